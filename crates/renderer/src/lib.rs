//! GPU rendering runtime for the shader gallery.
//!
//! The crate turns a [`catalog::Catalog`] of fragment shaders into a windowed
//! render loop:
//!
//! ```text
//! catalog::ShaderDefinition
//!        |  wrap + compile (compile)
//!        v
//! ShaderProgram  -- pipeline + bind group + parameter plan
//!        |
//! RenderSession  -- surface, quad, uniforms, pointer, clock, phase
//!        |
//! window runtime -- winit event loop, input, overlay
//! ```
//!
//! A session is fail-fast at construction and fail-soft afterwards: if the
//! context or the initial program cannot be built, [`run`] returns an error;
//! if a later shader switch fails, the session degrades to a solid fallback
//! clear and keeps presenting until a valid shader is selected again.

mod compile;
mod diagnostics;
mod error;
mod gpu;
mod window;

use std::collections::HashMap;

use anyhow::Result;
use catalog::Catalog;

pub use crate::diagnostics::{FpsMeter, OverlayReadout, OverlaySeverity};
pub use crate::error::{SessionError, ShaderBuildError};
pub use crate::gpu::{Phase, RenderSession};

/// Runtime parameter values keyed by uniform name.
pub type ParameterValues = HashMap<String, f64>;

/// Host-facing knobs for [`run`].
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Catalog id of the shader to show first; defaults to the first entry.
    pub initial_shader: Option<String>,
    /// Whether the fps overlay starts enabled.
    pub overlay: bool,
    pub window_title: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            initial_shader: None,
            overlay: false,
            window_title: "Shader Gallery".to_string(),
        }
    }
}

/// Opens a window and runs the gallery until the user quits.
///
/// Blocks the calling thread for the lifetime of the event loop.
pub fn run(config: GalleryConfig, catalog: Catalog) -> Result<()> {
    window::run_event_loop(config, catalog)
}
