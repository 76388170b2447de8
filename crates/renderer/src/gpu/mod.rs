//! GPU orchestration for the gallery renderer.
//!
//! - `context` owns wgpu instance/surface/device wiring and swapchain
//!   reconfiguration on resize.
//! - `geometry` builds the shared full-screen quad vertex buffer.
//! - `pipeline` links compiled stages into per-shader render pipelines and
//!   owns each shader's parameter uniform buffer.
//! - `uniforms` mirrors the generated GLSL uniform blocks and packs
//!   parameter values per the catalog descriptors.
//! - `session` glues everything into the per-frame state machine consumed by
//!   `window`.

mod context;
mod geometry;
mod pipeline;
mod session;
mod uniforms;

pub use session::{Phase, RenderSession};
