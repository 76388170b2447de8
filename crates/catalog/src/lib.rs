//! Shader catalog consumed by the gallery renderer.
//!
//! A [`Catalog`] is an ordered, immutable collection of [`ShaderDefinition`]s.
//! Each definition carries a unique id, a display name, the fragment-stage
//! GLSL body, and an ordered list of [`ParameterDescriptor`]s describing the
//! uniforms the shader exposes for live editing. Definitions are constructed
//! once at startup (either from the embedded built-in gallery or from a TOML
//! manifest via [`Catalog::from_manifest`]) and never mutated afterwards.
//!
//! Validation happens eagerly in [`Catalog::new`]: inverted ranges, non-positive
//! steps, duplicate ids, and parameter names that would be illegal GLSL
//! identifiers are all rejected with a readable [`CatalogError`] instead of
//! surfacing later as a shader compile failure.

mod manifest;

pub use manifest::{GalleryManifest, ManifestParameter, ManifestShader};

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric kind of a parameter, controlling how the value is marshalled to
/// the GPU (4-byte float vs 4-byte integer). Always taken from the
/// descriptor, never inferred from the parameter's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    #[default]
    Float,
    Int,
}

/// Describes one live-adjustable uniform exposed by a shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Uniform name; must be a valid GLSL identifier referenced by the source.
    pub name: String,
    /// Human-readable label for editing UIs.
    pub label: String,
    pub kind: ParameterKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl ParameterDescriptor {
    /// Convenience constructor for a float parameter.
    pub fn float(name: &str, label: &str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ParameterKind::Float,
            min,
            max,
            step,
            default,
        }
    }

    /// Convenience constructor for an integer parameter.
    pub fn int(name: &str, label: &str, min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            kind: ParameterKind::Int,
            ..Self::float(name, label, min, max, step, default)
        }
    }

    /// Clamps a candidate value into the descriptor's declared range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, shader_id: &str) -> Result<(), CatalogError> {
        let issue = |message: String| CatalogError::InvalidParameter {
            shader: shader_id.to_string(),
            name: self.name.clone(),
            message,
        };

        if !is_glsl_identifier(&self.name) {
            return Err(issue("name is not a valid GLSL identifier".to_string()));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(issue(format!("step must be positive, got {}", self.step)));
        }
        if self.min > self.max {
            return Err(issue(format!(
                "minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        if self.default < self.min || self.default > self.max {
            return Err(issue(format!(
                "default {} is outside [{}, {}]",
                self.default, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// One fragment shader entry in the gallery. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDefinition {
    /// Unique id used for selection (CLI flag, keyboard shortcuts).
    pub id: String,
    /// Display name shown in the window title.
    pub name: String,
    /// Fragment-stage GLSL body declaring `mainImage(out vec4, in vec2)`.
    pub source: String,
    /// Ordered parameter descriptors; order defines the uniform block layout.
    pub parameters: Vec<ParameterDescriptor>,
}

impl ShaderDefinition {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::InvalidShader {
                id: self.id.clone(),
                message: "id must not be empty".to_string(),
            });
        }
        if self.source.trim().is_empty() {
            return Err(CatalogError::InvalidShader {
                id: self.id.clone(),
                message: "fragment source must not be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for descriptor in &self.parameters {
            descriptor.validate(&self.id)?;
            if !seen.insert(descriptor.name.as_str()) {
                return Err(CatalogError::InvalidParameter {
                    shader: self.id.clone(),
                    name: descriptor.name.clone(),
                    message: "declared more than once".to_string(),
                });
            }
            if !self.source.contains(descriptor.name.as_str()) {
                return Err(CatalogError::InvalidParameter {
                    shader: self.id.clone(),
                    name: descriptor.name.clone(),
                    message: "never referenced by the fragment source".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered, validated collection of shader definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    shaders: Vec<ShaderDefinition>,
}

impl Catalog {
    /// Builds a catalog, validating every definition and id uniqueness.
    pub fn new(shaders: Vec<ShaderDefinition>) -> Result<Self, CatalogError> {
        if shaders.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut ids = HashSet::new();
        for shader in &shaders {
            shader.validate()?;
            if !ids.insert(shader.id.as_str()) {
                return Err(CatalogError::DuplicateId(shader.id.clone()));
            }
        }
        Ok(Self { shaders })
    }

    /// The embedded default gallery.
    pub fn builtin() -> Self {
        let shaders = vec![
            ShaderDefinition {
                id: "plasma".to_string(),
                name: "Plasma".to_string(),
                source: include_str!("../shaders/plasma.frag").to_string(),
                parameters: vec![
                    ParameterDescriptor::float("u_speed", "Speed", 0.1, 4.0, 0.1, 1.0),
                    ParameterDescriptor::float("u_scale", "Scale", 1.0, 24.0, 0.5, 8.0),
                ],
            },
            ShaderDefinition {
                id: "ripple".to_string(),
                name: "Ripple".to_string(),
                source: include_str!("../shaders/ripple.frag").to_string(),
                parameters: vec![
                    ParameterDescriptor::float("u_frequency", "Frequency", 4.0, 120.0, 2.0, 40.0),
                    ParameterDescriptor::float("u_amplitude", "Amplitude", 0.05, 1.0, 0.05, 0.6),
                    ParameterDescriptor::float("u_decay", "Decay", 0.0, 12.0, 0.25, 3.0),
                ],
            },
            ShaderDefinition {
                id: "fbm".to_string(),
                name: "Noise Field".to_string(),
                source: include_str!("../shaders/fbm.frag").to_string(),
                parameters: vec![
                    ParameterDescriptor::int("u_octaves", "Octaves", 1.0, 8.0, 1.0, 5.0),
                    ParameterDescriptor::float("u_zoom", "Zoom", 1.0, 16.0, 0.5, 4.0),
                    ParameterDescriptor::float("u_drift", "Drift", 0.0, 2.0, 0.05, 0.2),
                ],
            },
        ];
        Self::new(shaders).expect("built-in catalog must validate")
    }

    /// Loads a catalog from a TOML manifest, resolving shader source paths
    /// relative to the manifest's directory.
    pub fn from_manifest(path: &std::path::Path) -> Result<Self, CatalogError> {
        let manifest = GalleryManifest::load(path)?;
        manifest.into_catalog(path)
    }

    pub fn shaders(&self) -> &[ShaderDefinition] {
        &self.shaders
    }

    pub fn get(&self, id: &str) -> Option<&ShaderDefinition> {
        self.shaders.iter().find(|shader| shader.id == id)
    }

    /// Index of a shader id within the catalog order, for next/previous cycling.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.shaders.iter().position(|shader| shader.id == id)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

fn is_glsl_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') && !name.starts_with("gl_")
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog contains no shaders")]
    Empty,
    #[error("duplicate shader id `{0}`")]
    DuplicateId(String),
    #[error("shader `{id}`: {message}")]
    InvalidShader { id: String, message: String },
    #[error("shader `{shader}` parameter `{name}`: {message}")]
    InvalidParameter {
        shader: String,
        name: String,
        message: String,
    },
    #[error("failed to read {path}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
