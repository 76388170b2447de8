//! TOML manifest schema for external shader catalogs.
//!
//! A manifest lists shader entries with their source paths (resolved relative
//! to the manifest file) and parameter tables. Serde defaults keep sparse
//! manifests loadable; real validation happens when the entries are folded
//! into a [`Catalog`](crate::Catalog).
//!
//! ```toml
//! name = "demo gallery"
//!
//! [[shader]]
//! id = "plasma"
//! name = "Plasma"
//! source = "shaders/plasma.frag"
//!
//! [[shader.parameter]]
//! name = "u_speed"
//! label = "Speed"
//! min = 0.1
//! max = 4.0
//! step = 0.1
//! default = 1.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Catalog, CatalogError, ParameterDescriptor, ParameterKind, ShaderDefinition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "shader")]
    pub shaders: Vec<ManifestShader>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestShader {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Path to the fragment source, relative to the manifest file.
    pub source: std::path::PathBuf,
    #[serde(default, rename = "parameter")]
    pub parameters: Vec<ManifestParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestParameter {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: ParameterKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl GalleryManifest {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CatalogError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves source paths and folds the manifest into a validated catalog.
    pub fn into_catalog(self, manifest_path: &Path) -> Result<Catalog, CatalogError> {
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        let mut shaders = Vec::with_capacity(self.shaders.len());
        for entry in self.shaders {
            let source_path = base.join(&entry.source);
            let source =
                fs::read_to_string(&source_path).map_err(|source| CatalogError::ManifestIo {
                    path: source_path.clone(),
                    source,
                })?;
            tracing::debug!(id = %entry.id, path = %source_path.display(), "loaded shader source");
            shaders.push(ShaderDefinition {
                name: entry.name.unwrap_or_else(|| entry.id.clone()),
                id: entry.id,
                source,
                parameters: entry.parameters.into_iter().map(Into::into).collect(),
            });
        }
        Catalog::new(shaders)
    }
}

impl From<ManifestParameter> for ParameterDescriptor {
    fn from(parameter: ManifestParameter) -> Self {
        Self {
            label: parameter
                .label
                .unwrap_or_else(|| parameter.name.clone()),
            name: parameter.name,
            kind: parameter.kind,
            min: parameter.min,
            max: parameter.max,
            step: parameter.step,
            default: parameter.default,
        }
    }
}
