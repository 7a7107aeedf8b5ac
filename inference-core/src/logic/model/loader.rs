//! Model Loader - registry URI resolution and artifact loading
//!
//! URI forms:
//! - `models:/<name>/<stage>` → `<registry_dir>/<name>/<stage>/`
//! - `file://<path>` or a bare path
//!
//! A directory resolves to `model.onnx`, else `model.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::inference::{InferenceError, LinearModel, ModelHandle, OnnxModel};

const REGISTRY_SCHEME: &str = "models:/";
const FILE_SCHEME: &str = "file://";
const ARTIFACT_NAMES: &[&str] = &["model.onnx", "model.json"];

/// Performs the (slow, I/O-bound) load of one artifact
pub trait ModelLoader: Send + Sync {
    fn load(&self, uri: &str) -> Result<ModelHandle, InferenceError>;
}

/// Loads artifacts from a local registry mirror
pub struct ArtifactLoader {
    registry_dir: PathBuf,
}

impl ArtifactLoader {
    pub fn new(registry_dir: impl Into<PathBuf>) -> Self {
        Self { registry_dir: registry_dir.into() }
    }

    /// Map a URI to the artifact file on disk
    pub fn resolve(&self, uri: &str) -> Result<PathBuf, InferenceError> {
        let base = if let Some(rest) = uri.strip_prefix(REGISTRY_SCHEME) {
            let mut parts = rest.trim_matches('/').splitn(2, '/');
            match (parts.next(), parts.next()) {
                (Some(name), Some(stage)) if !name.is_empty() && !stage.is_empty() => {
                    self.registry_dir.join(name).join(stage)
                }
                _ => {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "registry URI must be models:/<name>/<stage>, got {}",
                        uri
                    )))
                }
            }
        } else if let Some(path) = uri.strip_prefix(FILE_SCHEME) {
            PathBuf::from(path)
        } else {
            PathBuf::from(uri)
        };

        if base.is_dir() {
            return ARTIFACT_NAMES.iter()
                .map(|name| base.join(name))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| InferenceError::NotFound(format!("no model artifact in {}", base.display())));
        }

        if base.is_file() {
            Ok(base)
        } else {
            Err(InferenceError::NotFound(base.display().to_string()))
        }
    }
}

/// SHA-256 of the artifact bytes, hex encoded
pub fn artifact_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

impl ModelLoader for ArtifactLoader {
    fn load(&self, uri: &str) -> Result<ModelHandle, InferenceError> {
        let path = self.resolve(uri)?;
        let bytes = std::fs::read(&path)?;
        let checksum = artifact_checksum(&bytes);

        let handle = match extension(&path) {
            Some("onnx") => ModelHandle::new(uri, Arc::new(OnnxModel::from_file(&path)?), Some(checksum)),
            Some("json") => ModelHandle::new(uri, Arc::new(LinearModel::from_json(&bytes)?), Some(checksum)),
            other => {
                return Err(InferenceError::InvalidArtifact(format!(
                    "unsupported artifact type {:?} at {}",
                    other,
                    path.display()
                )))
            }
        };

        log::info!(
            "Loaded {} model {} from {} (sha256 {})",
            handle.kind(),
            uri,
            path.display(),
            handle.checksum().unwrap_or("-")
        );

        Ok(handle)
    }
}
