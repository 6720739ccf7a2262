use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed glTF data")]
    Gltf(#[from] gltf::Error),
    #[error("model '{0}' has no meshes")]
    EmptyModel(String),
}
