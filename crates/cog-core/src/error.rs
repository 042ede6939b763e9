use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cog.toml not found in {dir}; run `cog init` to create one")]
    ConfigNotFound { dir: PathBuf },

    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Validation ──
    #[error("invalid python package {spec:?}: {reason}")]
    InvalidPackage { spec: String, reason: &'static str },

    #[error("invalid python_requirements path {}: {reason}", path.display())]
    InvalidRequirementsPath { path: PathBuf, reason: &'static str },

    #[error(
        "CUDA {cuda} is not supported; known versions: {}",
        known.join(", ")
    )]
    UnknownCuda { cuda: String, known: Vec<String> },

    #[error(
        "cuDNN {cudnn} is not available for CUDA {cuda}; known versions: {}",
        known.join(", ")
    )]
    UnknownCudnn {
        cuda: String,
        cudnn: String,
        known: Vec<String>,
    },

    #[error(
        "{framework}=={version} does not support CUDA {cuda}; compatible versions: {}",
        compatible.join(", ")
    )]
    IncompatibleCuda {
        framework: &'static str,
        version: String,
        cuda: String,
        compatible: Vec<String>,
    },
}
