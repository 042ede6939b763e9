use std::path::{Path, PathBuf};

use crate::dockerfile::GENERATED_DIR;

/// Copies a prebuilt cog wheel into the build context.
///
/// The wheel lands in `.cog/tmp/` under its own file name, which is where
/// the generated Dockerfile `COPY`s it from. Any previous copy is replaced.
pub fn stage_wheel(project_dir: &Path, wheel: &Path) -> Result<PathBuf, ContextError> {
    let file_name = wheel
        .file_name()
        .ok_or_else(|| ContextError::NotAFile(wheel.to_path_buf()))?;

    let generated_dir = project_dir.join(GENERATED_DIR);
    std::fs::create_dir_all(&generated_dir).map_err(|e| ContextError::Create {
        path: generated_dir.clone(),
        source: e,
    })?;

    let dst = generated_dir.join(file_name);
    std::fs::copy(wheel, &dst).map_err(|e| ContextError::CopyFile {
        path: wheel.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(src = %wheel.display(), dst = %dst.display(), "staged wheel");
    Ok(dst)
}

/// Returns the generated paths that are not present in the build context.
pub fn missing_paths<'a>(project_dir: &Path, generated_paths: &'a [String]) -> Vec<&'a str> {
    generated_paths
        .iter()
        .filter(|p| !project_dir.join(p.as_str()).is_file())
        .map(String::as_str)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("{0} is not a file")]
    NotAFile(PathBuf),
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
}
