use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CudaSpec, PythonPackage};

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "cog.toml";

/// cog.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CogConfig {
    #[serde(default)]
    pub build: BuildSection,
    /// Predictor reference, e.g. `predict.py:Predictor`
    pub predict: Option<String>,
}

/// The `[build]` table as written by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Build a CUDA-enabled image
    #[serde(default)]
    pub gpu: bool,
    /// Python minor version, e.g. "3.8"
    #[serde(default = "default_python_version")]
    pub python_version: String,
    /// Requirements file, relative to the project directory
    pub python_requirements: Option<PathBuf>,
    /// Packages in `name` or `name==version` form
    #[serde(default)]
    pub python_packages: Vec<String>,
    /// Packages to install via apt-get
    #[serde(default)]
    pub system_packages: Vec<String>,
    /// CUDA toolkit version (GPU only; inferred when omitted)
    pub cuda: Option<String>,
    /// cuDNN major version (GPU only; inferred when omitted)
    pub cudnn: Option<String>,
}

/// Validated build settings consumed by the Dockerfile generator.
///
/// Only [`CogConfig::validate_and_complete`] produces this from user input;
/// every field is already defaulted and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub gpu: bool,
    pub python_version: String,
    pub system_packages: Vec<String>,
    pub python_requirements: Option<PathBuf>,
    pub python_packages: Vec<PythonPackage>,
    /// Set only for GPU builds whose toolkit is pinned or inferable
    pub cuda: Option<CudaSpec>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            gpu: false,
            python_version: default_python_version(),
            python_requirements: None,
            python_packages: Vec::new(),
            system_packages: Vec::new(),
            cuda: None,
            cudnn: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            gpu: false,
            python_version: default_python_version(),
            system_packages: Vec::new(),
            python_requirements: None,
            python_packages: Vec::new(),
            cuda: None,
        }
    }
}

impl CogConfig {
    /// Load cog.toml from the given project directory.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(crate::Error::ConfigNotFound {
                dir: project_dir.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        Self::from_toml_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check the `[build]` table and fill in everything the generator needs.
    ///
    /// Nothing is read from disk; whether `python_requirements` exists is
    /// the build context's concern.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPackage`](crate::Error::InvalidPackage) for a malformed `python_packages` entry
    /// - [`Error::InvalidRequirementsPath`](crate::Error::InvalidRequirementsPath) if `python_requirements` points outside the project
    /// - CUDA errors from [`resolve_cuda`](crate::compat::resolve_cuda) for GPU builds
    pub fn validate_and_complete(&self) -> crate::Result<BuildConfig> {
        let build = &self.build;

        let python_packages = build
            .python_packages
            .iter()
            .map(|spec| spec.parse::<PythonPackage>())
            .collect::<crate::Result<Vec<_>>>()?;

        if let Some(requirements) = &build.python_requirements {
            check_requirements_path(requirements)?;
        }

        let cuda = if build.gpu {
            crate::compat::resolve_cuda(
                build.cuda.as_deref(),
                build.cudnn.as_deref(),
                &python_packages,
            )?
        } else {
            if build.cuda.is_some() || build.cudnn.is_some() {
                tracing::warn!("cuda/cudnn are ignored when gpu = false");
            }
            None
        };

        tracing::debug!(
            gpu = build.gpu,
            python_version = %build.python_version,
            python_packages = python_packages.len(),
            system_packages = build.system_packages.len(),
            "build config validated"
        );

        Ok(BuildConfig {
            gpu: build.gpu,
            python_version: build.python_version.clone(),
            system_packages: build.system_packages.clone(),
            python_requirements: build.python_requirements.clone(),
            python_packages,
            cuda,
        })
    }
}

/// The requirements file is `COPY`ed from the build context, so it must be
/// a relative path that stays inside the project directory.
fn check_requirements_path(path: &Path) -> crate::Result<()> {
    let invalid = |reason| crate::Error::InvalidRequirementsPath {
        path: path.to_path_buf(),
        reason,
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("path is empty"));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not leave the project directory")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the project directory"));
            }
        }
    }
    Ok(())
}

fn default_python_version() -> String {
    "3.8".to_owned()
}
