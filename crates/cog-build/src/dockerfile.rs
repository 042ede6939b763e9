use std::path::Path;

use cog_core::BuildConfig;

use crate::image::{self, ImageSpec};
use crate::packages::{self, APT_CACHE_MOUNT, PIP_CACHE_MOUNT, PipInstallPlan};

/// Version of the cog Python package baked into every image.
pub const COG_WHEEL_VERSION: &str = "0.0.1.dev";

/// Build-context directory the wheel is staged into before generation.
pub const GENERATED_DIR: &str = ".cog/tmp";

const SYNTAX: &str = "# syntax = docker/dockerfile:1.2";

const ENV_BLOCK: &str = "ENV DEBIAN_FRONTEND=noninteractive
ENV PYTHONUNBUFFERED=1
ENV LD_LIBRARY_PATH=$LD_LIBRARY_PATH:/usr/lib/x86_64-linux-gnu:/usr/local/nvidia/lib64:/usr/local/nvidia/bin";

/// Everything pyenv needs to compile any CPython patch release.
const PYENV_BUILD_DEPS: &[&str] = &[
    "make",
    "build-essential",
    "libssl-dev",
    "zlib1g-dev",
    "libbz2-dev",
    "libreadline-dev",
    "libsqlite3-dev",
    "wget",
    "curl",
    "llvm",
    "libncurses5-dev",
    "libncursesw5-dev",
    "xz-utils",
    "tk-dev",
    "libffi-dev",
    "liblzma-dev",
    "python-openssl",
    "git",
    "ca-certificates",
];

const TAIL: &str = r#"WORKDIR /src
CMD ["python", "-m", "cog.server.http"]
COPY . /src"#;

/// File name of the cog wheel.
pub fn wheel_filename() -> String {
    format!("cog-{COG_WHEEL_VERSION}-py3-none-any.whl")
}

/// Build-context path of the cog wheel.
pub fn wheel_context_path() -> String {
    format!("{GENERATED_DIR}/{}", wheel_filename())
}

/// A rendered Dockerfile and the build-context files it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDockerfile {
    pub dockerfile: String,
    /// Context-relative paths produced outside the generator that must be
    /// present for `docker build` to succeed
    pub generated_paths: Vec<String>,
}

/// Generates the Dockerfile for a cog model image.
///
/// Layers are ordered from least to most volatile: base image and Python,
/// the cog wheel, system packages, Python packages, and finally the model
/// source.
pub struct DockerfileGenerator<'a> {
    config: &'a BuildConfig,
    dir: &'a Path,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a BuildConfig, dir: &'a Path) -> Self {
        Self { config, dir }
    }

    /// Render the Dockerfile.
    ///
    /// # Errors
    ///
    /// [`GenerateError::UnsupportedVersion`] or [`GenerateError::UnsupportedCuda`]
    /// when no base image matches the configuration. Nothing is rendered in
    /// that case.
    pub fn generate(&self) -> Result<GeneratedDockerfile, GenerateError> {
        let config = self.config;
        let image = image::select(config.gpu, &config.python_version, config.cuda.as_ref())?;

        tracing::debug!(
            base_image = %image.base_image,
            needs_python_install = image.needs_python_install,
            "selected base image"
        );

        if let Some(requirements) = &config.python_requirements
            && !self.dir.join(requirements).exists()
        {
            tracing::warn!(
                path = %requirements.display(),
                "requirements file not found in build context"
            );
        }

        let mut generated_paths = Vec::new();
        let steps = [
            Some(SYNTAX.to_owned()),
            Some(format!("FROM {}", image.base_image)),
            Some(ENV_BLOCK.to_owned()),
            self.install_python(&image),
            Some(self.install_cog(&mut generated_paths)),
            packages::system_packages_step(&config.system_packages),
            packages::requirements_step(config.python_requirements.as_deref()),
            PipInstallPlan::new(config.gpu, &config.python_packages).render(),
            Some(TAIL.to_owned()),
        ];

        let dockerfile = steps.into_iter().flatten().collect::<Vec<_>>().join("\n");

        Ok(GeneratedDockerfile {
            dockerfile,
            generated_paths,
        })
    }

    fn install_python(&self, image: &ImageSpec) -> Option<String> {
        if !image.needs_python_install {
            return None;
        }
        let version = &self.config.python_version;

        let mut lines = vec![
            r#"ENV PATH="/root/.pyenv/shims:/root/.pyenv/bin:$PATH""#.to_owned(),
            format!(
                "RUN {APT_CACHE_MOUNT} apt-get update -qq && apt-get install -qqy --no-install-recommends \\"
            ),
        ];
        lines.extend(PYENV_BUILD_DEPS.iter().map(|dep| format!("\t{dep} \\")));
        lines.push("\t&& rm -rf /var/lib/apt/lists/*".to_owned());
        lines.push("RUN curl https://pyenv.run | bash && \\".to_owned());
        lines.push(
            "\tgit clone https://github.com/momo-lab/pyenv-install-latest.git \"$(pyenv root)\"/plugins/pyenv-install-latest && \\"
                .to_owned(),
        );
        lines.push(format!("\tpyenv install-latest \"{version}\" && \\"));
        lines.push(format!(
            "\tpyenv global $(pyenv install-latest --print \"{version}\")"
        ));

        Some(lines.join("\n"))
    }

    fn install_cog(&self, generated_paths: &mut Vec<String>) -> String {
        let wheel = wheel_filename();
        let context_path = wheel_context_path();
        let step = format!(
            "COPY {context_path} /tmp/{wheel}\nRUN {PIP_CACHE_MOUNT} pip install /tmp/{wheel}"
        );
        generated_paths.push(context_path);
        step
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(
        "unsupported python version {version} for {mode} builds; supported versions: {}",
        supported.join(", ")
    )]
    UnsupportedVersion {
        version: String,
        mode: &'static str,
        supported: Vec<String>,
    },
    #[error("no GPU base image for CUDA {cuda} with cuDNN {cudnn}")]
    UnsupportedCuda { cuda: String, cudnn: String },
}
