//! Dockerfile generation for cog model images.
//!
//! # Generated layers
//!
//! ```text
//! # syntax = docker/dockerfile:1.2
//! FROM <image>            ── image::select()  python:<v> or nvidia/cuda:<cuda>-cudnn<n>-devel-ubuntu<os>
//! ENV ...                 ── locale, unbuffered output, NVIDIA library path
//! <pyenv install>         ── GPU images only
//! COPY/RUN cog wheel      ── always; path reported in generated_paths
//! RUN apt-get install     ── build.system_packages, if any
//! COPY/RUN requirements   ── build.python_requirements, if set
//! RUN pip install         ── build.python_packages, if any (CPU variants rewritten)
//! WORKDIR /src
//! CMD ["python", "-m", "cog.server.http"]
//! COPY . /src
//! ```
//!
//! Output is a pure function of the [`BuildConfig`](cog_core::BuildConfig):
//! identical configuration yields byte-identical text, which keeps Docker's
//! layer cache warm across builds.

pub mod context;
pub mod dockerfile;
pub mod image;
pub mod packages;

pub use dockerfile::{DockerfileGenerator, GenerateError, GeneratedDockerfile};
