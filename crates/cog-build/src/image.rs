//! Base image selection.
//!
//! CPU builds use the official `python:<version>` images, which already
//! ship the requested interpreter. GPU builds start from an
//! `nvidia/cuda` development image and install Python on top with pyenv.

use cog_core::CudaSpec;

use crate::GenerateError;

/// Python version → CPU base image.
pub const CPU_IMAGES: &[(&str, &str)] = &[
    ("3.6", "python:3.6"),
    ("3.7", "python:3.7"),
    ("3.8", "python:3.8"),
    ("3.9", "python:3.9"),
];

/// Python version → default GPU base image, used when no CUDA toolkit is pinned.
pub const GPU_IMAGES: &[(&str, &str)] = &[
    ("3.6", "nvidia/cuda:11.0-cudnn8-devel-ubuntu16.04"),
    ("3.7", "nvidia/cuda:11.0-cudnn8-devel-ubuntu16.04"),
    ("3.8", "nvidia/cuda:11.0-cudnn8-devel-ubuntu16.04"),
    ("3.9", "nvidia/cuda:11.0-cudnn8-devel-ubuntu16.04"),
];

/// (CUDA, cuDNN) → GPU base image.
pub const CUDA_IMAGES: &[((&str, &str), &str)] = &[
    (("11.1", "8"), "nvidia/cuda:11.1-cudnn8-devel-ubuntu18.04"),
    (("11.0", "8"), "nvidia/cuda:11.0-cudnn8-devel-ubuntu16.04"),
    (("10.2", "8"), "nvidia/cuda:10.2-cudnn8-devel-ubuntu18.04"),
    (("10.2", "7"), "nvidia/cuda:10.2-cudnn7-devel-ubuntu18.04"),
    (("10.1", "8"), "nvidia/cuda:10.1-cudnn8-devel-ubuntu18.04"),
    (("10.1", "7"), "nvidia/cuda:10.1-cudnn7-devel-ubuntu18.04"),
    (("10.0", "7"), "nvidia/cuda:10.0-cudnn7-devel-ubuntu18.04"),
    (("9.2", "7"), "nvidia/cuda:9.2-cudnn7-devel-ubuntu18.04"),
];

/// The image a Dockerfile starts `FROM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub base_image: String,
    /// The image's own Python differs from the requested one
    pub needs_python_install: bool,
}

/// Pick the base image for a build.
///
/// Lookups are exact matches on the version strings.
pub fn select(
    gpu: bool,
    python_version: &str,
    cuda: Option<&CudaSpec>,
) -> Result<ImageSpec, GenerateError> {
    if !gpu {
        let base_image = lookup(CPU_IMAGES, python_version, "cpu")?;
        return Ok(ImageSpec {
            base_image: base_image.to_owned(),
            needs_python_install: false,
        });
    }

    let default_image = lookup(GPU_IMAGES, python_version, "gpu")?;
    let base_image = match cuda {
        Some(spec) => CUDA_IMAGES
            .iter()
            .find(|((cuda, cudnn), _)| *cuda == spec.cuda && *cudnn == spec.cudnn)
            .map(|(_, image)| *image)
            .ok_or_else(|| GenerateError::UnsupportedCuda {
                cuda: spec.cuda.clone(),
                cudnn: spec.cudnn.clone(),
            })?,
        None => default_image,
    };

    Ok(ImageSpec {
        base_image: base_image.to_owned(),
        needs_python_install: true,
    })
}

fn lookup(
    table: &'static [(&'static str, &'static str)],
    python_version: &str,
    mode: &'static str,
) -> Result<&'static str, GenerateError> {
    table
        .iter()
        .find(|(version, _)| *version == python_version)
        .map(|(_, image)| *image)
        .ok_or_else(|| GenerateError::UnsupportedVersion {
            version: python_version.to_owned(),
            mode,
            supported: table.iter().map(|(v, _)| (*v).to_owned()).collect(),
        })
}
