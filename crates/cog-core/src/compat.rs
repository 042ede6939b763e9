//! CUDA compatibility matrix for GPU builds.
//!
//! Maps pinned deep-learning framework versions to the CUDA toolkits their
//! published wheels were built against, and CUDA toolkits to the cuDNN
//! releases available as `nvidia/cuda` images.
//!
//! Every list is ordered newest first; inference always takes the head.

use crate::PythonPackage;

/// A resolved CUDA toolkit / cuDNN pair for a GPU image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaSpec {
    pub cuda: String,
    pub cudnn: String,
}

/// CUDA toolkit → cuDNN major versions.
pub const CUDA_CUDNN: &[(&str, &[&str])] = &[
    ("11.1", &["8"]),
    ("11.0", &["8"]),
    ("10.2", &["8", "7"]),
    ("10.1", &["8", "7"]),
    ("10.0", &["7"]),
    ("9.2", &["7"]),
];

/// torch version → CUDA toolkits with published wheels.
pub const TORCH_CUDA: &[(&str, &[&str])] = &[
    ("1.8.1", &["11.1", "10.2"]),
    ("1.8.0", &["11.1", "10.2"]),
    ("1.7.1", &["11.0", "10.2", "10.1", "9.2"]),
    ("1.7.0", &["11.0", "10.2", "10.1", "9.2"]),
    ("1.6.0", &["10.2", "10.1", "9.2"]),
    ("1.5.1", &["10.2", "10.1", "9.2"]),
    ("1.5.0", &["10.2", "10.1", "9.2"]),
    ("1.4.0", &["10.1", "10.0", "9.2"]),
];

/// tensorflow version → (CUDA toolkit, cuDNN) it was tested against.
pub const TENSORFLOW_CUDA: &[(&str, &str, &str)] = &[
    ("2.4.1", "11.0", "8"),
    ("2.4.0", "11.0", "8"),
    ("2.3.1", "10.1", "7"),
    ("2.3.0", "10.1", "7"),
    ("2.2.0", "10.1", "7"),
    ("2.1.0", "10.1", "7"),
    ("1.15.0", "10.0", "7"),
];

/// Resolve the CUDA/cuDNN pair for a GPU build.
///
/// Explicit values win. Otherwise CUDA is inferred from a pinned `torch`
/// (checked first) or `tensorflow` version. Returns `Ok(None)` when nothing
/// pins the toolkit, leaving the choice to the per-Python default image.
///
/// # Errors
///
/// - [`Error::UnknownCuda`](crate::Error::UnknownCuda) if the CUDA version is not in [`CUDA_CUDNN`]
/// - [`Error::UnknownCudnn`](crate::Error::UnknownCudnn) if the cuDNN version is not paired with it
/// - [`Error::IncompatibleCuda`](crate::Error::IncompatibleCuda) if a pinned framework lacks wheels for it
pub fn resolve_cuda(
    cuda: Option<&str>,
    cudnn: Option<&str>,
    packages: &[PythonPackage],
) -> crate::Result<Option<CudaSpec>> {
    let torch = pinned_version(packages, "torch").and_then(|version| {
        let cudas = lookup_torch(version);
        if cudas.is_none() {
            tracing::warn!(%version, "torch version not in compatibility matrix; not inferring CUDA");
        }
        cudas.map(|cudas| (version, cudas))
    });
    let tensorflow = pinned_version(packages, "tensorflow").and_then(|version| {
        let entry = lookup_tensorflow(version);
        if entry.is_none() {
            tracing::warn!(%version, "tensorflow version not in compatibility matrix; not inferring CUDA");
        }
        entry.map(|(cuda, cudnn)| (version, cuda, cudnn))
    });

    let chosen = match cuda {
        Some(explicit) => explicit,
        None => match (torch, tensorflow) {
            (Some((_, cudas)), _) => cudas[0],
            (None, Some((_, tf_cuda, _))) => tf_cuda,
            (None, None) => {
                if let Some(cudnn) = cudnn {
                    tracing::warn!(%cudnn, "cudnn set without cuda; using default GPU image");
                }
                return Ok(None);
            }
        },
    };

    let available = cudnn_for(chosen).ok_or_else(|| crate::Error::UnknownCuda {
        cuda: chosen.to_owned(),
        known: CUDA_CUDNN.iter().map(|(c, _)| (*c).to_owned()).collect(),
    })?;

    if let Some((version, cudas)) = torch
        && !cudas.contains(&chosen)
    {
        return Err(crate::Error::IncompatibleCuda {
            framework: "torch",
            version: version.to_owned(),
            cuda: chosen.to_owned(),
            compatible: cudas.iter().map(|c| (*c).to_owned()).collect(),
        });
    }
    if let Some((version, tf_cuda, _)) = tensorflow
        && tf_cuda != chosen
    {
        return Err(crate::Error::IncompatibleCuda {
            framework: "tensorflow",
            version: version.to_owned(),
            cuda: chosen.to_owned(),
            compatible: vec![tf_cuda.to_owned()],
        });
    }

    let cudnn = match cudnn {
        Some(explicit) if available.contains(&explicit) => explicit,
        Some(explicit) => {
            return Err(crate::Error::UnknownCudnn {
                cuda: chosen.to_owned(),
                cudnn: explicit.to_owned(),
                known: available.iter().map(|c| (*c).to_owned()).collect(),
            });
        }
        None => match tensorflow {
            Some((_, _, tf_cudnn)) => tf_cudnn,
            None => available[0],
        },
    };

    tracing::debug!(cuda = %chosen, %cudnn, "resolved CUDA toolkit");
    Ok(Some(CudaSpec {
        cuda: chosen.to_owned(),
        cudnn: cudnn.to_owned(),
    }))
}

fn pinned_version<'a>(packages: &'a [PythonPackage], name: &str) -> Option<&'a str> {
    packages
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.version.as_deref())
}

fn cudnn_for(cuda: &str) -> Option<&'static [&'static str]> {
    CUDA_CUDNN
        .iter()
        .find(|(c, _)| *c == cuda)
        .map(|(_, cudnns)| *cudnns)
}

fn lookup_torch(version: &str) -> Option<&'static [&'static str]> {
    // Local tags such as `+cu101` do not change which toolkits apply.
    let base = version.split('+').next().unwrap_or(version);
    TORCH_CUDA
        .iter()
        .find(|(v, _)| *v == base)
        .map(|(_, cudas)| *cudas)
}

fn lookup_tensorflow(version: &str) -> Option<(&'static str, &'static str)> {
    TENSORFLOW_CUDA
        .iter()
        .find(|(v, _, _)| *v == version)
        .map(|(_, cuda, cudnn)| (*cuda, *cudnn))
}
