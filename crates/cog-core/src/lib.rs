//! Core types and configuration for cog.
//!
//! This crate defines the `cog.toml` schema ([`CogConfig`]), its validated
//! form ([`BuildConfig`]), Python package specs, the CUDA compatibility
//! matrix, and shared error types.

pub mod compat;
pub mod config;
pub mod error;
pub mod package;

pub use compat::{CudaSpec, resolve_cuda};
pub use config::{BuildConfig, BuildSection, CONFIG_FILE, CogConfig};
pub use error::{Error, Result};
pub use package::PythonPackage;
