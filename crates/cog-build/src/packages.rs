//! Package installation steps.
//!
//! Every step renders to a single `RUN` (plus a `COPY` for requirements
//! files) so that a change to one list only invalidates its own layer.
//! Install order is taken verbatim from configuration; the instruction text
//! is part of the Docker build-cache key.

use std::borrow::Cow;
use std::path::{Component, Path};

use cog_core::PythonPackage;

pub const APT_CACHE_MOUNT: &str = "--mount=type=cache,target=/var/cache/apt";
pub const PIP_CACHE_MOUNT: &str = "--mount=type=cache,target=/root/.cache/pip";

/// In-image location a requirements file is copied to before installing.
const REQUIREMENTS_TMP: &str = "/tmp/requirements.txt";

/// How a package with a separate CPU-only build is rewritten for CPU images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuVariant {
    pub name: &'static str,
    /// Local version tag appended to pinned versions
    pub suffix: &'static str,
    /// Where pip finds the CPU wheels
    pub index: PackageIndex,
}

/// An extra package source passed to `pip install`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageIndex {
    /// `-f <url>`: a flat page of wheel links
    FindLinks(&'static str),
    /// `--extra-index-url=<url>`: a PEP 503 index
    ExtraIndex(&'static str),
}

const TORCH_STABLE: &str = "https://download.pytorch.org/whl/torch_stable.html";

/// Packages whose default wheels on PyPI are built against CUDA.
pub const CPU_VARIANTS: &[CpuVariant] = &[
    CpuVariant {
        name: "torch",
        suffix: "+cpu",
        index: PackageIndex::FindLinks(TORCH_STABLE),
    },
    CpuVariant {
        name: "torchvision",
        suffix: "+cpu",
        index: PackageIndex::FindLinks(TORCH_STABLE),
    },
];

pub fn cpu_variant(name: &str) -> Option<&'static CpuVariant> {
    CPU_VARIANTS.iter().find(|v| v.name == name)
}

/// `apt-get install` of the configured system packages, or `None` when empty.
pub fn system_packages_step(packages: &[String]) -> Option<String> {
    if packages.is_empty() {
        return None;
    }
    Some(format!(
        "RUN {APT_CACHE_MOUNT} apt-get update -qq && apt-get install -qqy {} && rm -rf /var/lib/apt/lists/*",
        packages.join(" ")
    ))
}

/// Copy and install a requirements file, removing it in the same layer.
pub fn requirements_step(requirements: Option<&Path>) -> Option<String> {
    let path = requirements?;
    Some(format!(
        "COPY {path} {REQUIREMENTS_TMP}\nRUN {PIP_CACHE_MOUNT} pip install -r {REQUIREMENTS_TMP} && rm {REQUIREMENTS_TMP}",
        path = context_path(path),
    ))
}

/// The resolved arguments for the explicit `pip install` step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipInstallPlan {
    pub find_links: Vec<String>,
    pub extra_index_urls: Vec<String>,
    /// Requirement strings in configuration order
    pub requirements: Vec<String>,
}

impl PipInstallPlan {
    /// Rewrite packages for the target image.
    ///
    /// CPU images get the CPU-only build of every package in
    /// [`CPU_VARIANTS`]: pinned versions gain the variant suffix and the
    /// variant's package index is added once. GPU images install
    /// the packages untouched.
    pub fn new(gpu: bool, packages: &[PythonPackage]) -> Self {
        let mut plan = Self::default();

        for package in packages {
            let variant = if gpu { None } else { cpu_variant(&package.name) };
            let Some(variant) = variant else {
                plan.requirements.push(package.to_string());
                continue;
            };

            let (urls, url) = match variant.index {
                PackageIndex::FindLinks(url) => (&mut plan.find_links, url),
                PackageIndex::ExtraIndex(url) => (&mut plan.extra_index_urls, url),
            };
            if !urls.iter().any(|u| u == url) {
                urls.push(url.to_owned());
            }

            let requirement = match package.version.as_deref() {
                Some(version) if version.contains('+') => {
                    tracing::debug!(
                        package = %package.name,
                        %version,
                        "version already has a local tag; leaving as is"
                    );
                    package.to_string()
                }
                Some(version) => format!("{}=={}{}", package.name, version, variant.suffix),
                None => {
                    tracing::warn!(
                        package = %package.name,
                        "unpinned package has a CPU-only build; pin it to select that build"
                    );
                    package.to_string()
                }
            };
            plan.requirements.push(requirement);
        }

        plan
    }

    /// Render as a single `RUN`, or `None` when there is nothing to install.
    pub fn render(&self) -> Option<String> {
        if self.requirements.is_empty() {
            return None;
        }
        let find_links: String = self.find_links.iter().map(|u| format!("-f {u} ")).collect();
        let extra_index_urls: String = self
            .extra_index_urls
            .iter()
            .map(|u| format!("--extra-index-url={u} "))
            .collect();
        Some(format!(
            "RUN {PIP_CACHE_MOUNT} pip install {find_links} {extra_index_urls} {}",
            self.requirements.join(" ")
        ))
    }
}

/// Paths inside the Docker build context always use forward slashes.
pub(crate) fn context_path(path: &Path) -> String {
    path.components()
        .map(|c| match c {
            // Joining with "/" supplies the leading separator.
            Component::RootDir => Cow::Borrowed(""),
            c => c.as_os_str().to_string_lossy(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkgs(specs: &[&str]) -> Vec<PythonPackage> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    // ── system packages ──

    #[test]
    fn system_packages_keep_order_and_duplicates() {
        let step = system_packages_step(&[
            "ffmpeg".to_owned(),
            "cowsay".to_owned(),
            "ffmpeg".to_owned(),
        ])
        .unwrap();
        assert_eq!(
            step,
            "RUN --mount=type=cache,target=/var/cache/apt apt-get update -qq && apt-get install -qqy ffmpeg cowsay ffmpeg && rm -rf /var/lib/apt/lists/*"
        );
    }

    #[test]
    fn system_packages_empty_is_none() {
        assert_eq!(system_packages_step(&[]), None);
    }

    // ── requirements ──

    #[test]
    fn requirements_step_copies_installs_and_removes() {
        let step = requirements_step(Some(Path::new("my-requirements.txt"))).unwrap();
        assert_eq!(
            step,
            "COPY my-requirements.txt /tmp/requirements.txt\n\
             RUN --mount=type=cache,target=/root/.cache/pip pip install -r /tmp/requirements.txt && rm /tmp/requirements.txt"
        );
    }

    #[test]
    fn requirements_step_nested_path_uses_slashes() {
        let path: std::path::PathBuf = ["deps", "requirements.txt"].iter().collect();
        let step = requirements_step(Some(&path)).unwrap();
        assert!(step.starts_with("COPY deps/requirements.txt /tmp/requirements.txt\n"));
    }

    #[test]
    fn requirements_step_absolute_path_has_single_leading_slash() {
        let step = requirements_step(Some(Path::new("/abs/req.txt"))).unwrap();
        assert!(step.starts_with("COPY /abs/req.txt /tmp/requirements.txt\n"), "got: {step}");
    }

    #[test]
    fn requirements_step_none_is_none() {
        assert_eq!(requirements_step(None), None);
    }

    // ── pip install plan ──

    #[test]
    fn cpu_rewrites_torch_and_adds_find_links() {
        let plan = PipInstallPlan::new(false, &pkgs(&["torch==1.5.1", "pandas==1.2.0.12"]));
        assert_eq!(plan.find_links, vec![TORCH_STABLE]);
        assert_eq!(plan.requirements, vec!["torch==1.5.1+cpu", "pandas==1.2.0.12"]);
        assert_eq!(
            plan.render().unwrap(),
            "RUN --mount=type=cache,target=/root/.cache/pip pip install -f https://download.pytorch.org/whl/torch_stable.html   torch==1.5.1+cpu pandas==1.2.0.12"
        );
    }

    #[test]
    fn gpu_passes_packages_through() {
        let plan = PipInstallPlan::new(true, &pkgs(&["torch==1.5.1", "pandas==1.2.0.12"]));
        assert!(plan.find_links.is_empty());
        assert_eq!(
            plan.render().unwrap(),
            "RUN --mount=type=cache,target=/root/.cache/pip pip install   torch==1.5.1 pandas==1.2.0.12"
        );
    }

    #[test]
    fn cpu_without_variant_packages_has_no_find_links() {
        let plan = PipInstallPlan::new(false, &pkgs(&["pandas==1.2.0.12", "requests"]));
        assert!(plan.find_links.is_empty());
        assert_eq!(plan.requirements, vec!["pandas==1.2.0.12", "requests"]);
    }

    #[test]
    fn find_links_added_once_for_shared_index() {
        let plan = PipInstallPlan::new(false, &pkgs(&["torch==1.7.1", "torchvision==0.8.2"]));
        assert_eq!(plan.find_links.len(), 1);
        assert_eq!(
            plan.requirements,
            vec!["torch==1.7.1+cpu", "torchvision==0.8.2+cpu"]
        );
    }

    #[test]
    fn existing_local_tag_is_not_doubled() {
        let plan = PipInstallPlan::new(false, &pkgs(&["torch==1.5.1+cpu"]));
        assert_eq!(plan.requirements, vec!["torch==1.5.1+cpu"]);
    }

    #[test]
    fn unpinned_variant_is_not_suffixed() {
        let plan = PipInstallPlan::new(false, &pkgs(&["torch"]));
        assert_eq!(plan.requirements, vec!["torch"]);
        assert_eq!(plan.find_links, vec![TORCH_STABLE]);
    }

    #[test]
    fn empty_plan_renders_nothing() {
        assert_eq!(PipInstallPlan::new(false, &[]).render(), None);
    }

    #[test]
    fn extra_index_urls_render_after_find_links() {
        let plan = PipInstallPlan {
            find_links: vec!["https://a.example/wheels".to_owned()],
            extra_index_urls: vec!["https://b.example/simple".to_owned()],
            requirements: vec!["numpy==1.19.0".to_owned()],
        };
        assert_eq!(
            plan.render().unwrap(),
            "RUN --mount=type=cache,target=/root/.cache/pip pip install -f https://a.example/wheels  --extra-index-url=https://b.example/simple  numpy==1.19.0"
        );
    }

    #[test]
    fn variant_table_names_are_unique() {
        for (i, a) in CPU_VARIANTS.iter().enumerate() {
            for b in &CPU_VARIANTS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
