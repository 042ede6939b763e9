use std::fmt;
use std::str::FromStr;

/// A Python package from `build.python_packages`, either bare or pinned.
///
/// # Examples
///
/// ```
/// use cog_core::PythonPackage;
///
/// let pkg: PythonPackage = "torch==1.5.1".parse().unwrap();
/// assert_eq!(pkg.name, "torch");
/// assert_eq!(pkg.version.as_deref(), Some("1.5.1"));
/// assert_eq!(pkg.to_string(), "torch==1.5.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonPackage {
    pub name: String,
    /// Exact version from a `==` pin
    pub version: Option<String>,
}

impl PythonPackage {
    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    pub fn unpinned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

impl fmt::Display for PythonPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}=={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for PythonPackage {
    type Err = crate::Error;

    fn from_str(spec: &str) -> crate::Result<Self> {
        let invalid = |reason| crate::Error::InvalidPackage {
            spec: spec.to_owned(),
            reason,
        };

        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(invalid("package specification is empty"));
        }

        let (name, version) = match trimmed.split_once("==") {
            Some((name, version)) => (name.trim(), Some(version.trim())),
            None => (trimmed, None),
        };

        if name.is_empty() {
            return Err(invalid("package name is empty"));
        }
        if !name.chars().all(is_name_char) {
            return Err(invalid(
                "only `name` or `name==version` is supported; use python_requirements for other constraints",
            ));
        }

        match version {
            Some("") => Err(invalid("version after `==` is empty")),
            Some(v) if !v.chars().all(is_version_char) => {
                Err(invalid("version contains unexpected characters"))
            }
            Some(v) => Ok(Self::pinned(name, v)),
            None => Ok(Self::unpinned(name)),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_' | '!')
}
