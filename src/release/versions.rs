use anyhow::Result;
use regex::Regex;

use crate::error::InstallError;

/// Published easy-make versions in release order
///
/// The last entry is the latest release. The list is never empty and
/// never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    versions: Vec<String>,
}

impl SupportedVersions {
    /// Build the list, validating every entry as `major.minor.patch`
    pub fn new<I, S>(versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Regex::new(r"^\d+\.\d+\.\d+$")?;
        let versions: Vec<String> = versions.into_iter().map(Into::into).collect();

        if versions.is_empty() {
            anyhow::bail!("Supported version list must not be empty");
        }

        for (i, version) in versions.iter().enumerate() {
            if !pattern.is_match(version) {
                anyhow::bail!(
                    "Invalid version '{}'. Expected the form major.minor.patch (e.g., '1.2.0')",
                    version
                );
            }
            if versions[..i].contains(version) {
                anyhow::bail!("Version '{}' is listed more than once", version);
            }
        }

        Ok(Self { versions })
    }

    /// The latest published version
    pub fn latest(&self) -> &str {
        // Non-empty by construction
        &self.versions[self.versions.len() - 1]
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Versions from newest to oldest
    pub fn iter_latest_first(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().rev().map(String::as_str)
    }

    /// Pick the version to install from the positional arguments
    ///
    /// No argument selects the latest release; one argument must name a
    /// published version; more than one is a usage error.
    pub fn select(&self, args: &[String]) -> Result<String, InstallError> {
        match args {
            [] => Ok(self.latest().to_string()),
            [requested] if self.contains(requested) => Ok(requested.clone()),
            [requested] => Err(InstallError::InvalidVersion {
                requested: requested.clone(),
                supported: self.iter_latest_first().map(str::to_string).collect(),
            }),
            _ => Err(InstallError::Usage { count: args.len() }),
        }
    }
}
