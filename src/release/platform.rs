use std::collections::BTreeSet;

use crate::error::InstallError;

/// Canonical (OS, architecture) pair used for support lookups
///
/// Both parts are lowercase and the architecture uses the release naming
/// (`x86-64`, not `x86_64`). The only way to build one is through
/// [`Platform::new`], so comparisons always happen on normalized values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Normalize a raw (os, architecture) pair
    pub fn new(os: &str, arch: &str) -> Self {
        let os = canonical_os(&os.trim().to_lowercase());
        let arch = canonical_arch(&arch.trim().to_lowercase());
        Self { os, arch }
    }

    /// Detect the current platform
    ///
    /// Uses std::env::consts, i.e. the target this binary was compiled for,
    /// not the machine it runs on. Under Rosetta or qemu-user emulation this
    /// reports the binary's architecture rather than the host's.
    pub fn detect() -> Self {
        use std::env::consts::{ARCH, OS};

        Self::new(OS, ARCH)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Map machine-reported architecture tokens onto the release vocabulary
/// Rust calls macOS `macos`; release names use the kernel name
fn canonical_os(os: &str) -> String {
    match os {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

fn canonical_arch(arch: &str) -> String {
    match arch {
        "x86_64" | "amd64" => "x86-64".to_string(),
        other => other.to_string(),
    }
}

/// Platforms that have a published prebuilt binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedPlatforms {
    platforms: BTreeSet<Platform>,
}

impl SupportedPlatforms {
    pub fn new<I>(platforms: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = Platform>,
    {
        let platforms: BTreeSet<Platform> = platforms.into_iter().collect();
        if platforms.is_empty() {
            anyhow::bail!("Supported platform set must not be empty");
        }
        Ok(Self { platforms })
    }

    pub fn contains(&self, platform: &Platform) -> bool {
        self.platforms.contains(platform)
    }

    /// Check the host against the supported set
    pub fn resolve(&self, host: Platform) -> Result<Platform, InstallError> {
        if self.contains(&host) {
            Ok(host)
        } else {
            Err(InstallError::UnsupportedPlatform {
                detected: host,
                supported: self.platforms.iter().cloned().collect(),
            })
        }
    }
}
