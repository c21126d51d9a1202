use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::release::defaults;
use crate::release::{Platform, ReleaseSource, SupportedPlatforms, SupportedVersions};

/// Overrides the install directory
pub const INSTALL_DIR_ENV: &str = "EASY_MAKE_INSTALL_DIR";

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "EASY_MAKE_CONFIG";

/// Everything a run needs, fixed at startup
///
/// Built once from the release defaults, the optional installer.toml and
/// the environment, then passed by reference to each stage.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub versions: SupportedVersions,
    pub platforms: SupportedPlatforms,
    pub release: ReleaseSource,
    pub install_dir: PathBuf,
    pub executable_name: String,
    /// Where downloads are staged; None means the system temp directory
    pub staging_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl InstallerConfig {
    /// Configuration from the compiled-in release defaults only
    pub fn builtin() -> Result<Self> {
        let versions = SupportedVersions::new(defaults::SUPPORTED_VERSIONS.iter().copied())?;
        let platforms = SupportedPlatforms::new(
            defaults::SUPPORTED_PLATFORMS
                .iter()
                .map(|(os, arch)| Platform::new(os, arch)),
        )?;

        Ok(Self {
            versions,
            platforms,
            release: ReleaseSource::default(),
            install_dir: PathBuf::from(defaults::INSTALL_DIR),
            executable_name: defaults::EXECUTABLE_NAME.to_string(),
            staging_dir: None,
            timeout: Duration::from_secs(defaults::DOWNLOAD_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
        })
    }

    /// Full path of the installed executable
    pub fn target_path(&self) -> PathBuf {
        self.install_dir.join(&self.executable_name)
    }

    fn apply_file(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(dir) = file.install.dir {
            self.install_dir = dir;
        }
        if let Some(dir) = file.install.staging_dir {
            self.staging_dir = Some(dir);
        }
        if let Some(url) = file.network.release_url {
            if url.trim().is_empty() {
                anyhow::bail!("[network] release_url must not be empty");
            }
            self.release = ReleaseSource::new(self.release.product.clone(), url);
        }
        if let Some(secs) = file.network.timeout_secs {
            self.timeout = positive_secs("timeout_secs", secs)?;
        }
        if let Some(secs) = file.network.connect_timeout_secs {
            self.connect_timeout = positive_secs("connect_timeout_secs", secs)?;
        }
        Ok(self)
    }

    fn apply_env(mut self) -> Self {
        if let Some(dir) = env::var_os(INSTALL_DIR_ENV).filter(|v| !v.is_empty()) {
            self.install_dir = PathBuf::from(dir);
        }
        self
    }
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        anyhow::bail!("[network] {} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}

/// On-disk layout of installer.toml
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub install: InstallSection,
    #[serde(default)]
    pub network: NetworkSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    pub dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    pub release_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

/// Default location: <config_dir>/easy-make/installer.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("easy-make").join("installer.toml"))
}

/// Load the installer configuration
///
/// Reads `$EASY_MAKE_CONFIG` if set (the file must exist), otherwise the
/// default location if present, then applies `$EASY_MAKE_INSTALL_DIR`.
pub fn load_config() -> Result<InstallerConfig> {
    let explicit = env::var_os(CONFIG_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let config = match explicit.or_else(|| default_config_path().filter(|p| p.exists())) {
        Some(path) => load_config_from(&path)?,
        None => InstallerConfig::builtin()?,
    };

    Ok(config.apply_env())
}

/// Apply a specific config file on top of the builtin defaults
pub fn load_config_from(path: &Path) -> Result<InstallerConfig> {
    let file = read_config_file(path)?;
    InstallerConfig::builtin()?.apply_file(file)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("could not find config file `{}`", path.display())
        } else {
            anyhow::anyhow!("failed to read `{}`: {}", path.display(), e)
        }
    })?;

    parse_config(&content).with_context(|| format!("failed to parse `{}`", path.display()))
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}
