use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{InstallerConfig, INSTALL_DIR_ENV};
use crate::error::InstallError;
use crate::release::{Fetcher, Installer, InterruptGuard, Platform};

/// Validate the positional arguments against the built-in release list
///
/// The version list cannot be changed by the config file, so this runs
/// before the file is read and a bad invocation is never masked by a
/// config error.
pub fn check_arguments(args: &[String]) -> Result<()> {
    InstallerConfig::builtin()?.versions.select(args)?;
    Ok(())
}

/// Install the requested easy-make release on this machine
///
/// `args` are the positional command-line arguments: empty for the latest
/// release or a single version string. Pipeline failures are returned as
/// an [`InstallError`] inside the `anyhow::Error`.
pub fn execute(args: &[String], config: &InstallerConfig, guard: &InterruptGuard) -> Result<PathBuf> {
    // Reject bad invocations before building the HTTP client
    let version = config.versions.select(args)?;
    let platform = config.platforms.resolve(Platform::detect())?;

    let fetcher = Fetcher::from_config(config)?
        .with_progress(true)
        .with_interrupt_guard(guard.clone());
    let installer = Installer::new(config.target_path()).with_interrupt_guard(guard.clone());

    Ok(run(&version, &platform, config, &fetcher, &installer)?)
}

/// Run the whole pipeline against an explicit host platform
///
/// Version selection and platform resolution both happen before anything
/// touches the network or the filesystem.
pub fn execute_with(
    args: &[String],
    config: &InstallerConfig,
    host: Platform,
    fetcher: &Fetcher,
    installer: &Installer,
) -> Result<PathBuf, InstallError> {
    let version = config.versions.select(args)?;
    let platform = config.platforms.resolve(host)?;

    run(&version, &platform, config, fetcher, installer)
}

fn run(
    version: &str,
    platform: &Platform,
    config: &InstallerConfig,
    fetcher: &Fetcher,
    installer: &Installer,
) -> Result<PathBuf, InstallError> {
    let artifact = config.release.locate(version, platform);

    println!("Downloading {}...", artifact.filename);
    println!("URL: {}", artifact.url);

    let downloaded = fetcher.fetch(&artifact)?;
    println!("Downloaded {} bytes.", downloaded.size());
    let location = installer.install(downloaded)?;

    println!("{} installed successfully!", config.release.product);
    println!("Location: {}", location.display());
    println!(
        "Run `{} --version` to verify the installation.",
        config.executable_name
    );

    Ok(location)
}

/// Print an operator-facing description of a failed run
pub fn report(error: &InstallError) {
    for line in render_error(error) {
        println!("{}", line);
    }
}

/// The lines printed by [`report`], error prefix included
pub fn render_error(error: &InstallError) -> Vec<String> {
    let mut lines = vec![format!("{} {}", "Error:".red().bold(), error.to_string().red())];

    match error {
        InstallError::InvalidVersion { supported, .. } => {
            lines.push("Valid versions are:".to_string());
            for (index, version) in supported.iter().enumerate() {
                if index == 0 {
                    lines.push(format!("* {} (latest)", version));
                } else {
                    lines.push(format!("* {}", version));
                }
            }
            lines.push("Not specifying a version selects the latest one.".to_string());
        }
        InstallError::UnsupportedPlatform { detected, supported } => {
            lines.push(format!("Current OS is {}.", detected.os()));
            lines.push(format!("Current architecture is {}.", detected.arch()));
            lines.push("Supported platforms are:".to_string());
            for platform in supported {
                lines.push(format!(
                    "* OS: {}, architecture: {}",
                    platform.os(),
                    platform.arch()
                ));
            }
        }
        InstallError::NotFound { .. } => {
            lines.push(format!(
                "{} No prebuilt binary is published for this version and platform.",
                "info:".cyan()
            ));
        }
        InstallError::Permission { path, .. } => {
            let installer_name = std::env::args()
                .next()
                .unwrap_or_else(|| "install-easy-make".to_string());
            let install_dir = path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default();

            lines.push("Try the following methods to solve the problem:".to_string());
            lines.push(format!(
                "1. Run the installer with sudo: `sudo {} <version>`.",
                installer_name
            ));
            lines.push(format!(
                "2. Change the installer's permissions: `chmod +x {}`.",
                installer_name
            ));
            lines.push(format!(
                "3. Install somewhere writable instead of {}: `{}=$HOME/.local/bin {}`.",
                install_dir, INSTALL_DIR_ENV, installer_name
            ));
        }
        InstallError::Usage { .. }
        | InstallError::Network { .. }
        | InstallError::Http { .. }
        | InstallError::Staging { .. }
        | InstallError::Install { .. } => {}
    }

    if error.is_retryable() {
        lines.push(format!(
            "{} Check your connection and run the installer again.",
            "info:".cyan()
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::InstallStage;

    #[test]
    fn test_check_arguments_uses_builtin_versions() {
        let args = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        assert!(check_arguments(&args(&[])).is_ok());
        assert!(check_arguments(&args(&["1.0.0"])).is_ok());

        let err = check_arguments(&args(&["1.1.0", "1.2.0"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::Usage { count: 2 })
        ));

        let err = check_arguments(&args(&["9.9.9"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_invalid_version_rendering() {
        colored::control::set_override(false);
        let error = InstallError::InvalidVersion {
            requested: "9.9.9".to_string(),
            supported: vec!["1.2.0".into(), "1.1.0".into(), "1.0.0".into()],
        };
        let lines = render_error(&error);

        assert_eq!(
            lines,
            vec![
                "Error: Version 9.9.9 is invalid.",
                "Valid versions are:",
                "* 1.2.0 (latest)",
                "* 1.1.0",
                "* 1.0.0",
                "Not specifying a version selects the latest one.",
            ]
        );
    }

    #[test]
    fn test_unsupported_platform_rendering() {
        colored::control::set_override(false);
        let error = InstallError::UnsupportedPlatform {
            detected: Platform::new("darwin", "arm64"),
            supported: vec![Platform::new("linux", "x86-64")],
        };
        let lines = render_error(&error);

        assert!(lines.contains(&"Current OS is darwin.".to_string()));
        assert!(lines.contains(&"Current architecture is arm64.".to_string()));
        assert!(lines.contains(&"* OS: linux, architecture: x86-64".to_string()));
    }

    #[test]
    fn test_network_rendering_suggests_retry() {
        colored::control::set_override(false);
        let error = InstallError::Network {
            url: "https://example.com/easy-make".to_string(),
            source: "connection reset".into(),
        };
        let lines = render_error(&error);

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("run the installer again"));

        let error = InstallError::NotFound {
            url: "https://example.com/easy-make".to_string(),
        };
        assert!(!render_error(&error)
            .iter()
            .any(|l| l.contains("run the installer again")));
    }

    #[test]
    fn test_permission_rendering_has_remediation() {
        colored::control::set_override(false);
        let error = InstallError::Permission {
            path: PathBuf::from("/usr/local/bin/easy-make"),
            stage: InstallStage::PermissionsSet,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let lines = render_error(&error);

        assert!(lines[0].starts_with("Error: Permission denied"));
        assert!(lines.iter().any(|l| l.contains("sudo")));
        assert!(lines.iter().any(|l| l.contains("chmod +x")));
        assert!(lines.iter().any(|l| l.contains(INSTALL_DIR_ENV)));
    }
}
