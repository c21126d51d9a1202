use std::process::Command;

use tempfile::TempDir;

const MALFORMED_CONFIG: &str = "[network]\ntimeout_secs = \"soon\"\n";

/// Run the installer binary with an isolated config and install directory
fn installer(args: &[&str]) -> (i32, String) {
    installer_with_config(args, "")
}

fn installer_with_config(args: &[&str], config: &str) -> (i32, String) {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("installer.toml");
    std::fs::write(&config_path, config).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_install-easy-make"))
        .args(args)
        .env("EASY_MAKE_CONFIG", &config_path)
        .env("EASY_MAKE_INSTALL_DIR", temp.path())
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run installer binary");

    let code = output.status.code().unwrap_or(-1);
    (code, String::from_utf8_lossy(&output.stdout).to_string())
}

#[test]
fn test_too_many_arguments() {
    let (code, stdout) = installer(&["1.1.0", "1.2.0"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("Too many arguments: Expected at most 1, but got 2."));
    assert!(!stdout.contains("Downloading"));
}

#[test]
fn test_invalid_version_lists_supported() {
    let (code, stdout) = installer(&["0.0.1"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("Version 0.0.1 is invalid."));

    let latest = stdout.find("* 1.2.0 (latest)").expect("latest entry missing");
    let middle = stdout.find("* 1.1.0").expect("1.1.0 missing");
    let oldest = stdout.find("* 1.0.0").expect("1.0.0 missing");
    assert!(latest < middle && middle < oldest);
    assert!(stdout.contains("Not specifying a version selects the latest one."));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let (code, stdout) = installer(&["--force"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("--force"));
    assert!(stdout.contains("Usage: install-easy-make [VERSION]"));
}

#[test]
fn test_malformed_config_fails_startup() {
    let (code, stdout) = installer_with_config(&[], MALFORMED_CONFIG);
    assert_eq!(code, 1);
    assert!(stdout.contains("failed to parse"));
}

#[test]
fn test_argument_errors_win_over_malformed_config() {
    let (code, stdout) = installer_with_config(&["1.1.0", "1.2.0"], MALFORMED_CONFIG);
    assert_eq!(code, 1);
    assert!(stdout.contains("Too many arguments: Expected at most 1, but got 2."));
    assert!(!stdout.contains("failed to parse"));

    let (code, stdout) = installer_with_config(&["9.9.9"], MALFORMED_CONFIG);
    assert_eq!(code, 1);
    assert!(stdout.contains("Version 9.9.9 is invalid."));
    assert!(stdout.contains("* 1.2.0 (latest)"));
    assert!(!stdout.contains("failed to parse"));
}
