/// Release constants for the easy-make installer
///
/// These are updated with each easy-make release. Everything here is
/// copied into an `InstallerConfig` at startup; nothing reads these
/// constants directly during a run.

/// Product name, used as the artifact filename prefix
pub const PRODUCT: &str = "easy-make";

/// Published versions in release order (last entry is the latest)
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0.0", "1.1.0", "1.2.0"];

/// Platforms with a published prebuilt binary, as (os, architecture)
pub const SUPPORTED_PLATFORMS: &[(&str, &str)] = &[("linux", "x86-64")];

/// Base URL of the GitHub release downloads
///
/// Artifacts live at `{RELEASE_BASE_URL}/v{version}/{filename}`
pub const RELEASE_BASE_URL: &str = "https://github.com/idanhalp/easy-make/releases/download";

/// System-wide install directory
pub const INSTALL_DIR: &str = "/usr/local/bin";

/// Name of the installed executable inside the install directory
pub const EXECUTABLE_NAME: &str = "easy-make";

/// Overall request timeout for the artifact download
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Timeout for establishing the connection to the release host
pub const CONNECT_TIMEOUT_SECS: u64 = 30;
