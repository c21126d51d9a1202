use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::release::{InstallStage, Platform};

/// Every way a single installer run can fail
///
/// Each variant carries what the operator needs to fix the problem; the
/// command layer pattern-matches on it to print the full diagnostics.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Bad invocation shape
    #[error("Too many arguments: Expected at most 1, but got {count}.")]
    Usage { count: usize },

    /// Requested version is not a published release
    #[error("Version {requested} is invalid.")]
    InvalidVersion {
        requested: String,
        /// Supported versions, latest first
        supported: Vec<String>,
    },

    /// Host is not in the supported platform set
    #[error("Current platform is unsupported.")]
    UnsupportedPlatform {
        detected: Platform,
        supported: Vec<Platform>,
    },

    /// Transport-level failure: DNS, refused connection, timeout, broken body
    #[error("Network error while downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server has no artifact for this version/platform combination
    #[error("Download failed: {url} was not found (HTTP 404)")]
    NotFound { url: String },

    /// Server answered with any other failure status
    #[error("Download failed with status {status}: {url}")]
    Http { url: String, status: u16 },

    /// The temporary download file could not be created or written
    #[error("Failed to write temporary download file: {source}")]
    Staging {
        #[source]
        source: io::Error,
    },

    /// Not allowed to write the install location
    #[error("Permission denied while installing to {}", .path.display())]
    Permission {
        path: PathBuf,
        stage: InstallStage,
        #[source]
        source: io::Error,
    },

    /// Any other failure while placing the executable
    #[error("Installation failed ({stage}) for {}: {source}", .path.display())]
    Install {
        path: PathBuf,
        stage: InstallStage,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    /// Whether re-running the same command may succeed without changes
    pub fn is_retryable(&self) -> bool {
        matches!(self, InstallError::Network { .. })
    }

    /// Classify an I/O error from the install step
    pub(crate) fn from_install_io(path: PathBuf, stage: InstallStage, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            InstallError::Permission { path, stage, source }
        } else {
            InstallError::Install { path, stage, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_message() {
        let err = InstallError::Usage { count: 3 };
        assert_eq!(err.to_string(), "Too many arguments: Expected at most 1, but got 3.");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_install_io_classification() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let err = InstallError::from_install_io(
            PathBuf::from("/usr/local/bin/easy-make"),
            InstallStage::PermissionsSet,
            denied,
        );
        assert!(matches!(err, InstallError::Permission { .. }));

        let missing = io::Error::from(io::ErrorKind::NotFound);
        let err = InstallError::from_install_io(
            PathBuf::from("/nowhere/easy-make"),
            InstallStage::PermissionsSet,
            missing,
        );
        assert!(matches!(err, InstallError::Install { .. }));
        assert!(err.to_string().contains("/nowhere/easy-make"));
    }

    #[test]
    fn test_http_errors_are_not_retryable() {
        let err = InstallError::NotFound {
            url: "https://example.com/a".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("404"));

        let err = InstallError::Http {
            url: "https://example.com/a".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
    }
}
