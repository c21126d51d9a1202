use super::defaults;
use super::Platform;

/// Where release artifacts are published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub product: String,
    /// Base download URL without a trailing slash
    pub base_url: String,
}

/// Download identifier for one version/platform combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    pub filename: String,
    pub url: String,
}

impl ReleaseSource {
    pub fn new(product: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            product: product.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Compose the artifact filename and URL
    ///
    /// Format: {base_url}/v1.2.0/easy-make-1.2.0-linux-x86-64
    pub fn locate(&self, version: &str, platform: &Platform) -> ArtifactReference {
        let filename = format!(
            "{}-{}-{}-{}",
            self.product,
            version,
            platform.os(),
            platform.arch()
        );
        let url = format!("{}/v{}/{}", self.base_url, version, filename);

        ArtifactReference { filename, url }
    }
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self::new(defaults::PRODUCT, defaults::RELEASE_BASE_URL)
    }
}

/// Locate an artifact on the default release host
pub fn locate(version: &str, os: &str, arch: &str) -> ArtifactReference {
    ReleaseSource::default().locate(version, &Platform::new(os, arch))
}
