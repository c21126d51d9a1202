mod artifact;
pub mod defaults;
mod downloader;
mod installer;
mod interrupt;
mod platform;
mod versions;

pub use artifact::{locate, ArtifactReference, ReleaseSource};
pub use downloader::{Fetcher, TemporaryArtifact};
pub use installer::{AtomicSwap, InstallStage, Installer, Swap, EXECUTABLE_MODE};
pub use interrupt::{InterruptGuard, INTERRUPTED_EXIT_CODE};
pub use platform::{Platform, SupportedPlatforms};
pub use versions::SupportedVersions;
