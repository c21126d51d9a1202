use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use super::{ArtifactReference, InterruptGuard};
use crate::config::InstallerConfig;
use crate::error::InstallError;

const CHUNK_SIZE: usize = 8192;

/// A downloaded artifact waiting to be installed
///
/// The file is removed when this value is dropped, so it can only outlive
/// the run by being moved into place by the installer.
#[derive(Debug)]
pub struct TemporaryArtifact {
    file: NamedTempFile,
    bytes: u64,
}

impl TemporaryArtifact {
    /// Number of bytes written
    pub fn size(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn into_temp_file(self) -> NamedTempFile {
        self.file
    }

    #[cfg(test)]
    pub(crate) fn from_temp_file(file: NamedTempFile) -> Self {
        let bytes = file.as_file().metadata().map(|m| m.len()).unwrap_or(0);
        Self { file, bytes }
    }
}

/// Downloads release artifacts over HTTP(S)
pub struct Fetcher {
    client: Client,
    staging_dir: Option<PathBuf>,
    show_progress: bool,
    guard: Option<InterruptGuard>,
}

impl Fetcher {
    /// Create a fetcher with the given overall and connect timeouts
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("install-easy-make/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            staging_dir: None,
            show_progress: false,
            guard: None,
        })
    }

    /// Create a fetcher using the configured timeouts and staging directory
    pub fn from_config(config: &InstallerConfig) -> Result<Self> {
        let fetcher = Self::new(config.timeout, config.connect_timeout)?;
        Ok(match &config.staging_dir {
            Some(dir) => fetcher.with_staging_dir(dir),
            None => fetcher,
        })
    }

    /// Put temporary downloads in `dir` instead of the system temp directory
    pub fn with_staging_dir(mut self, dir: &Path) -> Self {
        self.staging_dir = Some(dir.to_path_buf());
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_interrupt_guard(mut self, guard: InterruptGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Download the artifact into a fresh temporary file
    ///
    /// The body is streamed in chunks. On failure the partial file is
    /// removed before returning.
    pub fn fetch(&self, artifact: &ArtifactReference) -> Result<TemporaryArtifact, InstallError> {
        let url = &artifact.url;

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| InstallError::Network {
                url: url.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InstallError::NotFound { url: url.clone() });
        }
        if !status.is_success() {
            return Err(InstallError::Http {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = self.create_temp_file(&artifact.filename)?;
        if let Some(guard) = &self.guard {
            guard.track(file.path());
        }

        let pb = self.progress_bar(&artifact.filename, total_size);
        let result = stream_body(response, file.as_file_mut(), &pb, url);
        pb.finish_and_clear();

        match result {
            Ok(bytes) => Ok(TemporaryArtifact { file, bytes }),
            Err(e) => {
                if let Some(guard) = &self.guard {
                    guard.release(file.path());
                }
                if let Err(close_err) = file.close() {
                    println!(
                        "{} could not remove partial download: {}",
                        "warning:".yellow().bold(),
                        close_err
                    );
                }
                Err(e)
            }
        }
    }

    fn create_temp_file(&self, filename: &str) -> Result<NamedTempFile, InstallError> {
        let prefix = format!(".{}-", filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".part");

        let created = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        created.map_err(|source| InstallError::Staging { source })
    }

    fn progress_bar(&self, filename: &str, total_size: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{msg:20} [{bar:40}] {bytes:>10}/{total_bytes:>10}")
            {
                pb.set_style(style.progress_chars("=> "));
            }
            pb.set_message(format!("{}", filename.dimmed()));
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_message(format!("{} (unknown size)", filename.dimmed()));
            pb
        }
    }
}

/// Copy the response body into `dest` chunk by chunk
fn stream_body<R: Read, W: Write>(
    mut reader: R,
    dest: &mut W,
    pb: &ProgressBar,
    url: &str,
) -> Result<u64, InstallError> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(InstallError::Network {
                    url: url.to_string(),
                    source: Box::new(e),
                })
            }
        };

        dest.write_all(&buffer[..bytes_read])
            .map_err(|source| InstallError::Staging { source })?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    dest.flush().map_err(|source| InstallError::Staging { source })?;
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
            } else {
                self.sent = true;
                buf[..4].copy_from_slice(b"\x7fELF");
                Ok(4)
            }
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stream_body_copies_everything() {
        let body = vec![7u8; CHUNK_SIZE * 3 + 17];
        let mut dest = Vec::new();
        let bytes = stream_body(&body[..], &mut dest, &ProgressBar::hidden(), "http://x").unwrap();
        assert_eq!(bytes, body.len() as u64);
        assert_eq!(dest, body);
    }

    #[test]
    fn test_read_failure_is_network_error() {
        let mut dest = Vec::new();
        let err = stream_body(
            FailingReader { sent: false },
            &mut dest,
            &ProgressBar::hidden(),
            "http://x/a",
        )
        .unwrap_err();
        assert!(matches!(err, InstallError::Network { ref url, .. } if url == "http://x/a"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_write_failure_is_staging_error() {
        let err = stream_body(&b"data"[..], &mut FullDisk, &ProgressBar::hidden(), "http://x")
            .unwrap_err();
        assert!(matches!(err, InstallError::Staging { .. }));
    }

    #[test]
    fn test_temp_file_lands_in_staging_dir() {
        let staging = tempfile::TempDir::new().unwrap();
        let fetcher = Fetcher::new(Duration::from_secs(5), Duration::from_secs(1))
            .unwrap()
            .with_staging_dir(staging.path());

        let file = fetcher.create_temp_file("easy-make-1.2.0-linux-x86-64").unwrap();
        assert_eq!(file.path().parent(), Some(staging.path()));
        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".easy-make-1.2.0-linux-x86-64-"));
        assert!(name.ends_with(".part"));

        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
    }
}
