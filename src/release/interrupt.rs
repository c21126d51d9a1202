use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Exit status used when the operator interrupts a run (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Tracks the temporary files that are currently on disk
///
/// Destructors do not run when the process is killed by Ctrl-C, so the
/// interrupt handler removes the tracked files itself. Both the download
/// and the copy staged next to the target (cross-device installs) are
/// tracked. The install target is only ever replaced by rename, so an
/// interrupt never leaves a partial executable there.
#[derive(Debug, Clone, Default)]
pub struct InterruptGuard {
    pending: Arc<Mutex<Vec<PathBuf>>>,
}

impl InterruptGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the Ctrl-C handler for this process
    ///
    /// Can only be called once per process.
    pub fn install_handler(&self) -> Result<()> {
        let guard = self.clone();
        ctrlc::set_handler(move || {
            println!();
            for path in guard.cleanup() {
                println!("Removed {}", path.display());
            }
            println!("{} Installation interrupted.", "Error:".red().bold());
            std::process::exit(INTERRUPTED_EXIT_CODE);
        })
        .context("Failed to register interrupt handler")
    }

    pub fn track(&self, path: &Path) {
        let mut pending = self.lock();
        if !pending.iter().any(|p| p == path) {
            pending.push(path.to_path_buf());
        }
    }

    /// Stop tracking `path`; the file was consumed or already removed
    pub fn release(&self, path: &Path) {
        self.lock().retain(|p| p != path);
    }

    /// Remove every tracked file
    ///
    /// Returns the paths that were actually deleted.
    pub fn cleanup(&self) -> Vec<PathBuf> {
        let pending = std::mem::take(&mut *self.lock());
        pending
            .into_iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        // The tracked paths stay valid even if a holder panicked
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
