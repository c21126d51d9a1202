use colored::Colorize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, PersistError};

use super::{InterruptGuard, TemporaryArtifact};
use crate::error::InstallError;

/// Mode applied to the installed executable (rwxr-xr-x)
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Progress of a single install
///
/// Failures carry the last stage that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Pending,
    PermissionsSet,
    Moved,
}

impl std::fmt::Display for InstallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstallStage::Pending => "before setting permissions",
            InstallStage::PermissionsSet => "while moving into place",
            InstallStage::Moved => "after moving into place",
        };
        f.write_str(name)
    }
}

/// Replaces the target path with a prepared temporary file
///
/// On failure the temporary file is handed back inside the error so the
/// caller decides how to dispose of it. Any extra temporary file created
/// on the way is registered with `guard` for as long as it exists.
pub trait Swap {
    fn swap(
        &self,
        file: NamedTempFile,
        target: &Path,
        guard: &InterruptGuard,
    ) -> Result<(), PersistError>;
}

/// Rename-based replacement
///
/// Same filesystem: one atomic rename. Across filesystems the artifact is
/// first copied into a sibling temporary file of the target, which is then
/// renamed into place. The live target is never written in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicSwap;

impl Swap for AtomicSwap {
    fn swap(
        &self,
        file: NamedTempFile,
        target: &Path,
        guard: &InterruptGuard,
    ) -> Result<(), PersistError> {
        match file.persist(target) {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_rename(err.file, target, guard)
            }
            Err(err) => Err(err),
        }
    }
}

fn copy_then_rename(
    file: NamedTempFile,
    target: &Path,
    guard: &InterruptGuard,
) -> Result<(), PersistError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staged = match stage_beside(file.path(), dir, guard) {
        Ok(staged) => staged,
        Err(error) => return Err(PersistError { error, file }),
    };

    let staged_path = staged.path().to_path_buf();
    let persisted = staged.persist(target);
    guard.release(&staged_path);

    match persisted {
        Ok(_) => {
            // The copy is in place; drop the download
            discard(file);
            Ok(())
        }
        Err(err) => Err(PersistError {
            error: err.error,
            file,
        }),
    }
}

/// Copy `source` into a new executable temporary file inside `dir`
///
/// The staged file is tracked by `guard` from the moment it exists.
fn stage_beside(source: &Path, dir: &Path, guard: &InterruptGuard) -> io::Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(".easy-make-")
        .suffix(".part")
        .tempfile_in(dir)?;
    guard.track(staged.path());

    if let Err(e) = fill(source, &mut staged) {
        guard.release(staged.path());
        return Err(e);
    }

    Ok(staged)
}

fn fill(source: &Path, staged: &mut NamedTempFile) -> io::Result<()> {
    let mut reader = File::open(source)?;
    io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    make_executable(staged.path())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Moves downloaded artifacts into the install location
pub struct Installer {
    target: PathBuf,
    swap: Box<dyn Swap>,
    guard: InterruptGuard,
}

impl Installer {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            swap: Box::new(AtomicSwap),
            guard: InterruptGuard::new(),
        }
    }

    /// Use a different replacement strategy for the final move
    pub fn with_swap(mut self, swap: impl Swap + 'static) -> Self {
        self.swap = Box::new(swap);
        self
    }

    pub fn with_interrupt_guard(mut self, guard: InterruptGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Make the artifact executable and move it onto the target path
    ///
    /// Either the target is fully replaced, or it is left as it was and the
    /// temporary file is deleted.
    pub fn install(&self, artifact: TemporaryArtifact) -> Result<PathBuf, InstallError> {
        let file = artifact.into_temp_file();
        let download = file.path().to_path_buf();
        let result = self.place(file);
        self.guard.release(&download);

        result.map(|()| self.target.clone())
    }

    fn place(&self, file: NamedTempFile) -> Result<(), InstallError> {
        // Pending -> PermissionsSet
        if let Err(e) = make_executable(file.path()) {
            discard(file);
            return Err(InstallError::from_install_io(
                self.target.clone(),
                InstallStage::Pending,
                e,
            ));
        }

        // PermissionsSet -> Moved
        match self.swap.swap(file, &self.target, &self.guard) {
            Ok(()) => Ok(()),
            Err(PersistError { error, file }) => {
                discard(file);
                Err(InstallError::from_install_io(
                    self.target.clone(),
                    InstallStage::PermissionsSet,
                    error,
                ))
            }
        }
    }
}

/// Delete a temporary file that will not be installed
fn discard(file: NamedTempFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        println!(
            "{} could not remove temporary file {}: {}",
            "warning:".yellow().bold(),
            path.display(),
            e
        );
    }
}
