//! Filesystem helpers shared by the store, ledger, index and journal

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Create `path` (and parents) if it does not exist
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)
}

/// Replace the contents of `path` with `bytes`.
///
/// Truncate-and-write, not rename: a crash mid-write can leave a short
/// file. With `sync` the data is fsynced before returning.
pub fn write_file(path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Replace `path` with `bytes` so that readers see either the old or the
/// new contents, never a prefix.
///
/// The bytes go to `<path>.tmp` first, which is then renamed over `path`.
/// With `sync` the temp file and the parent directory are fsynced.
pub fn write_atomic(path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    write_file(&temp_path, bytes, sync)?;
    fs::rename(&temp_path, path)?;

    if sync {
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }
    Ok(())
}

/// Sibling temp file used by `write_atomic`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Append `bytes` to `path`, creating it if needed
pub fn append_file(path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

/// Remove a file; absent files are not an error
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
