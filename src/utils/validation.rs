//! Local file validation
//!
//! Checks the local side of a transfer before any connection is opened.

use std::io;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs::{self, File, OpenOptions};

static WRITE_CHECKS: AtomicU64 = AtomicU64::new(0);

/// Opens the file to upload, rejecting directories
pub async fn open_source(path: &Path) -> io::Result<File> {
    let file = File::open(path).await?;
    if file.metadata().await?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is a directory", path.display()),
        ));
    }
    Ok(file)
}

/// Creates and removes an empty file in `dir`. Permission bits alone do not
/// say whether this process may write there.
async fn ensure_writable(dir: &Path) -> io::Result<()> {
    let n = WRITE_CHECKS.fetch_add(1, Ordering::Relaxed);
    let marker = dir.join(format!(".rax-ftp-client-{}-{n}", process::id()));

    let created = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
        .await;
    match created {
        Ok(file) => {
            drop(file);
            fs::remove_file(&marker).await
        }
        Err(e) => Err(io::Error::new(
            e.kind(),
            format!("{} is not writable: {e}", dir.display()),
        )),
    }
}

/// Ensures a download can be written to `path`: the parent directory must
/// exist and be writable, and `path` itself must not be a directory.
pub async fn check_destination(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let parent_meta = fs::metadata(parent).await?;
    if !parent_meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", parent.display()),
        ));
    }
    ensure_writable(parent).await?;

    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is a directory", path.display()),
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
