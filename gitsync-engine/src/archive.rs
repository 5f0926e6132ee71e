//! Failure log archive.
//!
//! Keeps the transcript of each failed attempt as `<log_dir>/<repo>.log`.
//! Older copies shift down the scheme:
//!   demo.log → demo.log.1 → demo.log.2 → … → demo.log.5

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum number of rotated copies kept per repository.
pub const MAX_ARCHIVED_LOGS: usize = 5;

/// Write `contents` to `<log_dir>/<repository>.log`, rotating older copies.
///
/// Creates `log_dir` if needed. Returns the path written.
pub fn archive_log(
    log_dir: &Path,
    repository: &str,
    contents: &str,
    max_files: usize,
) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!("{repository}.log"));

    if path.exists() {
        rotate(&path, max_files)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

fn rotate(path: &Path, max_files: usize) -> io::Result<()> {
    if max_files == 0 {
        return fs::remove_file(path);
    }

    let oldest = numbered_path(path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let src = numbered_path(path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(path, n + 1))?;
        }
    }
    fs::rename(path, numbered_path(path, 1))
}

/// `demo.log` + 2 → `demo.log.2`
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{name}.{n}"))
}
