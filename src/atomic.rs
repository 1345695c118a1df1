//! Atomic whole-file writes
//!
//! Data is written to a temporary file created next to the target, then
//! renamed over it. Readers see either the old content or the new content,
//! never a partial write. If the write scope ends without a commit the
//! temporary file is removed and the target is left alone.
//!
//! ```rust,ignore
//! use linestore::atomic::write_atomic;
//! use std::io::Write;
//!
//! write_atomic("data/history", |f| f.write_all(b"one\ntwo"))?;
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Scoped write handle for an atomic replace of `target`
///
/// Dropping the handle without calling [`AtomicFile::commit`] discards
/// everything written so far.
#[derive(Debug)]
pub struct AtomicFile {
    target: PathBuf,
    temp: NamedTempFile,
}

impl AtomicFile {
    /// Create the parent directory if needed and open a temp file beside `path`
    ///
    /// The temp file takes the target's permissions when it exists, otherwise
    /// the usual `0666` minus umask on Unix.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let target = path.as_ref().to_path_buf();
        let parent = parent_dir(&target);
        ensure_dir(parent)?;

        let prefix = temp_prefix(&target);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(parent)?;

        match fs::metadata(&target) {
            Ok(meta) => temp.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        debug!(target = %target.display(), temp = %temp.path().display(), "Opened atomic write");
        Ok(Self { target, temp })
    }

    /// Path that will be replaced on commit
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush, fsync and rename the temp file over the target
    pub fn commit(mut self) -> io::Result<()> {
        self.temp.flush()?;
        self.temp.as_file().sync_all()?;

        let target = self.target;
        self.temp.persist(&target).map_err(|e| e.error)?;

        #[cfg(unix)]
        if let Ok(dir) = fs::File::open(parent_dir(&target)) {
            let _ = dir.sync_all();
        }

        debug!(target = %target.display(), "Committed atomic write");
        Ok(())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp.flush()
    }
}

/// Run `f` against a fresh [`AtomicFile`] and commit only if it succeeds
pub fn write_atomic<P, F>(path: P, f: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut AtomicFile) -> io::Result<()>,
{
    let mut file = AtomicFile::open(path)?;
    f(&mut file)?;
    file.commit()
}

/// Recursively create `dir` (mode 0755 on Unix) if it is missing
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn temp_prefix(target: &Path) -> String {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "linestore".to_string());
    format!(".{name}.")
}
