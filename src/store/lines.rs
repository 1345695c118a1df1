use std::fs;
use std::io::Write;
use std::ops::Index;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::atomic;

use super::error::{Result, StoreError};
use super::line::{self, Line, Mode};

/// In-memory lines backed by a single file
///
/// The file is read once at construction and rewritten atomically on
/// [`LineStore::save`]. Callers mutate the lines directly in between;
/// nothing is written through.
#[derive(Debug, Clone)]
pub struct LineStore<L> {
    path: PathBuf,
    lines: Vec<L>,
}

impl<L: Line> LineStore<L> {
    /// Load `path`, or start empty if it is not an existing regular file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lines = if path.is_file() {
            debug!("Reading {}", path.display());
            read_lines(&path)?
        } else {
            Vec::new()
        };
        Ok(Self { path, lines })
    }

    /// Open `fname` inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P, fname: &str) -> Result<Self> {
        Self::open(dir.as_ref().join(fname))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        L::MODE
    }

    pub fn lines(&self) -> &[L] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<L> {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.lines.iter()
    }

    /// Atomically rewrite the file with every line
    pub fn save(&self) -> Result<()> {
        write_lines(&self.path, &self.lines)
    }
}

impl<L> Index<usize> for LineStore<L> {
    type Output = L;

    fn index(&self, index: usize) -> &L {
        &self.lines[index]
    }
}

impl<'a, L> IntoIterator for &'a LineStore<L> {
    type Item = &'a L;
    type IntoIter = std::slice::Iter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

fn read_lines<L: Line>(path: &Path) -> Result<Vec<L>> {
    let content = fs::read(path)?;
    line::split(&content)
        .enumerate()
        .map(|(i, raw)| {
            L::from_bytes(raw).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                line: i,
                source,
            })
        })
        .collect()
}

/// Atomically replace `path` with `lines` joined by `\n`
pub(crate) fn write_lines<L: Line>(path: &Path, lines: &[L]) -> Result<()> {
    debug!("Saving to {}", path.display());
    let data = line::join(lines);
    atomic::write_atomic(path, |f| f.write_all(&data))?;
    Ok(())
}
