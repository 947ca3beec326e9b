//! One-level directory expansion.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The immediate entries of `dir`, sorted by path.
///
/// Sub-directories are returned as entries, not entered; whoever consumes the
/// list decides what to do with them.
pub fn immediate_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = std::fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    children.sort();
    Ok(children)
}
