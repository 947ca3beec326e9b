//! Atomic file replacement.

use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Replace the contents of `path` without ever exposing a partial file.
///
/// The data goes to a temporary sibling carrying `permissions`, is flushed
/// and synced, then renamed over `path`. If any step fails the temporary file
/// is removed and `path` is left as it was.
pub fn atomic_write(path: &Path, contents: &[u8], permissions: Permissions) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let io_err = |e: std::io::Error| Error::io(path, e);

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;

    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
