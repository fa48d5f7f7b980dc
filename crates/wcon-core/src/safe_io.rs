//! Atomic file writes for dataset output.
//!
//! A dataset file is either fully replaced or left as it was. Every write
//! goes through its own uniquely named temp file in the target directory, so
//! concurrent writers to one target never share a temp file; the last rename
//! wins.

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::Builder;

/// Atomically write bytes to a file.
///
/// Creates missing parent directories, writes and fsyncs a temp file
/// (`.<name>.<random>.tmp`) next to `path`, then renames it over `path`.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut prefix = OsString::from(".");
    prefix.push(path.file_name().unwrap_or_else(|| "dataset".as_ref()));
    prefix.push(".");

    let mut tmp = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        writer.write_all(contents)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
