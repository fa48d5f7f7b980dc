//! Loading every file of a chained dataset.
//!
//! Starting from any member, the walk follows `files.prev` back to the first
//! file and `files.next` on to the last, reading each through a
//! [`DatasetIo`]. Errors from resolution or reading end the walk; nothing is
//! skipped.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::chain::{next_file, previous_file};
use crate::codec::WconCodec;
use crate::config::ChainConfig;
use crate::dataset_io::{DatasetIo, strip_zip_suffix};
use crate::document::Document;
use crate::error::{Result, WconError};

/// One file of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub path: PathBuf,
    pub document: Document,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn adjacent(self, path: &Path, document: &Document) -> Result<Option<PathBuf>> {
        match self {
            Direction::Previous => previous_file(path, document),
            Direction::Next => next_file(path, document),
        }
    }
}

/// The path fragment resolution runs against: `path` with a trailing `.zip`
/// removed from its file name.
fn resolution_path(path: &Path) -> PathBuf {
    match path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(strip_zip_suffix)
    {
        Some(stem) if !stem.is_empty() => path.with_file_name(stem),
        _ => path.to_path_buf(),
    }
}

/// Where a resolved sibling actually lives: the path itself, or its `.zip`
/// variant when only that exists.
fn locate(sibling: PathBuf) -> PathBuf {
    if sibling.exists() {
        return sibling;
    }
    let mut zipped = OsString::from(sibling.as_os_str());
    zipped.push(".zip");
    let zipped = PathBuf::from(zipped);
    if zipped.exists() { zipped } else { sibling }
}

fn walk<C: WconCodec>(
    io: &DatasetIo<C>,
    start: &ChainLink,
    direction: Direction,
    limit: usize,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<ChainLink>,
) -> Result<()> {
    loop {
        let current = out.last().unwrap_or(start);
        let Some(sibling) = direction.adjacent(&resolution_path(&current.path), &current.document)?
        else {
            return Ok(());
        };
        let sibling = locate(sibling);

        if !visited.insert(sibling.clone()) {
            return Err(WconError::Chain(format!(
                "chain loops back to {}",
                sibling.display()
            )));
        }
        if visited.len() > limit {
            return Err(WconError::Chain(format!(
                "chain starting at {} has more than {} files",
                start.path.display(),
                limit
            )));
        }

        let document = io.read_dataset(&sibling)?;
        out.push(ChainLink {
            path: sibling,
            document,
        });
    }
}

/// Load the chain `path` belongs to, ordered from its first file to its last.
///
/// Which directions are followed, and how many files may be visited, comes
/// from `config`. A document without `files` links is a chain of one.
pub fn load_chain<C: WconCodec>(
    io: &DatasetIo<C>,
    path: &Path,
    config: &ChainConfig,
) -> Result<Vec<ChainLink>> {
    let limit = config.file_limit();
    let start = ChainLink {
        path: path.to_path_buf(),
        document: io.read_dataset(path)?,
    };
    let mut visited = HashSet::from([start.path.clone()]);

    let mut earlier = Vec::new();
    if config.load_previous {
        walk(io, &start, Direction::Previous, limit, &mut visited, &mut earlier)?;
    }
    let mut later = Vec::new();
    if config.load_next {
        walk(io, &start, Direction::Next, limit, &mut visited, &mut later)?;
    }

    earlier.reverse();
    earlier.push(start);
    earlier.extend(later);
    debug!("loaded {} file(s) of the chain at {}", earlier.len(), path.display());
    Ok(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolution_path_strips_zip() {
        assert_eq!(
            resolution_path(Path::new("/d/run_2.wcon.zip")),
            PathBuf::from("/d/run_2.wcon")
        );
        assert_eq!(
            resolution_path(Path::new("/d/run_2.wcon")),
            PathBuf::from("/d/run_2.wcon")
        );
        assert_eq!(resolution_path(Path::new("/d/.zip")), PathBuf::from("/d/.zip"));
    }

    #[test]
    fn test_locate_prefers_plain_then_zip() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("run_2.wcon");
        let zipped = dir.path().join("run_2.wcon.zip");

        assert_eq!(locate(plain.clone()), plain);

        std::fs::write(&zipped, b"").unwrap();
        assert_eq!(locate(plain.clone()), zipped);

        std::fs::write(&plain, b"").unwrap();
        assert_eq!(locate(plain.clone()), plain);
    }
}
