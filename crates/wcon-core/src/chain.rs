//! Sibling file name resolution for chained WCON datasets.
//!
//! Chain members share a file name with a short distinguishing fragment
//! embedded in it (`run_1.wcon`, `run_2.wcon`, ...). Each document records
//! its own fragment under `files.this` and its neighbours' under
//! `files.prev` / `files.next`; a sibling's path is derived by swapping one
//! fragment for the other. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::Document;
use crate::error::{Result, WconError};

/// Canonical WCON file extension.
pub const WCON_EXTENSION: &str = ".wcon";

/// Number of trailing characters compared against [`WCON_EXTENSION`].
///
/// Fixed width, not real extension parsing: paths shorter than this compare
/// as a whole.
const EXTENSION_WIDTH: usize = 5;

const MISMATCH_MESSAGE: &str = "Mismatch between actual and specified file name";

/// Byte offset at which the last `EXTENSION_WIDTH` characters of `path` start.
fn extension_start(path: &str) -> usize {
    path.char_indices()
        .rev()
        .nth(EXTENSION_WIDTH - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Compute the path of an adjacent chain member.
///
/// Returns `Ok(None)` when `candidates` is empty, which is the normal end of
/// a chain. Otherwise the trailing `self_fragment` of `current_path` is
/// replaced by the first candidate; later candidates are never consulted.
/// When the fragment is not itself a suffix but sits right before a `.wcon`
/// extension (any case), the substitution happens before the extension and
/// the extension is kept as written.
///
/// Fragment matching is case-sensitive. A fragment found in neither position
/// is an [`WconError::Argument`].
///
/// ```
/// use wcon_core::resolve_adjacent;
///
/// let next = resolve_adjacent("/data/run_a.WCON", "a", &["b".to_string()]).unwrap();
/// assert_eq!(next.as_deref(), Some("/data/run_b.WCON"));
/// ```
pub fn resolve_adjacent(
    current_path: &str,
    self_fragment: &str,
    candidates: &[String],
) -> Result<Option<String>> {
    let Some(first) = candidates.first() else {
        return Ok(None);
    };

    let (stem, ext) = current_path.split_at(extension_start(current_path));

    if current_path.ends_with(self_fragment) {
        let prefix = &current_path[..current_path.len() - self_fragment.len()];
        Ok(Some(format!("{prefix}{first}")))
    } else if ext.eq_ignore_ascii_case(WCON_EXTENSION) && stem.ends_with(self_fragment) {
        let prefix = &stem[..stem.len() - self_fragment.len()];
        Ok(Some(format!("{prefix}{first}{ext}")))
    } else {
        Err(WconError::Argument(MISMATCH_MESSAGE.to_string()))
    }
}

/// Path of the file after `path` in its chain, or `None` at the chain's end.
///
/// `path` must be the file `document` was read from, with any `.zip`
/// wrapper already stripped.
pub fn next_file(path: &Path, document: &Document) -> Result<Option<PathBuf>> {
    adjacent_file(path, document, document.successor_fragments(), "next")
}

/// Path of the file before `path` in its chain, or `None` at the chain's start.
pub fn previous_file(path: &Path, document: &Document) -> Result<Option<PathBuf>> {
    adjacent_file(path, document, document.predecessor_fragments(), "previous")
}

fn adjacent_file(
    path: &Path,
    document: &Document,
    candidates: &[String],
    direction: &str,
) -> Result<Option<PathBuf>> {
    let text = path.to_str().ok_or_else(|| {
        WconError::Argument(format!("path is not valid UTF-8: {}", path.display()))
    })?;

    let self_fragment = match document.self_fragment() {
        Some(fragment) => fragment,
        None => {
            if !candidates.is_empty() {
                warn!(
                    "{}: no files.this fragment, resolving {} file against the empty fragment",
                    text, direction
                );
            }
            ""
        }
    };

    let resolved = resolve_adjacent(text, self_fragment, candidates)?;
    if let Some(ref sibling) = resolved {
        debug!("{} file of {} is {}", direction, text, sibling);
    }
    Ok(resolved.map(PathBuf::from))
}
