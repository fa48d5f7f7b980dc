//! Read/write facade over a [`WconCodec`].
//!
//! Codec failures come back as [`WconError::Io`] with the codec's message
//! untouched. There is no retry or partial-write recovery here.

use std::path::Path;

use log::{debug, warn};

use crate::chain::WCON_EXTENSION;
use crate::codec::{JsonCodec, WconCodec};
use crate::document::Document;
use crate::error::{Result, WconError};

const ZIP_EXTENSION: &str = ".zip";

/// `name` without a trailing `.zip` (any case), or `None` if it has none.
pub(crate) fn strip_zip_suffix(name: &str) -> Option<&str> {
    let cut = name.len().checked_sub(ZIP_EXTENSION.len())?;
    if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(ZIP_EXTENSION) {
        Some(&name[..cut])
    } else {
        None
    }
}

/// True when `path`'s file name follows the `.wcon` convention: longer than
/// the extension itself and ending in it (any case). A `.zip` wrapper is
/// looked through.
fn has_conventional_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = strip_zip_suffix(&name).unwrap_or(&name);
    let chars = name.chars().count();
    let extension: String = name.chars().skip(chars.saturating_sub(WCON_EXTENSION.len())).collect();
    chars > WCON_EXTENSION.len() && extension.eq_ignore_ascii_case(WCON_EXTENSION)
}

/// Warn about file names that do not follow the `.wcon` convention. Never fails.
fn check_file_name(path: &Path) {
    if !has_conventional_name(path) {
        warn!(
            "{}: file name is too short or does not end in {}, the recommended extension",
            path.display(),
            WCON_EXTENSION
        );
    }
}

/// Base name handed to the codec when writing `document` to `path`.
///
/// The document's own fragment wins when it has a non-empty one. Otherwise
/// the path's file name is used, minus a trailing `.zip` when writing
/// compressed.
pub fn write_base_name(path: &Path, document: &Document, compressed: bool) -> String {
    if let Some(fragment) = document.self_fragment().filter(|f| !f.is_empty()) {
        return fragment.to_string();
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match strip_zip_suffix(&file_name) {
        Some(stem) if compressed => stem.to_string(),
        _ => file_name,
    }
}

/// Dispatches dataset reads and writes to a codec.
///
/// Holds nothing but the codec, so it is as thread-safe as the codec is.
#[derive(Debug, Clone, Default)]
pub struct DatasetIo<C = JsonCodec> {
    codec: C,
}

impl<C: WconCodec> DatasetIo<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Read `path` through the codec and adapt the result into a [`Document`].
    pub fn read_dataset(&self, path: &Path) -> Result<Document> {
        check_file_name(path);
        debug!("reading dataset {}", path.display());
        let dataset = self.codec.read(path).map_err(WconError::Io)?;
        Document::from_underlying(dataset).map_err(WconError::Io)
    }

    /// Write `document` to `path`, as a zip archive when `compressed`.
    pub fn write_dataset(&self, path: &Path, document: &Document, compressed: bool) -> Result<()> {
        check_file_name(path);
        let base_name = write_base_name(path, document, compressed);
        debug!(
            "writing dataset {} (base name {}, compressed: {})",
            path.display(),
            base_name,
            compressed
        );
        let dataset = document.to_underlying();
        let outcome = if compressed {
            self.codec.write_zip(&dataset, path, &base_name)
        } else {
            self.codec.write(&dataset, path, &base_name)
        };
        outcome.map_err(WconError::Io)
    }
}
