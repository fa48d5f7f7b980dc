//! The codec boundary and the built-in JSON/zip codec.
//!
//! [`WconCodec`] is the contract the dataset facade dispatches to. Errors cross
//! it as plain strings; the facade wraps them without rewording.
//! [`JsonCodec`] is the default implementation. It only checks that a file is
//! a JSON object, and knows nothing of the WCON schema beyond that.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use log::debug;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::chain::WCON_EXTENSION;
use crate::config::ChainConfig;
use crate::safe_io::atomic_write;

/// Signature of a zip local file header.
const ZIP_LOCAL_MAGIC: &[u8] = b"PK\x03\x04";
/// Signature of the end-of-central-directory record (an empty archive).
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// A JSON value parsed with duplicate object keys rejected at any depth.
///
/// `serde_json::Value` keeps the last of two equal keys; a WCON file with two
/// `files` objects would then silently resolve against the wrong one.
struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StrictVisitor).map(StrictValue)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        StrictValue::deserialize(deserializer).map(|StrictValue(v)| v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(StrictValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
            let StrictValue(value) = access.next_value()?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}

/// Parse JSON text, rejecting duplicate object keys.
fn parse_strict(text: &[u8]) -> serde_json::Result<Value> {
    serde_json::from_slice::<StrictValue>(text).map(|StrictValue(v)| v)
}

/// Reads and writes WCON datasets on behalf of [`crate::DatasetIo`].
pub trait WconCodec {
    /// Read the dataset stored at `path`, zipped or not.
    fn read(&self, path: &Path) -> Result<Value, String>;

    /// Write `dataset` to `path` as a plain WCON file.
    fn write(&self, dataset: &Value, path: &Path, base_name: &str) -> Result<(), String>;

    /// Write `dataset` to `path` as a zip archive whose entry is named after
    /// `base_name`.
    fn write_zip(&self, dataset: &Value, path: &Path, base_name: &str) -> Result<(), String>;
}

/// File-backed codec for WCON JSON text and single-entry zip archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty_print: bool,
}

impl JsonCodec {
    /// Codec writing compact JSON.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty_print(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self::with_pretty_print(config.pretty_print)
    }

    fn serialize(&self, dataset: &Value) -> Result<Vec<u8>, String> {
        let bytes = if self.pretty_print {
            serde_json::to_vec_pretty(dataset)
        } else {
            serde_json::to_vec(dataset)
        };
        bytes.map_err(|e| format!("failed to serialize dataset: {}", e))
    }
}

fn has_wcon_extension(name: &str) -> bool {
    name.len() >= WCON_EXTENSION.len()
        && name.is_char_boundary(name.len() - WCON_EXTENSION.len())
        && name[name.len() - WCON_EXTENSION.len()..].eq_ignore_ascii_case(WCON_EXTENSION)
}

/// Name of the single entry inside a zip written for `base_name`.
pub(crate) fn zip_entry_name(base_name: &str) -> String {
    if has_wcon_extension(base_name) {
        base_name.to_string()
    } else {
        format!("{}{}", base_name, WCON_EXTENSION)
    }
}

/// Contents of the dataset entry of a zip archive: the first `.wcon` entry,
/// or failing that the first file entry.
fn read_zip_entry(bytes: Vec<u8>, path: &Path) -> Result<Vec<u8>, String> {
    let zip_err = |e: zip::result::ZipError| format!("{}: invalid zip archive: {}", path.display(), e);
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_err)?;

    let mut chosen = None;
    let mut fallback = None;
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(zip_err)?;
        if entry.is_dir() {
            continue;
        }
        if has_wcon_extension(entry.name()) {
            chosen = Some(index);
            break;
        }
        fallback.get_or_insert(index);
    }

    let index = chosen
        .or(fallback)
        .ok_or_else(|| format!("{}: zip archive contains no WCON entry", path.display()))?;
    let mut entry = archive.by_index(index).map_err(zip_err)?;
    debug!("{}: reading zip entry {}", path.display(), entry.name());
    let mut contents = Vec::new();
    entry
        .read_to_end(&mut contents)
        .map_err(|e| format!("{}: failed to read zip entry: {}", path.display(), e))?;
    Ok(contents)
}

impl WconCodec for JsonCodec {
    fn read(&self, path: &Path) -> Result<Value, String> {
        let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let text = if bytes.starts_with(ZIP_LOCAL_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC) {
            read_zip_entry(bytes, path)?
        } else {
            bytes
        };

        let dataset = parse_strict(&text)
            .map_err(|e| format!("{}: invalid JSON: {}", path.display(), e))?;
        if !dataset.is_object() {
            return Err(format!("{}: WCON root must be a JSON object", path.display()));
        }
        Ok(dataset)
    }

    fn write(&self, dataset: &Value, path: &Path, base_name: &str) -> Result<(), String> {
        debug!("writing {} (base name {})", path.display(), base_name);
        let bytes = self.serialize(dataset)?;
        atomic_write(path, &bytes).map_err(|e| format!("{}: {}", path.display(), e))
    }

    fn write_zip(&self, dataset: &Value, path: &Path, base_name: &str) -> Result<(), String> {
        let entry_name = zip_entry_name(base_name);
        debug!("writing {} with zip entry {}", path.display(), entry_name);
        let bytes = self.serialize(dataset)?;

        let zip_err = |e: zip::result::ZipError| format!("{}: failed to write zip: {}", path.display(), e);
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(entry_name, options).map_err(zip_err)?;
            zip.write_all(&bytes)
                .map_err(|e| format!("{}: failed to write zip: {}", path.display(), e))?;
            zip.finish().map_err(zip_err)?;
        }

        atomic_write(path, buffer.get_ref()).map_err(|e| format!("{}: {}", path.display(), e))
    }
}
