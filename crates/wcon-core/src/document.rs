//! Dataset adapter: the chain links of a WCON document plus its opaque body.
//!
//! Only the `files` object is interpreted. Units, metadata and tracking data
//! are carried through untouched, in their original key order.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};

/// Top-level key holding the chain links.
const FILES_KEY: &str = "files";

/// Keys of the `files` object this layer owns; anything else passes through.
const LINK_KEYS: [&str; 3] = ["this", "prev", "next"];

/// The `files` object of a WCON document.
///
/// `prev` and `next` accept either a list of fragments or a single fragment
/// string; `null` or a missing key means no neighbour in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileLinks {
    #[serde(default)]
    pub this: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub prev: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub next: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(fragment)) => vec![fragment],
        Some(OneOrMany::Many(fragments)) => fragments,
    })
}

impl FileLinks {
    /// True when none of the three links carries anything.
    pub fn is_empty(&self) -> bool {
        self.this.is_none() && self.prev.is_empty() && self.next.is_empty()
    }

    /// Write the links into an existing `files` object.
    ///
    /// A link whose stored value already means the same thing (`[]` and
    /// `null`, `"_2"` and `["_2"]`) is left exactly as written; other keys
    /// are never touched. A fresh object gets all three links.
    fn merge_into(&self, files: &mut Map<String, Value>) {
        let fresh = files.is_empty();

        let this = self.this.as_ref().map_or(Value::Null, |t| json!(t));
        if fresh || files.get("this").unwrap_or(&Value::Null) != &this {
            files.insert("this".to_string(), this);
        }

        for (key, fragments) in [("prev", &self.prev), ("next", &self.next)] {
            if fresh || stored_fragments(files.get(key)).as_ref() != Some(fragments) {
                let value = if fragments.is_empty() {
                    Value::Null
                } else {
                    json!(fragments)
                };
                files.insert(key.to_string(), value);
            }
        }
    }
}

/// Fragments a stored `prev`/`next` value stands for, or `None` if the value
/// has some other shape.
fn stored_fragments(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::String(fragment)) => Some(vec![fragment.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(_) => None,
    }
}

/// A WCON dataset as seen by the chain layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
    links: FileLinks,
}

impl Document {
    /// Empty document with no body and no chain links.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapt a codec dataset (a JSON object) into a document.
    pub fn from_underlying(dataset: Value) -> Result<Self, String> {
        let Value::Object(root) = dataset else {
            return Err("WCON root must be a JSON object".to_string());
        };
        let links = match root.get(FILES_KEY) {
            None | Some(Value::Null) => FileLinks::default(),
            Some(files) => serde_json::from_value(files.clone())
                .map_err(|e| format!("invalid \"{}\" object: {}", FILES_KEY, e))?,
        };
        Ok(Self { root, links })
    }

    /// Convert back into the codec's dataset representation.
    ///
    /// The source `files` object is kept in place, extra keys included, with
    /// only changed links rewritten. It is dropped when every link is empty
    /// and it holds nothing else.
    pub fn to_underlying(&self) -> Value {
        let mut root = self.root.clone();
        let mut files = match root.get(FILES_KEY) {
            Some(Value::Object(files)) => files.clone(),
            _ => Map::new(),
        };
        let has_extra_keys = files
            .keys()
            .any(|key| !LINK_KEYS.contains(&key.as_str()));

        if self.links.is_empty() && !has_extra_keys {
            root.retain(|key, _| key != FILES_KEY);
        } else {
            self.links.merge_into(&mut files);
            root.insert(FILES_KEY.to_string(), Value::Object(files));
        }
        Value::Object(root)
    }

    /// Fragment identifying this file within its chain (`files.this`).
    pub fn self_fragment(&self) -> Option<&str> {
        self.links.this.as_deref()
    }

    /// Fragments of later chain members (`files.next`), in file order.
    pub fn successor_fragments(&self) -> &[String] {
        &self.links.next
    }

    /// Fragments of earlier chain members (`files.prev`).
    pub fn predecessor_fragments(&self) -> &[String] {
        &self.links.prev
    }

    pub fn links(&self) -> &FileLinks {
        &self.links
    }

    /// Everything in the document root, including the raw `files` value.
    pub fn body(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn with_self_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.links.this = Some(fragment.into());
        self
    }

    pub fn with_successor_fragments(mut self, fragments: Vec<String>) -> Self {
        self.links.next = fragments;
        self
    }

    pub fn with_predecessor_fragments(mut self, fragments: Vec<String>) -> Self {
        self.links.prev = fragments;
        self
    }

    /// Set a top-level body entry. `files` is managed through the links and
    /// cannot be set here.
    pub fn with_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != FILES_KEY {
            self.root.insert(key, value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_from_lists() {
        let doc = Document::from_underlying(json!({
            "units": {"t": "s"},
            "files": {"this": "_2", "prev": ["_1"], "next": ["_3", "_3b"]}
        }))
        .unwrap();
        assert_eq!(doc.self_fragment(), Some("_2"));
        assert_eq!(doc.predecessor_fragments(), ["_1".to_string()]);
        assert_eq!(doc.successor_fragments(), ["_3".to_string(), "_3b".to_string()]);
    }

    #[test]
    fn test_single_string_link_is_wrapped() {
        let doc = Document::from_underlying(json!({
            "files": {"this": "_1", "prev": null, "next": "_2"}
        }))
        .unwrap();
        assert_eq!(doc.successor_fragments(), ["_2".to_string()]);
        assert!(doc.predecessor_fragments().is_empty());
    }

    #[test]
    fn test_missing_files_means_no_links() {
        let doc = Document::from_underlying(json!({"units": {}, "data": []})).unwrap();
        assert_eq!(doc.self_fragment(), None);
        assert!(doc.links().is_empty());

        let doc = Document::from_underlying(json!({"files": null})).unwrap();
        assert!(doc.links().is_empty());
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = Document::from_underlying(json!([1, 2, 3])).unwrap_err();
        assert!(err.contains("JSON object"));
    }

    #[test]
    fn test_rejects_malformed_files() {
        let err = Document::from_underlying(json!({"files": {"next": 3}})).unwrap_err();
        assert!(err.contains("\"files\""));
    }

    #[test]
    fn test_to_underlying_round_trip_keeps_links_and_order() {
        let source = json!({
            "units": {"t": "s", "x": "mm"},
            "files": {"this": "_2", "prev": ["_1"], "next": null},
            "data": [{"id": "1", "t": 0.0, "x": [1.0], "y": [2.0]}]
        });
        let doc = Document::from_underlying(source.clone()).unwrap();
        let back = doc.to_underlying();

        let keys: Vec<&String> = back.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["units", "files", "data"]);
        assert_eq!(back, source);
        assert_eq!(Document::from_underlying(back).unwrap().links(), doc.links());
    }

    #[test]
    fn test_builders_produce_files_object() {
        let doc = Document::new()
            .with_entry("units", json!({"t": "s"}))
            .with_self_fragment("_1")
            .with_successor_fragments(vec!["_2".to_string()]);
        let value = doc.to_underlying();
        assert_eq!(
            value["files"],
            json!({"this": "_1", "prev": null, "next": ["_2"]})
        );
        assert_eq!(value["units"], json!({"t": "s"}));
    }

    #[test]
    fn test_round_trip_keeps_extra_files_keys_and_shapes() {
        let source = json!({
            "units": {"t": "s"},
            "files": {"this": "_1", "prev": [], "next": "_2", "@lab": {"chunk": 1}},
            "data": []
        });
        let doc = Document::from_underlying(source.clone()).unwrap();
        assert_eq!(doc.to_underlying(), source);

        let files = doc.to_underlying()["files"].clone();
        let keys: Vec<&String> = files.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["this", "prev", "next", "@lab"]);
    }

    #[test]
    fn test_changed_links_rewrite_only_link_keys() {
        let doc = Document::from_underlying(json!({
            "files": {"this": "_1", "prev": [], "next": ["_2"], "@lab": {"chunk": 1}}
        }))
        .unwrap()
        .with_self_fragment("_5")
        .with_successor_fragments(vec!["_6".to_string()]);

        assert_eq!(
            doc.to_underlying()["files"],
            json!({"this": "_5", "prev": [], "next": ["_6"], "@lab": {"chunk": 1}})
        );
    }

    #[test]
    fn test_extra_files_keys_survive_without_links() {
        let doc = Document::from_underlying(json!({
            "files": {"this": null, "prev": null, "next": null, "@note": "solo"}
        }))
        .unwrap();
        assert!(doc.links().is_empty());
        assert_eq!(
            doc.to_underlying()["files"],
            json!({"this": null, "prev": null, "next": null, "@note": "solo"})
        );
    }

    #[test]
    fn test_with_entry_ignores_files_key() {
        let doc = Document::new().with_entry("files", json!({"this": "_9"}));
        assert!(doc.body().is_empty());
        assert_eq!(doc.self_fragment(), None);
    }

    #[test]
    fn test_cleared_links_drop_files_object() {
        let doc = Document::from_underlying(json!({
            "units": {},
            "files": {"this": null, "prev": null, "next": null}
        }))
        .unwrap();
        assert!(doc.to_underlying().get("files").is_none());
    }
}
