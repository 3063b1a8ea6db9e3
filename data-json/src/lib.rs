use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use data_error::Result;

/*
Qoder's `storage.json` is one flat JSON object with dot- and
slash-namespaced keys (`telemetry.machineId`, `qoderAuth/accessToken`).
Patching it means assigning fields in place; keys outside the supplied
field set must survive untouched.
*/

/// Load a document as a key-value mapping. A missing or unparsable
/// file is an empty mapping, never an error.
pub fn load_document(path: impl AsRef<Path>) -> Map<String, Value> {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return Map::new(),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            log::warn!("{} is not a JSON object, starting empty", path.display());
            Map::new()
        }
    }
}

/// Assign each field into the document (overwrite semantics) and write
/// the whole mapping back. Either the full new content lands on disk or
/// the prior file is left untouched.
pub fn apply_fields(
    path: impl AsRef<Path>,
    fields: impl IntoIterator<Item = (String, Value)>,
) -> Result<Map<String, Value>> {
    let path = path.as_ref();
    let mut doc = load_document(path);
    for (key, value) in fields {
        doc.insert(key, value);
    }
    write_document(path, &doc)?;
    Ok(doc)
}

/// Serialize the mapping with a fixed 4-space indent, matching the
/// format Qoder itself writes, and replace the file atomically.
pub fn write_document(
    path: impl AsRef<Path>,
    doc: &Map<String, Value>,
) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;

    fs_atomic::write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempdir::TempDir;

    #[test]
    fn test_apply_fields_preserves_unrelated_keys() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let path = temp_dir.path().join("storage.json");
        fs::write(
            &path,
            r#"{"untouched": {"nested": [1, 2]}, "telemetry.machineId": "old"}"#,
        )
        .unwrap();

        let doc = apply_fields(
            &path,
            vec![
                ("telemetry.machineId".to_string(), json!("new")),
                ("telemetry.sqmId".to_string(), json!("{X}")),
            ],
        )
        .unwrap();

        assert_eq!(doc.get("telemetry.machineId"), Some(&json!("new")));
        assert_eq!(doc.get("telemetry.sqmId"), Some(&json!("{X}")));
        assert_eq!(doc.get("untouched"), Some(&json!({"nested": [1, 2]})));

        let reloaded = load_document(&path);
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn test_missing_file_is_an_empty_document() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let path = temp_dir.path().join("absent.json");

        assert!(load_document(&path).is_empty());

        let doc =
            apply_fields(&path, vec![("a".to_string(), json!(1))]).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_garbage_file_is_an_empty_document() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(load_document(&path).is_empty());
    }

    #[test]
    fn test_written_document_uses_four_space_indent() {
        let temp_dir =
            TempDir::new("tmp").expect("Failed to create temporary directory");
        let path = temp_dir.path().join("storage.json");

        apply_fields(&path, vec![("key".to_string(), json!("value"))]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"key\": \"value\""));
    }
}
