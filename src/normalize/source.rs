// Export file loading: reads chat exports from disk and tags each record
// with the file stem as its source channel
use crate::error::{PulseError, Result};
use crate::normalize::{normalize_all, Message};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Messages loaded from a set of export files
#[derive(Debug, Clone, Default)]
pub struct LoadedSources {
    pub messages: Vec<Message>,
    /// File names that were read successfully, in load order
    pub files: Vec<String>,
    /// Files that could not be read or parsed
    pub skipped: Vec<PathBuf>,
}

/// Extract the record list from an export document
///
/// Accepts a bare array, or an object carrying the array under `messages`
/// or `data`. An object with neither yields no messages.
pub fn parse_export(document: &Value, source: &str) -> Result<Vec<Message>> {
    match document {
        Value::Array(_) => normalize_all(document, Some(source)),
        Value::Object(map) => match map.get("messages").or_else(|| map.get("data")) {
            Some(records) => normalize_all(records, Some(source)),
            None => Ok(Vec::new()),
        },
        _ => Err(PulseError::InvalidInput(format!(
            "export '{}' is neither a record array nor an object",
            source
        ))),
    }
}

/// Load and normalize every export file
///
/// Unreadable or malformed files are skipped with a warning. Fails with
/// `EmptyResult` only when no file produced any message.
pub fn load_sources(paths: &[PathBuf]) -> Result<LoadedSources> {
    let mut loaded = LoadedSources::default();

    for path in paths {
        match load_one(path) {
            Ok(messages) => {
                tracing::info!("Loaded {} messages from {:?}", messages.len(), path);
                loaded.messages.extend(messages);
                loaded.files.push(file_name(path));
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                loaded.skipped.push(path.clone());
            }
        }
    }

    if loaded.messages.is_empty() {
        return Err(PulseError::EmptyResult(format!(
            "no messages found in {} source file(s)",
            paths.len()
        )));
    }

    Ok(loaded)
}

fn load_one(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path).map_err(|e| PulseError::Io {
        source: e,
        context: format!("Failed to read export file: {:?}", path),
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|e| PulseError::Json {
        source: e,
        context: format!("Failed to parse export file: {:?}", path),
    })?;
    parse_export(&document, &source_tag(path))
}

/// File stem, e.g. `general` for `exports/general.json`
fn source_tag(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_export_shapes() {
        let arr = json!([{"content": "a"}, {"content": "b"}]);
        assert_eq!(parse_export(&arr, "general").unwrap().len(), 2);

        let wrapped = json!({"messages": [{"content": "a"}]});
        let msgs = parse_export(&wrapped, "questions").unwrap();
        assert_eq!(msgs[0].channel, "questions");

        let data = json!({"data": [{"content": "a"}, {"content": "b"}, {"content": "c"}]});
        assert_eq!(parse_export(&data, "x").unwrap().len(), 3);

        let other = json!({"guild": "abc"});
        assert!(parse_export(&other, "x").unwrap().is_empty());

        assert!(parse_export(&json!("nope"), "x").is_err());
    }

    #[test]
    fn test_load_sources_tags_and_skips() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("payouts.json");
        let bad = dir.path().join("broken.json");
        std::fs::write(&good, r#"[{"content": "when is payout?", "author": {"username": "u1"}}]"#)
            .unwrap();
        std::fs::write(&bad, "{not json").unwrap();

        let loaded = load_sources(&[good, bad.clone(), dir.path().join("missing.json")]).unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].channel, "payouts");
        assert_eq!(loaded.files, vec!["payouts.json".to_string()]);
        assert_eq!(loaded.skipped.len(), 2);
        assert_eq!(loaded.skipped[0], bad);
    }

    #[test]
    fn test_load_sources_all_empty() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("general.json");
        std::fs::write(&empty, "[]").unwrap();

        let err = load_sources(&[empty]).unwrap_err();
        assert!(matches!(err, PulseError::EmptyResult(_)));
    }
}
