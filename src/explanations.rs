//! Loading of explanation maps.
//!
//! The on-disk form is a JSON object keyed by zero-based page index:
//! `{"0": "text for the first page", "3": "..."}`. `null` values count as
//! missing entries.

use marginalia_core::{ComposeError, ExplanationMap};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

pub fn parse_explanations(json: &str) -> Result<ExplanationMap, ComposeError> {
    let raw: BTreeMap<String, Option<String>> = serde_json::from_str(json)?;
    let mut map = ExplanationMap::new();
    for (key, text) in raw {
        let index: usize = key.trim().parse().map_err(|_| {
            ComposeError::InvalidOptions(format!("explanation key '{key}' is not a page index"))
        })?;
        if let Some(text) = text {
            map.insert(index, text);
        }
    }
    Ok(map)
}

pub fn load_explanations<P: AsRef<Path>>(path: P) -> Result<ExplanationMap, ComposeError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| {
        ComposeError::Io(io::Error::new(
            e.kind(),
            format!("Failed to read explanations from '{}': {}", path.display(), e),
        ))
    })?;
    let map = parse_explanations(&json)?;
    log::debug!("Loaded {} explanations from {}", map.len(), path.display());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_page_indices() {
        let map = parse_explanations(r#"{"0": "first", "10": "eleventh", "2": null}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&0], "first");
        assert_eq!(map[&10], "eleventh");
        assert!(!map.contains_key(&2));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 10]);
    }

    #[test]
    fn non_numeric_key_is_rejected() {
        let err = parse_explanations(r#"{"first": "text"}"#).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidOptions(_)));
        let err = parse_explanations(r#"{"-1": "text"}"#).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidOptions(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(parse_explanations("[1, 2]"), Err(ComposeError::Json(_))));
    }
}
