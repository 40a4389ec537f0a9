//! Dot/bracket path addressing over `serde_json::Value`.
//!
//! Paths use the form `a.b[0].c`. This module is the only place that parses
//! or builds such paths; the language detector and the translation service
//! both go through it so their addressing always agrees.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Parse a `a.b[0].c` path into segments. Empty tokens are discarded, and
/// purely numeric tokens are treated as array indices.
pub fn parse_path(path: &str) -> Vec<Segment> {
    path.split(|c| c == '.' || c == '[' || c == ']')
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.bytes().all(|b| b.is_ascii_digit()) {
                Segment::Index(token.parse().unwrap_or(0))
            } else {
                Segment::Key(token.to_string())
            }
        })
        .collect()
}

/// Append an object key to a path.
pub fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Append an array index to a path.
pub fn join_index(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

/// Read the value at `path`, if present.
pub fn get_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in parse_path(path) {
        current = match segment {
            Segment::Key(key) => current.get(key.as_str())?,
            Segment::Index(index) => current.get(index)?,
        };
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate containers as needed.
/// Whether a missing container becomes an array or an object is decided by
/// the next segment: numeric means array, anything else means object.
pub fn set_value(root: &mut Value, path: &str, value: Value) {
    let segments = parse_path(path);
    if segments.is_empty() {
        return;
    }

    let mut current = root;
    for window in 0..segments.len() - 1 {
        let next_is_index = matches!(segments[window + 1], Segment::Index(_));
        current = match &segments[window] {
            Segment::Key(key) => {
                if !current.is_object() {
                    *current = Value::Object(Default::default());
                }
                let map = current.as_object_mut().unwrap();
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                ensure_container(entry, next_is_index);
                entry
            }
            Segment::Index(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let array = current.as_array_mut().unwrap();
                if array.len() <= *index {
                    array.resize(*index + 1, Value::Null);
                }
                let entry = &mut array[*index];
                ensure_container(entry, next_is_index);
                entry
            }
        };
    }

    match segments.last().unwrap() {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Default::default());
            }
            current
                .as_object_mut()
                .unwrap()
                .insert(key.clone(), value);
        }
        Segment::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let array = current.as_array_mut().unwrap();
            if array.len() <= *index {
                array.resize(*index + 1, Value::Null);
            }
            array[*index] = value;
        }
    }
}

fn ensure_container(slot: &mut Value, next_is_index: bool) {
    let compatible = if next_is_index {
        slot.is_array()
    } else {
        slot.is_object()
    };
    if !compatible {
        *slot = if next_is_index {
            Value::Array(Vec::new())
        } else {
            Value::Object(Default::default())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("a.b[0].c"),
            vec![
                Segment::Key("a".to_string()),
                Segment::Key("b".to_string()),
                Segment::Index(0),
                Segment::Key("c".to_string()),
            ]
        );
        assert_eq!(parse_path(""), vec![]);
        assert_eq!(parse_path("plain"), vec![Segment::Key("plain".to_string())]);
    }

    #[test]
    fn test_get_value() {
        let root = json!({"a": {"b": ["x", "y"]}});
        assert_eq!(get_value(&root, "a.b[1]"), Some(&json!("y")));
        assert_eq!(get_value(&root, "a.b[2]"), None);
        assert_eq!(get_value(&root, "a.missing"), None);
    }

    #[test]
    fn test_set_value_existing_path() {
        let mut root = json!({"a": {"b": ["x", "y"]}});
        set_value(&mut root, "a.b[0]", json!("translated"));
        assert_eq!(root, json!({"a": {"b": ["translated", "y"]}}));
    }

    #[test]
    fn test_set_value_creates_intermediate_containers() {
        let mut root = json!({});
        set_value(&mut root, "a.b[1].c", json!("deep"));
        assert_eq!(root, json!({"a": {"b": [null, {"c": "deep"}]}}));
    }

    #[test]
    fn test_join_helpers_match_parse() {
        let path = join_index(&join_key(&join_key("", "a"), "b"), 0);
        assert_eq!(path, "a.b[0]");
        assert_eq!(parse_path(&path).len(), 3);
    }
}
