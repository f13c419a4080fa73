//! Purpose: Decode the `--params` blob and serialize it as query pairs.
//! Exports: `parse_params`, `query_pairs`.
//! Role: Pure input boundary; no I/O, runs before any network activity.
//! Invariants: The params text must decode to a JSON object, nothing else.
//! Invariants: Pair order follows the object's insertion order.
//! Invariants: Null-valued entries are dropped; arrays repeat their key.
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind};

/// Decodes the `--params` text into a JSON object. The runner accepts only
/// an object at the top level because each entry becomes one query pair.
pub fn parse_params(text: &str) -> Result<Map<String, Value>, Error> {
    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("--params is not valid json")
            .with_source(err)
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::new(ErrorKind::Decode)
            .with_message(format!(
                "--params must be a json object, got {}",
                json_type_name(&other)
            ))
            .with_hint(r#"Pass an object literal, e.g. --params '{"q": "test", "limit": 5}'."#)),
    }
}

/// Serializes a parameter object into query pairs, in insertion order.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar_text(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_text(other))),
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(val) => {
            if *val {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        Value::Null => "null".to_string(),
        // Nested structures have no scalar form; send their compact JSON.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_params, query_pairs};
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn parse_params_accepts_object() {
        let map = parse_params(r#"{"q": "test", "limit": 5}"#).expect("object");
        assert_eq!(map.len(), 2);
        assert_eq!(map["q"], json!("test"));
        assert_eq!(map["limit"], json!(5));
    }

    #[test]
    fn parse_params_rejects_invalid_json() {
        let err = parse_params("{bad json").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn parse_params_rejects_non_object() {
        let err = parse_params("[1, 2]").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.message().unwrap().contains("an array"));
        assert!(err.hint().is_some());
    }

    #[test]
    fn query_pairs_preserve_insertion_order() {
        let map = parse_params(r#"{"q": "test", "limit": 5, "all": true}"#).expect("object");
        let pairs = query_pairs(&map);
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "test".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("all".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn query_pairs_drop_null_entries() {
        let map = parse_params(r#"{"a": null, "b": "x"}"#).expect("object");
        let pairs = query_pairs(&map);
        assert_eq!(pairs, vec![("b".to_string(), "x".to_string())]);
    }

    #[test]
    fn query_pairs_repeat_key_for_arrays() {
        let map = parse_params(r#"{"tag": ["a", "b"], "n": 2}"#).expect("object");
        let pairs = query_pairs(&map);
        assert_eq!(
            pairs,
            vec![
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
                ("n".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn query_pairs_render_nested_values_as_compact_json() {
        let map = parse_params(r#"{"filter": {"x": 1}}"#).expect("object");
        let pairs = query_pairs(&map);
        assert_eq!(
            pairs,
            vec![("filter".to_string(), r#"{"x":1}"#.to_string())]
        );
    }

    #[test]
    fn query_pairs_render_fractional_numbers() {
        let map = parse_params(r#"{"radius": 1.5}"#).expect("object");
        let pairs = query_pairs(&map);
        assert_eq!(pairs, vec![("radius".to_string(), "1.5".to_string())]);
    }
}
