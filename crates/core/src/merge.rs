//! Content payload merge used when two versions are merged.

use serde_json::{Map, Value};

use crate::content_version::FIELD_CULTURAL_CONTEXT;

/// Shallow-merge two content payloads, `source` winning over `target`.
///
/// The one exception is `culturalContext`: when both sides hold a list, the
/// result is target's items followed by source's, with falsy entries
/// (`null`, `false`, `0`, `""`) dropped and duplicates removed (first
/// occurrence kept).
///
/// Non-object payloads are treated as empty.
pub fn merge_content(source: &Value, target: &Value) -> Value {
    let empty = Map::new();
    let source = source.as_object().unwrap_or(&empty);
    let target = target.as_object().unwrap_or(&empty);

    let mut merged = target.clone();
    for (key, value) in source {
        merged.insert(key.clone(), value.clone());
    }

    if let (Some(Value::Array(t)), Some(Value::Array(s))) = (
        target.get(FIELD_CULTURAL_CONTEXT),
        source.get(FIELD_CULTURAL_CONTEXT),
    ) {
        let combined = concat_unique(t, s);
        merged.insert(FIELD_CULTURAL_CONTEXT.to_string(), Value::Array(combined));
    }

    Value::Object(merged)
}

fn concat_unique(first: &[Value], second: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if is_falsy(item) || out.contains(item) {
            continue;
        }
        out.push(item.clone());
    }
    out
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_wins_on_shared_keys() {
        let source = json!({"original": "Hola amigo", "pronunciation": "O-la"});
        let target = json!({"original": "Hola", "translated": "Hello"});
        let merged = merge_content(&source, &target);
        assert_eq!(
            merged,
            json!({"original": "Hola amigo", "translated": "Hello", "pronunciation": "O-la"})
        );
    }

    #[test]
    fn cultural_context_lists_are_concatenated() {
        let source = json!({"culturalContext": ["mate", "asado", ""]});
        let target = json!({"culturalContext": ["asado", null, "tango"]});
        let merged = merge_content(&source, &target);
        assert_eq!(merged["culturalContext"], json!(["asado", "tango", "mate"]));
    }

    #[test]
    fn cultural_context_string_is_overwritten() {
        let source = json!({"culturalContext": "Used at family gatherings"});
        let target = json!({"culturalContext": ["formal"]});
        let merged = merge_content(&source, &target);
        assert_eq!(merged["culturalContext"], json!("Used at family gatherings"));
    }

    #[test]
    fn target_list_kept_when_source_lacks_field() {
        let merged = merge_content(&json!({"original": "x"}), &json!({"culturalContext": ["a"]}));
        assert_eq!(merged["culturalContext"], json!(["a"]));
    }

    #[test]
    fn non_object_inputs_are_empty() {
        assert_eq!(merge_content(&Value::Null, &json!("text")), json!({}));
    }
}
