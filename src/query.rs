use serde_json::Value;

use crate::resource::Params;

/// Build the query pairs for a request from an allow-list and a call
/// parameter bag.
///
/// The allow-list is iterated in its declared order so the resulting query
/// string is stable across calls. Keys absent from the bag, or present with
/// a null or non-scalar value, are omitted. Keys in the bag that are not in
/// the allow-list never reach the output.
pub fn normalize(allow_list: &[&str], params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(allow_list.len());

    for &key in allow_list {
        if let Some(value) = params.get(key).and_then(coerce) {
            pairs.push((key.to_string(), value));
        }
    }

    pairs
}

/// Coerce a scalar JSON value to its canonical string form.
///
/// Numbers render as decimal strings, booleans as "true"/"false". Null,
/// arrays and objects yield `None` and are treated as absent.
pub(crate) fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
