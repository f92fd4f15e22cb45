use serde_json::Value;

/// Deep structural equality that ignores ordering.
///
/// Objects compare by key set and per-key value. Arrays compare as multisets, so a
/// dropdown whose options were only reordered upstream is not reported as drift.
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(k, v)| right.get(k).is_some_and(|w| structurally_equal(v, w)))
        }
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                return false;
            }
            let mut used = vec![false; right.len()];
            left.iter().all(|item| {
                let hit = right
                    .iter()
                    .enumerate()
                    .find(|(i, candidate)| !used[*i] && structurally_equal(item, candidate));
                match hit {
                    Some((i, _)) => {
                        used[i] = true;
                        true
                    }
                    None => false,
                }
            })
        }
        _ => a == b,
    }
}
