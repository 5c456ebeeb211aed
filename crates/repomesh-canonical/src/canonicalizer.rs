use canonical_json::to_string;
use serde_json::Value;
use std::collections::HashSet;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Provided JSON could not be canonicalized.
    #[error("invalid JSON structure: {0}")]
    InvalidStructure(String),
    /// A duplicate object member was detected.
    #[error("duplicate key detected at {0}")]
    DuplicateKey(String),
}

/// Produces the canonical UTF-8 bytes for a JSON value.
///
/// Object keys are sorted lexicographically by Unicode code point, arrays
/// keep their source order, and the output carries no insignificant
/// whitespace. Duplicate object members are rejected.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    assert_no_duplicates(value, String::new())?;
    let canonical =
        to_string(value).map_err(|err| CanonicalizationError::InvalidStructure(err.to_string()))?;
    Ok(canonical.into_bytes())
}

/// Canonical bytes of `value` with the named top-level members removed.
///
/// Content hashes commit to an event with `signature` stripped, and
/// manifest hashes commit to a manifest with `manifestHash` stripped; both
/// go through this single entry point.
pub fn canonical_bytes_without(
    value: &Value,
    strip: &[&str],
) -> Result<Vec<u8>, CanonicalizationError> {
    let mut reduced = value.clone();
    if let Value::Object(map) = &mut reduced {
        for key in strip {
            map.remove(*key);
        }
    }
    canonical_bytes(&reduced)
}

fn assert_no_duplicates(value: &Value, path: String) -> Result<(), CanonicalizationError> {
    if let Value::Object(map) = value {
        let mut seen = HashSet::new();
        for (key, child) in map {
            if !seen.insert(key) {
                return Err(CanonicalizationError::DuplicateKey(format!(
                    "{}.{}",
                    path, key
                )));
            }
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            assert_no_duplicates(child, child_path)?;
        }
    } else if let Value::Array(items) = value {
        for (idx, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, idx);
            assert_no_duplicates(item, item_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn orders_keys_and_strips_whitespace() {
        let value = json!({"b": 1, "a": {"nested": 2}});
        let bytes = canonical_bytes(&value).unwrap();
        assert_eq!(bytes, br#"{"a":{"nested":2},"b":1}"#.to_vec());
    }

    #[test]
    fn arrays_keep_source_order() {
        let value = json!({"list": [3, 1, 2]});
        let bytes = canonical_bytes(&value).unwrap();
        assert_eq!(bytes, br#"{"list":[3,1,2]}"#.to_vec());
    }

    #[test]
    fn strips_named_top_level_members() {
        let value = json!({"repo": "a/b", "signature": {"alg": "ed25519"}});
        let bytes = canonical_bytes_without(&value, &["signature"]).unwrap();
        assert_eq!(bytes, br#"{"repo":"a/b"}"#.to_vec());
    }

    #[test]
    fn structurally_equal_values_produce_identical_bytes() {
        let left = json!({"x": "1", "y": ["a", "b"], "z": {"k": 2}});
        let right = json!({"z": {"k": 2}, "y": ["a", "b"], "x": "1"});
        assert_eq!(
            canonical_bytes(&left).unwrap(),
            canonical_bytes(&right).unwrap()
        );
    }
}
