//! Canonical hashing of rig summaries.
//!
//! A rig hash is `hex(BLAKE3(canonical_json))`, where canonical JSON has
//! lexicographically sorted object keys and no insignificant whitespace.
//! Two runs over the same input must produce the same hash.

use serde::Serialize;

use crate::error::SpecError;

/// Computes the canonical BLAKE3 hash of any serializable value.
///
/// # Example
/// ```
/// use autorig_spec::hash::canonical_hash;
///
/// let a = canonical_hash(&serde_json::json!({"b": 1, "a": 2})).unwrap();
/// let b = canonical_hash(&serde_json::json!({"a": 2, "b": 1})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, SpecError> {
    let value = serde_json::to_value(value)?;
    let canonical = canonicalize_json(&value)?;
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

/// Serializes a JSON value with sorted keys and no whitespace.
pub fn canonicalize_json(value: &serde_json::Value) -> Result<String, SpecError> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &serde_json::Value, out: &mut String) -> Result<(), SpecError> {
    match value {
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_sorts_nested_keys() {
        let value = json!({"z": [1, {"b": true, "a": null}], "a": "x"});
        assert_eq!(
            canonicalize_json(&value).unwrap(),
            r#"{"a":"x","z":[1,{"a":null,"b":true}]}"#
        );
    }

    #[test]
    fn test_hash_distinguishes_values() {
        let a = canonical_hash(&json!({"joint": "Char_Pelvis_jnt"})).unwrap();
        let b = canonical_hash(&json!({"joint": "Char_Head_jnt"})).unwrap();
        assert_ne!(a, b);
    }
}
