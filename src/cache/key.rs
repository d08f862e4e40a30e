//! Cache Key Module
//!
//! Derives fixed-length keys from `(category, content)` and estimates value sizes.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::Category;
use crate::error::Result;

// == Canonical Form ==
/// Returns the canonical text of `content`.
///
/// Strings are used verbatim. Structured values are serialized as compact
/// JSON with object keys sorted at every level, so field order never
/// affects the result.
pub fn canonical_form(content: &Value) -> Result<String> {
    match content {
        Value::String(s) => Ok(s.clone()),
        other => {
            let mut out = String::new();
            write_canonical(other, &mut out)?;
            Ok(out)
        }
    }
}

fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
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
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

// == Derive Key ==
/// Hex SHA-256 of `"{category}:{canonical content}"`.
pub fn derive_key(category: Category, content: &Value) -> Result<String> {
    let canonical = canonical_form(content)?;

    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

// == Estimate Size ==
/// Approximate footprint of a value: byte length of its serialized form.
pub fn estimate_size(value: &Value) -> Result<usize> {
    match value {
        Value::String(s) => Ok(s.len()),
        other => Ok(serde_json::to_vec(other)?.len()),
    }
}
