//! Canonical encoding and hashing of blocks.
//!
//! The encoding is JSON with object keys sorted at every nesting level,
//! `", "` / `": "` separators and every character outside printable ASCII
//! escaped as `\uXXXX`. Floats are spelled the way Python's `repr` spells
//! them (`1e-07`, `1e+16`, `1000000000000000.0`). For the value shapes a block
//! holds this is byte-for-byte what `json.dumps(block, sort_keys=True)`
//! produces, so hashes stay comparable with chains written by other tooling.

use crate::blockchain::Block;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Encode any serializable value canonically.
///
/// Non-finite floats are turned into `null` by `serde_json`; callers that
/// must reject them check before encoding (see [`Block::check_canonical`]).
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_value(&value, &mut out);
    Ok(out)
}

/// SHA-256 hex digest of the canonical encoding of `value`.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    let encoded = to_canonical_json(value)?;
    Ok(hex::encode(Sha256::digest(encoded.as_bytes())))
}

/// Hash of a block as used for `previous_hash` links.
pub fn hash_block(block: &Block) -> Result<String> {
    block.check_canonical()?;
    let digest = canonical_hash(block)?;
    tracing::debug!(index = block.index, hash = %digest, "hashed block");
    Ok(digest)
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => out.push_str(&format_float(f)),
            _ => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(key, out);
                out.push_str(": ");
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out.push('"');
}

/// Shortest round-trip digits, laid out with Python's `repr` rules: plain
/// notation while the decimal point sits within 16 digits, otherwise
/// scientific with a signed, two-digit-minimum exponent.
fn format_float(f: f64) -> String {
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exponent + 1;

    let mut out = String::new();
    if f.is_sign_negative() {
        out.push('-');
    }
    if point > -4 && point <= 16 {
        let len = digits.len() as i32;
        if point <= 0 {
            out.push_str("0.");
            out.push_str(&"0".repeat((-point) as usize));
            out.push_str(&digits);
        } else if point >= len {
            out.push_str(&digits);
            out.push_str(&"0".repeat((point - len) as usize));
            out.push_str(".0");
        } else {
            let (whole, frac) = digits.split_at(point as usize);
            out.push_str(whole);
            out.push('.');
            out.push_str(frac);
        }
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("e{}{:02}", sign, exponent.abs()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_recursively() {
        let value = json!({"b": {"z": 1, "a": [ {"y": true, "x": null} ]}, "a": "s"});
        let encoded = to_canonical_json(&value).unwrap();
        assert_eq!(
            encoded,
            r#"{"a": "s", "b": {"a": [{"x": null, "y": true}], "z": 1}}"#
        );
    }

    #[test]
    fn test_non_ascii_escaped() {
        let value = json!({"b": "Zoë 😀", "a": [1, 2.5, true]});
        let encoded = to_canonical_json(&value).unwrap();
        assert_eq!(encoded, r#"{"a": [1, 2.5, true], "b": "Zo\u00eb \ud83d\ude00"}"#);
    }

    #[test]
    fn test_control_characters_escaped() {
        let encoded = to_canonical_json(&"a\"b\\c\nd\u{1}").unwrap();
        assert_eq!(encoded, r#""a\"b\\c\nd\u0001""#);
    }

    #[test]
    fn test_floats_spelled_like_python_repr() {
        let cases = [
            (1e-7, "1e-07"),
            (1e16, "1e+16"),
            (1e15, "1000000000000000.0"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (123.456, "123.456"),
            (1.0, "1.0"),
            (-0.0, "-0.0"),
            (123456789012345678.0, "1.2345678901234568e+17"),
            (1e100, "1e+100"),
            (-2.5e-10, "-2.5e-10"),
            (1700000000.5, "1700000000.5"),
        ];
        for (value, expected) in cases {
            assert_eq!(to_canonical_json(&value).unwrap(), expected, "{value:?}");
        }
        assert_eq!(to_canonical_json(&json!([7, -3])).unwrap(), "[7, -3]");
    }

    #[test]
    fn test_exponent_floats_hash_like_reference_encoding() {
        let value = json!({
            "data": [{"x": 1e-7, "y": 1e16, "z": 1e15}],
            "index": 2,
            "previous_hash": "abc",
            "proof": 226,
            "timestamp": 1700000000.5
        });
        assert_eq!(
            canonical_hash(&value).unwrap(),
            "f1f2b9e647397983569d6b77339618ca2dedf6f7ad7af2b0b67f34d6cd73ac04"
        );
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let digest = canonical_hash(&json!({})).unwrap();
        assert_eq!(digest.len(), 64);
        // sha256("{}")
        assert_eq!(
            digest,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }
}
