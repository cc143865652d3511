//! Canonical JSON form shared by token issuers and the verifier.
//!
//! Version 1 of the form is the byte string produced by
//! `json.dumps(obj, separators=(",", ":"), sort_keys=True, ensure_ascii=False)`:
//! - no insignificant whitespace;
//! - object keys sorted by UTF-8 byte order at every depth, array order kept;
//! - strings escape only `"`, `\` and control characters below U+0020 (`/` and non-ASCII are
//!   written as-is, as UTF-8);
//! - numbers keep the literal they were parsed from.
//!
//! `serde_json` is built with `arbitrary_precision`, so a parsed number carries its source
//! text (`1e-05`, integers wider than 64 bits) and is written back byte for byte. Numbers built
//! in Rust are written in their shortest round-trip form.
//!
//! Any change here invalidates every token in circulation; bump [`CANONICAL_FORM_VERSION`]
//! and coordinate with issuers instead.

use serde_json::Value;

pub const CANONICAL_FORM_VERSION: u8 = 1;

/// Serializes `value` in canonical form v1.
pub fn to_canonical_vec(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    write_value(&mut out, value);
    out
}

/// Serializes the entries of a JSON object in canonical form v1.
///
/// Entries may be supplied in any order.
pub fn object_to_canonical_vec<'a, I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut out = Vec::with_capacity(128);
    write_object(&mut out, entries.into_iter().collect());
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            write_object(out, map.iter().map(|(k, v)| (k.as_str(), v)).collect());
        }
    }
}

fn write_object(out: &mut Vec<u8>, mut entries: Vec<(&str, &Value)>) {
    // `serde_json::Map` iterates in insertion order when `preserve_order` is enabled anywhere in
    // the dependency graph, so never rely on its iteration order.
    entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_string(out, key);
        out.push(b':');
        write_value(out, value);
    }
    out.push(b'}');
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    out.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0c => b"\\f",
            0x00..=0x1f => &[],
            _ => continue,
        };
        out.extend_from_slice(&bytes[start..i]);
        if escape.is_empty() {
            out.extend_from_slice(b"\\u00");
            out.push(HEX[(b >> 4) as usize]);
            out.push(HEX[(b & 0x0f) as usize]);
        } else {
            out.extend_from_slice(escape);
        }
        start = i + 1;
    }
    out.extend_from_slice(&bytes[start..]);
    out.push(b'"');
}
