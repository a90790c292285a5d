//! Thin read-only view over [`fastnbt::Value`], the tag-tree codec this
//! crate treats as an external collaborator.
//!
//! Nothing downstream of this module matches on `fastnbt::Value` directly —
//! every access by name goes through one of the helpers here, so a future
//! swap to a different NBT crate touches only this file.

use fastnbt::Value;

use crate::error::{Error, Result};

/// Look up a named child of a compound. Returns `None` if `value` is not a
/// compound or has no such key — absent fields are routine (schema drift
/// across data-versions), not an error.
pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Compound(map) => map.get(key),
        _ => None,
    }
}

/// `get` chained through a path of keys, short-circuiting on the first miss.
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = value;
    for key in path {
        cur = get(cur, key)?;
    }
    Some(cur)
}

pub fn as_compound(value: &Value) -> Option<&std::collections::HashMap<String, Value>> {
    match value {
        Value::Compound(map) => Some(map),
        _ => None,
    }
}

pub fn as_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) => Some(items),
        _ => None,
    }
}

pub fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match *value {
        Value::Byte(b) => Some(b as i64),
        Value::Short(s) => Some(s as i64),
        Value::Int(i) => Some(i as i64),
        Value::Long(l) => Some(l),
        _ => None,
    }
}

pub fn as_i8(value: &Value) -> Option<i8> {
    match *value {
        Value::Byte(b) => Some(b),
        Value::Int(i) => Some(i as i8),
        Value::Long(l) => Some(l as i8),
        _ => None,
    }
}

/// A `ByteArray`, as unsigned bytes (the wire representation is signed
/// `i8`; callers of `Blocks`/`Data`/`Add` want raw byte math).
pub fn as_byte_array(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::ByteArray(bytes) => Some(bytes.iter().map(|&b| b as u8).collect()),
        _ => None,
    }
}

/// A `LongArray`, reinterpreted as unsigned 64-bit words — the bit-pack
/// codec always treats packed words as unsigned (spec §4.1), regardless of
/// the signed representation NBT requires on the wire.
pub fn as_long_array(value: &Value) -> Option<Vec<u64>> {
    match value {
        Value::LongArray(longs) => Some(longs.iter().map(|&l| l as u64).collect()),
        _ => None,
    }
}

/// Parse a `fastnbt`-encoded byte buffer into a `Value`, mapping any parse
/// failure to the crate's own error type so callers never see `fastnbt`'s
/// error type directly.
pub fn parse(bytes: &[u8]) -> Result<Value> {
    fastnbt::from_bytes(bytes).map_err(Error::from)
}

/// Serialize a `Value` back to NBT bytes.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    fastnbt::to_bytes(value).map_err(Error::from)
}

/// Build a `Long` value from an unsigned 64-bit word, reinterpreting it as
/// signed for the wire — the inverse of `as_long_array`'s element mapping.
pub fn long_array_value(words: &[u64]) -> Value {
    Value::LongArray(words.iter().map(|&w| w as i64).collect())
}
