//! Stable hashes of requests and configuration.
//!
//! Values go through `serde_json` and then xxh64. Hashed types hold ids,
//! integers and strings only; floats are passed through [`quantize`] first and
//! maps are `BTreeMap`s, so equal values always produce equal bytes.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Fixed-point factor for [`quantize`].
pub const QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Fixed-point form of a float, six decimal places.
pub fn quantize(value: f64) -> i64 {
    (value * QUANTIZATION_FACTOR).round() as i64
}

/// JSON bytes of `value`.
///
/// Serializing plain data with string keys cannot fail; a failure would
/// yield empty bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// xxh64 of the canonical bytes, seed 0.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// [`canonical_hash`] as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
