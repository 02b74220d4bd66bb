//! Key encoding for the sled trees.
//!
//! Row keys are `[shape name][0x00][surrogate key (8 bytes, big-endian)]`.
//! Big-endian encoding makes lexicographic order match numeric order, so a
//! prefix scan returns a shape's rows in surrogate-key order.

use super::codec::encode_value;
use crate::error::StorageError;
use crate::value::Value;

/// Size of an encoded surrogate key in bytes.
pub const SURROGATE_SIZE: usize = 8;

/// Prefix for per-shape sequence counters in the meta tree.
pub const SEQ_PREFIX: &[u8] = b"seq:";

/// Prefix shared by every row of a shape.
pub fn row_prefix(shape: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(shape.len() + 1);
    prefix.extend_from_slice(shape.as_bytes());
    prefix.push(0); // Null separator
    prefix
}

/// Key of one row.
pub fn row_key(shape: &str, surrogate: u64) -> Vec<u8> {
    let mut key = row_prefix(shape);
    key.extend_from_slice(&surrogate.to_be_bytes());
    key
}

/// Extract the surrogate key from a row key.
pub fn decode_row_key(key: &[u8], prefix_len: usize) -> Result<u64, StorageError> {
    if key.len() != prefix_len + SURROGATE_SIZE {
        return Err(StorageError::InvalidKey);
    }
    decode_u64(&key[prefix_len..])
}

/// Decode a big-endian u64.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, StorageError> {
    let buf: [u8; SURROGATE_SIZE] = bytes.try_into().map_err(|_| StorageError::InvalidKey)?;
    Ok(u64::from_be_bytes(buf))
}

/// Key of a shape's sequence counter.
pub fn seq_key(shape: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(SEQ_PREFIX.len() + shape.len());
    key.extend_from_slice(SEQ_PREFIX);
    key.extend_from_slice(shape.as_bytes());
    key
}

/// Key of a relation between two shapes.
pub fn relation_key(parent: &str, child: &str) -> Vec<u8> {
    let mut key = row_prefix(parent);
    key.extend_from_slice(child.as_bytes());
    key
}

/// Key of one unique-index entry.
pub fn unique_key(shape: &str, field: &str, value: &Value) -> Result<Vec<u8>, StorageError> {
    let mut key = row_prefix(shape);
    key.extend_from_slice(field.as_bytes());
    key.push(0);
    encode_value(&mut key, value)?;
    Ok(key)
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}
