//! Envelope for stored rows.

use crate::error::StorageError;
use rkyv::{Archive, Deserialize, Serialize};

/// A stored row with metadata.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredRow {
    /// Encoded field values (see [`encode_fields`](super::encode_fields)).
    pub data: Vec<u8>,

    /// Write timestamp in microseconds since Unix epoch.
    pub created_at: u64,
}

impl StoredRow {
    /// Create a row stamped with the current time.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            created_at: super::key::current_timestamp(),
        }
    }

    /// Serialize the row to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Deserialize a row from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| StorageError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_envelope() {
        let row = StoredRow::new(vec![1, 2, 3, 4, 5]);
        let bytes = row.to_bytes().unwrap();
        let decoded = StoredRow::from_bytes(&bytes).unwrap();

        assert_eq!(row, decoded);
        assert!(decoded.created_at > 0);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(StoredRow::from_bytes(&[0xde, 0xad]).is_err());
    }
}
