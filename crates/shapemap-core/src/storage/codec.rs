//! Row codec for encoding/decoding record fields to/from bytes.

use crate::error::StorageError;
use crate::value::Value;

/// Type tag for encoded values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueTag {
    Int = 1,
    Uuid = 2,
    String = 3,
    Bool = 4,
}

impl TryFrom<u8> for ValueTag {
    type Error = StorageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ValueTag::Int),
            2 => Ok(ValueTag::Uuid),
            3 => Ok(ValueTag::String),
            4 => Ok(ValueTag::Bool),
            _ => Err(StorageError::InvalidData(format!("Unknown value tag: {}", value))),
        }
    }
}

/// Encode field name/value pairs to bytes.
///
/// Format:
/// - Field count (4 bytes, little-endian)
/// - For each field:
///   - Field name length (2 bytes, little-endian)
///   - Field name (UTF-8 bytes)
///   - Value tag (1 byte)
///   - Value data (variable length, depends on type)
pub fn encode_fields<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a Value)>,
) -> Result<Vec<u8>, StorageError> {
    let fields: Vec<_> = fields.into_iter().collect();
    let mut buf = Vec::new();

    let count = u32::try_from(fields.len())
        .map_err(|_| StorageError::InvalidData("Too many fields".into()))?;
    buf.extend_from_slice(&count.to_le_bytes());

    for (name, value) in fields {
        let name_bytes = name.as_bytes();
        let name_len = u16::try_from(name_bytes.len())
            .map_err(|_| StorageError::InvalidData("Field name too long".into()))?;
        buf.extend_from_slice(&name_len.to_le_bytes());
        buf.extend_from_slice(name_bytes);

        encode_value(&mut buf, value)?;
    }

    Ok(buf)
}

/// Decode bytes back to field name/value pairs.
pub fn decode_fields(data: &[u8]) -> Result<Vec<(String, Value)>, StorageError> {
    let mut cursor = Cursor::new(data);

    let count = u32::from_le_bytes(cursor.take_array("field count")?) as usize;
    let mut fields = Vec::with_capacity(count.min(data.len()));

    for _ in 0..count {
        let name_len = u16::from_le_bytes(cursor.take_array("field name length")?) as usize;
        let name = String::from_utf8(cursor.take(name_len, "field name")?.to_vec())
            .map_err(|_| StorageError::InvalidData("Invalid UTF-8 in field name".into()))?;

        let value = decode_value(&mut cursor)?;
        fields.push((name, value));
    }

    if !cursor.is_empty() {
        return Err(StorageError::InvalidData("Trailing bytes after fields".into()));
    }

    Ok(fields)
}

/// Encode a single value to the buffer.
pub fn encode_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), StorageError> {
    match value {
        Value::Int(n) => {
            buf.push(ValueTag::Int as u8);
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Value::Uuid(uuid) => {
            buf.push(ValueTag::Uuid as u8);
            buf.extend_from_slice(uuid);
        }
        Value::String(s) => {
            buf.push(ValueTag::String as u8);
            let bytes = s.as_bytes();
            let len = u32::try_from(bytes.len())
                .map_err(|_| StorageError::InvalidData("String too long".into()))?;
            buf.extend_from_slice(&len.to_le_bytes());
            buf.extend_from_slice(bytes);
        }
        Value::Bool(b) => {
            buf.push(ValueTag::Bool as u8);
            buf.push(u8::from(*b));
        }
    }
    Ok(())
}

fn decode_value(cursor: &mut Cursor<'_>) -> Result<Value, StorageError> {
    let [tag] = cursor.take_array::<1>("value tag")?;
    let value = match ValueTag::try_from(tag)? {
        ValueTag::Int => Value::Int(i64::from_le_bytes(cursor.take_array("int")?)),
        ValueTag::Uuid => Value::Uuid(cursor.take_array("uuid")?),
        ValueTag::String => {
            let len = u32::from_le_bytes(cursor.take_array("string length")?) as usize;
            let bytes = cursor.take(len, "string")?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|_| StorageError::InvalidData("Invalid UTF-8 in string".into()))?;
            Value::String(s)
        }
        ValueTag::Bool => {
            let [b] = cursor.take_array::<1>("bool")?;
            if b > 1 {
                return Err(StorageError::InvalidData(format!("Invalid bool byte: {}", b)));
            }
            Value::Bool(b == 1)
        }
    };
    Ok(value)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], StorageError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| StorageError::InvalidData(format!("Data too short for {}", what)))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], StorageError> {
        let slice = self.take(N, what)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }
}
