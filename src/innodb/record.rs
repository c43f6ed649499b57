//! Fixed-width record decoding.
//!
//! [`decode_record`] walks a [`Schema`] in declaration order, keeping a
//! running offset from 0, and reads exactly each field's width:
//!
//! | Kind | Width | Decoding |
//! |------|-------|----------|
//! | `int` | 4 | big-endian `u32` |
//! | `string` | 255 | UTF-8, invalid sequences dropped, trailing NULs stripped |
//! | `bool` | 1 | non-zero is `true` |
//!
//! Nothing in the bytes tags the fields, so a schema that does not match the
//! page silently produces garbage values.

use byteorder::{BigEndian, ByteOrder};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::innodb::schema::{FieldKind, Schema};
use crate::SalvageError;

/// Decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(u32),
    Str(String),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A decoded record: field name to value, in schema order.
///
/// Serializes as a JSON object whose keys follow schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// Decode one record from `data` using `schema`.
///
/// Fails with [`SalvageError::BufferExhausted`] when `data` is shorter than
/// [`Schema::width`]. Bytes past the schema width are ignored.
///
/// # Examples
///
/// ```
/// use salvage::innodb::record::{decode_record, FieldValue};
/// use salvage::innodb::schema::Schema;
///
/// let schema = Schema::parse("id:int,active:bool").unwrap();
/// let rec = decode_record(&[0, 0, 1, 0, 1], &schema).unwrap();
/// assert_eq!(rec.get("id"), Some(&FieldValue::Int(256)));
/// assert_eq!(rec.get("active"), Some(&FieldValue::Bool(true)));
///
/// assert!(decode_record(&[0, 0, 1], &schema).is_err());
/// ```
pub fn decode_record(data: &[u8], schema: &Schema) -> Result<Record, SalvageError> {
    if data.len() < schema.width() {
        return Err(SalvageError::BufferExhausted {
            needed: schema.width(),
            available: data.len(),
        });
    }

    let mut offset = 0;
    let mut fields = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let width = field.kind.width();
        let bytes = &data[offset..offset + width];
        let value = match field.kind {
            FieldKind::Integer => FieldValue::Int(BigEndian::read_u32(bytes)),
            FieldKind::FixedString => FieldValue::Str(decode_fixed_string(bytes)),
            FieldKind::Boolean => FieldValue::Bool(bytes[0] != 0),
        };
        fields.push((field.name.clone(), value));
        offset += width;
    }

    Ok(Record { fields })
}

/// Best-effort UTF-8: invalid byte sequences are dropped, not replaced.
fn decode_fixed_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    let trimmed = out.trim_end_matches('\0').len();
    out.truncate(trimmed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::FIELD_STRING_LEN;

    fn encode(id: u32, email: &[u8], active: bool) -> Vec<u8> {
        let mut buf = vec![0u8; 4 + FIELD_STRING_LEN + 1];
        BigEndian::write_u32(&mut buf[0..], id);
        buf[4..4 + email.len()].copy_from_slice(email);
        buf[4 + FIELD_STRING_LEN] = active as u8;
        buf
    }

    fn schema() -> Schema {
        Schema::parse("id:int,email:string,active:bool").unwrap()
    }

    #[test]
    fn test_decode_known_values() {
        let data = encode(0xDEADBEEF, b"alice@example.com", true);
        let rec = decode_record(&data, &schema()).unwrap();
        assert_eq!(rec.get("id"), Some(&FieldValue::Int(0xDEADBEEF)));
        assert_eq!(
            rec.get("email"),
            Some(&FieldValue::Str("alice@example.com".to_string()))
        );
        assert_eq!(rec.get("active"), Some(&FieldValue::Bool(true)));
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = encode(7, b"bob", false);
        let a = decode_record(&data, &schema()).unwrap();
        let b = decode_record(&data, &schema()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bool_any_nonzero_is_true() {
        let s = Schema::parse("flag:bool").unwrap();
        assert_eq!(
            decode_record(&[0x80], &s).unwrap().get("flag"),
            Some(&FieldValue::Bool(true))
        );
        assert_eq!(
            decode_record(&[0], &s).unwrap().get("flag"),
            Some(&FieldValue::Bool(false))
        );
    }

    #[test]
    fn test_invalid_utf8_is_dropped() {
        let data = encode(1, b"ab\xFF\xFEcd", false);
        let rec = decode_record(&data, &schema()).unwrap();
        assert_eq!(rec.get("email"), Some(&FieldValue::Str("abcd".to_string())));
    }

    #[test]
    fn test_only_trailing_nuls_stripped() {
        let data = encode(1, b"a\0b", false);
        let rec = decode_record(&data, &schema()).unwrap();
        assert_eq!(rec.get("email"), Some(&FieldValue::Str("a\0b".to_string())));
    }

    #[test]
    fn test_full_width_string_kept() {
        let long = vec![b'x'; FIELD_STRING_LEN];
        let data = encode(1, &long, false);
        let rec = decode_record(&data, &schema()).unwrap();
        match rec.get("email") {
            Some(FieldValue::Str(s)) => assert_eq!(s.len(), FIELD_STRING_LEN),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_buffer_is_exhausted() {
        let data = vec![0u8; 259];
        match decode_record(&data, &schema()) {
            Err(SalvageError::BufferExhausted { needed, available }) => {
                assert_eq!(needed, 260);
                assert_eq!(available, 259);
            }
            other => panic!("expected BufferExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_bytes_ignored() {
        let mut data = encode(5, b"x", true);
        data.extend_from_slice(&[0xFF; 100]);
        let rec = decode_record(&data, &schema()).unwrap();
        assert_eq!(rec.get("id"), Some(&FieldValue::Int(5)));
    }

    #[test]
    fn test_serialize_keeps_schema_order() {
        let s = Schema::parse("z:int,a:bool").unwrap();
        let rec = decode_record(&[0, 0, 0, 9, 1], &s).unwrap();
        assert_eq!(serde_json::to_string(&rec).unwrap(), r#"{"z":9,"a":true}"#);
        assert_eq!(rec.to_string(), "{z: 9, a: true}");
    }
}
