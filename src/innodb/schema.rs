//! Record layouts.
//!
//! A [`Schema`] is an ordered list of named fields, each of a fixed-width
//! [`FieldKind`]. Declaration order is byte order: the first field starts at
//! offset 0 of a record and each following field starts where the previous
//! one ended. There are no variable-length or nullable fields.
//!
//! Schemas come from three places:
//! - an inline spec such as `"id:int,email:string,active:bool"` ([`Schema::parse`]),
//! - a JSON file with a `fields` array ([`Schema::from_json`] / [`Schema::load`]),
//! - the [`Schema::wp_newsletter`] preset.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::innodb::constants::*;
use crate::SalvageError;

/// On-disk encoding of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FieldKind {
    /// 4-byte big-endian unsigned integer.
    Integer,
    /// 255-byte UTF-8 string, NUL padded.
    FixedString,
    /// 1 byte, non-zero is true.
    Boolean,
}

impl FieldKind {
    /// Fixed byte width of this kind.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Integer => FIELD_INT_LEN,
            FieldKind::FixedString => FIELD_STRING_LEN,
            FieldKind::Boolean => FIELD_BOOL_LEN,
        }
    }

    /// Canonical schema-spec name (`int`, `string`, `bool`).
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Integer => "int",
            FieldKind::FixedString => "string",
            FieldKind::Boolean => "bool",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = SalvageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(FieldKind::Integer),
            "string" | "str" => Ok(FieldKind::FixedString),
            "bool" | "boolean" => Ok(FieldKind::Boolean),
            other => Err(SalvageError::Parse(format!(
                "Unknown field kind '{}' (expected int, string or bool)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for FieldKind {
    type Error = SalvageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldKind> for &'static str {
    fn from(kind: FieldKind) -> Self {
        kind.name()
    }
}

/// A named field in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered field list defining a record's byte layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaFile", into = "SchemaFile")]
pub struct Schema {
    fields: Vec<Field>,
    width: usize,
}

/// JSON representation: `{"fields": [{"name": "id", "kind": "int"}, ...]}`.
#[derive(Serialize, Deserialize)]
struct SchemaFile {
    fields: Vec<Field>,
}

impl TryFrom<SchemaFile> for Schema {
    type Error = SalvageError;

    fn try_from(file: SchemaFile) -> Result<Self, Self::Error> {
        Schema::new(file.fields)
    }
}

impl From<Schema> for SchemaFile {
    fn from(schema: Schema) -> Self {
        SchemaFile {
            fields: schema.fields,
        }
    }
}

impl Schema {
    /// Build a schema from an ordered field list.
    ///
    /// Rejects empty schemas, empty names, and duplicate names.
    pub fn new(fields: Vec<Field>) -> Result<Self, SalvageError> {
        if fields.is_empty() {
            return Err(SalvageError::Parse("Schema has no fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(SalvageError::Parse("Field name is empty".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SalvageError::Parse(format!(
                    "Duplicate field name '{}'",
                    field.name
                )));
            }
        }

        let width = fields.iter().map(|f| f.kind.width()).sum();
        Ok(Schema { fields, width })
    }

    /// Parse an inline spec: comma-separated `name:kind` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use salvage::innodb::schema::{FieldKind, Schema};
    ///
    /// let schema = Schema::parse("id:int, email:string, active:bool").unwrap();
    /// assert_eq!(schema.fields().len(), 3);
    /// assert_eq!(schema.fields()[1].kind, FieldKind::FixedString);
    /// assert_eq!(schema.width(), 4 + 255 + 1);
    /// ```
    pub fn parse(spec: &str) -> Result<Self, SalvageError> {
        let mut fields = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, kind) = part.split_once(':').ok_or_else(|| {
                SalvageError::Parse(format!(
                    "Field '{}' is missing a kind (expected name:kind)",
                    part
                ))
            })?;
            fields.push(Field {
                name: name.trim().to_string(),
                kind: kind.parse()?,
            });
        }
        Self::new(fields)
    }

    /// Parse a JSON schema document.
    pub fn from_json(json: &str) -> Result<Self, SalvageError> {
        serde_json::from_str(json)
            .map_err(|e| SalvageError::Parse(format!("Invalid schema JSON: {}", e)))
    }

    /// Read and parse a JSON schema file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SalvageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SalvageError::Io(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Layout of the `wp_newsletter` table this tool was first pointed at.
    pub fn wp_newsletter() -> Self {
        let fields = [
            ("id", FieldKind::Integer),
            ("email", FieldKind::FixedString),
            ("list_1", FieldKind::Boolean),
            ("list_2", FieldKind::Boolean),
            ("profile_1", FieldKind::FixedString),
            ("profile_2", FieldKind::FixedString),
        ]
        .into_iter()
        .map(|(name, kind)| Field {
            name: name.to_string(),
            kind,
        })
        .collect::<Vec<_>>();
        let width = fields.iter().map(|f| f.kind.width()).sum();
        Schema { fields, width }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total record width in bytes (sum of the field widths).
    pub fn width(&self) -> usize {
        self.width
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", field.name, field.kind)?;
        }
        Ok(())
    }
}
