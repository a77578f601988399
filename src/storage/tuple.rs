//! Tuples, fields, and schemas.
//!
//! A [`Tuple`] is a fixed-width record conforming to a [`Schema`]: an
//! ordered sequence of typed fields. Rows serialize to exactly
//! `Schema::row_bytes` bytes, which is what makes the slotted page
//! layout in [`heap_page`](crate::storage::heap_page) possible.

use std::fmt;

use crate::common::{Error, RecordId, Result};

/// The type of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit signed integer, 8 bytes little-endian.
    Int,
    /// UTF-8 string of at most `n` bytes: a 2-byte little-endian
    /// length prefix followed by `n` bytes, zero-padded.
    Text(usize),
}

impl FieldType {
    /// Serialized width of a value of this type, in bytes.
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            FieldType::Int => 8,
            FieldType::Text(n) => 2 + n,
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i64),
    Text(String),
}

impl Field {
    /// Check that this value fits a column of the given type.
    fn matches(&self, ty: FieldType) -> bool {
        match (self, ty) {
            (Field::Int(_), FieldType::Int) => true,
            (Field::Text(s), FieldType::Text(n)) => s.len() <= n,
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// An ordered sequence of column types; the shape of one table's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldType>,
}

impl Schema {
    /// Create a schema from an ordered list of column types.
    ///
    /// # Panics
    /// Panics if `fields` is empty: a zero-width row has no slot math.
    pub fn new(fields: Vec<FieldType>) -> Self {
        assert!(!fields.is_empty(), "schema must have at least one field");
        Schema { fields }
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Type of column `i`.
    #[inline]
    pub fn field_type(&self, i: usize) -> Option<FieldType> {
        self.fields.get(i).copied()
    }

    /// Iterate over the column types in order.
    pub fn field_types(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.fields.iter().copied()
    }

    /// Serialized row width in bytes: the sum of all column widths.
    pub fn row_bytes(&self) -> usize {
        self.fields.iter().map(FieldType::width).sum()
    }

    /// Check that a tuple's values conform to this schema.
    ///
    /// # Errors
    /// Returns `Error::SchemaMismatch` on arity or type disagreement,
    /// or when a text value exceeds its column's byte budget.
    pub fn check(&self, tuple: &Tuple) -> Result<()> {
        if tuple.fields.len() != self.fields.len() {
            return Err(Error::SchemaMismatch);
        }
        for (value, &ty) in tuple.fields.iter().zip(&self.fields) {
            if !value.matches(ty) {
                return Err(Error::SchemaMismatch);
            }
        }
        Ok(())
    }

    /// Serialize a tuple into `out`, which must be exactly
    /// `row_bytes()` long.
    pub fn encode(&self, tuple: &Tuple, out: &mut [u8]) -> Result<()> {
        self.check(tuple)?;
        debug_assert_eq!(out.len(), self.row_bytes());

        let mut offset = 0;
        for (value, &ty) in tuple.fields.iter().zip(&self.fields) {
            let width = ty.width();
            let dst = &mut out[offset..offset + width];
            match (value, ty) {
                (Field::Int(v), FieldType::Int) => {
                    dst.copy_from_slice(&v.to_le_bytes());
                }
                (Field::Text(s), FieldType::Text(_)) => {
                    let bytes = s.as_bytes();
                    dst.fill(0);
                    dst[..2].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
                    dst[2..2 + bytes.len()].copy_from_slice(bytes);
                }
                _ => return Err(Error::SchemaMismatch),
            }
            offset += width;
        }
        Ok(())
    }

    /// Deserialize a tuple from `bytes`, which must be exactly
    /// `row_bytes()` long.
    pub fn decode(&self, bytes: &[u8]) -> Tuple {
        debug_assert_eq!(bytes.len(), self.row_bytes());

        let mut fields = Vec::with_capacity(self.fields.len());
        let mut offset = 0;
        for &ty in &self.fields {
            let width = ty.width();
            let src = &bytes[offset..offset + width];
            match ty {
                FieldType::Int => {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(src);
                    fields.push(Field::Int(i64::from_le_bytes(buf)));
                }
                FieldType::Text(n) => {
                    let len = u16::from_le_bytes([src[0], src[1]]) as usize;
                    let len = len.min(n);
                    let s = String::from_utf8_lossy(&src[2..2 + len]).into_owned();
                    fields.push(Field::Text(s));
                }
            }
            offset += width;
        }
        Tuple::new(fields)
    }
}

/// A fixed-width record.
///
/// `record_id` is `None` until the tuple is stored; inserts and scans
/// fill it in so the tuple can be located again for delete/update.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a tuple from its field values. Not yet stored anywhere.
    pub fn new(fields: Vec<Field>) -> Self {
        Tuple {
            fields,
            record_id: None,
        }
    }

    /// The field values in column order.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value of column `i`.
    #[inline]
    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields.get(i)
    }

    /// Where this tuple is stored, if it has been stored.
    #[inline]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Record where this tuple lives. Called by insert and by scans.
    #[inline]
    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ")")
    }
}
