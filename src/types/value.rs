//! Scalar field kinds and decoded values.
//!
//! All multi-byte fields in this protocol family are big-endian on the wire.

use serde::{Deserialize, Serialize};

/// Wire kind of a fixed-header field or tail element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit big-endian.
    U16,
    /// Signed 16-bit big-endian.
    I16,
    /// Unsigned 32-bit big-endian.
    U32,
}

impl FieldKind {
    /// Byte width of this kind on the wire.
    pub fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 => 4,
        }
    }

    /// Decode one value of this kind from the start of `bytes`.
    ///
    /// Callers guarantee `bytes.len() >= self.width()`; the decoder checks
    /// frame length before unpacking.
    pub(crate) fn read(self, bytes: &[u8]) -> Value {
        match self {
            FieldKind::U8 => Value::U8(bytes[0]),
            FieldKind::U16 => Value::U16(u16::from_be_bytes([bytes[0], bytes[1]])),
            FieldKind::I16 => Value::I16(i16::from_be_bytes([bytes[0], bytes[1]])),
            FieldKind::U32 => {
                Value::U32(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }
}

/// A decoded scalar field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    U8(u8),
    U16(u16),
    I16(i16),
    U32(u32),
}

impl Value {
    /// The value as an unsigned 8-bit integer, if it is one.
    pub fn as_u8(self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(v),
            _ => None,
        }
    }

    /// The value as an unsigned 16-bit integer, if it is one.
    pub fn as_u16(self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a signed 16-bit integer, if it is one.
    pub fn as_i16(self) -> Option<i16> {
        match self {
            Value::I16(v) => Some(v),
            _ => None,
        }
    }

    /// The value as an unsigned 32-bit integer, if it is one.
    pub fn as_u32(self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    /// The value widened to `i64`, whatever its wire kind.
    pub fn as_i64(self) -> i64 {
        match self {
            Value::U8(v) => v as i64,
            Value::U16(v) => v as i64,
            Value::I16(v) => v as i64,
            Value::U32(v) => v as i64,
        }
    }
}
