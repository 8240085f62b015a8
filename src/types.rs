//! Cell-level data model.
//!
//! Every destination leaf field has a [`CellKind`]. Converters turn raw cell text into a typed
//! [`Value`] of that kind, and [`FieldValue::assign`] writes the value into the record field.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

/// Timestamp type produced by the timestamp converter.
///
/// Date-only and offset-less layouts are interpreted as UTC.
pub type Timestamp = DateTime<FixedOffset>;

/// Semantic type of a destination leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Str,
    Timestamp,
}

impl CellKind {
    /// Rust spelling of the kind, used in error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            CellKind::Bool => "bool",
            CellKind::I8 => "i8",
            CellKind::I16 => "i16",
            CellKind::I32 => "i32",
            CellKind::I64 => "i64",
            CellKind::Isize => "isize",
            CellKind::U8 => "u8",
            CellKind::U16 => "u16",
            CellKind::U32 => "u32",
            CellKind::U64 => "u64",
            CellKind::Usize => "usize",
            CellKind::F32 => "f32",
            CellKind::F64 => "f64",
            CellKind::Str => "String",
            CellKind::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A converted cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Str(String),
    Timestamp(Timestamp),
}

impl Value {
    /// The kind this value was converted as.
    pub fn kind(&self) -> CellKind {
        match self {
            Value::Bool(_) => CellKind::Bool,
            Value::I8(_) => CellKind::I8,
            Value::I16(_) => CellKind::I16,
            Value::I32(_) => CellKind::I32,
            Value::I64(_) => CellKind::I64,
            Value::Isize(_) => CellKind::Isize,
            Value::U8(_) => CellKind::U8,
            Value::U16(_) => CellKind::U16,
            Value::U32(_) => CellKind::U32,
            Value::U64(_) => CellKind::U64,
            Value::Usize(_) => CellKind::Usize,
            Value::F32(_) => CellKind::F32,
            Value::F64(_) => CellKind::F64,
            Value::Str(_) => CellKind::Str,
            Value::Timestamp(_) => CellKind::Timestamp,
        }
    }
}

/// A record field type the converters can fill.
///
/// Implemented for every scalar kind and for `Option` of each; the `Option` form is the
/// optional ("pointer") variant that stays `None` when its cell is empty.
pub trait FieldValue: 'static {
    const KIND: CellKind;
    const OPTIONAL: bool;

    /// Store a converted value. Values of a different kind are ignored.
    fn assign(&mut self, value: Value);
}

macro_rules! field_values {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: CellKind = CellKind::$variant;
                const OPTIONAL: bool = false;

                fn assign(&mut self, value: Value) {
                    if let Value::$variant(v) = value {
                        *self = v;
                    }
                }
            }

            impl FieldValue for Option<$ty> {
                const KIND: CellKind = CellKind::$variant;
                const OPTIONAL: bool = true;

                fn assign(&mut self, value: Value) {
                    if let Value::$variant(v) = value {
                        *self = Some(v);
                    }
                }
            }
        )*
    };
}

field_values!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => Str,
    Timestamp => Timestamp,
);

impl FieldValue for DateTime<Utc> {
    const KIND: CellKind = CellKind::Timestamp;
    const OPTIONAL: bool = false;

    fn assign(&mut self, value: Value) {
        if let Value::Timestamp(ts) = value {
            *self = ts.with_timezone(&Utc);
        }
    }
}

impl FieldValue for Option<DateTime<Utc>> {
    const KIND: CellKind = CellKind::Timestamp;
    const OPTIONAL: bool = true;

    fn assign(&mut self, value: Value) {
        if let Value::Timestamp(ts) = value {
            *self = Some(ts.with_timezone(&Utc));
        }
    }
}
