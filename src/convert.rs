//! Cell converter registry.
//!
//! One conversion function per [`CellKind`], resolved once when a record schema is compiled
//! (see [`Converter::for_kind`]) rather than per cell. Every converter is reached through
//! [`Converter::convert`], which short-circuits empty cells to "absent" without parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{CellFault, ConvertError, InvalidTimestampError, ParseFault};
use crate::types::{CellKind, Timestamp, Value};

/// Built-in timestamp layouts (chrono strftime syntax), tried after any caller-supplied ones.
pub const DEFAULT_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S %z"];

type ParseFn = fn(&str, &[String]) -> Result<Value, CellFault>;

/// Conversion strategy for one destination kind.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    kind: CellKind,
    parse: ParseFn,
}

impl Converter {
    /// Look up the converter registered for `kind`.
    pub fn for_kind(kind: CellKind) -> Self {
        let parse: ParseFn = match kind {
            CellKind::Bool => parse_bool,
            CellKind::I8 => parse_i8,
            CellKind::I16 => parse_i16,
            CellKind::I32 => parse_i32,
            CellKind::I64 => parse_i64,
            CellKind::Isize => parse_isize,
            CellKind::U8 => parse_u8,
            CellKind::U16 => parse_u16,
            CellKind::U32 => parse_u32,
            CellKind::U64 => parse_u64,
            CellKind::Usize => parse_usize,
            CellKind::F32 => parse_f32,
            CellKind::F64 => parse_f64,
            CellKind::Str => parse_string,
            CellKind::Timestamp => parse_timestamp_cell,
        };
        Self { kind, parse }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Convert `raw` cell text.
    ///
    /// Returns `Ok(None)` for the empty string (field stays at its default), `Ok(Some(_))` for a
    /// successful conversion.
    pub fn convert(&self, raw: &str, layouts: &[String]) -> Result<Option<Value>, CellFault> {
        if raw.is_empty() {
            return Ok(None);
        }
        (self.parse)(raw, layouts).map(Some)
    }
}

/// The full, ordered layout list: caller layouts, then extras, then the built-in defaults.
pub fn datetime_layouts(caller: &[String], extra: &[String]) -> Vec<String> {
    caller
        .iter()
        .chain(extra)
        .cloned()
        .chain(DEFAULT_DATETIME_FORMATS.iter().map(|s| s.to_string()))
        .collect()
}

/// Parse a timestamp with the first matching layout.
///
/// Each layout is tried as offset-aware, then as a naive date-time (UTC), then as a naive date
/// (midnight UTC).
pub fn parse_timestamp(raw: &str, layouts: &[String]) -> Result<Timestamp, InvalidTimestampError> {
    for layout in layouts {
        if let Ok(ts) = DateTime::parse_from_str(raw, layout) {
            return Ok(ts);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(naive.and_utc().fixed_offset());
        }
        if let Some(midnight) = NaiveDate::parse_from_str(raw, layout)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(midnight.and_utc().fixed_offset());
        }
    }
    Err(InvalidTimestampError {
        raw: raw.to_string(),
        formats: layouts.to_vec(),
    })
}

/// Parse a boolean literal (case-insensitive).
pub fn parse_bool_literal(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_bool(raw: &str, _: &[String]) -> Result<Value, CellFault> {
    parse_bool_literal(raw)
        .map(Value::Bool)
        .ok_or_else(|| ConvertError::new(raw, CellKind::Bool, ParseFault::Bool).into())
}

macro_rules! integer_parsers {
    ($($name:ident: $ty:ty => $variant:ident),* $(,)?) => {
        $(
            fn $name(raw: &str, _: &[String]) -> Result<Value, CellFault> {
                raw.parse::<$ty>()
                    .map(Value::$variant)
                    .map_err(|e| ConvertError::new(raw, CellKind::$variant, e).into())
            }
        )*
    };
}

integer_parsers!(
    parse_i8: i8 => I8,
    parse_i16: i16 => I16,
    parse_i32: i32 => I32,
    parse_i64: i64 => I64,
    parse_isize: isize => Isize,
    parse_u8: u8 => U8,
    parse_u16: u16 => U16,
    parse_u32: u32 => U32,
    parse_u64: u64 => U64,
    parse_usize: usize => Usize,
);

fn parse_f32(raw: &str, _: &[String]) -> Result<Value, CellFault> {
    let v = raw
        .parse::<f32>()
        .map_err(|e| ConvertError::new(raw, CellKind::F32, e))?;
    check_float_range(raw, v.is_infinite(), CellKind::F32)?;
    Ok(Value::F32(v))
}

fn parse_f64(raw: &str, _: &[String]) -> Result<Value, CellFault> {
    let v = raw
        .parse::<f64>()
        .map_err(|e| ConvertError::new(raw, CellKind::F64, e))?;
    check_float_range(raw, v.is_infinite(), CellKind::F64)?;
    Ok(Value::F64(v))
}

// Rust float parsing saturates to infinity; only explicit infinity literals may produce one.
fn check_float_range(raw: &str, infinite: bool, kind: CellKind) -> Result<(), ConvertError> {
    let literal = raw.trim_start_matches(['+', '-']).to_ascii_lowercase();
    if infinite && !literal.starts_with("inf") {
        return Err(ConvertError::new(raw, kind, ParseFault::OutOfRange(kind)));
    }
    Ok(())
}

fn parse_string(raw: &str, _: &[String]) -> Result<Value, CellFault> {
    Ok(Value::Str(raw.to_string()))
}

fn parse_timestamp_cell(raw: &str, layouts: &[String]) -> Result<Value, CellFault> {
    Ok(Value::Timestamp(parse_timestamp(raw, layouts)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        datetime_layouts(&[], &[])
    }

    fn convert(kind: CellKind, raw: &str) -> Result<Option<Value>, CellFault> {
        Converter::for_kind(kind).convert(raw, &defaults())
    }

    #[test]
    fn empty_cell_is_absent_for_every_kind() {
        let kinds = [
            CellKind::Bool,
            CellKind::I8,
            CellKind::I64,
            CellKind::U16,
            CellKind::Usize,
            CellKind::F32,
            CellKind::F64,
            CellKind::Str,
            CellKind::Timestamp,
        ];
        for kind in kinds {
            assert_eq!(convert(kind, "").unwrap(), None, "kind {kind}");
        }
    }

    #[test]
    fn integers_respect_destination_width() {
        assert_eq!(convert(CellKind::I8, "127").unwrap(), Some(Value::I8(i8::MAX)));
        assert_eq!(convert(CellKind::I8, "-128").unwrap(), Some(Value::I8(i8::MIN)));
        assert_eq!(convert(CellKind::U64, &u64::MAX.to_string()).unwrap(), Some(Value::U64(u64::MAX)));

        let err = convert(CellKind::I8, "200").unwrap_err();
        match err {
            CellFault::Convert(e) => {
                assert_eq!(e.kind, CellKind::I8);
                assert_eq!(e.raw, "200");
                assert!(matches!(e.fault, ParseFault::Int(_)));
            }
            other => panic!("unexpected fault: {other:?}"),
        }
        assert!(convert(CellKind::U8, "-1").is_err());
        assert!(convert(CellKind::I32, "1.5").is_err());
    }

    #[test]
    fn floats_reject_overflow_but_accept_boundaries() {
        assert_eq!(
            convert(CellKind::F32, &f32::MAX.to_string()).unwrap(),
            Some(Value::F32(f32::MAX))
        );
        assert_eq!(convert(CellKind::F64, "2.5").unwrap(), Some(Value::F64(2.5)));
        assert_eq!(
            convert(CellKind::F32, "inf").unwrap(),
            Some(Value::F32(f32::INFINITY))
        );

        let err = convert(CellKind::F32, "1e40").unwrap_err();
        assert!(matches!(
            err,
            CellFault::Convert(ConvertError {
                fault: ParseFault::OutOfRange(CellKind::F32),
                ..
            })
        ));
        assert!(convert(CellKind::F64, "abc").is_err());
    }

    #[test]
    fn bools_accept_conventional_spellings() {
        for raw in ["true", "TRUE", "True", "t", "1", "yes", "Y"] {
            assert_eq!(convert(CellKind::Bool, raw).unwrap(), Some(Value::Bool(true)), "{raw}");
        }
        for raw in ["false", "False", "F", "0", "no", "n"] {
            assert_eq!(convert(CellKind::Bool, raw).unwrap(), Some(Value::Bool(false)), "{raw}");
        }
        assert!(convert(CellKind::Bool, "maybe").is_err());
    }

    #[test]
    fn strings_never_fail() {
        assert_eq!(
            convert(CellKind::Str, " padded ").unwrap(),
            Some(Value::Str(" padded ".to_string()))
        );
    }

    #[test]
    fn timestamps_use_default_layouts() {
        let ts = parse_timestamp("2021-03-09", &defaults()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-09T00:00:00+00:00");

        let ts = parse_timestamp("2024-12-19 17:35:08", &defaults()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-12-19T17:35:08+00:00");

        let ts = parse_timestamp("2024-12-19 17:35:08 +0200", &defaults()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-12-19T17:35:08+02:00");
    }

    #[test]
    fn caller_layouts_are_tried_first() {
        let layouts = datetime_layouts(&["%d.%m.%Y".to_string()], &["%m/%d/%Y".to_string()]);
        assert_eq!(layouts[0], "%d.%m.%Y");
        assert_eq!(layouts[1], "%m/%d/%Y");
        assert_eq!(&layouts[2..], &DEFAULT_DATETIME_FORMATS.map(String::from)[..]);

        let ts = parse_timestamp("6.1.2016", &layouts).unwrap();
        assert_eq!(ts.to_rfc3339(), "2016-01-06T00:00:00+00:00");
        let ts = parse_timestamp("01/06/2016", &layouts).unwrap();
        assert_eq!(ts.to_rfc3339(), "2016-01-06T00:00:00+00:00");
    }

    #[test]
    fn invalid_timestamp_lists_every_layout_in_order() {
        let layouts = datetime_layouts(&["%d.%m.%Y".to_string()], &[]);
        let err = parse_timestamp("invalid", &layouts).unwrap_err();
        assert_eq!(err.raw, "invalid");
        assert_eq!(err.formats, layouts);
    }
}
