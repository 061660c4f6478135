use std::fmt;

use hifitime::Epoch;

use crate::time::epoch_to_et;

/// A single element read from, or appended to, a [`Cell`](crate::cell::Cell).
///
/// `Time` values are ephemeris seconds past J2000 (TDB), the representation
/// used by the native toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Character(String),
    Double(f64),
    Integer(i32),
    Time(f64),
    Boolean(bool),
}

impl CellValue {
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Character(_) => "character",
            CellValue::Double(_) => "double precision",
            CellValue::Integer(_) => "integer",
            CellValue::Time(_) => "time",
            CellValue::Boolean(_) => "boolean",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Character(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Double(x) | CellValue::Time(x) => Some(*x),
            CellValue::Integer(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Character(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Character(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Double(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<Epoch> for CellValue {
    fn from(value: Epoch) -> Self {
        CellValue::Time(epoch_to_et(&value))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Character(s) => write!(f, "'{s}'"),
            CellValue::Double(x) | CellValue::Time(x) => write!(f, "{x}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}
