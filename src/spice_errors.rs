use std::time::Duration;

use thiserror::Error;

use crate::{native::NativeError, type_tag::TypeTag};

#[derive(Error, Debug)]
pub enum SpiceError {
    #[error("Invalid cell data type code: {0}")]
    InvalidType(i32),

    #[error("Cell capacity exceeded: all {capacity} slots are in use")]
    CapacityExceeded { capacity: usize },

    #[error("Invalid cardinality {requested} for a cell of capacity {capacity}")]
    Cardinality { requested: i64, capacity: usize },

    #[error("Cannot store a {found} value in a {expected} cell")]
    ValueMismatch {
        expected: TypeTag,
        found: &'static str,
    },

    #[error("Expected a {expected} cell, got a {found} cell")]
    CellTypeMismatch { expected: TypeTag, found: TypeTag },

    #[error(
        "Segment summary declares {declared} columns but holds {names} names and {descriptors} descriptors"
    )]
    ColumnMismatch {
        declared: usize,
        names: usize,
        descriptors: usize,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Native call {context} failed: {error}")]
    NativeCall { context: String, error: NativeError },

    #[error("The native toolkit is already in use by another session")]
    ToolkitBusy,

    #[error("String cannot be passed to the native toolkit: {0}")]
    InvalidString(String),

    #[error("Unexpected response during step '{step}'")]
    AutomationProtocol { step: String, transcript: String },

    #[error("Timeout after {timeout:?} during step '{step}'")]
    AutomationTimeout { step: String, timeout: Duration },

    #[error("Invalid dialogue pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl PartialEq for SpiceError {
    fn eq(&self, other: &Self) -> bool {
        use SpiceError::*;
        match (self, other) {
            (InvalidType(a), InvalidType(b)) => a == b,
            (CapacityExceeded { capacity: a }, CapacityExceeded { capacity: b }) => a == b,
            (
                Cardinality {
                    requested: r1,
                    capacity: c1,
                },
                Cardinality {
                    requested: r2,
                    capacity: c2,
                },
            ) => r1 == r2 && c1 == c2,
            (
                ValueMismatch {
                    expected: e1,
                    found: f1,
                },
                ValueMismatch {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (
                CellTypeMismatch {
                    expected: e1,
                    found: f1,
                },
                CellTypeMismatch {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (
                ColumnMismatch {
                    declared: d1,
                    names: n1,
                    descriptors: s1,
                },
                ColumnMismatch {
                    declared: d2,
                    names: n2,
                    descriptors: s2,
                },
            ) => d1 == d2 && n1 == n2 && s1 == s2,
            (InvalidRecord(a), InvalidRecord(b)) => a == b,
            (
                NativeCall {
                    context: c1,
                    error: e1,
                },
                NativeCall {
                    context: c2,
                    error: e2,
                },
            ) => c1 == c2 && e1 == e2,
            (InvalidString(a), InvalidString(b)) => a == b,
            (AutomationProtocol { step: a, .. }, AutomationProtocol { step: b, .. }) => a == b,
            (
                AutomationTimeout {
                    step: s1,
                    timeout: t1,
                },
                AutomationTimeout {
                    step: s2,
                    timeout: t2,
                },
            ) => s1 == s2 && t1 == t2,
            (Pattern(a), Pattern(b)) => a == b,

            // foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (ReqwestError(_), ReqwestError(_)) => true,

            (ToolkitBusy, ToolkitBusy) => true,

            _ => false,
        }
    }
}
