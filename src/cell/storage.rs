//! Contiguous typed storage backing a [`Cell`](crate::cell::Cell).
//!
//! The buffer holds the control area followed by the data area, exactly as
//! CSPICE lays out a cell: `base` points to slot 0 and `data` to slot
//! [`CELL_CTRL_SIZE`]. Character elements are stored as fixed-width byte
//! runs, every other type as one native scalar per slot.

use std::{ffi::c_void, iter};

use crate::{
    cell::value::CellValue,
    constants::{CELL_CTRL_SIZE, SPICE_FALSE, SPICE_TRUE},
    spice_errors::SpiceError,
    type_tag::TypeTag,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellStorage {
    Character { width: usize, bytes: Vec<u8> },
    Double(Vec<f64>),
    Integer(Vec<i32>),
    Time(Vec<f64>),
    Boolean(Vec<i32>),
}

impl CellStorage {
    /// Allocate `CELL_CTRL_SIZE + capacity` slots filled with the default value of `tag`.
    ///
    /// `width` is only read for character storage and must already be clamped.
    pub(crate) fn with_defaults(tag: TypeTag, capacity: usize, width: usize) -> Self {
        let slots = CELL_CTRL_SIZE + capacity;
        match tag {
            TypeTag::Character => {
                let blank = iter::repeat(b' ').take(width - 1).chain(iter::once(0u8));
                let bytes = blank.cycle().take(slots * width).collect();
                CellStorage::Character { width, bytes }
            }
            TypeTag::DoublePrecision => CellStorage::Double(vec![0.0; slots]),
            TypeTag::Integer => CellStorage::Integer(vec![0; slots]),
            TypeTag::Time => CellStorage::Time(vec![0.0; slots]),
            TypeTag::Boolean => CellStorage::Boolean(vec![SPICE_TRUE; slots]),
        }
    }

    pub(crate) fn tag(&self) -> TypeTag {
        match self {
            CellStorage::Character { .. } => TypeTag::Character,
            CellStorage::Double(_) => TypeTag::DoublePrecision,
            CellStorage::Integer(_) => TypeTag::Integer,
            CellStorage::Time(_) => TypeTag::Time,
            CellStorage::Boolean(_) => TypeTag::Boolean,
        }
    }

    pub(crate) fn text_slot(&self, slot: usize) -> Option<&[u8]> {
        match self {
            CellStorage::Character { width, bytes } => bytes.get(slot * width..(slot + 1) * width),
            _ => None,
        }
    }

    pub(crate) fn read(&self, slot: usize) -> Option<CellValue> {
        match self {
            CellStorage::Character { .. } => {
                let raw = self.text_slot(slot)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                Some(CellValue::Character(
                    String::from_utf8_lossy(&raw[..end]).into_owned(),
                ))
            }
            CellStorage::Double(v) => v.get(slot).copied().map(CellValue::Double),
            CellStorage::Time(v) => v.get(slot).copied().map(CellValue::Time),
            CellStorage::Integer(v) => v.get(slot).copied().map(CellValue::Integer),
            CellStorage::Boolean(v) => v
                .get(slot)
                .map(|&b| CellValue::Boolean(b != SPICE_FALSE)),
        }
    }

    /// Check that `value` can be stored here, without writing anything.
    pub(crate) fn accepts(&self, value: &CellValue) -> Result<(), SpiceError> {
        let compatible = match (self, value) {
            (CellStorage::Character { .. }, CellValue::Character(_)) => true,
            (
                CellStorage::Double(_) | CellStorage::Time(_) | CellStorage::Integer(_),
                CellValue::Double(_) | CellValue::Time(_) | CellValue::Integer(_),
            ) => true,
            (CellStorage::Boolean(_), CellValue::Boolean(_) | CellValue::Integer(_)) => true,
            _ => false,
        };
        if compatible {
            Ok(())
        } else {
            Err(SpiceError::ValueMismatch {
                expected: self.tag(),
                found: value.kind(),
            })
        }
    }

    /// Convert and store `value` in `slot`.
    ///
    /// Text is truncated to `width - 1` bytes on a character boundary and
    /// padded with NUL bytes up to `width`.
    pub(crate) fn write(&mut self, slot: usize, value: &CellValue) -> Result<(), SpiceError> {
        self.accepts(value)?;
        match (self, value) {
            (CellStorage::Character { width, bytes }, CellValue::Character(text)) => {
                let target = &mut bytes[slot * *width..(slot + 1) * *width];
                let mut end = text.len().min(*width - 1);
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                target[..end].copy_from_slice(&text.as_bytes()[..end]);
                target[end..].fill(0);
            }
            (CellStorage::Double(v) | CellStorage::Time(v), value) => {
                v[slot] = match value {
                    CellValue::Integer(i) => f64::from(*i),
                    CellValue::Double(x) | CellValue::Time(x) => *x,
                    _ => unreachable!("rejected by accepts"),
                };
            }
            (CellStorage::Integer(v), value) => {
                v[slot] = match value {
                    CellValue::Integer(i) => *i,
                    CellValue::Double(x) | CellValue::Time(x) => *x as i32,
                    _ => unreachable!("rejected by accepts"),
                };
            }
            (CellStorage::Boolean(v), value) => {
                let flag = match value {
                    CellValue::Boolean(b) => *b,
                    CellValue::Integer(i) => *i != 0,
                    _ => unreachable!("rejected by accepts"),
                };
                v[slot] = if flag { SPICE_TRUE } else { SPICE_FALSE };
            }
            _ => unreachable!("rejected by accepts"),
        }
        Ok(())
    }

    pub(crate) fn base_ptr(&mut self) -> *mut c_void {
        match self {
            CellStorage::Character { bytes, .. } => bytes.as_mut_ptr().cast(),
            CellStorage::Double(v) | CellStorage::Time(v) => v.as_mut_ptr().cast(),
            CellStorage::Integer(v) | CellStorage::Boolean(v) => v.as_mut_ptr().cast(),
        }
    }

    pub(crate) fn data_ptr(&mut self) -> *mut c_void {
        match self {
            CellStorage::Character { width, bytes } => {
                bytes[CELL_CTRL_SIZE * *width..].as_mut_ptr().cast()
            }
            CellStorage::Double(v) | CellStorage::Time(v) => {
                v[CELL_CTRL_SIZE..].as_mut_ptr().cast()
            }
            CellStorage::Integer(v) | CellStorage::Boolean(v) => {
                v[CELL_CTRL_SIZE..].as_mut_ptr().cast()
            }
        }
    }

    pub(crate) fn doubles(&self) -> Option<&[f64]> {
        match self {
            CellStorage::Double(v) | CellStorage::Time(v) => Some(&v[CELL_CTRL_SIZE..]),
            _ => None,
        }
    }

    pub(crate) fn doubles_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            CellStorage::Double(v) | CellStorage::Time(v) => Some(&mut v[CELL_CTRL_SIZE..]),
            _ => None,
        }
    }

    pub(crate) fn integers(&self) -> Option<&[i32]> {
        match self {
            CellStorage::Integer(v) => Some(&v[CELL_CTRL_SIZE..]),
            _ => None,
        }
    }

    pub(crate) fn integers_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            CellStorage::Integer(v) => Some(&mut v[CELL_CTRL_SIZE..]),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            CellStorage::Character { width, bytes } => Some(&mut bytes[CELL_CTRL_SIZE * *width..]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod storage_test {
    use super::*;

    #[test]
    fn test_default_layout() {
        let storage = CellStorage::with_defaults(TypeTag::Character, 2, 6);
        assert!(matches!(&storage, CellStorage::Character { bytes, .. } if bytes.len() == 8 * 6));
        assert_eq!(storage.text_slot(7), Some(&b"     \0"[..]));
        assert_eq!(storage.text_slot(8), None);

        let storage = CellStorage::with_defaults(TypeTag::Boolean, 3, 0);
        assert_eq!(storage.read(8), Some(CellValue::Boolean(true)));
        assert_eq!(storage.read(9), None);
    }

    #[test]
    fn test_write_truncates_on_char_boundary() {
        let mut storage = CellStorage::with_defaults(TypeTag::Character, 1, 6);
        storage
            .write(CELL_CTRL_SIZE, &CellValue::Character("abcdé".into()))
            .unwrap();
        // 'é' is two bytes and would straddle the terminator
        assert_eq!(storage.text_slot(CELL_CTRL_SIZE), Some(&b"abcd\0\0"[..]));
    }

    #[test]
    fn test_numeric_conversion() {
        let mut storage = CellStorage::with_defaults(TypeTag::Integer, 1, 0);
        storage
            .write(CELL_CTRL_SIZE, &CellValue::Double(-99.7))
            .unwrap();
        assert_eq!(storage.integers(), Some(&[-99][..]));

        let mut storage = CellStorage::with_defaults(TypeTag::Boolean, 1, 0);
        storage
            .write(CELL_CTRL_SIZE, &CellValue::Integer(0))
            .unwrap();
        assert_eq!(storage.read(CELL_CTRL_SIZE), Some(CellValue::Boolean(false)));
    }

    #[test]
    fn test_mismatch_leaves_slot() {
        let mut storage = CellStorage::with_defaults(TypeTag::DoublePrecision, 1, 0);
        let err = storage
            .write(CELL_CTRL_SIZE, &CellValue::Character("x".into()))
            .unwrap_err();
        assert_eq!(
            err,
            SpiceError::ValueMismatch {
                expected: TypeTag::DoublePrecision,
                found: "character"
            }
        );
        assert_eq!(storage.doubles(), Some(&[0.0][..]));
    }
}
