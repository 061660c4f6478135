//! # Typed cells
//!
//! This module defines [`Cell`], the bounded, type-tagged container used to
//! pass sets, windows and arrays across the native boundary.
//!
//! ## Memory contract
//!
//! A cell mirrors CSPICE's `SpiceCell`:
//!
//! ```text
//! Cell
//! ├── tag, capacity, element width     (fixed at construction)
//! ├── cardinality                      (0 ..= capacity)
//! ├── isSet / adjust / init flags
//! └── storage: [ control area (6 slots) | data (capacity slots) ]
//! ```
//!
//! The control area and the data share one contiguous buffer, so the native
//! side can read and write both in place through a
//! [`NativeCell`](crate::native::native_cell::NativeCell) view.
//!
//! ## Defaults
//!
//! | Type            | Default slot value                      |
//! |-----------------|-----------------------------------------|
//! | Character       | `width - 1` blanks followed by one NUL   |
//! | DoublePrecision | `0.0`                                   |
//! | Integer         | `0`                                     |
//! | Time            | `0.0`                                   |
//! | Boolean         | `true`                                  |
//!
//! ## Usage
//!
//! ```rust
//! use spicebridge::cell::Cell;
//! use spicebridge::type_tag::TypeTag;
//!
//! let mut ids = Cell::new(TypeTag::Integer, 4);
//! ids.set_cardinality(2).unwrap();
//! ids.append(-99).unwrap();
//!
//! assert_eq!(ids.cardinality(), 3);
//! assert_eq!(ids.as_integers().unwrap()[2], -99);
//! assert!(ids.is_initialized());
//! ```

use std::fmt;

use hifitime::Epoch;
use itertools::Itertools;

use crate::{
    constants::{CELL_CTRL_SIZE, MIN_CHAR_LEN},
    native::native_cell::{NativeCell, NativeCellState},
    spice_errors::SpiceError,
    time::et_to_epoch,
    type_tag::TypeTag,
};

pub(crate) mod storage;
pub mod value;

use storage::CellStorage;
pub use value::CellValue;

/// Bounded, type-tagged container with a native-compatible control area.
///
/// Fields are private: the data area is only mutated through
/// [`append`](Cell::append), [`set_cardinality`](Cell::set_cardinality) and
/// native reconciliation, which keeps `cardinality <= capacity` at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    tag: TypeTag,
    width: usize,
    capacity: usize,
    cardinality: usize,
    is_set: bool,
    adjust: bool,
    init: bool,
    storage: CellStorage,
}

impl Cell {
    /// Create an empty cell of `capacity` elements.
    ///
    /// Character cells get the minimum element width of [`MIN_CHAR_LEN`] bytes.
    pub fn new(tag: TypeTag, capacity: usize) -> Self {
        Cell::with_width(tag, capacity, MIN_CHAR_LEN)
    }

    /// Create an empty cell with an explicit character element width.
    ///
    /// Arguments
    /// ---------
    /// * `tag`: kind of the elements
    /// * `capacity`: number of data slots, fixed for the cell lifetime
    /// * `width`: element width in bytes, terminator included. Only read for
    ///   [`TypeTag::Character`], where it is raised to at least [`MIN_CHAR_LEN`].
    ///
    /// Return
    /// ------
    /// * A cell with cardinality 0, all flags false and every slot holding
    ///   the default value of `tag`
    pub fn with_width(tag: TypeTag, capacity: usize, width: usize) -> Self {
        let width = match tag {
            TypeTag::Character => width.max(MIN_CHAR_LEN),
            _ => 0,
        };
        Cell {
            tag,
            width,
            capacity,
            cardinality: 0,
            is_set: false,
            adjust: false,
            init: false,
            storage: CellStorage::with_defaults(tag, capacity, width),
        }
    }

    /// Create a cell from a raw native type code.
    ///
    /// Fails with [`SpiceError::InvalidType`] when `code` is not one of the
    /// codes listed in [`TypeTag`].
    pub fn from_code(code: i32, capacity: usize, width: usize) -> Result<Self, SpiceError> {
        let tag = TypeTag::try_from(code)?;
        Ok(Cell::with_width(tag, capacity, width))
    }

    /// Build a fresh, empty cell shaped like `template`.
    ///
    /// The result has the type, capacity and element width of `template`,
    /// cardinality 0 and default values in every slot. Live values of
    /// `source` are not carried over; use [`Clone`] for a deep copy.
    pub fn copy(source: &Cell, template: &Cell) -> Cell {
        log::trace!(
            "shape copy of a {} cell ({} live elements discarded)",
            source.tag,
            source.cardinality
        );
        Cell::with_width(template.tag, template.capacity, template.width)
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Element width in bytes for character cells, 0 otherwise.
    pub fn element_width(&self) -> usize {
        self.width
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    pub fn is_full(&self) -> bool {
        self.cardinality == self.capacity
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub fn set_is_set(&mut self, is_set: bool) {
        self.is_set = is_set;
    }

    pub fn adjust(&self) -> bool {
        self.adjust
    }

    pub fn set_adjust(&mut self, adjust: bool) {
        self.adjust = adjust;
    }

    /// True once the cell has been mutated or synchronized with the native side.
    pub fn is_initialized(&self) -> bool {
        self.init
    }

    /// Append `value` after the last live element.
    ///
    /// Arguments
    /// ---------
    /// * `value`: anything convertible into a [`CellValue`]. Text is truncated
    ///   to `element_width - 1` bytes and padded with NUL bytes; numbers are
    ///   converted to the cell's native representation.
    ///
    /// Return
    /// ------
    /// * [`SpiceError::CapacityExceeded`] when the cell is full
    /// * [`SpiceError::ValueMismatch`] when the value cannot be stored in this cell type
    ///
    /// The cell is left untouched on error.
    pub fn append<V: Into<CellValue>>(&mut self, value: V) -> Result<(), SpiceError> {
        let value = value.into();
        if self.cardinality >= self.capacity {
            return Err(SpiceError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.storage.write(CELL_CTRL_SIZE + self.cardinality, &value)?;
        self.cardinality += 1;
        self.init = true;
        Ok(())
    }

    /// Declare the first `n` data slots live, whatever they contain.
    ///
    /// Fails with [`SpiceError::Cardinality`] if `n > capacity`.
    pub fn set_cardinality(&mut self, n: usize) -> Result<(), SpiceError> {
        if n > self.capacity {
            return Err(SpiceError::Cardinality {
                requested: n as i64,
                capacity: self.capacity,
            });
        }
        self.cardinality = n;
        self.init = true;
        Ok(())
    }

    /// Read data slot `index`, live or not.
    pub fn get(&self, index: usize) -> Option<CellValue> {
        if index >= self.capacity {
            return None;
        }
        self.storage.read(CELL_CTRL_SIZE + index)
    }

    /// Iterate over the live elements.
    pub fn iter(&self) -> impl Iterator<Item = CellValue> + '_ {
        (0..self.cardinality).filter_map(move |i| self.get(i))
    }

    /// Live elements of a time cell as epochs.
    pub fn epochs(&self) -> Option<Vec<Epoch>> {
        match self.tag {
            TypeTag::Time => self
                .storage
                .doubles()
                .map(|v| v[..self.cardinality].iter().map(|&et| et_to_epoch(et)).collect()),
            _ => None,
        }
    }

    /// Every data slot of a double precision or time cell.
    pub fn as_doubles(&self) -> Option<&[f64]> {
        self.storage.doubles()
    }

    /// Every data slot of an integer cell.
    pub fn as_integers(&self) -> Option<&[i32]> {
        self.storage.integers()
    }

    /// Raw bytes of data slot `index` of a character cell, padding included.
    pub fn text_slot(&self, index: usize) -> Option<&[u8]> {
        if index >= self.capacity {
            return None;
        }
        self.storage.text_slot(CELL_CTRL_SIZE + index)
    }

    pub fn control_header(&self) -> ControlHeader<'_> {
        ControlHeader {
            storage: &self.storage,
        }
    }

    /// Apply the control fields reported by the native side after a call.
    ///
    /// Fails with [`SpiceError::Cardinality`] if the reported cardinality is
    /// outside `0..=capacity`; the cell is then left unchanged.
    pub fn reconcile(&mut self, state: NativeCellState) -> Result<(), SpiceError> {
        let card = usize::try_from(state.card)
            .ok()
            .filter(|&c| c <= self.capacity)
            .ok_or(SpiceError::Cardinality {
                requested: i64::from(state.card),
                capacity: self.capacity,
            })?;
        self.cardinality = card;
        self.is_set = state.is_set;
        self.init = state.init;
        Ok(())
    }

    /// Lend the cell to a native call through a typed-buffer view, then
    /// reconcile the control fields written by the callee.
    pub(crate) fn with_native<R>(
        &mut self,
        call: impl FnOnce(&mut NativeCell<'_>) -> R,
    ) -> Result<R, SpiceError> {
        let to_int = |value: usize, what: &str| {
            i32::try_from(value).map_err(|_| {
                SpiceError::InvalidRecord(format!("cell {what} {value} exceeds SpiceInt"))
            })
        };
        let mut view = NativeCell::new(
            self.tag,
            to_int(self.width, "width")?,
            to_int(self.capacity, "capacity")?,
            to_int(self.cardinality, "cardinality")?,
            [self.is_set, self.adjust, self.init],
            &mut self.storage,
        );
        let result = call(&mut view);
        let state = view.state();
        self.reconcile(state)?;
        Ok(result)
    }
}

/// Read-only view of the 6-slot control area placed before the cell data.
#[derive(Debug, Clone, Copy)]
pub struct ControlHeader<'a> {
    storage: &'a CellStorage,
}

impl ControlHeader<'_> {
    pub fn len(&self) -> usize {
        CELL_CTRL_SIZE
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn slot(&self, index: usize) -> Option<CellValue> {
        if index >= CELL_CTRL_SIZE {
            return None;
        }
        self.storage.read(index)
    }

    pub fn slots(&self) -> Vec<CellValue> {
        (0..CELL_CTRL_SIZE).filter_map(|i| self.slot(i)).collect()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<SpiceCell: dtype={}, size={}, length={}, card={}, isSet={}, init={}, data=[{}]>",
            self.tag,
            self.capacity,
            self.width,
            self.cardinality,
            self.is_set,
            self.init,
            self.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod cell_test {
    use super::*;

    #[test]
    fn test_fresh_cell_defaults() {
        for tag in [
            TypeTag::Character,
            TypeTag::DoublePrecision,
            TypeTag::Integer,
            TypeTag::Time,
            TypeTag::Boolean,
        ] {
            let cell = Cell::new(tag, 5);
            assert_eq!(cell.tag(), tag);
            assert_eq!(cell.capacity(), 5);
            assert_eq!(cell.cardinality(), 0);
            assert!(!cell.is_set());
            assert!(!cell.adjust());
            assert!(!cell.is_initialized());

            let expected = match tag {
                TypeTag::Character => CellValue::Character("     ".into()),
                TypeTag::DoublePrecision => CellValue::Double(0.0),
                TypeTag::Integer => CellValue::Integer(0),
                TypeTag::Time => CellValue::Time(0.0),
                TypeTag::Boolean => CellValue::Boolean(true),
            };
            for i in 0..5 {
                assert_eq!(cell.get(i), Some(expected.clone()), "{tag} slot {i}");
            }
            assert_eq!(cell.get(5), None);
            assert_eq!(cell.control_header().slots(), vec![expected; 6]);
        }
    }

    #[test]
    fn test_width_clamping() {
        assert_eq!(Cell::with_width(TypeTag::Character, 2, 1).element_width(), 6);
        assert_eq!(Cell::with_width(TypeTag::Character, 2, 6).element_width(), 6);
        assert_eq!(Cell::with_width(TypeTag::Character, 2, 12).element_width(), 12);
        assert_eq!(Cell::with_width(TypeTag::Integer, 2, 12).element_width(), 0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut cell = Cell::new(TypeTag::DoublePrecision, 0);
        assert_eq!(cell.as_doubles(), Some(&[][..]));
        assert!(cell.is_full());
        assert_eq!(
            cell.append(1.0),
            Err(SpiceError::CapacityExceeded { capacity: 0 })
        );
        assert_eq!(cell.set_cardinality(0), Ok(()));
    }

    #[test]
    fn test_from_code() {
        let cell = Cell::from_code(1, 3, 0).unwrap();
        assert_eq!(cell.tag(), TypeTag::DoublePrecision);
        assert_eq!(Cell::from_code(7, 3, 0), Err(SpiceError::InvalidType(7)));
    }

    #[test]
    fn test_reconcile_rejects_out_of_range() {
        let mut cell = Cell::new(TypeTag::Integer, 2);
        let err = cell
            .reconcile(NativeCellState {
                card: 3,
                is_set: true,
                init: true,
            })
            .unwrap_err();
        assert_eq!(
            err,
            SpiceError::Cardinality {
                requested: 3,
                capacity: 2
            }
        );
        assert!(!cell.is_initialized());

        cell.reconcile(NativeCellState {
            card: 2,
            is_set: true,
            init: true,
        })
        .unwrap();
        assert_eq!(cell.cardinality(), 2);
        assert!(cell.is_set());
        assert!(cell.is_initialized());
    }

    #[test]
    fn test_display() {
        let mut cell = Cell::new(TypeTag::Integer, 3);
        cell.append(4).unwrap();
        cell.append(8).unwrap();
        assert_eq!(
            cell.to_string(),
            "<SpiceCell: dtype=INT, size=3, length=0, card=2, isSet=false, init=true, data=[4, 8]>"
        );
    }
}
