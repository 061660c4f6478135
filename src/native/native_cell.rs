//! Typed-buffer view of a [`Cell`](crate::cell::Cell) handed to native calls.
//!
//! A [`NativeCell`] owns a `#[repr(C)]` [`SpiceCell`] whose `base` and `data`
//! pointers refer to the cell's own storage, so the native toolkit reads and
//! writes the control area and the elements in place. Once the call returns,
//! [`NativeCell::state`] captures the control fields the callee may have
//! changed and the owning cell reconciles itself from them.

use std::ffi::c_void;

use crate::{
    cell::storage::CellStorage,
    constants::{SPICE_FALSE, SPICE_TRUE},
    type_tag::TypeTag,
};

/// Binary layout of CSPICE's `SpiceCell` (`SpiceCel.h`).
#[repr(C)]
#[derive(Debug)]
pub struct SpiceCell {
    pub dtype: i32,
    pub length: i32,
    pub size: i32,
    pub card: i32,
    pub is_set: i32,
    pub adjust: i32,
    pub init: i32,
    pub base: *mut c_void,
    pub data: *mut c_void,
}

/// Control fields read back from a [`SpiceCell`] after a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCellState {
    pub card: i32,
    pub is_set: bool,
    pub init: bool,
}

pub struct NativeCell<'a> {
    raw: SpiceCell,
    storage: &'a mut CellStorage,
}

fn to_boolean(flag: bool) -> i32 {
    if flag {
        SPICE_TRUE
    } else {
        SPICE_FALSE
    }
}

impl<'a> NativeCell<'a> {
    pub(crate) fn new(
        tag: TypeTag,
        length: i32,
        size: i32,
        card: i32,
        [is_set, adjust, init]: [bool; 3],
        storage: &'a mut CellStorage,
    ) -> Self {
        let raw = SpiceCell {
            dtype: tag.code(),
            length,
            size,
            card,
            is_set: to_boolean(is_set),
            adjust: to_boolean(adjust),
            init: to_boolean(init),
            base: storage.base_ptr(),
            data: storage.data_ptr(),
        };
        NativeCell { raw, storage }
    }

    /// Pointer suitable for a native routine expecting `SpiceCell *`.
    ///
    /// The pointer is valid for as long as this view is alive; the storage it
    /// refers to is never reallocated.
    pub fn as_mut_ptr(&mut self) -> *mut SpiceCell {
        self.raw.base = self.storage.base_ptr();
        self.raw.data = self.storage.data_ptr();
        &mut self.raw
    }

    pub fn tag(&self) -> TypeTag {
        self.storage.tag()
    }

    pub fn size(&self) -> i32 {
        self.raw.size
    }

    pub fn length(&self) -> i32 {
        self.raw.length
    }

    pub fn card(&self) -> i32 {
        self.raw.card
    }

    /// Record a new cardinality, as a native routine does when it fills the cell.
    pub fn set_card(&mut self, card: i32) {
        self.raw.card = card;
        self.raw.init = SPICE_TRUE;
    }

    pub fn set_is_set(&mut self, is_set: bool) {
        self.raw.is_set = to_boolean(is_set);
    }

    /// Data area of an integer cell, `size` elements long.
    pub fn integers_mut(&mut self) -> Option<&mut [i32]> {
        self.storage.integers_mut()
    }

    /// Data area of a double precision or time cell, `size` elements long.
    pub fn doubles_mut(&mut self) -> Option<&mut [f64]> {
        self.storage.doubles_mut()
    }

    /// Data area of a character cell, `size * length` bytes long.
    pub fn text_mut(&mut self) -> Option<&mut [u8]> {
        self.storage.text_mut()
    }

    pub fn state(&self) -> NativeCellState {
        NativeCellState {
            card: self.raw.card,
            is_set: self.raw.is_set != SPICE_FALSE,
            init: self.raw.init != SPICE_FALSE,
        }
    }
}

#[cfg(test)]
mod native_cell_test {
    use std::mem::{align_of, size_of};

    use crate::{cell::Cell, constants::CELL_CTRL_SIZE};

    use super::*;

    #[test]
    fn test_spice_cell_layout() {
        // seven SpiceInt/SpiceBoolean fields followed by two pointers
        let ints = 7 * size_of::<i32>();
        let ptr = size_of::<*mut c_void>();
        let padded = ints.div_ceil(align_of::<*mut c_void>()) * align_of::<*mut c_void>();
        assert_eq!(size_of::<SpiceCell>(), padded + 2 * ptr);
    }

    #[test]
    fn test_pointers_follow_control_area() {
        let mut cell = Cell::new(TypeTag::DoublePrecision, 3);
        cell.with_native(|view| {
            let raw = view.as_mut_ptr();
            let (base, data) = unsafe { ((*raw).base as usize, (*raw).data as usize) };
            assert_eq!(data - base, CELL_CTRL_SIZE * size_of::<f64>());
            assert_eq!(view.size(), 3);
            assert_eq!(view.length(), 0);
        })
        .unwrap();

        let mut cell = Cell::with_width(TypeTag::Character, 2, 10);
        cell.with_native(|view| {
            let raw = view.as_mut_ptr();
            let (base, data) = unsafe { ((*raw).base as usize, (*raw).data as usize) };
            assert_eq!(data - base, CELL_CTRL_SIZE * 10);
            assert_eq!(view.text_mut().map(|t| t.len()), Some(20));
        })
        .unwrap();
    }

    #[test]
    fn test_writes_are_reconciled() {
        let mut cell = Cell::new(TypeTag::Integer, 4);
        cell.with_native(|view| {
            view.integers_mut().unwrap()[..2].copy_from_slice(&[399, 301]);
            view.set_card(2);
            view.set_is_set(true);
        })
        .unwrap();

        assert_eq!(cell.cardinality(), 2);
        assert!(cell.is_set());
        assert!(cell.is_initialized());
        assert_eq!(cell.as_integers(), Some(&[399, 301, 0, 0][..]));
    }

    #[test]
    fn test_untouched_view_keeps_state() {
        let mut cell = Cell::new(TypeTag::Integer, 4);
        cell.append(1).unwrap();
        cell.with_native(|_| ()).unwrap();
        assert_eq!(cell.cardinality(), 1);
        assert!(cell.is_initialized());
        assert!(!cell.is_set());
    }
}
