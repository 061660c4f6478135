//! # Native toolkit session
//!
//! [`SpiceSession`] is the explicit context through which a host talks to the
//! native toolkit. The toolkit keeps process-wide, non re-entrant state (the
//! kernel pool), so the session:
//!
//! 1. owns the [`NativeToolkit`] behind a [`Mutex`] and runs every call,
//!    including the reconciliation of cells modified by the call, while
//!    holding the lock;
//! 2. collects the toolkit's pending failure after each call and converts it
//!    into [`SpiceError::NativeCall`] with the name of the failing routine;
//! 3. records the kernels it loaded and unloads the remaining ones, in
//!    reverse load order, when dropped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camino::Utf8Path;
//! use spicebridge::{cell::Cell, native::session::SpiceSession, type_tag::TypeTag};
//!
//! let session = SpiceSession::new(toolkit);
//! session.load_kernel(Utf8Path::new("naif0012.tls"))?;
//! session.load_kernel(Utf8Path::new("de440s.bsp"))?;
//!
//! let mut ids = Cell::new(TypeTag::Integer, 64);
//! session.spk_objects(Utf8Path::new("de440s.bsp"), &mut ids)?;
//! println!("{ids}");
//! ```

use std::sync::{Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::Vector3;

use crate::{
    cell::Cell,
    native::{native_cell::NativeCell, NativeToolkit},
    records::{
        ek::{SegmentSummary, SpiceEKSegSum},
        ellipse::{Ellipse, SpiceEllipse},
        plane::{Plane, SpicePlane},
    },
    spice_errors::SpiceError,
    type_tag::TypeTag,
};

struct SessionState<T> {
    toolkit: T,
    kernels: Vec<Utf8PathBuf>,
}

/// Intersection of an ellipse with a plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    /// The ellipse lies in the plane.
    Coplanar,
    /// Zero, one or two intersection points.
    Points(Vec<Vector3<f64>>),
}

pub struct SpiceSession<T: NativeToolkit> {
    state: Mutex<SessionState<T>>,
}

impl<T: NativeToolkit> SpiceSession<T> {
    pub fn new(toolkit: T) -> Self {
        SpiceSession {
            state: Mutex::new(SessionState {
                toolkit,
                kernels: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<T>> {
        // a panic inside a call leaves the toolkit usable,
        // its error state is reset on the next call
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(toolkit: &mut T, context: &str) -> Result<(), SpiceError> {
        match toolkit.take_error() {
            Some(error) => {
                log::debug!("{context} failed: {}", error.short);
                Err(SpiceError::NativeCall {
                    context: context.to_string(),
                    error,
                })
            }
            None => Ok(()),
        }
    }

    /// Run one native routine under the session lock.
    ///
    /// Arguments
    /// ---------
    /// * `context`: name of the native routine, reported on failure
    /// * `call`: the routine invocation
    ///
    /// Return
    /// ------
    /// * the routine output, or [`SpiceError::NativeCall`] if the toolkit reported a failure
    pub fn call<R>(&self, context: &str, call: impl FnOnce(&mut T) -> R) -> Result<R, SpiceError> {
        let mut state = self.lock();
        log::debug!("native call {context}");
        let output = call(&mut state.toolkit);
        Self::check(&mut state.toolkit, context)?;
        Ok(output)
    }

    /// Run one native routine taking a cell, then reconcile the cell, under the session lock.
    ///
    /// A native failure takes precedence over a reconciliation failure.
    pub fn call_with_cell<R>(
        &self,
        context: &str,
        cell: &mut Cell,
        call: impl FnOnce(&mut T, &mut NativeCell<'_>) -> R,
    ) -> Result<R, SpiceError> {
        let mut state = self.lock();
        log::debug!("native call {context} on a {} cell", cell.tag());
        let toolkit = &mut state.toolkit;
        let output = cell.with_native(|view| call(toolkit, view));
        Self::check(toolkit, context)?;
        output
    }

    // ---------------------------------------------------------------------------------------------
    // Kernel pool
    // ---------------------------------------------------------------------------------------------

    pub fn load_kernel(&self, path: &Utf8Path) -> Result<(), SpiceError> {
        let mut state = self.lock();
        log::debug!("native call furnsh_c {path}");
        state.toolkit.load_kernel(path);
        Self::check(&mut state.toolkit, "furnsh_c")?;
        state.kernels.push(path.to_path_buf());
        Ok(())
    }

    /// Unload a kernel. Unloading a kernel this session did not load is forwarded
    /// to the toolkit, which ignores it.
    pub fn unload_kernel(&self, path: &Utf8Path) -> Result<(), SpiceError> {
        let mut state = self.lock();
        log::debug!("native call unload_c {path}");
        state.toolkit.unload_kernel(path);
        Self::check(&mut state.toolkit, "unload_c")?;
        if let Some(pos) = state.kernels.iter().rposition(|k| k == path) {
            state.kernels.remove(pos);
        }
        Ok(())
    }

    pub fn loaded_kernels(&self) -> Vec<Utf8PathBuf> {
        self.lock().kernels.clone()
    }

    // ---------------------------------------------------------------------------------------------
    // Bodies and time
    // ---------------------------------------------------------------------------------------------

    pub fn body_code(&self, name: &str) -> Result<Option<i32>, SpiceError> {
        self.call("bodn2c_c", |tk| tk.body_name_to_code(name))
    }

    pub fn body_name(&self, code: i32) -> Result<Option<String>, SpiceError> {
        self.call("bodc2n_c", |tk| tk.body_code_to_name(code))
    }

    pub fn str_to_et(&self, text: &str) -> Result<f64, SpiceError> {
        self.call("str2et_c", |tk| tk.string_to_et(text))
    }

    pub fn et_to_utc(&self, et: f64, format: &str, precision: i32) -> Result<String, SpiceError> {
        self.call("et2utc_c", |tk| tk.et_to_utc(et, format, precision))
    }

    // ---------------------------------------------------------------------------------------------
    // SPK content
    // ---------------------------------------------------------------------------------------------

    /// Add the IDs of the bodies covered by `spk` to an integer cell.
    pub fn spk_objects(&self, spk: &Utf8Path, ids: &mut Cell) -> Result<(), SpiceError> {
        expect_tag(ids, TypeTag::Integer)?;
        self.call_with_cell("spkobj_c", ids, |tk, view| tk.spk_objects(spk, view))
    }

    /// Add the coverage window of `body` in `spk` to a double precision cell.
    pub fn spk_coverage(
        &self,
        spk: &Utf8Path,
        body: i32,
        cover: &mut Cell,
    ) -> Result<(), SpiceError> {
        expect_tag(cover, TypeTag::DoublePrecision)?;
        self.call_with_cell("spkcov_c", cover, |tk, view| {
            tk.spk_coverage(spk, body, view)
        })
    }

    // ---------------------------------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------------------------------

    pub fn ellipse_from_vectors(
        &self,
        center: &Vector3<f64>,
        vec1: &Vector3<f64>,
        vec2: &Vector3<f64>,
    ) -> Result<Ellipse, SpiceError> {
        let center: [f64; 3] = (*center).into();
        let vec1: [f64; 3] = (*vec1).into();
        let vec2: [f64; 3] = (*vec2).into();
        let raw = self.call("cgv2el_c", |tk| tk.ellipse_from_vectors(&center, &vec1, &vec2))?;
        Ok(Ellipse::from(raw))
    }

    pub fn plane_from_normal(
        &self,
        normal: &Vector3<f64>,
        constant: f64,
    ) -> Result<Plane, SpiceError> {
        let normal: [f64; 3] = (*normal).into();
        let raw = self.call("nvc2pl_c", |tk| tk.plane_from_normal(&normal, constant))?;
        Ok(Plane::from(raw))
    }

    pub fn intersect_ellipse_plane(
        &self,
        ellipse: &Ellipse,
        plane: &Plane,
    ) -> Result<Intersection, SpiceError> {
        let raw_ellipse = SpiceEllipse::from(ellipse);
        let raw_plane = SpicePlane::from(plane);
        let (count, first, second) = self.call("inelpl_c", |tk| {
            tk.intersect_ellipse_plane(&raw_ellipse, &raw_plane)
        })?;
        Ok(match usize::try_from(count) {
            Ok(count) => Intersection::Points(
                [first, second]
                    .into_iter()
                    .take(count)
                    .map(Vector3::from)
                    .collect(),
            ),
            Err(_) => Intersection::Coplanar,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // E-kernels
    // ---------------------------------------------------------------------------------------------

    /// Summary of segment `segment` (0-based) of the EK at `path`.
    ///
    /// The file is opened and closed within the call.
    pub fn ek_segment_summary(
        &self,
        path: &Utf8Path,
        segment: i32,
    ) -> Result<SegmentSummary, SpiceError> {
        let mut state = self.lock();
        let toolkit = &mut state.toolkit;

        let handle = toolkit.open_ek(path);
        Self::check(toolkit, "ekopr_c")?;

        let mut raw = Box::<SpiceEKSegSum>::default();
        toolkit.ek_segment_summary(handle, segment, &mut raw);
        let summary = Self::check(toolkit, "ekssum_c");

        toolkit.close_ek(handle);
        let closed = Self::check(toolkit, "ekcls_c");

        if let Err(err) = summary {
            if let Err(close_err) = closed {
                log::warn!("closing {path} after a failed summary: {close_err}");
            }
            return Err(err);
        }
        closed?;
        SegmentSummary::try_from(&*raw)
    }
}

fn expect_tag(cell: &Cell, expected: TypeTag) -> Result<(), SpiceError> {
    if cell.tag() == expected {
        Ok(())
    } else {
        Err(SpiceError::CellTypeMismatch {
            expected,
            found: cell.tag(),
        })
    }
}

impl<T: NativeToolkit> Drop for SpiceSession<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        while let Some(kernel) = state.kernels.pop() {
            state.toolkit.unload_kernel(&kernel);
            if let Some(error) = state.toolkit.take_error() {
                log::warn!("unable to unload {kernel} while closing the session: {error}");
            }
        }
    }
}
