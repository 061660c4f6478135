//! # Native boundary
//!
//! Everything that crosses into the native ephemeris toolkit goes through this
//! module.
//!
//! ## Overview
//!
//! - [`NativeToolkit`] is the seam between the host and the toolkit. It lists
//!   the routines this crate marshals, with arguments already converted to
//!   their native shape ([`NativeCell`](native_cell::NativeCell) for cells,
//!   `#[repr(C)]` mirrors for records).
//! - [`SpiceSession`](session::SpiceSession) owns a toolkit, serializes every
//!   call under a lock, reconciles cells and converts native failures into
//!   [`SpiceError::NativeCall`](crate::spice_errors::SpiceError::NativeCall).
//! - With the `cspice` feature, [`Cspice`](cspice::Cspice) binds the real C library.
//!
//! ## Error capture
//!
//! The toolkit's default reaction to an error is to abort the process. The
//! session therefore queries [`NativeToolkit::take_error`] after every call;
//! implementations report the pending failure once and clear it.

use std::fmt;

use camino::Utf8Path;

use crate::records::{
    ek::SpiceEKSegSum,
    ellipse::SpiceEllipse,
    plane::SpicePlane,
};

pub mod native_cell;
pub mod session;

#[cfg(feature = "cspice")]
pub mod cspice;

use native_cell::NativeCell;

/// Failure reported by the native toolkit for one call.
///
/// The three parts are the toolkit's own short code (e.g.
/// `SPICE(NOSUCHFILE)`), long message and explanation of the short code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeError {
    pub short: String,
    pub long: String,
    pub explain: String,
}

impl NativeError {
    pub fn new(
        short: impl Into<String>,
        long: impl Into<String>,
        explain: impl Into<String>,
    ) -> Self {
        NativeError {
            short: short.into(),
            long: long.into(),
            explain: explain.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short)?;
        if !self.explain.is_empty() {
            write!(f, " ({})", self.explain)?;
        }
        if !self.long.is_empty() {
            write!(f, ": {}", self.long)?;
        }
        Ok(())
    }
}

/// Routines of the native toolkit marshaled by this crate.
///
/// Methods mirror the toolkit one-to-one and never fail directly: a failing
/// routine leaves an error pending, which the caller collects with
/// [`take_error`](NativeToolkit::take_error). Outputs of a failed call are
/// unspecified.
pub trait NativeToolkit: Send {
    /// Load a kernel into the toolkit pool (`furnsh_c`).
    fn load_kernel(&mut self, path: &Utf8Path);

    /// Unload a kernel from the toolkit pool (`unload_c`).
    fn unload_kernel(&mut self, path: &Utf8Path);

    /// Body name to NAIF ID (`bodn2c_c`), `None` when the name is unknown.
    fn body_name_to_code(&mut self, name: &str) -> Option<i32>;

    /// NAIF ID to body name (`bodc2n_c`), `None` when the code is unknown.
    fn body_code_to_name(&mut self, code: i32) -> Option<String>;

    /// Time string to ephemeris seconds past J2000 (`str2et_c`).
    fn string_to_et(&mut self, text: &str) -> f64;

    /// Ephemeris time to a UTC string (`et2utc_c`).
    fn et_to_utc(&mut self, et: f64, format: &str, precision: i32) -> String;

    /// Collect the IDs of all bodies covered by an SPK into an integer cell (`spkobj_c`).
    fn spk_objects(&mut self, spk: &Utf8Path, ids: &mut NativeCell<'_>);

    /// Add the coverage window of `body` in an SPK to a double precision cell (`spkcov_c`).
    fn spk_coverage(&mut self, spk: &Utf8Path, body: i32, cover: &mut NativeCell<'_>);

    /// Ellipse from a center and two generating vectors (`cgv2el_c`).
    fn ellipse_from_vectors(
        &mut self,
        center: &[f64; 3],
        vec1: &[f64; 3],
        vec2: &[f64; 3],
    ) -> SpiceEllipse;

    /// Plane from a normal vector and a constant (`nvc2pl_c`).
    fn plane_from_normal(&mut self, normal: &[f64; 3], constant: f64) -> SpicePlane;

    /// Intersection points of an ellipse and a plane (`inelpl_c`).
    ///
    /// Returns the number of intersection points (`-1` when the ellipse lies
    /// in the plane) and the two points.
    fn intersect_ellipse_plane(
        &mut self,
        ellipse: &SpiceEllipse,
        plane: &SpicePlane,
    ) -> (i32, [f64; 3], [f64; 3]);

    /// Open an EK file for reading and return its handle (`ekopr_c`).
    fn open_ek(&mut self, path: &Utf8Path) -> i32;

    /// Close an EK file (`ekcls_c`).
    fn close_ek(&mut self, handle: i32);

    /// Summary of segment `segment` (0-based) of an open EK (`ekssum_c`).
    fn ek_segment_summary(&mut self, handle: i32, segment: i32, summary: &mut SpiceEKSegSum);

    /// Return and clear the pending failure, if any.
    fn take_error(&mut self) -> Option<NativeError>;
}
