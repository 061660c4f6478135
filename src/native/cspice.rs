//! FFI backend binding the NAIF CSPICE C library.
//!
//! Enabled with the `cspice` cargo feature; `libcspice` must be found by the
//! linker (e.g. through `RUSTFLAGS="-L /path/to/cspice/lib"`).
//!
//! CSPICE keeps its kernel pool and error state in process-wide globals, so
//! at most one [`Cspice`] value may exist at a time. On acquisition the error
//! action is switched to `RETURN` and automatic error output to `NONE`:
//! failures are then reported through [`NativeToolkit::take_error`] instead of
//! aborting the process.

use std::{
    ffi::{c_char, CStr, CString},
    sync::atomic::{AtomicBool, Ordering},
};

use camino::Utf8Path;

use crate::{
    constants::{BODY_NAME_LEN, ERROR_MESSAGE_LEN, SPICE_FALSE, UTC_STRING_LEN},
    native::{
        native_cell::{NativeCell, SpiceCell},
        NativeError, NativeToolkit,
    },
    records::{ek::SpiceEKSegSum, ellipse::SpiceEllipse, plane::SpicePlane},
    spice_errors::SpiceError,
};

type SpiceInt = i32;
type SpiceBoolean = i32;
type SpiceDouble = f64;

#[link(name = "cspice")]
extern "C" {
    fn furnsh_c(file: *const c_char);
    fn unload_c(file: *const c_char);
    fn bodn2c_c(name: *const c_char, code: *mut SpiceInt, found: *mut SpiceBoolean);
    fn bodc2n_c(code: SpiceInt, lenout: SpiceInt, name: *mut c_char, found: *mut SpiceBoolean);
    fn str2et_c(text: *const c_char, et: *mut SpiceDouble);
    fn et2utc_c(
        et: SpiceDouble,
        format: *const c_char,
        prec: SpiceInt,
        lenout: SpiceInt,
        utcstr: *mut c_char,
    );
    fn spkobj_c(spk: *const c_char, ids: *mut SpiceCell);
    fn spkcov_c(spk: *const c_char, idcode: SpiceInt, cover: *mut SpiceCell);
    fn cgv2el_c(
        center: *const SpiceDouble,
        vec1: *const SpiceDouble,
        vec2: *const SpiceDouble,
        ellipse: *mut SpiceEllipse,
    );
    fn nvc2pl_c(normal: *const SpiceDouble, constant: SpiceDouble, plane: *mut SpicePlane);
    fn inelpl_c(
        ellipse: *const SpiceEllipse,
        plane: *const SpicePlane,
        nxpts: *mut SpiceInt,
        xpt1: *mut SpiceDouble,
        xpt2: *mut SpiceDouble,
    );
    fn ekopr_c(fname: *const c_char, handle: *mut SpiceInt);
    fn ekcls_c(handle: SpiceInt);
    fn ekssum_c(handle: SpiceInt, segno: SpiceInt, segsum: *mut SpiceEKSegSum);
    fn failed_c() -> SpiceBoolean;
    fn getmsg_c(option: *const c_char, lenout: SpiceInt, msg: *mut c_char);
    fn reset_c();
    fn erract_c(operation: *const c_char, lenout: SpiceInt, action: *mut c_char);
    fn errprt_c(operation: *const c_char, lenout: SpiceInt, list: *mut c_char);
}

static CSPICE_IN_USE: AtomicBool = AtomicBool::new(false);

/// Exclusive handle on the CSPICE library.
pub struct Cspice {
    // strings that could not be converted for the last call
    pending: Option<NativeError>,
}

fn read_buffer(buffer: &[u8]) -> String {
    CStr::from_bytes_until_nul(buffer)
        .map(|s| s.to_string_lossy().trim_end().to_string())
        .unwrap_or_default()
}

impl Cspice {
    /// Take exclusive ownership of the library.
    ///
    /// Return
    /// ------
    /// * [`SpiceError::ToolkitBusy`] if another [`Cspice`] value is alive
    pub fn acquire() -> Result<Self, SpiceError> {
        if CSPICE_IN_USE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SpiceError::ToolkitBusy);
        }

        let mut action = *b"RETURN\0";
        let mut report = *b"NONE\0";
        // SAFETY: lenout is 0 for SET, the buffers are NUL terminated and only read
        unsafe {
            erract_c(c"SET".as_ptr(), 0, action.as_mut_ptr().cast());
            errprt_c(c"SET".as_ptr(), 0, report.as_mut_ptr().cast());
        }
        log::debug!("CSPICE acquired, error action set to RETURN");

        Ok(Cspice { pending: None })
    }

    fn message(option: &CStr) -> String {
        let mut buffer = vec![0u8; ERROR_MESSAGE_LEN];
        // SAFETY: buffer holds lenout bytes
        unsafe {
            getmsg_c(
                option.as_ptr(),
                ERROR_MESSAGE_LEN as SpiceInt,
                buffer.as_mut_ptr().cast(),
            )
        };
        read_buffer(&buffer)
    }

    /// Convert a host string, recording a failure instead of calling the library on error.
    fn c_string(&mut self, text: &str) -> Option<CString> {
        match CString::new(text) {
            Ok(s) => Some(s),
            Err(err) => {
                self.pending = Some(NativeError::new(
                    "SPICEBRIDGE(INVALIDSTRING)",
                    format!("'{text}' contains a NUL byte at {}", err.nul_position()),
                    "Strings passed to CSPICE cannot contain NUL bytes.",
                ));
                None
            }
        }
    }
}

impl Drop for Cspice {
    fn drop(&mut self) {
        CSPICE_IN_USE.store(false, Ordering::Release);
    }
}

impl NativeToolkit for Cspice {
    fn load_kernel(&mut self, path: &Utf8Path) {
        if let Some(file) = self.c_string(path.as_str()) {
            // SAFETY: file is a valid C string for the duration of the call
            unsafe { furnsh_c(file.as_ptr()) }
        }
    }

    fn unload_kernel(&mut self, path: &Utf8Path) {
        if let Some(file) = self.c_string(path.as_str()) {
            unsafe { unload_c(file.as_ptr()) }
        }
    }

    fn body_name_to_code(&mut self, name: &str) -> Option<i32> {
        let name = self.c_string(name)?;
        let mut code = 0;
        let mut found = SPICE_FALSE;
        unsafe { bodn2c_c(name.as_ptr(), &mut code, &mut found) };
        (found != SPICE_FALSE).then_some(code)
    }

    fn body_code_to_name(&mut self, code: i32) -> Option<String> {
        let mut buffer = [0u8; BODY_NAME_LEN];
        let mut found = SPICE_FALSE;
        unsafe {
            bodc2n_c(
                code,
                BODY_NAME_LEN as SpiceInt,
                buffer.as_mut_ptr().cast(),
                &mut found,
            )
        };
        (found != SPICE_FALSE).then(|| read_buffer(&buffer))
    }

    fn string_to_et(&mut self, text: &str) -> f64 {
        let mut et = 0.0;
        if let Some(text) = self.c_string(text) {
            unsafe { str2et_c(text.as_ptr(), &mut et) };
        }
        et
    }

    fn et_to_utc(&mut self, et: f64, format: &str, precision: i32) -> String {
        let Some(format) = self.c_string(format) else {
            return String::new();
        };
        let mut buffer = [0u8; UTC_STRING_LEN];
        unsafe {
            et2utc_c(
                et,
                format.as_ptr(),
                precision,
                UTC_STRING_LEN as SpiceInt,
                buffer.as_mut_ptr().cast(),
            )
        };
        read_buffer(&buffer)
    }

    fn spk_objects(&mut self, spk: &Utf8Path, ids: &mut NativeCell<'_>) {
        if let Some(spk) = self.c_string(spk.as_str()) {
            // SAFETY: the cell view keeps its storage alive and unmoved for the call
            unsafe { spkobj_c(spk.as_ptr(), ids.as_mut_ptr()) }
        }
    }

    fn spk_coverage(&mut self, spk: &Utf8Path, body: i32, cover: &mut NativeCell<'_>) {
        if let Some(spk) = self.c_string(spk.as_str()) {
            unsafe { spkcov_c(spk.as_ptr(), body, cover.as_mut_ptr()) }
        }
    }

    fn ellipse_from_vectors(
        &mut self,
        center: &[f64; 3],
        vec1: &[f64; 3],
        vec2: &[f64; 3],
    ) -> SpiceEllipse {
        let mut ellipse = SpiceEllipse::default();
        unsafe { cgv2el_c(center.as_ptr(), vec1.as_ptr(), vec2.as_ptr(), &mut ellipse) };
        ellipse
    }

    fn plane_from_normal(&mut self, normal: &[f64; 3], constant: f64) -> SpicePlane {
        let mut plane = SpicePlane::default();
        unsafe { nvc2pl_c(normal.as_ptr(), constant, &mut plane) };
        plane
    }

    fn intersect_ellipse_plane(
        &mut self,
        ellipse: &SpiceEllipse,
        plane: &SpicePlane,
    ) -> (i32, [f64; 3], [f64; 3]) {
        let mut count = 0;
        let mut first = [0.0; 3];
        let mut second = [0.0; 3];
        unsafe {
            inelpl_c(
                ellipse,
                plane,
                &mut count,
                first.as_mut_ptr(),
                second.as_mut_ptr(),
            )
        };
        (count, first, second)
    }

    fn open_ek(&mut self, path: &Utf8Path) -> i32 {
        let mut handle = 0;
        if let Some(file) = self.c_string(path.as_str()) {
            unsafe { ekopr_c(file.as_ptr(), &mut handle) };
        }
        handle
    }

    fn close_ek(&mut self, handle: i32) {
        unsafe { ekcls_c(handle) }
    }

    fn ek_segment_summary(&mut self, handle: i32, segment: i32, summary: &mut SpiceEKSegSum) {
        unsafe { ekssum_c(handle, segment, summary) }
    }

    fn take_error(&mut self) -> Option<NativeError> {
        if let Some(error) = self.pending.take() {
            return Some(error);
        }
        if unsafe { failed_c() } == SPICE_FALSE {
            return None;
        }
        let error = NativeError::new(
            Cspice::message(c"SHORT"),
            Cspice::message(c"LONG"),
            Cspice::message(c"EXPLAIN"),
        );
        unsafe { reset_c() };
        Some(error)
    }
}
