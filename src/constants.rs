//! # Constants shared across spicebridge
//!
//! This module centralizes the **memory-layout constants** of the CSPICE data
//! structures mirrored by this crate, together with a few defaults used by the
//! Horizons automation.
//!
//! ## Overview
//!
//! - Cell layout (control area size, minimum character width)
//! - EK (E-kernel) record sizes, as defined in `SpiceEK.h`
//! - CSPICE boolean encoding
//! - Horizons telnet service defaults
//!
//! Every value in the first three groups is part of the native ABI and must
//! not be changed.

use std::time::Duration;

// -------------------------------------------------------------------------------------------------
// Cell layout
// -------------------------------------------------------------------------------------------------

/// Number of control slots stored in front of the data of every cell (`SPICE_CELL_CTRLSZ`)
pub const CELL_CTRL_SIZE: usize = 6;

/// Minimum width in bytes of a character cell element, terminator included
pub const MIN_CHAR_LEN: usize = 6;

// -------------------------------------------------------------------------------------------------
// Booleans
// -------------------------------------------------------------------------------------------------

/// `SPICETRUE`
pub const SPICE_TRUE: i32 = 1;

/// `SPICEFALSE`
pub const SPICE_FALSE: i32 = 0;

// -------------------------------------------------------------------------------------------------
// E-kernel records
// -------------------------------------------------------------------------------------------------

/// Maximum length of an EK table name, terminator included (`SPICE_EK_TSTRLN`)
pub const EK_TABLE_NAME_LEN: usize = 65;

/// Maximum length of an EK column name, terminator included (`SPICE_EK_CSTRLN`)
pub const EK_COLUMN_NAME_LEN: usize = 33;

/// Maximum number of columns in an EK segment (`SPICE_EK_MXCLSG`)
pub const EK_MAX_COLUMNS: usize = 100;

// -------------------------------------------------------------------------------------------------
// Native string buffers
// -------------------------------------------------------------------------------------------------

/// Output buffer length used for body names returned by the toolkit
pub const BODY_NAME_LEN: usize = 37;

/// Output buffer length used for UTC strings returned by the toolkit
pub const UTC_STRING_LEN: usize = 64;

/// Output buffer length used for long error messages (`SPICE_ERROR_LMSGLN` is 1841)
pub const ERROR_MESSAGE_LEN: usize = 1841;

// -------------------------------------------------------------------------------------------------
// JPL Horizons telnet service
// -------------------------------------------------------------------------------------------------

/// Host name of the Horizons line-oriented service
pub const HORIZONS_HOST: &str = "horizons.jpl.nasa.gov";

/// TCP port of the Horizons line-oriented service
pub const HORIZONS_PORT: u16 = 6775;

/// Timeout applied to each step of the Horizons dialogue
pub const HORIZONS_STEP_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout applied to the SPK file download
pub const SPK_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Capacity of the integer cell used to collect body IDs from a downloaded SPK
pub const MAX_SPK_BODIES: usize = 64;
