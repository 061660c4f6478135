use hifitime::Epoch;
use std::str::FromStr;

use crate::spice_errors::SpiceError;

/// Transformation from ephemeris time to a hifitime epoch
///
/// Argument
/// --------
/// * `et`: ephemeris seconds past J2000, the representation of time cell elements
///
/// Return
/// ------
/// * the corresponding [`Epoch`]
pub fn et_to_epoch(et: f64) -> Epoch {
    Epoch::from_et_seconds(et)
}

/// Transformation from a hifitime epoch to ephemeris time
///
/// Argument
/// --------
/// * `epoch`: any epoch, whatever its time scale
///
/// Return
/// ------
/// * ephemeris seconds past J2000
pub fn epoch_to_et(epoch: &Epoch) -> f64 {
    epoch.to_et_seconds()
}

/// Transformation from a date string to ephemeris time without the native toolkit
///
/// Argument
/// --------
/// * `date`: a date understood by hifitime, e.g. `2013-01-16T12:00:00 UTC`
///
/// Return
/// ------
/// * ephemeris seconds past J2000, or [`SpiceError::InvalidString`] if the date cannot be parsed
pub fn date_to_et(date: &str) -> Result<f64, SpiceError> {
    let epoch = Epoch::from_str(date)
        .map_err(|e| SpiceError::InvalidString(format!("invalid date '{date}': {e}")))?;
    Ok(epoch_to_et(&epoch))
}

/// Calendar date `YYYY-MM-DD` of an epoch, in UTC
pub fn calendar_date(epoch: &Epoch) -> String {
    let (year, month, day, ..) = epoch.to_gregorian_utc();
    format!("{year:04}-{month:02}-{day:02}")
}
