pub mod cell;
pub mod constants;
pub mod env_state;
pub mod horizons;
pub mod native;
pub mod records;
pub mod spice_errors;
pub mod time;
pub mod type_tag;
