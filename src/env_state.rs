//! # Horizons environment state
//!
//! This module defines [`crate::env_state::HorizonsEnv`], the environment object
//! passed to the Horizons retrieval. It provides access to:
//!
//! - The [`HorizonsConfig`] driving the dialogue and the download.
//! - A persistent **HTTP client** used to download the SPK files prepared by Horizons.
//!
//! ## Structure
//!
//! ```text
//! HorizonsEnv
//! ├── config       (HorizonsConfig)
//! └── http_client  (reqwest::Client)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spicebridge::env_state::HorizonsEnv;
//!
//! let env = HorizonsEnv::new()?;
//! let transport = env.connect()?;
//! ```
//!
//! ## Notes
//!
//! - The HTTP client keeps its connection pool between downloads, reuse the
//!   same [`HorizonsEnv`] for several targets.
//! - Cloning is cheap: the client is reference counted.
//!
//! ## See also
//!
//! - [`crate::horizons::retrieval::retrieve_target_spk`] – consumer of this object.
//! - [`reqwest::Client`] – HTTP client used internally.
use crate::{
    horizons::{transport::TcpTransport, HorizonsConfig},
    spice_errors::SpiceError,
};

/// Environment of a Horizons retrieval
///
/// # Fields
///
/// * `config` - dialogue and download settings
/// * `http_client` - A reqwest client used to download the SPK files,
///   its timeout is `config.download_timeout`
#[derive(Debug, Clone)]
pub struct HorizonsEnv {
    pub config: HorizonsConfig,
    pub http_client: reqwest::Client,
}

impl HorizonsEnv {
    /// Create a new environment with the default [`HorizonsConfig`]
    pub fn new() -> Result<Self, SpiceError> {
        HorizonsEnv::with_config(HorizonsConfig::default())
    }

    /// Create a new environment
    ///
    /// Arguments
    /// ---------
    /// * `config`: dialogue and download settings
    ///
    /// Return
    /// ------
    /// * The environment, or [`SpiceError::ReqwestError`] if the HTTP client cannot be built
    pub fn with_config(config: HorizonsConfig) -> Result<Self, SpiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()?;

        Ok(HorizonsEnv {
            config,
            http_client,
        })
    }

    /// Open a telnet connection to the configured Horizons service
    pub fn connect(&self) -> Result<TcpTransport, SpiceError> {
        Ok(TcpTransport::connect(
            &self.config.host,
            self.config.port,
            self.config.step_timeout,
        )?)
    }
}
