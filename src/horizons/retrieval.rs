//! Lookup, download and body ID resolution of a target SPK.
//!
//! [`retrieve_target_spk`] chains the three sub-steps and reports each one in
//! its own message, the way an unreliable scraping dependency should: a
//! failure stops the chain but never propagates as an error.

use camino::{Utf8Path, Utf8PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{
    cell::Cell,
    constants::MAX_SPK_BODIES,
    env_state::HorizonsEnv,
    horizons::{transport::LineTransport, HorizonsDialogue},
    native::{session::SpiceSession, NativeToolkit},
    spice_errors::SpiceError,
    type_tag::TypeTag,
};

/// Outcome of [`retrieve_target_spk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalReport {
    /// Where the SPK is (or would have been) written.
    pub spk_path: Utf8PathBuf,
    /// NAIF ID of the target, `0` when unresolved.
    pub body_id: i32,
    /// One message per sub-step: lookup, retrieval, body ID.
    pub messages: [String; 3],
}

impl RetrievalReport {
    fn new(spk_path: Utf8PathBuf) -> Self {
        RetrievalReport {
            spk_path,
            body_id: 0,
            messages: [
                "Horizons lookup FAILED".to_string(),
                "SPK retrieval not attempted".to_string(),
                "SPICE Body ID not attempted".to_string(),
            ],
        }
    }

    /// Resolve the body ID of the SPK at `spk_path` and report it in the third message.
    ///
    /// `body_id` stays 0 on failure.
    pub fn record_body_id<T: NativeToolkit>(&mut self, session: &SpiceSession<T>) {
        match resolve_body_id(session, &self.spk_path) {
            Ok(id) => {
                self.body_id = id;
                self.messages[2] = format!("### Retrieved SPICEID {id}; status=SUCCESS");
            }
            Err(err) => self.messages[2] = format!("SPICE Body ID FAILED: {err}"),
        }
    }
}

/// Local file name of the SPK of `target`
///
/// Every character outside `[-A-Za-z0-9]` is replaced by `_`, then
/// `_horizons.bsp` is appended.
///
/// Argument
/// --------
/// * `target`: the target designation, e.g. `"DES=C/2012 S1;"`
///
/// Return
/// ------
/// * the file name, e.g. `"DES_C_2012_S1__horizons.bsp"`
pub fn spk_file_name(target: &str) -> String {
    let name: String = target
        .chars()
        .map(|c| if c == '-' || c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{name}_horizons.bsp")
}

/// Download a large file from a URL
/// Uses reqwest to download the file in chunks
/// and saves it to the specified path using tokio's async file I/O.
///
/// Arguments
/// ---------
/// * `client`: the reqwest client of the environment
/// * `url`: the URL of the file to download
/// * `path`: the path to save the downloaded file
async fn download_big_file(
    client: &reqwest::Client,
    url: &str,
    path: &Utf8Path,
) -> Result<(), SpiceError> {
    let mut response = client.get(url).send().await?.error_for_status()?;
    let mut file = File::create(path).await?;
    log::info!("Downloading {url}...");

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    log::info!("Downloaded {url}");
    Ok(())
}

/// Download the SPK at `url` into `path`, blocking on a private runtime
///
/// Must not be called from inside a tokio runtime.
pub fn download_spk(env: &HorizonsEnv, url: &str, path: &Utf8Path) -> Result<(), SpiceError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(download_big_file(&env.http_client, url, path))
}

/// NAIF ID of the first body covered by an SPK
///
/// Only the live elements of the ID set are read.
///
/// Return
/// ------
/// * the ID, or [`SpiceError::InvalidRecord`] if the file covers no body
pub fn resolve_body_id<T: NativeToolkit>(
    session: &SpiceSession<T>,
    spk: &Utf8Path,
) -> Result<i32, SpiceError> {
    let mut ids = Cell::new(TypeTag::Integer, MAX_SPK_BODIES);
    session.spk_objects(spk, &mut ids)?;
    let id = ids
        .iter()
        .next()
        .and_then(|id| id.as_i32())
        .ok_or_else(|| SpiceError::InvalidRecord(format!("no body covered by {spk}")));
    id
}

/// Produce, fetch and identify the SPK of one target
///
/// 1. run the Horizons dialogue over `transport`,
/// 2. download the prepared file into `output_dir`,
/// 3. resolve the body ID from the downloaded file.
///
/// Post-capture dialogue failures (negative status) still proceed with the
/// download since the file location is known.
///
/// Arguments
/// ---------
/// * `env`: Horizons configuration and HTTP client
/// * `transport`: connection to the Horizons service
/// * `session`: native session used to read the SPK
/// * `target`: the target designation
/// * `output_dir`: directory receiving the SPK
///
/// Return
/// ------
/// * the [`RetrievalReport`], whatever happened
pub fn retrieve_target_spk<T, L>(
    env: &HorizonsEnv,
    transport: &mut L,
    session: &SpiceSession<T>,
    target: &str,
    output_dir: &Utf8Path,
) -> RetrievalReport
where
    T: NativeToolkit,
    L: LineTransport + ?Sized,
{
    let mut report = RetrievalReport::new(output_dir.join(spk_file_name(target)));

    let outcome = match HorizonsDialogue::new(&env.config, target) {
        Ok(dialogue) => dialogue.run(transport),
        Err(err) => {
            report.messages[0] = format!("Horizons lookup FAILED: {err}");
            return report;
        }
    };

    let url = outcome.output_path.clone().unwrap_or_default();
    if !outcome.has_path() {
        report.messages[0] = format!(
            "Horizons lookup FAILED status={}, URL={url}",
            outcome.status
        );
        if let Some(failure) = &outcome.failure {
            log::info!("Horizons lookup of {target} failed: {failure}");
        }
        return report;
    }
    report.messages[0] = format!("Horizons lookup status={}, URL={url}", outcome.status);
    log::info!("Horizons prepared the SPK of {target} at {url}");

    if let Err(err) = download_spk(env, &url, &report.spk_path) {
        report.messages[1] = format!("SPK retrieval FAILED: {err}");
        return report;
    }
    report.messages[1] = format!("### Retrieved SPK (URL={url}) as {}", report.spk_path);

    report.record_body_id(session);
    report
}

/// [`retrieve_target_spk`] over a new connection to the configured service
pub fn retrieve<T: NativeToolkit>(
    env: &HorizonsEnv,
    session: &SpiceSession<T>,
    target: &str,
    output_dir: &Utf8Path,
) -> RetrievalReport {
    match env.connect() {
        Ok(mut transport) => retrieve_target_spk(env, &mut transport, session, target, output_dir),
        Err(err) => {
            let mut report = RetrievalReport::new(output_dir.join(spk_file_name(target)));
            report.messages[0] = format!("Horizons lookup FAILED: {err}");
            report
        }
    }
}
