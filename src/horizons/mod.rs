//! # Horizons SPK automation
//!
//! Scripted dialogue with the JPL Horizons telnet service producing an SPK
//! file for one target, then retrieval of that file and resolution of the
//! target's NAIF body ID.
//!
//! ## Overview
//!
//! The dialogue is a fixed table of [`Step`]s. Each step optionally sends a
//! line, then waits for an expected pattern within its own timeout:
//!
//! ```text
//!  #   send                  expect
//!  1   -                     Horizons>
//!  2   PAGE                  PAGING toggled OFF      (re-sent once on "PAGING toggled ON")
//!  3   <target>              [S]PK
//!  4   SPK                   e-mail address
//!  5   <e-mail>              text transfer ... YES, NO,
//!  6   NO                    START
//!  7   <start date>          STOP
//!  8   <stop date>           Add more objects to file
//!  9   NO                    Full path :
//! 10   -                     end of line             (captures the file location)
//! 11   -                     Select ...
//! 12   <empty line>          Horizons>
//! 13   quit                  Connection closed       (or end of stream)
//! ```
//!
//! The run yields a [`DialogueOutcome`] whose status is:
//!
//! * `0` on success,
//! * the 1-based number of the failing step when it fails before the file
//!   location is captured (no location is returned),
//! * `-1`, `-2` or `-3` when the select, return or quit step fails after the
//!   capture (the location is kept).
//!
//! The transcript received so far is always returned.
//!
//! ## See also
//!
//! * [`retrieval::retrieve_target_spk`] – full lookup, download and body ID resolution.
//! * [`transport::TcpTransport`] – connection to the live service.

use std::time::Duration;

use hifitime::Epoch;
use regex::Regex;

use crate::{
    constants::{HORIZONS_HOST, HORIZONS_PORT, HORIZONS_STEP_TIMEOUT, SPK_DOWNLOAD_TIMEOUT},
    spice_errors::SpiceError,
    time::calendar_date,
};

pub mod retrieval;
pub mod transport;

use transport::{ExpectBuffer, ExpectFailure, LineTransport};

/// Settings of the Horizons dialogue and of the SPK download.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonsConfig {
    pub host: String,
    pub port: u16,
    /// Address given to Horizons when it asks for one.
    pub email: String,
    /// First date covered by the SPK.
    pub start: Epoch,
    /// Last date covered by the SPK.
    pub stop: Epoch,
    /// Deadline of each dialogue step.
    pub step_timeout: Duration,
    /// Deadline of the whole SPK download.
    pub download_timeout: Duration,
}

impl Default for HorizonsConfig {
    fn default() -> Self {
        HorizonsConfig {
            host: HORIZONS_HOST.to_string(),
            port: HORIZONS_PORT,
            email: "spicebridge@example.org".to_string(),
            start: Epoch::from_gregorian_utc_at_midnight(2000, 1, 1),
            stop: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            step_timeout: HORIZONS_STEP_TIMEOUT,
            download_timeout: SPK_DOWNLOAD_TIMEOUT,
        }
    }
}

/// What a failing step reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Stop with the 1-based step number as status.
    Abort,
    /// Stop with this status, keeping the captured file location.
    KeepPath(i32),
}

/// One send/expect exchange of the dialogue.
#[derive(Debug, Clone)]
pub struct Step {
    pub label: &'static str,
    pub send: Option<String>,
    pub expect: Regex,
    /// Answer meaning "send again": the line is re-sent once on it.
    pub retry: Option<Regex>,
    /// The text before the match is the SPK location.
    pub capture: bool,
    /// The remote closing the connection counts as a match.
    pub accept_close: bool,
    pub timeout: Duration,
    pub on_failure: OnFailure,
}

impl Step {
    fn new(
        label: &'static str,
        send: Option<String>,
        expect: &str,
        timeout: Duration,
    ) -> Result<Self, SpiceError> {
        Ok(Step {
            label,
            send,
            expect: Regex::new(expect)?,
            retry: None,
            capture: false,
            accept_close: false,
            timeout,
            on_failure: OnFailure::Abort,
        })
    }

    fn retry_on(mut self, pattern: &str) -> Result<Self, SpiceError> {
        self.retry = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    fn closing(mut self) -> Self {
        self.accept_close = true;
        self
    }

    fn on_failure(mut self, on_failure: OnFailure) -> Self {
        self.on_failure = on_failure;
        self
    }
}

/// Result of one dialogue run.
#[derive(Debug)]
pub struct DialogueOutcome {
    pub status: i32,
    /// Location of the SPK file prepared by Horizons.
    pub output_path: Option<String>,
    pub transcript: String,
    /// Cause of the failure, if any.
    pub failure: Option<SpiceError>,
}

impl DialogueOutcome {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// True when the file location is usable, i.e. the status is not positive.
    pub fn has_path(&self) -> bool {
        self.status <= 0 && self.output_path.is_some()
    }
}

/// Step table for one target.
pub struct HorizonsDialogue {
    steps: Vec<Step>,
}

impl HorizonsDialogue {
    /// Build the step table.
    ///
    /// Arguments
    /// ---------
    /// * `config`: e-mail, time window and step timeout
    /// * `target`: any target designation accepted by Horizons, e.g. `"DES=C/2012 S1;"`
    pub fn new(config: &HorizonsConfig, target: &str) -> Result<Self, SpiceError> {
        let timeout = config.step_timeout;
        let line = |text: &str| Some(text.to_string());
        let start = calendar_date(&config.start);
        let stop = calendar_date(&config.stop);

        let steps = vec![
            Step::new("greeting", None, "Horizons>", timeout)?,
            Step::new("page mode", line("PAGE"), "PAGING toggled OFF", timeout)?
                .retry_on("PAGING toggled ON")?,
            Step::new("target", line(target), r"\[S\]PK", timeout)?,
            Step::new("SPK format", line("SPK"), "e-mail address", timeout)?,
            Step::new(
                "e-mail",
                line(config.email.as_str()),
                "text transfer.*YES, NO,",
                timeout,
            )?,
            Step::new("text transfer", line("NO"), "START", timeout)?,
            Step::new("start date", line(start.as_str()), "STOP", timeout)?,
            Step::new("stop date", line(stop.as_str()), "Add more objects to file", timeout)?,
            Step::new("no more objects", line("NO"), r"\n *Full path *:", timeout)?,
            Step::new("file location", None, r"[\r\n]", timeout)?.capturing(),
            Step::new("select prompt", None, r"\n *Select ", timeout)?
                .on_failure(OnFailure::KeepPath(-1)),
            Step::new("main prompt", line(""), "Horizons>", timeout)?
                .on_failure(OnFailure::KeepPath(-2)),
            Step::new("quit", line("quit"), "Connection closed", timeout)?
                .closing()
                .on_failure(OnFailure::KeepPath(-3)),
        ];
        Ok(HorizonsDialogue { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run the dialogue over `transport`.
    ///
    /// Never fails: the outcome carries the status, the transcript and the
    /// cause of a failure.
    pub fn run<T: LineTransport + ?Sized>(&self, transport: &mut T) -> DialogueOutcome {
        let mut buffer = ExpectBuffer::new(transport);
        let mut output_path = None;

        for (number, step) in (1..).zip(&self.steps) {
            log::debug!("Horizons step {number} ({})", step.label);
            match run_step(&mut buffer, step) {
                Ok(captured) => {
                    if step.capture {
                        log::debug!("Horizons SPK location: {captured}");
                        output_path = Some(captured);
                    }
                }
                Err(failure) => {
                    let status = match step.on_failure {
                        OnFailure::Abort => number,
                        OnFailure::KeepPath(status) => status,
                    };
                    log::debug!("Horizons step {number} ({}) failed: {failure}", step.label);
                    let failure = match failure {
                        SpiceError::AutomationProtocol { step, .. } => {
                            SpiceError::AutomationProtocol {
                                step,
                                transcript: buffer.transcript().to_string(),
                            }
                        }
                        other => other,
                    };
                    return DialogueOutcome {
                        status,
                        output_path,
                        transcript: buffer.into_transcript(),
                        failure: Some(failure),
                    };
                }
            }
        }

        DialogueOutcome {
            status: 0,
            output_path,
            transcript: buffer.into_transcript(),
            failure: None,
        }
    }
}

/// Run one step, returning the trimmed text received before its match.
///
/// A first answer matching the retry pattern re-sends the line; a second one
/// is accepted as is, leaving the remote in whatever mode it reported.
fn run_step<T: LineTransport + ?Sized>(
    buffer: &mut ExpectBuffer<'_, T>,
    step: &Step,
) -> Result<String, SpiceError> {
    if let Some(line) = &step.send {
        buffer.send_line(line)?;
    }

    let mut patterns = vec![&step.expect];
    if let Some(retry) = &step.retry {
        patterns.push(retry);
    }

    let mut retried = false;
    loop {
        match buffer.expect(&patterns, step.timeout) {
            Ok(matched) if matched.index == 0 => {
                return Ok(matched.before.trim_matches(['\r', '\n', ' ']).to_string())
            }
            Ok(_) if !retried => {
                retried = true;
                if let Some(line) = &step.send {
                    buffer.send_line(line)?;
                }
            }
            Ok(matched) => {
                log::warn!("Horizons step {} kept the retry answer", step.label);
                return Ok(matched.before.trim_matches(['\r', '\n', ' ']).to_string());
            }
            Err(ExpectFailure::Closed) if step.accept_close => return Ok(String::new()),
            Err(ExpectFailure::Closed) => return Err(protocol_error(step)),
            Err(ExpectFailure::Timeout) => {
                return Err(SpiceError::AutomationTimeout {
                    step: step.label.to_string(),
                    timeout: step.timeout,
                })
            }
            Err(ExpectFailure::Io(err)) => return Err(SpiceError::IoError(err)),
        }
    }
}

fn protocol_error(step: &Step) -> SpiceError {
    SpiceError::AutomationProtocol {
        step: step.label.to_string(),
        transcript: String::new(),
    }
}
