#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    io,
    time::Duration,
};

use camino::{Utf8Path, Utf8PathBuf};
use spicebridge::{
    horizons::transport::{Chunk, LineTransport},
    native::{native_cell::NativeCell, NativeError, NativeToolkit},
    records::{ek::SpiceEKSegSum, ellipse::SpiceEllipse, plane::SpicePlane},
};

/// In-process stand-in for the native toolkit.
///
/// Kernels must exist in `files` to load; SPK contents are declared per file.
#[derive(Debug, Default)]
pub struct FakeToolkit {
    pub files: Vec<Utf8PathBuf>,
    pub spk_bodies: HashMap<Utf8PathBuf, Vec<i32>>,
    pub spk_windows: HashMap<(Utf8PathBuf, i32), Vec<f64>>,
    pub ek_summary: Option<SpiceEKSegSum>,
    pub loaded: Vec<Utf8PathBuf>,
    pub unload_log: Vec<Utf8PathBuf>,
    /// Forces the next call to report this card instead of the real one.
    pub forced_card: Option<i32>,
    /// Makes every EK close fail.
    pub fail_close: bool,
    pending: Option<NativeError>,
}

impl FakeToolkit {
    pub fn with_files(files: &[&str]) -> Self {
        FakeToolkit {
            files: files.iter().map(|f| Utf8PathBuf::from(*f)).collect(),
            ..FakeToolkit::default()
        }
    }

    fn fail(&mut self, short: &str, long: String) {
        self.pending = Some(NativeError::new(short, long, "Fake toolkit failure."));
    }

    fn knows(&mut self, path: &Utf8Path) -> bool {
        if self.files.iter().any(|f| f == path) {
            true
        } else {
            self.fail("SPICE(NOSUCHFILE)", format!("The file '{path}' could not be located."));
            false
        }
    }
}

impl NativeToolkit for FakeToolkit {
    fn load_kernel(&mut self, path: &Utf8Path) {
        if self.knows(path) {
            self.loaded.push(path.to_path_buf());
        }
    }

    fn unload_kernel(&mut self, path: &Utf8Path) {
        self.unload_log.push(path.to_path_buf());
        if let Some(pos) = self.loaded.iter().position(|k| k == path) {
            self.loaded.remove(pos);
        }
    }

    fn body_name_to_code(&mut self, name: &str) -> Option<i32> {
        match name.to_uppercase().as_str() {
            "EARTH" => Some(399),
            "MARS" => Some(499),
            _ => None,
        }
    }

    fn body_code_to_name(&mut self, code: i32) -> Option<String> {
        match code {
            399 => Some("EARTH".to_string()),
            499 => Some("MARS".to_string()),
            _ => None,
        }
    }

    fn string_to_et(&mut self, text: &str) -> f64 {
        if text.starts_with("2000-01-01T12:00:00") {
            64.184
        } else {
            self.fail("SPICE(UNPARSEDTIME)", format!("'{text}' is not a time string"));
            0.0
        }
    }

    fn et_to_utc(&mut self, _et: f64, format: &str, _precision: i32) -> String {
        format!("2000 JAN 01 12:00:00 ({format})")
    }

    fn spk_objects(&mut self, spk: &Utf8Path, ids: &mut NativeCell<'_>) {
        if !self.knows(spk) {
            return;
        }
        let bodies = self.spk_bodies.get(spk).cloned().unwrap_or_default();
        let mut card = ids.card();
        let size = ids.size();
        let data = ids.integers_mut().unwrap();
        for id in bodies {
            if card >= size {
                self.fail("SPICE(CELLTOOSMALL)", format!("cannot add {id}"));
                break;
            }
            data[card as usize] = id;
            card += 1;
        }
        ids.set_card(self.forced_card.take().unwrap_or(card));
        ids.set_is_set(true);
    }

    fn spk_coverage(&mut self, spk: &Utf8Path, body: i32, cover: &mut NativeCell<'_>) {
        if !self.knows(spk) {
            return;
        }
        let window = self
            .spk_windows
            .get(&(spk.to_path_buf(), body))
            .cloned()
            .unwrap_or_default();
        let card = cover.card() as usize;
        let data = cover.doubles_mut().unwrap();
        data[card..card + window.len()].copy_from_slice(&window);
        cover.set_card((card + window.len()) as i32);
    }

    fn ellipse_from_vectors(
        &mut self,
        center: &[f64; 3],
        vec1: &[f64; 3],
        vec2: &[f64; 3],
    ) -> SpiceEllipse {
        // orthogonal generating vectors are already the semi-axes
        SpiceEllipse {
            center: *center,
            semi_major: *vec1,
            semi_minor: *vec2,
        }
    }

    fn plane_from_normal(&mut self, normal: &[f64; 3], constant: f64) -> SpicePlane {
        let norm = normal.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            self.fail("SPICE(ZEROVECTOR)", "normal vector is zero".to_string());
            return SpicePlane::default();
        }
        SpicePlane {
            normal: normal.map(|x| x / norm),
            constant: constant / norm,
        }
    }

    fn intersect_ellipse_plane(
        &mut self,
        ellipse: &SpiceEllipse,
        plane: &SpicePlane,
    ) -> (i32, [f64; 3], [f64; 3]) {
        // only handles a circle in z = center.z against z = constant
        let z = ellipse.center[2];
        if (z - plane.constant).abs() < 1e-12 {
            (-1, [0.0; 3], [0.0; 3])
        } else {
            (0, [0.0; 3], [0.0; 3])
        }
    }

    fn open_ek(&mut self, path: &Utf8Path) -> i32 {
        if self.knows(path) {
            1
        } else {
            0
        }
    }

    fn close_ek(&mut self, handle: i32) {
        if self.fail_close && self.pending.is_none() {
            self.fail("SPICE(INVALIDHANDLE)", format!("handle {handle} is not open"));
        }
    }

    fn ek_segment_summary(&mut self, _handle: i32, segment: i32, summary: &mut SpiceEKSegSum) {
        match (&self.ek_summary, segment) {
            (Some(sum), 0) => *summary = sum.clone(),
            _ => self.fail("SPICE(INDEXOUTOFRANGE)", format!("no segment {segment}")),
        }
    }

    fn take_error(&mut self) -> Option<NativeError> {
        self.pending.take()
    }
}

/// Transport replaying a scripted conversation.
///
/// Each expected outgoing line is answered with the chunks queued for it;
/// once the queue is empty every read times out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub sent: Vec<String>,
    answers: VecDeque<Vec<Chunk>>,
    incoming: VecDeque<Chunk>,
}

impl ScriptedTransport {
    /// `greeting` is readable right away, `answers[i]` after the i-th sent line.
    pub fn new<S: AsRef<str>>(greeting: &str, answers: &[S]) -> Self {
        ScriptedTransport {
            sent: Vec::new(),
            answers: answers
                .iter()
                .map(|answer| vec![Chunk::Data(answer.as_ref().to_string())])
                .collect(),
            incoming: VecDeque::from([Chunk::Data(greeting.to_string())]),
        }
    }

    /// Close the connection after the last scripted answer.
    pub fn closing(mut self) -> Self {
        if let Some(last) = self.answers.back_mut() {
            last.push(Chunk::Closed);
        }
        self
    }
}

impl LineTransport for ScriptedTransport {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.sent.push(line.to_string());
        if let Some(chunks) = self.answers.pop_front() {
            self.incoming.extend(chunks);
        }
        Ok(())
    }

    fn read_chunk(&mut self, _timeout: Duration) -> io::Result<Chunk> {
        Ok(self.incoming.pop_front().unwrap_or(Chunk::Timeout))
    }
}

/// Answers of a complete Horizons session, one entry per sent line.
pub fn horizons_script(location: &str) -> Vec<String> {
    vec![
        "PAGE\r\nPAGING toggled OFF\r\nHorizons> ".to_string(),
        " Select ... [E]phemeris, [F]tp, [M]ail, [R]edisplay, [S]PK,?,<cr>: ".to_string(),
        " Enter your Internet e-mail address [?]: ".to_string(),
        " Confirm e-mail and text transfer format  [ YES, NO, ? ] : ".to_string(),
        " SPK object START [ t >= 1599-DEC-31 00:00, TDB ]: ".to_string(),
        " SPK object STOP  [ t <= 2500-JAN-01 00:00, TDB ]: ".to_string(),
        " Add more objects to file  [ YES, NO, ? ] : ".to_string(),
        format!(
            "\r\n File type         : Binary SPK\r\n Full path   : {location}\r\n\r\n Select ... [A]gain, [N]ew-case, [F]tp, [M]ail, [R]edisplay, ? : "
        ),
        "\r\nHorizons> ".to_string(),
        "\r\n Connection closed by foreign host.\r\n".to_string(),
    ]
}
