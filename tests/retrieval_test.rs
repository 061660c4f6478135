use camino::{Utf8Path, Utf8PathBuf};
use spicebridge::{
    env_state::HorizonsEnv,
    horizons::retrieval::{resolve_body_id, retrieve_target_spk, RetrievalReport},
    native::session::SpiceSession,
    spice_errors::SpiceError,
};

mod common;
use common::{horizons_script, FakeToolkit, ScriptedTransport};

const LOCATION: &str = "ftp://ssd.jpl.nasa.gov/pub/ssd/wld12345.15";
const TARGET: &str = "DES=C/2012 S1;";

fn spk_session() -> SpiceSession<FakeToolkit> {
    let mut toolkit = FakeToolkit::with_files(&["comet.bsp", "empty.bsp"]);
    toolkit
        .spk_bodies
        .insert(Utf8PathBuf::from("comet.bsp"), vec![1003228, 10]);
    toolkit
        .spk_bodies
        .insert(Utf8PathBuf::from("empty.bsp"), vec![]);
    SpiceSession::new(toolkit)
}

fn downloaded(spk: &str) -> RetrievalReport {
    RetrievalReport {
        spk_path: Utf8PathBuf::from(spk),
        body_id: 0,
        messages: [
            format!("Horizons lookup status=0, URL={LOCATION}"),
            format!("### Retrieved SPK (URL={LOCATION}) as {spk}"),
            "SPICE Body ID not attempted".to_string(),
        ],
    }
}

#[test]
fn test_resolve_body_id() {
    let session = spk_session();
    assert_eq!(
        resolve_body_id(&session, Utf8Path::new("comet.bsp")),
        Ok(1003228)
    );
}

#[test]
fn test_resolve_body_id_without_bodies() {
    let session = spk_session();
    assert_eq!(
        resolve_body_id(&session, Utf8Path::new("empty.bsp")),
        Err(SpiceError::InvalidRecord(
            "no body covered by empty.bsp".into()
        ))
    );
}

#[test]
fn test_resolve_body_id_native_failure() {
    let session = spk_session();
    let err = resolve_body_id(&session, Utf8Path::new("missing.bsp")).unwrap_err();
    assert!(matches!(
        err,
        SpiceError::NativeCall { ref context, ref error }
            if context == "spkobj_c" && error.short == "SPICE(NOSUCHFILE)"
    ));
}

#[test]
fn test_report_body_id_success() {
    let session = spk_session();
    let mut report = downloaded("comet.bsp");
    report.record_body_id(&session);

    assert_eq!(report.body_id, 1003228);
    assert_eq!(
        report.messages[2],
        "### Retrieved SPICEID 1003228; status=SUCCESS"
    );
    assert!(report.messages[1].starts_with("### Retrieved SPK"));
}

#[test]
fn test_report_body_id_failure() {
    let session = spk_session();

    let mut report = downloaded("empty.bsp");
    report.record_body_id(&session);
    assert_eq!(report.body_id, 0);
    assert_eq!(
        report.messages[2],
        "SPICE Body ID FAILED: Invalid record: no body covered by empty.bsp"
    );

    let mut report = downloaded("missing.bsp");
    report.record_body_id(&session);
    assert_eq!(report.body_id, 0);
    assert!(report.messages[2].starts_with("SPICE Body ID FAILED: Native call spkobj_c failed"));
}

#[test]
fn test_retrieval_report_on_lookup_failure() {
    let env = HorizonsEnv::new().unwrap();
    let session = SpiceSession::new(FakeToolkit::default());
    let dir = tempfile::tempdir().unwrap();
    let output_dir = Utf8Path::from_path(dir.path()).unwrap();

    let mut transport = ScriptedTransport::new("Service unavailable\r\n", &[] as &[&str]);
    let report = retrieve_target_spk(&env, &mut transport, &session, TARGET, output_dir);

    assert_eq!(report.spk_path, output_dir.join("DES_C_2012_S1__horizons.bsp"));
    assert_eq!(report.body_id, 0);
    assert_eq!(report.messages[0], "Horizons lookup FAILED status=1, URL=");
    assert_eq!(report.messages[1], "SPK retrieval not attempted");
    assert_eq!(report.messages[2], "SPICE Body ID not attempted");
    assert!(!report.spk_path.exists());
}

#[test]
fn test_retrieval_report_on_download_failure() {
    let env = HorizonsEnv::new().unwrap();
    let session = SpiceSession::new(FakeToolkit::default());
    let dir = tempfile::tempdir().unwrap();
    let output_dir = Utf8Path::from_path(dir.path()).unwrap();

    // reqwest does not handle ftp locations
    let mut transport = ScriptedTransport::new("Horizons> ", &horizons_script(LOCATION));
    let report = retrieve_target_spk(&env, &mut transport, &session, TARGET, output_dir);

    assert_eq!(report.messages[0], format!("Horizons lookup status=0, URL={LOCATION}"));
    assert!(report.messages[1].starts_with("SPK retrieval FAILED"));
    assert_eq!(report.messages[2], "SPICE Body ID not attempted");
    assert_eq!(report.body_id, 0);
}
