//! Integration tests for the PSPS SOAP client and job runner
//!
//! The service endpoints are pointed at a wiremock server that replies with
//! canned SOAP envelopes; the runner must walk the whole slow-path state
//! machine (submit, poll, extract, download, drop) against it.

use std::io::Write;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skycat_cli::config::Config;
use skycat_cli::credentials::Credentials;
use skycat_cli::psps::{JobType, PspsRunner, PspsSettings, SoapClient};
use skycat_cli::ChunkOutcome;

/// Wrap a value in a minimal SOAP reply envelope
fn soap_return(value: &str) -> String {
    format!(
        "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soap:Body><response><return>{}</return></response></soap:Body>\
         </soap:Envelope>",
        value
    )
}

fn config_for(server: &MockServer) -> Config {
    Config {
        psps_auth_url: format!("{}/auth", server.uri()),
        psps_jobs_url: format!("{}/jobs", server.uri()),
        psps_datastore_url: format!("{}/store/", server.uri()),
        ..Config::default()
    }
}

fn settings(job_type: JobType, work_dir: &std::path::Path) -> PspsSettings {
    PspsSettings {
        username: "observer".to_string(),
        wait: Duration::from_millis(1),
        poll_timeout: Duration::from_secs(5),
        job_type,
        dry_run: false,
        work_dir: work_dir.to_path_buf(),
    }
}

fn auth_file(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("psps_auth.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "observer").unwrap();
    writeln!(file, "hunter2").unwrap();
    path
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(header("SOAPAction", "\"login\""))
        .and(body_string_contains("<username>observer</username>"))
        .and(body_string_contains("<password>hunter2</password>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("SESSION-99")))
        .mount(server)
        .await;
}

// ============================================================================
// SoapClient
// ============================================================================

#[tokio::test]
async fn test_login_returns_session_token() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = SoapClient::new(
        format!("{}/auth", server.uri()),
        format!("{}/jobs", server.uri()),
    )
    .unwrap();

    let session = client.login("observer", "hunter2".to_string()).await.unwrap();
    assert_eq!(session, "SESSION-99");
}

#[tokio::test]
async fn test_get_job_status_decodes_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"getJobStatus\""))
        .and(body_string_contains("<jobID>42</jobID>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("5")))
        .mount(&server)
        .await;

    let client = SoapClient::new(
        format!("{}/auth", server.uri()),
        format!("{}/jobs", server.uri()),
    )
    .unwrap();

    let status = client
        .get_job_status("SESSION-99", "PS1_SCHEMA", 42)
        .await
        .unwrap();
    assert_eq!(status, skycat_common::types::JobStatus::Finished);
    assert!(status.is_terminal());
}

#[tokio::test]
async fn test_soap_fault_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<soap:Envelope><soap:Body><soap:Fault>\
             <faultstring>invalid session</faultstring>\
             </soap:Fault></soap:Body></soap:Envelope>",
        ))
        .mount(&server)
        .await;

    let client = SoapClient::new(
        format!("{}/auth", server.uri()),
        format!("{}/jobs", server.uri()),
    )
    .unwrap();

    let err = client
        .get_job_status("BAD-SESSION", "PS1_SCHEMA", 42)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SOAP"));
}

// ============================================================================
// PspsRunner
// ============================================================================

#[tokio::test]
async fn test_fast_path_writes_result_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"executeQuickJob\""))
        .and(body_string_contains("<sessionID>SESSION-99</sessionID>"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(soap_return("objID,ira,idec\n1,10.1,0.4")),
        )
        .mount(&server)
        .await;

    let runner = PspsRunner::new(settings(JobType::Fast, dir.path()), config_for(&server)).unwrap();
    let creds = Credentials::load(auth_file(dir.path())).unwrap();

    let outcome = runner
        .run(creds, "cat_0", "select top 10 * from StackObjectThin")
        .await
        .unwrap();

    assert_eq!(outcome, ChunkOutcome::Downloaded);
    let written = std::fs::read_to_string(dir.path().join("cat_0_observer.fit")).unwrap();
    assert_eq!(written, "objID,ira,idec\n1,10.1,0.4");
}

#[tokio::test]
async fn test_slow_path_downloads_and_drops_table() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;

    // Query job and the final drop-table job both come through submitJob
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"submitJob\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("42")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"getJobStatus\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("5")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"submitExtractJob\""))
        .and(body_string_contains("<tableName>cat_0</tableName>"))
        .and(body_string_contains("<format>FITS</format>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("43")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/store/cat_0_observer.fit"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SIMULATED FITS".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let runner = PspsRunner::new(settings(JobType::Slow, dir.path()), config_for(&server)).unwrap();
    let creds = Credentials::load(auth_file(dir.path())).unwrap();

    let outcome = runner
        .run(creds, "cat_0", "select * into mydb.[cat_0] from x")
        .await
        .unwrap();

    assert_eq!(outcome, ChunkOutcome::Downloaded);
    let written = std::fs::read(dir.path().join("cat_0_observer.fit")).unwrap();
    assert_eq!(written, b"SIMULATED FITS");

    // Drop-table job was submitted after the download
    let requests = server.received_requests().await.unwrap();
    let drops: Vec<_> = requests
        .iter()
        .filter(|r| {
            String::from_utf8_lossy(&r.body).contains("drop table cat_0")
        })
        .collect();
    assert_eq!(drops.len(), 1);
}

#[tokio::test]
async fn test_slow_path_failed_job_is_soft_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"submitJob\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("42")))
        .mount(&server)
        .await;

    // JOB_FAILED
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"getJobStatus\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("4")))
        .mount(&server)
        .await;

    let runner = PspsRunner::new(settings(JobType::Slow, dir.path()), config_for(&server)).unwrap();
    let creds = Credentials::load(auth_file(dir.path())).unwrap();

    let outcome = runner.run(creds, "cat_0", "select 1").await.unwrap();
    match outcome {
        ChunkOutcome::Failed(reason) => assert!(reason.contains("failed")),
        other => panic!("expected a failed outcome, got {:?}", other),
    }
    assert!(!dir.path().join("cat_0_observer.fit").exists());
}

#[tokio::test]
async fn test_slow_path_poll_deadline_bounds_nonterminal_job() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"submitJob\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("42")))
        .mount(&server)
        .await;

    // JOB_STARTED forever; only the deadline gets us out
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("SOAPAction", "\"getJobStatus\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_return("1")))
        .mount(&server)
        .await;

    let mut settings = settings(JobType::Slow, dir.path());
    settings.poll_timeout = Duration::from_millis(50);
    let runner = PspsRunner::new(settings, config_for(&server)).unwrap();
    let creds = Credentials::load(auth_file(dir.path())).unwrap();

    let outcome = runner.run(creds, "cat_0", "select 1").await.unwrap();
    match outcome {
        ChunkOutcome::Failed(reason) => assert!(reason.contains("deadline")),
        other => panic!("expected a failed outcome, got {:?}", other),
    }
}
