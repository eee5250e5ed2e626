use portal_client::{Phase, PortalClient, SelectedFile, UploadOrchestrator};
use portal_core::{IngestTarget, Severity};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn portal(server: &MockServer) -> UploadOrchestrator {
    let client = PortalClient::new(&server.uri()).expect("portal client");
    UploadOrchestrator::new(client)
}

fn target() -> IngestTarget {
    IngestTarget::new("sales", "orders")
}

fn upload_success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"message": "File uploaded successfully"}))
}

fn titles(orchestrator: &UploadOrchestrator) -> Vec<&str> {
    orchestrator
        .notifications
        .notifications()
        .iter()
        .map(|entry| entry.title.as_str())
        .collect()
}

async fn mount_refresh_backend(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/file-count"))
        .and(query_param("database", "sales"))
        .and(query_param("table", "orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fileCount": 2})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/total-data"))
        .and(query_param("database", "sales"))
        .and(query_param("table", "orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalSize": 300})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submitJob"))
        .and(body_partial_json(json!({
            "run_name": "Data Ingestion",
            "tasks": [{
                "task_key": "ingest",
                "notebook_task": {
                    "notebook_path": "/pipelines/file_ingestion",
                    "base_parameters": {
                        "database_name": "sales",
                        "table_name": "orders",
                    },
                },
            }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Job submitted successfully",
            "data": {"run_id": 7},
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCost": 42.5,
            "currency": "USD",
            "timeframe": "2024-01-31 to 2024-03-01",
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn a_two_file_batch_tracks_progress_and_notifies_each_step() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(upload_success())
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh_backend(&server).await;

    let mut portal = portal(&server);
    let files = vec![
        SelectedFile::new("a.txt", vec![b'a'; 100]),
        SelectedFile::new("b.txt", vec![b'b'; 200]),
    ];

    let report = portal.run_batch(files, &target(), "Data Ingestion").await;

    assert_eq!(report.files_uploaded, 2);
    assert_eq!(report.files_failed, 0);
    assert_eq!(report.bytes_uploaded, 300);
    assert_eq!(report.files[0].progress_percent, 50.0);
    assert_eq!(report.files[1].progress_percent, 100.0);
    assert_eq!(report.job.and_then(|job| job.run_id), Some(7));

    assert_eq!(portal.metrics.file_count, 2);
    assert_eq!(portal.metrics.total_bytes, 300);
    assert_eq!(portal.metrics.cost, 42.5);
    assert_eq!(portal.metrics.currency, "USD");
    assert_eq!(portal.phase(), Phase::Idle);
    assert_eq!(portal.progress_percent(), 100.0);

    assert_eq!(
        titles(&portal),
        [
            "File Uploaded",
            "File Uploaded",
            "File Count Updated",
            "Data Ingested Updated",
            "Job Submitted",
            "Cost Updated",
        ]
    );

    let requests = server.received_requests().await.expect("request recording");
    let upload = requests
        .iter()
        .find(|request| request.url.path() == "/api/upload")
        .expect("upload request");
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"a.txt\""));
    assert!(body.contains("name=\"database\""));
    assert!(body.contains("name=\"table\""));
}

#[tokio::test]
async fn a_failed_upload_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(upload_success())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "disk full"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(upload_success())
        .mount(&server)
        .await;
    mount_refresh_backend(&server).await;

    let mut portal = portal(&server);
    let files = vec![
        SelectedFile::new("a.txt", vec![0u8; 100]),
        SelectedFile::new("b.txt", vec![0u8; 200]),
        SelectedFile::new("c.txt", vec![0u8; 400]),
    ];

    let report = portal.run_batch(files, &target(), "Data Ingestion").await;

    assert_eq!(report.files_uploaded, 2);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.bytes_uploaded, 500);
    assert_eq!(report.files[1].error.as_deref(), Some("disk full"));
    // A failure leaves the progress bar where it was.
    assert_eq!(
        report.files[1].progress_percent,
        report.files[0].progress_percent
    );
    assert!((report.files[2].progress_percent - 200.0 / 3.0).abs() < 1e-9);

    let failure = portal
        .notifications
        .notifications()
        .iter()
        .find(|entry| entry.title == "Upload Failed")
        .expect("failure notification");
    assert_eq!(failure.body, "Failed to upload b.txt: disk full");
    assert_eq!(failure.severity, Severity::Error);

    // The follow-up steps still ran.
    assert_eq!(portal.metrics.file_count, 2);
    assert!(report.job.is_some());
}

#[tokio::test]
async fn an_incomplete_target_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    let mut portal = portal(&server);
    let files = vec![SelectedFile::new("a.txt", vec![0u8; 10])];

    let report = portal
        .run_batch(files, &IngestTarget::new("", "orders"), "Data Ingestion")
        .await;

    assert!(report.files.is_empty());
    assert_eq!(report.files_uploaded, 0);
    assert_eq!(report.files_failed, 0);
    assert_eq!(portal.phase(), Phase::Idle);

    let entries = portal.notifications.notifications();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Missing Information");
    assert_eq!(entries[0].body, "Please provide the database and table names.");
    assert_eq!(entries[0].severity, Severity::Error);

    let requests = server.received_requests().await.expect("request recording");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn refresh_failures_keep_the_upload_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(upload_success())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/file-count"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Error fetching file count",
            "error": "lake unreachable",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/total-data"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Error fetching total data ingested",
            "error": "lake unreachable",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submitJob"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": "Failed to submit job",
            "details": "Bad Gateway",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cost"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Error fetching cost data",
            "error": "no cost data available",
        })))
        .mount(&server)
        .await;

    let mut portal = portal(&server);
    let files = vec![SelectedFile::new("a.txt", vec![0u8; 128])];

    let report = portal.run_batch(files, &target(), "Data Ingestion").await;

    assert_eq!(report.files_uploaded, 1);
    assert!(report.job.is_none());
    // The upload keeps counting even though every follow-up step failed.
    assert_eq!(portal.metrics.total_bytes, 128);
    assert_eq!(portal.metrics.file_count, 0);

    assert_eq!(
        titles(&portal),
        [
            "File Uploaded",
            "File Count Update Failed",
            "Data Ingested Update Failed",
            "Job Submission Failed",
            "Cost Update Failed",
        ]
    );

    let entries = portal.notifications.notifications();
    assert!(entries[1].body.contains("Error fetching file count"));
    assert!(entries[3].body.contains("Bad Gateway"));
}

#[tokio::test]
async fn an_empty_batch_still_refreshes_metrics_and_submits_the_job() {
    let server = MockServer::start().await;
    mount_refresh_backend(&server).await;

    let mut portal = portal(&server);
    let report = portal
        .run_batch(Vec::new(), &target(), "Data Ingestion")
        .await;

    assert!(report.files.is_empty());
    assert_eq!(report.bytes_uploaded, 0);
    assert_eq!(portal.progress_percent(), 0.0);
    assert_eq!(
        titles(&portal),
        [
            "File Count Updated",
            "Data Ingested Updated",
            "Job Submitted",
            "Cost Updated",
        ]
    );
}

#[tokio::test]
async fn upload_failures_surface_the_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "File must be a TXT"})),
        )
        .mount(&server)
        .await;

    let client = PortalClient::new(&server.uri()).expect("portal client");
    let file = SelectedFile::new("report.csv", b"a,b\n".to_vec());
    let outcome = client.upload(&file, &target()).await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.byte_size, 0);
    assert_eq!(outcome.error.as_deref(), Some("File must be a TXT"));
}

#[tokio::test]
async fn non_json_upload_responses_become_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = PortalClient::new(&server.uri()).expect("portal client");
    let file = SelectedFile::new("data.txt", vec![0u8; 4]);
    let outcome = client.upload(&file, &target()).await;

    assert!(!outcome.succeeded);
    assert_eq!(
        outcome.error.as_deref(),
        Some("unexpected response: 502 Bad Gateway")
    );
}
