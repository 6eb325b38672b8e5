//! Add endpoint behaviour against an in-process daemon

mod support;

use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage_staging::{
    Blob, Cid, File, Method, Progress, PutOptions, StorageError, UploadResult,
};
use support::{client, parts, MockDaemon, Reply};
use tokio_util::sync::CancellationToken;

fn two_files() -> Vec<File> {
    vec![
        File::new(Blob::new(&b"abc"[..], "text/plain"), "a.txt")
            .last_modified(Utc.timestamp_millis_opt(1_600_000_000_123).unwrap()),
        File::new(&b"hello"[..], "b.txt")
            .last_modified(Utc.timestamp_millis_opt(1_600_000_001_000).unwrap()),
    ]
}

#[tokio::test]
async fn test_put_all_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();

    let daemon = MockDaemon::ndjson(&[
        r#"{"Hash":"Qm1","Name":"a.txt","Size":"3"}"#,
        r#"{"Hash":"Qm2","Name":"b.txt","Size":"5"}"#,
    ]);
    let client = client(daemon.clone());

    let results = client
        .blob()
        .put_all(&two_files(), &PutOptions::new().pin(true))
        .await?;

    assert_eq!(
        results,
        vec![
            UploadResult::new("a.txt", 3, Cid::new("Qm1")),
            UploadResult::new("b.txt", 5, Cid::new("Qm2")),
        ]
    );

    let requests = daemon.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(
        request.url.as_str(),
        "http://localhost:5001/api/v0/add?stream-channels=true&pin=true"
    );
    assert!(request
        .header("Content-Type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let parts = parts(request).await;
    assert_eq!(parts.len(), 2);

    assert_eq!(parts[0].name, "file");
    assert_eq!(parts[0].filename.as_deref(), Some("a.txt"));
    assert_eq!(parts[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(parts[0].header("mtime"), Some("1600000000"));
    assert_eq!(parts[0].header("mtime-nsecs"), Some("123000000"));
    assert_eq!(parts[0].data, b"abc");

    assert_eq!(parts[1].name, "file");
    assert_eq!(parts[1].filename.as_deref(), Some("b.txt"));
    assert_eq!(parts[1].content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(parts[1].header("mtime"), Some("1600000001"));
    assert_eq!(parts[1].header("mtime-nsecs"), Some("0"));
    assert_eq!(parts[1].data, b"hello");

    Ok(())
}

#[tokio::test]
async fn test_put_single_file() -> Result<(), Box<dyn std::error::Error>> {
    let daemon = MockDaemon::ndjson(&[r#"{"Hash":"QmSingle","Name":"notes/today.md","Size":"2"}"#]);
    let client = client(daemon.clone());

    let file = File::new(&b"hi"[..], "today.md").path("notes/today.md");
    let result = client.blob().put(&file, &PutOptions::new()).await?;

    assert_eq!(result.cid.to_string(), "QmSingle");
    assert_eq!(result.path, "notes/today.md");
    assert_eq!(result.size, 2);

    let parts = parts(&daemon.requests()[0]).await;
    assert_eq!(parts[0].filename.as_deref(), Some("notes/today.md"));
    Ok(())
}

#[tokio::test]
async fn test_put_with_empty_report_fails() {
    let client = client(MockDaemon::ndjson(&[]));
    let file = File::new(&b"x"[..], "x");
    assert!(matches!(
        client.blob().put(&file, &PutOptions::new()).await,
        Err(StorageError::UploadError { .. })
    ));
}

#[tokio::test]
async fn test_put_all_empty_makes_no_request() {
    let daemon = MockDaemon::ndjson(&[]);
    let client = client(daemon.clone());

    let result = client.blob().put_all(&[], &PutOptions::new()).await;
    assert!(matches!(
        result,
        Err(StorageError::InvalidParameter { .. })
    ));
    assert!(daemon.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_options_make_no_request() {
    let daemon = MockDaemon::ndjson(&[]);
    let client = client(daemon.clone());

    let result = client
        .blob()
        .put_all(&two_files(), &PutOptions::new().cid_version(7))
        .await;
    assert!(matches!(
        result,
        Err(StorageError::InvalidParameter { .. })
    ));
    assert!(daemon.requests().is_empty());
}

#[tokio::test]
async fn test_line_break_in_content_type_makes_no_request() {
    let daemon = MockDaemon::ndjson(&[]);
    let client = client(daemon.clone());

    let file = File::new(Blob::new(&b"real"[..], "text/plain\r\n\r\nINJECTED"), "a.txt");
    let result = client.blob().put(&file, &PutOptions::new()).await;
    assert!(matches!(
        result,
        Err(StorageError::InvalidParameter { .. })
    ));
    assert!(daemon.requests().is_empty());
}

#[tokio::test]
async fn test_server_error_is_upload_error() {
    let client = client(MockDaemon::status(500, "Internal Server Error"));

    match client.blob().put_all(&two_files(), &PutOptions::new()).await {
        Err(StorageError::UploadError { message }) => {
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("Expected UploadError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_network_failure_is_upload_error() {
    let client = client(MockDaemon::new(Reply::Fail("connection reset".into())));

    let result = client.blob().put_all(&two_files(), &PutOptions::new()).await;
    assert!(matches!(result, Err(StorageError::UploadError { .. })));
}

#[tokio::test]
async fn test_timeout_surfaces_timeout_error() {
    let daemon = MockDaemon::new(Reply::Hang);
    let client = client(daemon.clone());

    let result = client
        .blob()
        .put_all(
            &two_files(),
            &PutOptions::new().timeout(Duration::from_millis(25)),
        )
        .await;

    assert!(matches!(result, Err(StorageError::Timeout { .. })));
    assert!(daemon.dropped());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_surfaces_abort_error() {
    let daemon = MockDaemon::new(Reply::Hang);
    let client = client(daemon.clone());
    let signal = CancellationToken::new();

    let canceller = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = client
        .blob()
        .put_all(&two_files(), &PutOptions::new().signal(signal))
        .await;

    assert!(matches!(result, Err(StorageError::Aborted { .. })));
    assert!(daemon.dropped());
}

#[tokio::test]
async fn test_progress_reported_and_flag_sent() {
    let daemon = MockDaemon::ndjson(&[r#"{"Hash":"Qm1","Name":"a.txt","Size":"3"}"#]);
    let client = client(daemon.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let options = PutOptions::new().on_progress(move |progress: Progress| {
        println!(
            "Upload progress: {} of {} bytes ({}%)",
            progress.loaded,
            progress.total,
            (progress.percentage() * 100.0) as u32
        );
        recorder.lock().unwrap().push(progress);
    });

    client.blob().put_all(&two_files()[..1], &options).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].loaded, seen[1].total);
    assert!(daemon.requests()[0]
        .url
        .as_str()
        .contains("stream-channels=true&progress=true"));
}
