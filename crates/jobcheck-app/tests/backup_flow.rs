//! GCS mock 서버 → 검증기 → 결과 레코드 전체 흐름 통합 테스트.

use chrono::{TimeZone, Utc};
use jobcheck_checker::{run_checks, BackupReporter, BackupVerifier, RunSummary};
use jobcheck_core::config::{BackupJobConfig, JobType, StorageConfig, TelemetryConfig};
use jobcheck_core::ports::clock::FixedClock;
use jobcheck_core::retry::RetryPolicy;
use jobcheck_network::GcsObjectStore;
use jobcheck_telemetry::sink::MemorySink;
use jobcheck_telemetry::{MetricEmitter, MetricsRegistry};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    verifier: BackupVerifier,
    reporter: BackupReporter,
    sink: Arc<MemorySink>,
    registry: Arc<MetricsRegistry>,
}

fn harness(endpoint: &str, telemetry: TelemetryConfig) -> Harness {
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()));
    let registry = Arc::new(MetricsRegistry::new());
    let sink = Arc::new(MemorySink::new());

    let storage = StorageConfig {
        endpoint: endpoint.to_string(),
        access_token: Some("test-token".to_string()),
        ..StorageConfig::default()
    };
    let store = GcsObjectStore::from_config(&storage).unwrap();

    let emitter = MetricEmitter::new(telemetry, registry.clone(), sink.clone())
        .with_clock(clock.clone());
    let verifier = BackupVerifier::new(
        Arc::new(store),
        registry.clone(),
        RetryPolicy::new(1, Duration::from_millis(10)),
    )
    .with_clock(clock);

    Harness {
        verifier,
        reporter: BackupReporter::new(Arc::new(emitter)),
        sink,
        registry,
    }
}

fn job(name: &str, bucket: &str, prefix: &str, job_type: JobType) -> BackupJobConfig {
    BackupJobConfig {
        job_name: name.to_string(),
        instance_id: format!("{name}-01"),
        storage_type: "gcs".to_string(),
        bucket_name: bucket.to_string(),
        prefix: prefix.to_string(),
        timeout_seconds: 5,
        retention_hours: 24,
        job_type,
    }
}

#[tokio::test]
async fn file_and_folder_jobs_end_to_end() {
    let mut server = mockito::Server::new_async().await;

    let files = server
        .mock("GET", "/storage/v1/b/app-backups/o")
        .match_query(Matcher::UrlEncoded("prefix".into(), "mysql/".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items":[
                {"name":"mysql/dump-0109.sql.gz","size":"2048","updated":"2024-01-09T02:00:00Z"},
                {"name":"mysql/dump-0110.sql.gz","size":"4096","updated":"2024-01-10T02:00:00Z"}
            ]}"#,
        )
        .create_async()
        .await;

    let folders = server
        .mock("GET", "/storage/v1/b/pg-backups/o")
        .match_query(Matcher::UrlEncoded("prefix".into(), "psdb01/".into()))
        .with_status(200)
        .with_body(
            r#"{"items":[
                {"name":"psdb01/2024-01-10_daily/base.tar.gz","size":"100","updated":"2024-01-10T01:00:00Z"},
                {"name":"psdb01/2024-01-07_weekly/base.tar.gz","size":"200","updated":"2024-01-07T01:00:00Z"},
                {"name":"psdb01/2024-01-01_monthly/base.tar.gz","size":"300","updated":"2024-01-01T01:00:00Z"}
            ]}"#,
        )
        .create_async()
        .await;

    let h = harness(&server.url(), TelemetryConfig::default());
    let jobs = vec![
        job("mysql", "app-backups", "mysql/", JobType::GcsFiles),
        job("postgres", "pg-backups", "psdb01", JobType::PostgresBackup),
    ];

    let summary = run_checks(&jobs, &h.verifier, &h.reporter).await;

    assert_eq!(
        summary,
        RunSummary {
            total: 2,
            succeeded: 2,
            failed: 0
        }
    );
    files.assert_async().await;
    folders.assert_async().await;

    let lines = h.sink.json_lines().unwrap();
    assert_eq!(lines.len(), 2);

    let mysql = &lines[0];
    assert_eq!(mysql["event_type"], "backup_verification");
    assert_eq!(mysql["status"], "success");
    assert_eq!(mysql["size_bytes"], 4096);
    assert_eq!(mysql["backup_info"]["recent_count"], 1);
    assert_eq!(mysql["backup_info"]["file_count"], 2);
    assert_eq!(mysql["backup_info"]["newest_name"], "mysql/dump-0110.sql.gz");

    let postgres = &lines[1];
    assert_eq!(postgres["status"], "success");
    assert_eq!(postgres["size_bytes"], 600);
    assert_eq!(postgres["backup_info"]["recent_count"], 3);
    assert_eq!(
        postgres["backup_info"]["per_type"]["weekly"]["folder_date"],
        "2024-01-07"
    );

    assert_eq!(h.registry.counter("backups_check_success"), Some(2));
    assert_eq!(h.registry.counter("log_entries_output"), Some(2));
    assert_eq!(h.registry.histogram("backup_check_duration_seconds").len(), 2);
}

#[tokio::test]
async fn missing_bucket_is_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;
    let missing = server
        .mock("GET", "/storage/v1/b/gone/o")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"The specified bucket does not exist."}}"#)
        .expect(2)
        .create_async()
        .await;

    let h = harness(&server.url(), TelemetryConfig::default());
    let jobs = vec![job("orphan", "gone", "db/", JobType::GcsFiles)];

    let summary = run_checks(&jobs, &h.verifier, &h.reporter).await;

    assert_eq!(summary.failed, 1);
    missing.assert_async().await;

    let lines = h.sink.json_lines().unwrap();
    let entry = &lines[0];
    assert_eq!(entry["status"], "failed");
    assert_eq!(entry["size_bytes"], 0);
    assert!(entry["error_detail"].as_str().unwrap().contains("gone"));
    assert!(entry.get("backup_info").is_none());

    assert_eq!(h.registry.counter("backup_checks_not_found"), Some(1));
    assert_eq!(h.registry.counter("gcs_backup_check_entries"), Some(2));
}

#[tokio::test]
async fn verification_records_ignore_metrics_switch() {
    let mut server = mockito::Server::new_async().await;
    let _empty = server
        .mock("GET", "/storage/v1/b/quiet/o")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"kind":"storage#objects"}"#)
        .create_async()
        .await;

    let telemetry = TelemetryConfig {
        metrics_enabled: false,
        ..TelemetryConfig::default()
    };
    let h = harness(&server.url(), telemetry);
    let jobs = vec![job("quiet", "quiet", "", JobType::GcsFiles)];

    run_checks(&jobs, &h.verifier, &h.reporter).await;

    let lines = h.sink.json_lines().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["error_detail"], "No recent backup found");
    assert_eq!(lines[0]["backup_info"]["recent_count"], 0);
}
