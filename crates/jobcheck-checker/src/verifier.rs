//! 백업 검증기.
//!
//! `ObjectStore`로 목록을 조회해 작업 종류별 평가 함수에 넘긴다.
//! 조회는 [`RetryPolicy`]로 감싸며, 재시도 소진 또는 재시도 불가 에러는
//! 종류별 실패 카운터를 올린 뒤 호출자에게 그대로 반환한다.

use jobcheck_core::config::{BackupJobConfig, JobType};
use jobcheck_core::error::CoreError;
use jobcheck_core::models::backup::BackupCheckResult;
use jobcheck_core::ports::clock::{Clock, SystemClock};
use jobcheck_core::ports::object_store::ObjectStore;
use jobcheck_core::retry::RetryPolicy;
use jobcheck_telemetry::MetricsRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::evaluation::evaluate_files;
use crate::folders::{evaluate_folders, normalize_prefix};

/// 평가 소요 시간 히스토그램
pub const DURATION_HISTOGRAM: &str = "backup_check_duration_seconds";

/// 작업 종류별 카운터 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckMode {
    /// 시도마다 증가하는 카운터
    pub entries_counter: &'static str,
    /// 실패 카운터 접두사 (`<prefix>_checks_<kind>`)
    pub failure_prefix: &'static str,
    operation: &'static str,
}

impl CheckMode {
    pub const FILES: CheckMode = CheckMode {
        entries_counter: "gcs_backup_check_entries",
        failure_prefix: "backup",
        operation: "check_gcs_backup",
    };

    pub const FOLDERS: CheckMode = CheckMode {
        entries_counter: "postgres_backup_check_entries",
        failure_prefix: "postgres_backup",
        operation: "check_postgres_backup",
    };

    pub fn for_job(job_type: JobType) -> Self {
        match job_type {
            JobType::GcsFiles => Self::FILES,
            JobType::PostgresBackup => Self::FOLDERS,
        }
    }

    pub fn failure_counter(&self, error: &CoreError) -> String {
        format!(
            "{}_checks_{}",
            self.failure_prefix,
            error.failure_kind().as_suffix()
        )
    }
}

/// 백업 검증기
pub struct BackupVerifier {
    store: Arc<dyn ObjectStore>,
    registry: Arc<MetricsRegistry>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl BackupVerifier {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: Arc<MetricsRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            retry,
            clock: Arc::new(SystemClock),
        }
    }

    /// 시각 제공자 교체
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 작업 종류에 맞는 검증 실행
    pub async fn verify(&self, job: &BackupJobConfig) -> Result<BackupCheckResult, CoreError> {
        let mode = CheckMode::for_job(job.job_type);

        let result = self
            .retry
            .execute(mode.operation, CoreError::is_retryable_storage, move || {
                self.check_once(mode, job)
            })
            .await;

        result.map_err(|e| {
            let counter = mode.failure_counter(&e);
            self.registry.inc(&counter);
            error!(
                job = %job.job_name,
                bucket = %job.bucket_name,
                kind = e.failure_kind().as_suffix(),
                "백업 검사 실패: {e}"
            );
            e
        })
    }

    /// 단일 시도: 목록 조회 + 평가
    async fn check_once(
        &self,
        mode: CheckMode,
        job: &BackupJobConfig,
    ) -> Result<BackupCheckResult, CoreError> {
        self.registry.inc(mode.entries_counter);

        let started = Instant::now();
        let now = self.clock.now();

        let prefix = match job.job_type {
            JobType::GcsFiles => job.prefix.clone(),
            JobType::PostgresBackup => normalize_prefix(&job.prefix),
        };

        let objects = self
            .store
            .list_objects(&job.bucket_name, &prefix, job.timeout())
            .await?;
        debug!(bucket = %job.bucket_name, prefix = %prefix, count = objects.len(), "목록 조회 완료");

        let result = match job.job_type {
            JobType::GcsFiles => evaluate_files(&objects, now, job.retention_hours),
            JobType::PostgresBackup => evaluate_folders(&objects, &prefix, now),
        };

        self.registry
            .record_histogram(DURATION_HISTOGRAM, started.elapsed().as_secs_f64());

        match (&result.newest_name, result.is_success()) {
            (Some(name), true) => info!(
                "백업 정상: {}/{} - {} bytes",
                job.bucket_name, name, result.size_bytes
            ),
            (Some(name), false) if result.found => warn!(
                "백업 크기 0: {}/{}",
                job.bucket_name, name
            ),
            _ => debug!(job = %job.job_name, detail = %result.error_detail, "평가 결과"),
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use jobcheck_core::models::backup::CheckStatus;
    use jobcheck_core::models::object::StoredObject;
    use jobcheck_core::ports::clock::FixedClock;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 준비된 응답을 순서대로 돌려주는 저장소
    #[derive(Default)]
    struct ScriptedStore {
        responses: Mutex<VecDeque<Result<Vec<StoredObject>, CoreError>>>,
        prefixes: Mutex<Vec<String>>,
    }

    impl ScriptedStore {
        fn push(self, response: Result<Vec<StoredObject>, CoreError>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        fn calls(&self) -> usize {
            self.prefixes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStore for ScriptedStore {
        async fn list_objects(
            &self,
            _bucket: &str,
            prefix: &str,
            _timeout: Duration,
        ) -> Result<Vec<StoredObject>, CoreError> {
            self.prefixes.lock().unwrap().push(prefix.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn job(job_type: JobType, prefix: &str) -> BackupJobConfig {
        BackupJobConfig {
            job_name: "nightly".to_string(),
            instance_id: "psdb01".to_string(),
            storage_type: "gcs".to_string(),
            bucket_name: "backups".to_string(),
            prefix: prefix.to_string(),
            timeout_seconds: 30,
            retention_hours: 24,
            job_type,
        }
    }

    fn verifier(store: Arc<ScriptedStore>, registry: Arc<MetricsRegistry>) -> BackupVerifier {
        BackupVerifier::new(store, registry, RetryPolicy::new(2, Duration::from_secs(1)))
            .with_clock(Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn file_mode_success() {
        let store = Arc::new(ScriptedStore::default().push(Ok(vec![StoredObject::new(
            "db/a.sql.gz",
            42,
            Utc.with_ymd_and_hms(2024, 1, 10, 3, 0, 0).unwrap(),
        )])));
        let registry = Arc::new(MetricsRegistry::new());

        let result = verifier(store.clone(), registry.clone())
            .verify(&job(JobType::GcsFiles, "db/"))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.size_bytes, 42);
        assert_eq!(registry.counter("gcs_backup_check_entries"), Some(1));
        assert_eq!(registry.histogram(DURATION_HISTOGRAM).len(), 1);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn folder_mode_lists_normalized_prefix() {
        let store = Arc::new(ScriptedStore::default().push(Ok(vec![
            StoredObject::new(
                "psdb01/daily-2024-01-10/a",
                10,
                Utc.with_ymd_and_hms(2024, 1, 10, 1, 0, 0).unwrap(),
            ),
            StoredObject::new(
                "psdb01/weekly-2024-01-08/b",
                20,
                Utc.with_ymd_and_hms(2024, 1, 8, 1, 0, 0).unwrap(),
            ),
        ])));
        let registry = Arc::new(MetricsRegistry::new());

        let result = verifier(store.clone(), registry.clone())
            .verify(&job(JobType::PostgresBackup, "psdb01"))
            .await
            .unwrap();

        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.error_detail, "monthly missing");
        assert_eq!(store.prefixes.lock().unwrap()[0], "psdb01/");
        assert_eq!(registry.counter("postgres_backup_check_entries"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let store = Arc::new(
            ScriptedStore::default()
                .push(Err(CoreError::Transport("503".to_string())))
                .push(Ok(Vec::new())),
        );
        let registry = Arc::new(MetricsRegistry::new());

        let result = verifier(store.clone(), registry.clone())
            .verify(&job(JobType::GcsFiles, "db/"))
            .await
            .unwrap();

        assert_eq!(result.error_detail, "No recent backup found");
        assert_eq!(store.calls(), 2);
        assert_eq!(registry.counter("gcs_backup_check_entries"), Some(2));
        assert_eq!(registry.histogram(DURATION_HISTOGRAM).len(), 1);
        assert_eq!(registry.counter("backup_checks_failed"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_count_failure_kind() {
        let not_found = || {
            Err(CoreError::NotFound {
                resource_type: "bucket".to_string(),
                id: "backups".to_string(),
            })
        };
        let store = Arc::new(
            ScriptedStore::default()
                .push(not_found())
                .push(not_found())
                .push(not_found()),
        );
        let registry = Arc::new(MetricsRegistry::new());

        let err = verifier(store.clone(), registry.clone())
            .verify(&job(JobType::PostgresBackup, "psdb01/"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(store.calls(), 3);
        assert_eq!(registry.counter("postgres_backup_checks_not_found"), Some(1));
        assert!(registry.histogram(DURATION_HISTOGRAM).is_empty());
    }

    #[tokio::test]
    async fn non_retryable_error_fails_fast() {
        let store = Arc::new(
            ScriptedStore::default().push(Err(CoreError::Internal("broken".to_string()))),
        );
        let registry = Arc::new(MetricsRegistry::new());

        let err = verifier(store.clone(), registry.clone())
            .verify(&job(JobType::GcsFiles, ""))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Internal(_)));
        assert_eq!(store.calls(), 1);
        assert_eq!(registry.counter("backup_checks_failed"), Some(1));
    }

    #[test]
    fn failure_counter_names() {
        let timeout = CoreError::Timeout {
            timeout_secs: 30,
            context: "list".to_string(),
        };
        assert_eq!(
            CheckMode::FILES.failure_counter(&timeout),
            "backup_checks_timeout"
        );
        assert_eq!(
            CheckMode::FOLDERS.failure_counter(&CoreError::PermissionDenied("x".into())),
            "postgres_backup_checks_permission_denied"
        );
    }
}
