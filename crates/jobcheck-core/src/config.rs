//! 애플리케이션 설정 구조체.
//!
//! 앱 식별 정보, 메트릭 출력 스위치, 재시도 튜닝, 스토리지 접속 정보,
//! 백업 작업 목록을 정의한다. 로드 순서는 [`crate::config_manager`] 참조.
//!
//! 설정 파일은 아래 필드만 덮어쓸 수 있으며 알 수 없는 키는 무시된다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 메트릭/로그 출력 설정
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 재시도 설정
    #[serde(default)]
    pub retry: RetryConfig,
    /// 스토리지 접속 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 백업 작업 목록
    #[serde(default)]
    pub backup_jobs: Vec<BackupJobConfig>,
}

// ============================================================
// 텔레메트리 설정
// ============================================================

/// 로그 심각도. 순서대로 비교한다 (Debug < ... < Critical).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// `tracing_subscriber::EnvFilter`에 넘길 필터 지시어
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            other => Err(CoreError::validation(
                "log_level",
                format!("알 수 없는 로그 레벨: {other}"),
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, CoreError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON 메트릭 이벤트 스키마
///
/// - `MetricValue`: 호출자가 넘긴 값을 `metric_value`로 기록
/// - `CallCounter`: 위에 더해 emitter별 단조 증가 호출 횟수를 `counter`로 기록
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSchema {
    #[default]
    MetricValue,
    CallCounter,
}

impl FromStr for MetricSchema {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric_value" | "value" => Ok(MetricSchema::MetricValue),
            "call_counter" | "counter" => Ok(MetricSchema::CallCounter),
            other => Err(CoreError::validation(
                "metric_schema",
                format!("알 수 없는 메트릭 스키마: {other}"),
            )),
        }
    }
}

/// 텔레메트리 설정 — 앱 식별 정보와 두 출력 싱크의 활성화 스위치
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_app_name", alias = "APP_NAME")]
    pub app_name: String,
    #[serde(default = "default_app_type", alias = "APP_TYPE")]
    pub app_type: String,
    #[serde(default = "default_owner", alias = "OWNER")]
    pub owner: String,
    /// JSON 메트릭 로그 출력 (로그 레벨과 무관)
    #[serde(default = "default_true", alias = "METRICS_ENABLED")]
    pub metrics_enabled: bool,
    /// 프로세스 내 레지스트리 갱신
    #[serde(default, alias = "PROMETHEUS_ENABLED")]
    pub prometheus_enabled: bool,
    /// 일반 로그 최소 심각도
    #[serde(default, alias = "LOG_LEVEL")]
    pub log_level: LogLevel,
    #[serde(default, alias = "METRIC_SCHEMA")]
    pub metric_schema: MetricSchema,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            app_type: default_app_type(),
            owner: default_owner(),
            metrics_enabled: true,
            prometheus_enabled: false,
            log_level: LogLevel::Info,
            metric_schema: MetricSchema::MetricValue,
        }
    }
}

fn default_app_name() -> String {
    "default_app".to_string()
}

fn default_app_type() -> String {
    "gke_job".to_string()
}

fn default_owner() -> String {
    "default_owner".to_string()
}

fn default_true() -> bool {
    true
}

// ============================================================
// 재시도 설정
// ============================================================

/// 재시도 설정 — exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 첫 시도 이후 재시도 횟수 (총 시도 = max_attempts + 1)
    #[serde(default = "default_max_attempts", alias = "RETRY_MAX_ATTEMPTS")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_secs", alias = "RETRY_INITIAL_DELAY")]
    pub initial_delay_secs: f64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            backoff_factor: default_backoff_factor(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_secs() -> f64 {
    1.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_secs() -> f64 {
    60.0
}

// ============================================================
// 스토리지 설정
// ============================================================

/// 오브젝트 스토리지 접속 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, alias = "GCP_PROJECT_ID")]
    pub project_id: Option<String>,
    /// HTTP 연결 타임아웃 (초). 요청 타임아웃은 작업별 `timeout_seconds`
    #[serde(default = "default_timeout_secs", alias = "GCS_TIMEOUT")]
    pub timeout_secs: u64,
    /// JSON API 엔드포인트
    #[serde(default = "default_endpoint", alias = "GCS_ENDPOINT")]
    pub endpoint: String,
    /// 외부에서 발급된 bearer 토큰
    #[serde(default, alias = "GCS_ACCESS_TOKEN", skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            timeout_secs: default_timeout_secs(),
            endpoint: default_endpoint(),
            access_token: None,
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

// ============================================================
// 백업 작업 설정
// ============================================================

/// 백업 검증 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// 접두사 아래 최신 단일 파일 검사
    #[default]
    GcsFiles,
    /// daily/weekly/monthly 날짜 폴더 검사
    PostgresBackup,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::GcsFiles => "gcs_files",
            JobType::PostgresBackup => "postgres_backup",
        }
    }
}

/// 지원하는 스토리지 종류
pub const SUPPORTED_STORAGE_TYPE: &str = "gcs";

/// 단일 백업 작업 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupJobConfig {
    pub job_name: String,
    pub instance_id: String,
    /// 현재 "gcs"만 지원
    pub storage_type: String,
    pub bucket_name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,
    /// 최근 백업으로 인정하는 기간 (시간)
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
    #[serde(default)]
    pub job_type: JobType,
}

fn default_retention_hours() -> i64 {
    24
}

impl BackupJobConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// 단일 작업 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.storage_type != SUPPORTED_STORAGE_TYPE {
            return Err(CoreError::validation(
                "storage_type",
                format!(
                    "작업 {}: '{}' 미지원 — '{}'만 지원",
                    self.job_name, self.storage_type, SUPPORTED_STORAGE_TYPE
                ),
            ));
        }

        if self.job_type == JobType::PostgresBackup && self.prefix.is_empty() {
            return Err(CoreError::validation(
                "prefix",
                format!(
                    "작업 {}: postgres_backup 작업은 인스턴스 폴더 prefix 필수",
                    self.job_name
                ),
            ));
        }

        if self.bucket_name.is_empty() {
            return Err(CoreError::validation(
                "bucket_name",
                format!("작업 {}: bucket_name 필수", self.job_name),
            ));
        }

        if self.retention_hours <= 0 {
            return Err(CoreError::validation(
                "retention_hours",
                format!("작업 {}: retention_hours는 양수여야 함", self.job_name),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// 기본 설정 (작업 없음)
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 실행 전 전체 설정 검증. 하나라도 실패하면 어떤 작업도 시작하지 않는다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.telemetry.app_name.is_empty() {
            return Err(CoreError::validation("app_name", "APP_NAME 필수"));
        }

        if self.backup_jobs.is_empty() {
            return Err(CoreError::validation("backup_jobs", "설정된 백업 작업 없음"));
        }

        for job in &self.backup_jobs {
            job.validate()?;
        }

        Ok(())
    }
}
