//! 설정 로드.
//!
//! 우선순위 (뒤가 이김): 기본값 → JSON 설정 파일 → 환경 변수.
//! 백업 작업 목록은 `BACKUP_JOBS_CONFIG` (JSON 배열 문자열 또는 파일 경로)에서
//! 읽고, 없으면 현재 디렉토리의 `backup-jobs.json`을 찾는다.

use crate::config::{AppConfig, BackupJobConfig, RetryConfig, StorageConfig, TelemetryConfig};
use crate::error::CoreError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 기본 설정 파일 이름
const SETTINGS_FILE_NAME: &str = ".configs";

/// 기본 작업 목록 파일 이름
const JOBS_FILE_NAME: &str = "backup-jobs.json";

/// 중첩 형식 설정 파일의 최상위 키
const SECTION_KEYS: [&str; 4] = ["telemetry", "retry", "storage", "backup_jobs"];

/// 환경 변수 조회 함수
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// 설정 로더
///
/// 환경 변수 조회를 주입받아 테스트에서 프로세스 환경을 건드리지 않는다.
pub struct ConfigLoader {
    settings_path: Option<PathBuf>,
    jobs_source: Option<String>,
    base_dir: PathBuf,
    env: EnvLookup,
}

impl ConfigLoader {
    /// 프로세스 환경 변수를 사용하는 로더 생성
    pub fn new() -> Self {
        Self {
            settings_path: None,
            jobs_source: None,
            base_dir: PathBuf::from("."),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// 설정 파일 경로 지정 (없으면 `CONFIG_FILE` → `./.configs`)
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// 작업 목록 소스 지정 (`BACKUP_JOBS_CONFIG`보다 우선)
    pub fn with_jobs_source(mut self, source: impl Into<String>) -> Self {
        self.jobs_source = Some(source.into());
        self
    }

    /// 기본 파일(`.configs`, `backup-jobs.json`)을 찾을 디렉토리
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// 환경 변수 조회 함수 교체
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    /// 설정 로드. 검증은 호출자가 [`AppConfig::validate`]로 수행한다.
    pub fn load(&self) -> Result<AppConfig, CoreError> {
        let mut config = match self.resolve_settings_path() {
            Some(path) => load_settings_file(&path)?,
            None => AppConfig::default_config(),
        };

        self.apply_env_overrides(&mut config)?;

        let jobs = self.load_jobs()?;
        if !jobs.is_empty() {
            config.backup_jobs = jobs;
        }

        Ok(config)
    }

    fn env(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }

    fn resolve_settings_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.settings_path {
            return Some(path.clone());
        }
        if let Some(path) = self.env("CONFIG_FILE") {
            return Some(PathBuf::from(path));
        }
        let default_path = self.base_dir.join(SETTINGS_FILE_NAME);
        default_path.is_file().then_some(default_path)
    }

    /// 환경 변수 오버라이드 적용
    pub fn apply_env_overrides(&self, config: &mut AppConfig) -> Result<(), CoreError> {
        let telemetry = &mut config.telemetry;
        if let Some(v) = self.env("APP_NAME") {
            telemetry.app_name = v;
        }
        if let Some(v) = self.env("APP_TYPE") {
            telemetry.app_type = v;
        }
        if let Some(v) = self.env("OWNER") {
            telemetry.owner = v;
        }
        if let Some(v) = self.env("METRICS_ENABLED") {
            telemetry.metrics_enabled = parse_bool(&v);
        }
        if let Some(v) = self.env("PROMETHEUS_ENABLED") {
            telemetry.prometheus_enabled = parse_bool(&v);
        }
        if let Some(v) = self.env("LOG_LEVEL") {
            telemetry.log_level = v.parse()?;
        }
        if let Some(v) = self.env("METRIC_SCHEMA") {
            telemetry.metric_schema = v.parse()?;
        }

        if let Some(v) = self.env("RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = self.env("RETRY_INITIAL_DELAY") {
            config.retry.initial_delay_secs = parse_number("RETRY_INITIAL_DELAY", &v)?;
        }

        let storage = &mut config.storage;
        if let Some(v) = self.env("GCS_TIMEOUT") {
            storage.timeout_secs = parse_number("GCS_TIMEOUT", &v)?;
        }
        if let Some(v) = self.env("GCP_PROJECT_ID") {
            storage.project_id = Some(v);
        }
        if let Some(v) = self.env("GCS_ENDPOINT") {
            storage.endpoint = v;
        }
        if let Some(v) = self.env("GCS_ACCESS_TOKEN") {
            storage.access_token = Some(v);
        }

        Ok(())
    }

    fn load_jobs(&self) -> Result<Vec<BackupJobConfig>, CoreError> {
        if let Some(source) = self
            .jobs_source
            .clone()
            .or_else(|| self.env("BACKUP_JOBS_CONFIG"))
        {
            return parse_jobs_source(&source);
        }

        warn!("BACKUP_JOBS_CONFIG 환경 변수 미설정");
        let fallback = self.base_dir.join(JOBS_FILE_NAME);
        if fallback.is_file() {
            return load_jobs_file(&fallback);
        }
        Ok(Vec::new())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// 작업 목록 소스 해석: JSON 배열 문자열이면 그대로, 아니면 파일 경로
pub fn parse_jobs_source(source: &str) -> Result<Vec<BackupJobConfig>, CoreError> {
    match serde_json::from_str::<Value>(source) {
        Ok(value @ Value::Array(_)) => {
            let jobs = jobs_from_value(value)?;
            info!("환경 변수에서 백업 작업 {}개 로드", jobs.len());
            Ok(jobs)
        }
        _ => load_jobs_file(Path::new(source.trim())),
    }
}

/// JSON 파일에서 작업 목록 로드
pub fn load_jobs_file(path: &Path) -> Result<Vec<BackupJobConfig>, CoreError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("작업 설정 파일 읽기 실패: {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        CoreError::Config(format!("작업 설정 파일 파싱 실패: {}: {}", path.display(), e))
    })?;
    let jobs = jobs_from_value(value)?;
    info!("{}에서 백업 작업 {}개 로드", path.display(), jobs.len());
    Ok(jobs)
}

fn jobs_from_value(value: Value) -> Result<Vec<BackupJobConfig>, CoreError> {
    if !value.is_array() {
        return Err(CoreError::Config(
            "작업 설정은 작업 객체의 배열이어야 함".to_string(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| CoreError::Config(format!("작업 설정 파싱 실패: {e}")))
}

/// 설정 파일 로드
///
/// `{"telemetry": {...}, "retry": {...}}` 중첩 형식과
/// `{"APP_NAME": "...", "LOG_LEVEL": "..."}` 평면 형식을 모두 받는다.
pub fn load_settings_file(path: &Path) -> Result<AppConfig, CoreError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
    })?;

    let Some(object) = value.as_object() else {
        return Err(CoreError::Config(format!(
            "설정 파일은 JSON 객체여야 함: {}",
            path.display()
        )));
    };

    let nested = SECTION_KEYS.iter().any(|key| object.contains_key(*key));
    let config = if nested {
        serde_json::from_value::<AppConfig>(value)
    } else {
        flat_settings(value)
    }
    .map_err(|e| CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e)))?;

    debug!("설정 파일 로드 완료: {}", path.display());
    Ok(config)
}

fn flat_settings(value: Value) -> Result<AppConfig, serde_json::Error> {
    Ok(AppConfig {
        telemetry: serde_json::from_value::<TelemetryConfig>(value.clone())?,
        retry: serde_json::from_value::<RetryConfig>(value.clone())?,
        storage: serde_json::from_value::<StorageConfig>(value)?,
        backup_jobs: Vec::new(),
    })
}

/// `"true"` (대소문자 무시)만 참
fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} 값이 숫자가 아님: {value}")))
}
