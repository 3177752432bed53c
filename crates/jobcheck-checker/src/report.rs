//! 검증 결과 로그 출력.
//!
//! 작업당 한 줄의 `backup_verification` JSON 레코드를 쓴다.
//! 로그 기반 메트릭 파이프라인이 이 줄을 읽으므로 `metrics_enabled`와 무관하게 항상 출력한다.

use chrono::{DateTime, Utc};
use jobcheck_core::config::BackupJobConfig;
use jobcheck_core::error::CoreError;
use jobcheck_core::models::backup::{BackupCheckResult, CheckStatus};
use jobcheck_telemetry::MetricEmitter;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const VERIFICATION_EVENT_TYPE: &str = "backup_verification";
pub const LOG_ENTRIES_COUNTER: &str = "log_entries_output";
/// 레코드 생성/출력 실패
pub const LOG_ENTRIES_FAILED_COUNTER: &str = "log_entries_failed";

/// 검증 결과 로그 레코드
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationLogEntry {
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    pub app_type: String,
    pub job_name: String,
    pub instance_id: String,
    pub status: CheckStatus,
    /// 백업을 찾았을 때만 실제 크기, 아니면 0
    pub size_bytes: i64,
    pub storage_type: String,
    pub error_detail: String,
    /// 검증 결과에서 `found`/`size_bytes`를 뺀 나머지
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_info: Option<Map<String, Value>>,
}

/// 결과 레코드 출력기
pub struct BackupReporter {
    emitter: Arc<MetricEmitter>,
}

impl BackupReporter {
    pub fn new(emitter: Arc<MetricEmitter>) -> Self {
        Self { emitter }
    }

    pub fn emitter(&self) -> &Arc<MetricEmitter> {
        &self.emitter
    }

    /// 로그 레코드 생성. `app_name`/`app_type`이 없으면 설정값을 쓴다.
    pub fn build_entry(
        &self,
        job: &BackupJobConfig,
        status: CheckStatus,
        backup_info: Option<&BackupCheckResult>,
        error_detail: &str,
        app_name: Option<&str>,
        app_type: Option<&str>,
    ) -> Result<VerificationLogEntry, CoreError> {
        let config = self.emitter.config();

        let size_bytes = backup_info
            .filter(|info| info.found)
            .map_or(0, |info| info.size_bytes);

        let backup_info = backup_info.map(strip_result).transpose()?;

        Ok(VerificationLogEntry {
            event_type: VERIFICATION_EVENT_TYPE,
            timestamp: self.emitter.now(),
            app_name: app_name.unwrap_or(&config.app_name).to_string(),
            app_type: app_type.unwrap_or(&config.app_type).to_string(),
            job_name: job.job_name.clone(),
            instance_id: job.instance_id.clone(),
            status,
            size_bytes,
            storage_type: job.storage_type.clone(),
            error_detail: error_detail.to_string(),
            backup_info,
        })
    }

    /// 레코드 한 줄 출력 후 `log_entries_output` 증가.
    /// 실패하면 `log_entries_failed`를 증가시키고 에러를 반환한다.
    pub fn output_log_entry(
        &self,
        job: &BackupJobConfig,
        status: CheckStatus,
        backup_info: Option<&BackupCheckResult>,
        error_detail: &str,
        app_name: Option<&str>,
        app_type: Option<&str>,
    ) -> Result<(), CoreError> {
        let written = self
            .build_entry(job, status, backup_info, error_detail, app_name, app_type)
            .and_then(|entry| self.emitter.emit_json(&entry));

        let registry = self.emitter.registry();
        match written {
            Ok(()) => {
                registry.inc(LOG_ENTRIES_COUNTER);
                Ok(())
            }
            Err(e) => {
                registry.inc(LOG_ENTRIES_FAILED_COUNTER);
                Err(e)
            }
        }
    }
}

fn strip_result(result: &BackupCheckResult) -> Result<Map<String, Value>, CoreError> {
    let mut map = match serde_json::to_value(result)? {
        Value::Object(map) => map,
        other => {
            return Err(CoreError::Internal(format!(
                "검증 결과가 객체로 직렬화되지 않음: {other}"
            )))
        }
    };
    map.remove("found");
    map.remove("size_bytes");
    Ok(map)
}
