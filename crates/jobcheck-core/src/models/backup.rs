//! 백업 검증 결과 모델.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 검증 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Failed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Success => "success",
            CheckStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 폴더 기반 백업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Daily,
    Weekly,
    Monthly,
}

impl BackupKind {
    /// 평가 순서
    pub const ALL: [BackupKind; 3] = [BackupKind::Daily, BackupKind::Weekly, BackupKind::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Daily => "daily",
            BackupKind::Weekly => "weekly",
            BackupKind::Monthly => "monthly",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 종류별 최신 폴더 평가 결과
///
/// 후보가 없으면 `found`/`passed`만 `false`로 채워진다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderCheck {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    /// 폴더 날짜 자정(UTC) 이후 경과 시간, 소수 둘째 자리 반올림
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_since: Option<f64>,
    /// 달력 기준 경과 일수
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since: Option<i64>,
    pub passed: bool,
}

impl FolderCheck {
    /// 후보 폴더 없음
    pub fn missing() -> Self {
        Self {
            found: false,
            folder_name: None,
            folder_date: None,
            size_bytes: None,
            file_count: None,
            hours_since: None,
            days_since: None,
            passed: false,
        }
    }
}

/// 단일 작업 검증 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupCheckResult {
    pub found: bool,
    pub status: CheckStatus,
    pub size_bytes: i64,
    /// 접두사 아래 전체 오브젝트 수 (폴더 모드: 선택된 폴더 합계)
    pub file_count: usize,
    /// 보존 기간 내 오브젝트 수 (폴더 모드: 통과 시 3)
    pub recent_count: usize,
    pub newest_updated: Option<DateTime<Utc>>,
    pub newest_name: Option<String>,
    pub error_detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_type: Option<BTreeMap<BackupKind, FolderCheck>>,
}

impl BackupCheckResult {
    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Success
    }
}
