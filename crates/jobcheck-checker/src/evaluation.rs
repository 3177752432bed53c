//! 단일 파일 모드 평가.
//!
//! 보존 기간 안에 수정된 오브젝트 중 가장 최근 것을 골라 크기를 확인한다.

use chrono::{DateTime, TimeDelta, Utc};
use jobcheck_core::models::backup::{BackupCheckResult, CheckStatus};
use jobcheck_core::models::object::StoredObject;

pub const NO_RECENT_BACKUP: &str = "No recent backup found";
pub const ZERO_BYTE_BACKUP: &str = "Backup has zero bytes";

/// `now - retention_hours` 이후 수정된 오브젝트로 성공/실패 판정
///
/// `file_count`는 접두사 아래 전체 오브젝트 수, `recent_count`는 보존 기간 내 개수.
pub fn evaluate_files(
    objects: &[StoredObject],
    now: DateTime<Utc>,
    retention_hours: i64,
) -> BackupCheckResult {
    let cutoff = retention_cutoff(now, retention_hours);

    let mut recent_count = 0;
    let mut newest: Option<&StoredObject> = None;
    for object in objects.iter().filter(|o| o.updated > cutoff) {
        recent_count += 1;
        // 동률이면 먼저 나온 오브젝트 유지
        if newest.map_or(true, |n| object.updated > n.updated) {
            newest = Some(object);
        }
    }

    let Some(newest) = newest else {
        return BackupCheckResult {
            found: false,
            status: CheckStatus::Failed,
            size_bytes: 0,
            file_count: objects.len(),
            recent_count: 0,
            newest_updated: None,
            newest_name: None,
            error_detail: NO_RECENT_BACKUP.to_string(),
            per_type: None,
        };
    };

    let (status, error_detail) = if newest.size <= 0 {
        (CheckStatus::Failed, ZERO_BYTE_BACKUP.to_string())
    } else {
        (CheckStatus::Success, String::new())
    };

    BackupCheckResult {
        found: true,
        status,
        size_bytes: newest.size,
        file_count: objects.len(),
        recent_count,
        newest_updated: Some(newest.updated),
        newest_name: Some(newest.name.clone()),
        error_detail,
        per_type: None,
    }
}

fn retention_cutoff(now: DateTime<Utc>, retention_hours: i64) -> DateTime<Utc> {
    TimeDelta::try_hours(retention_hours)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
