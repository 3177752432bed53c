//! 오브젝트 스토리지 목록 항목.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 접두사 목록 조회로 얻은 오브젝트 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    /// 버킷 내 전체 경로
    pub name: String,
    /// 크기 (bytes)
    pub size: i64,
    /// 마지막 수정 시각
    pub updated: DateTime<Utc>,
}

impl StoredObject {
    pub fn new(name: impl Into<String>, size: i64, updated: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            updated,
        }
    }
}
