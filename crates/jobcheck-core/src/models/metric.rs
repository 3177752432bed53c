//! 로그 기반 메트릭 이벤트 모델.
//!
//! 한 번의 방출 호출마다 하나의 [`MetricEvent`]가 만들어져 곧바로
//! 한 줄짜리 JSON 객체로 직렬화된다.
//!
//! # 예약 키 우선 규칙
//!
//! `extra` 필드는 기본 필드 뒤에 병합된다. 키가 기본 필드
//! (`metric_name`, `metric_value`, `info`, `app_name`, `app_type`, `owner`,
//! `event_type`, `timestamp`, 그리고 존재할 경우 `message`, `counter`)와
//! 겹치면 기본 값이 유지되고 `extra` 값은 조용히 버려진다.
//! 호출자가 식별 필드를 위조할 수 없도록 보장하는 계약이다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// 메트릭 이벤트의 `event_type` 값
pub const METRIC_EVENT_TYPE: &str = "metric";

/// 불변 메트릭 이벤트
#[derive(Debug, Clone, Serialize)]
pub struct MetricEvent {
    pub metric_name: String,
    pub metric_value: f64,
    /// 자유 형식 컨텍스트
    pub info: Map<String, Value>,
    pub app_name: String,
    pub app_type: String,
    pub owner: String,
    pub event_type: &'static str,
    /// RFC3339 UTC
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 호출 횟수 스키마에서만 채워짐
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<u64>,
    /// 병합 대상 추가 필드
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl MetricEvent {
    /// 기본 필드 + 추가 필드를 병합한 JSON 객체
    pub fn to_json_object(&self) -> Result<Map<String, Value>, CoreError> {
        let mut object = match serde_json::to_value(self)? {
            Value::Object(object) => object,
            other => {
                return Err(CoreError::Internal(format!(
                    "메트릭 이벤트가 객체로 직렬화되지 않음: {other}"
                )))
            }
        };
        merge_extra(&mut object, &self.extra);
        Ok(object)
    }

    /// 한 줄 JSON
    pub fn to_json_line(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.to_json_object()?)?)
    }
}

/// 이미 존재하는 키는 덮어쓰지 않고 새 키만 추가한다.
pub fn merge_extra(target: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        target
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}
