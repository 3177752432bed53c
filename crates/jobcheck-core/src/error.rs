//! jobcheck 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from]`으로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 설정 검증, 스토리지 조회, 직렬화 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (파일 읽기, 파싱 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 버킷/오브젝트를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "bucket")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 접근 권한 없음 (401/403)
    #[error("권한 거부: {0}")]
    PermissionDenied(String),

    /// 스토리지 호출 타임아웃
    #[error("타임아웃: {timeout_secs}초 초과 — {context}")]
    Timeout {
        /// 요청에 적용된 타임아웃 (초)
        timeout_secs: u64,
        /// 타임아웃이 발생한 호출
        context: String,
    },

    /// 전송/API 에러 (연결 실패, 비정상 응답)
    #[error("전송 에러: {0}")]
    Transport(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 실패 카운터 분류용 스토리지 에러 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Timeout,
    Other,
}

impl FailureKind {
    /// 카운터 이름 접미사
    pub fn as_suffix(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::Timeout => "timeout",
            FailureKind::Other => "failed",
        }
    }
}

impl CoreError {
    /// 스토리지 조회 재시도 대상인지 판별
    ///
    /// 전송/API, 미발견, 권한 거부, 타임아웃, I/O 에러만 재시도한다.
    pub fn is_retryable_storage(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. }
                | CoreError::PermissionDenied(_)
                | CoreError::Timeout { .. }
                | CoreError::Transport(_)
                | CoreError::Io(_)
        )
    }

    /// 실패 카운터 분류
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            CoreError::NotFound { .. } => FailureKind::NotFound,
            CoreError::PermissionDenied(_) => FailureKind::PermissionDenied,
            CoreError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::Other,
        }
    }

    /// 설정 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
