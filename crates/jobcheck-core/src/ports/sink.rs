//! 구조화 이벤트 출력 포트.

use crate::error::CoreError;

/// 한 줄에 JSON 객체 하나를 쓰는 출력 채널
pub trait EventSink: Send + Sync {
    /// `line`은 개행을 포함하지 않는다. 구현체가 줄 구분을 붙인다.
    fn write_line(&self, line: &str) -> Result<(), CoreError>;
}
