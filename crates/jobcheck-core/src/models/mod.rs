//! jobcheck 도메인 모델.
//!
//! 메트릭 이벤트, 백업 검증 결과, 스토리지 오브젝트 메타데이터를 정의한다.
//! 모든 모델은 `serde` Serialize를 구현한다.

pub mod backup;
pub mod metric;
pub mod object;
