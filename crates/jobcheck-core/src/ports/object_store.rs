//! 오브젝트 스토리지 목록 조회 포트.
//!
//! 구현: `jobcheck-network` crate (GCS JSON API)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::object::StoredObject;

/// 접두사 기반 오브젝트 목록 조회
///
/// 실패는 `NotFound`, `PermissionDenied`, `Timeout`, `Transport`, `Io` 중 하나로 보고한다.
/// `timeout`은 구현체에 전달되는 권고값이며 코어는 직접 강제하지 않는다.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        timeout: Duration,
    ) -> Result<Vec<StoredObject>, CoreError>;
}
