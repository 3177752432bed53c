//! GCS JSON API 목록 조회 클라이언트.
//!
//! `ObjectStore` 포트 구현. 첫 페이지만 읽으며 토큰은 외부에서 발급받아 주입한다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobcheck_core::config::StorageConfig;
use jobcheck_core::error::CoreError;
use jobcheck_core::models::object::StoredObject;
use jobcheck_core::ports::object_store::ObjectStore;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// objects.list 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// 오브젝트 리소스 (필요한 필드만)
#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    /// GCS는 크기를 10진 문자열로 인코딩한다
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
}

/// GCS 목록 조회 클라이언트 — `ObjectStore` 포트 구현
pub struct GcsObjectStore {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    user_project: Option<String>,
}

impl GcsObjectStore {
    /// 새 클라이언트 생성
    pub fn new(endpoint: &str) -> Result<Self, CoreError> {
        Self::build(endpoint, None)
    }

    /// 스토리지 설정으로 생성. `timeout_secs`는 연결 타임아웃으로 쓴다.
    pub fn from_config(config: &StorageConfig) -> Result<Self, CoreError> {
        let mut store = Self::build(&config.endpoint, Some(config.timeout()))?;
        store.access_token = config.access_token.clone();
        store.user_project = config.project_id.clone();
        Ok(store)
    }

    fn build(endpoint: &str, connect_timeout: Option<Duration>) -> Result<Self, CoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Transport(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: None,
            user_project: None,
        })
    }

    /// bearer 토큰 설정
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn list_url(&self, bucket: &str, prefix: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(&format!("{}/storage/v1/b/{}/o", self.endpoint, bucket))
            .map_err(|e| CoreError::Transport(format!("잘못된 엔드포인트 URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            if !prefix.is_empty() {
                query.append_pair("prefix", prefix);
            }
            if let Some(project) = &self.user_project {
                query.append_pair("userProject", project);
            }
        }
        Ok(url)
    }
}

/// 응답 상태 코드 → 에러 매핑
fn map_status(status: reqwest::StatusCode, bucket: &str, body: String, timeout: Duration) -> CoreError {
    match status.as_u16() {
        404 => CoreError::NotFound {
            resource_type: "bucket".to_string(),
            id: bucket.to_string(),
        },
        401 | 403 => CoreError::PermissionDenied(format!("{bucket}: {body}")),
        408 | 504 => CoreError::Timeout {
            timeout_secs: timeout.as_secs(),
            context: format!("{bucket} 목록 조회 ({status})"),
        },
        _ => CoreError::Transport(format!("GCS API 에러 ({status}): {body}")),
    }
}

/// 전송 계층 에러 매핑
fn map_send_error(e: reqwest::Error, bucket: &str, timeout: Duration) -> CoreError {
    if e.is_timeout() {
        CoreError::Timeout {
            timeout_secs: timeout.as_secs(),
            context: format!("{bucket} 목록 조회"),
        }
    } else {
        CoreError::Transport(format!("GCS 요청 실패: {e}"))
    }
}

fn into_stored_object(resource: ObjectResource) -> Result<Option<StoredObject>, CoreError> {
    let Some(updated) = resource.updated else {
        debug!(name = %resource.name, "updated 없는 오브젝트 건너뜀");
        return Ok(None);
    };
    let size = match resource.size.as_deref() {
        None => 0,
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            CoreError::Transport(format!("잘못된 오브젝트 크기: {} = {raw}", resource.name))
        })?,
    };
    Ok(Some(StoredObject {
        name: resource.name,
        size,
        updated,
    }))
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        timeout: Duration,
    ) -> Result<Vec<StoredObject>, CoreError> {
        debug!(bucket, prefix, "GCS 오브젝트 목록 조회");

        let url = self.list_url(bucket, prefix)?;
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| map_send_error(e, bucket, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|e| {
                warn!("응답 본문 읽기 실패: {e}");
                String::new()
            });
            return Err(map_status(status, bucket, body, timeout));
        }

        let listing: ListResponse = resp
            .json()
            .await
            .map_err(|e| map_send_error(e, bucket, timeout))?;

        if listing.next_page_token.is_some() {
            warn!(bucket, prefix, "목록이 첫 페이지에서 잘림 (페이지네이션 미지원)");
        }

        let mut objects = Vec::with_capacity(listing.items.len());
        for resource in listing.items {
            if let Some(object) = into_stored_object(resource)? {
                objects.push(object);
            }
        }
        Ok(objects)
    }
}
