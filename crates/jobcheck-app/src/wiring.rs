//! DI 와이어링 — 설정에서 어댑터와 서비스 생성.

use anyhow::{Context, Result};
use jobcheck_checker::{BackupReporter, BackupVerifier};
use jobcheck_core::config::AppConfig;
use jobcheck_core::ports::sink::EventSink;
use jobcheck_core::retry::RetryPolicy;
use jobcheck_network::GcsObjectStore;
use jobcheck_telemetry::{MetricEmitter, MetricsRegistry};
use std::sync::Arc;
use tracing::debug;

/// 실행에 필요한 구성 요소
pub struct Components {
    pub registry: Arc<MetricsRegistry>,
    pub emitter: Arc<MetricEmitter>,
    pub verifier: BackupVerifier,
    pub reporter: BackupReporter,
}

/// 구성 요소 생성. 레지스트리는 하나만 만들어 모든 컴포넌트가 공유한다.
pub fn build(config: &AppConfig, sink: Arc<dyn EventSink>) -> Result<Components> {
    let registry = Arc::new(MetricsRegistry::new());
    let emitter = Arc::new(MetricEmitter::new(
        config.telemetry.clone(),
        registry.clone(),
        sink,
    ));

    let store = GcsObjectStore::from_config(&config.storage)
        .context("GCS 클라이언트 생성 실패")?;
    debug!(endpoint = %config.storage.endpoint, "GCS 클라이언트 초기화");

    let policy = RetryPolicy::from(&config.retry);
    let verifier = BackupVerifier::new(Arc::new(store), registry.clone(), policy);
    let reporter = BackupReporter::new(emitter.clone());

    Ok(Components {
        registry,
        emitter,
        verifier,
        reporter,
    })
}
