//! 메트릭 방출기.
//!
//! 두 개의 독립 싱크를 다룬다.
//! - JSON 메트릭 로그: `metrics_enabled`일 때 호출당 한 줄을 `EventSink`에 쓴다.
//!   로그 레벨 임계값과 무관하게 항상 출력된다.
//! - 프로세스 내 레지스트리: `prometheus_enabled`일 때 [`MetricEmitter::record`]가 카운터를 올린다.
//!
//! 일반 텍스트 로그([`MetricEmitter::log`])만 `log_level` 임계값을 따른다.
//!
//! `extra` 필드의 키가 기본 필드와 겹치면 기본 값이 유지되고 `extra` 값은 버려진다
//! ([`jobcheck_core::models::metric`] 참조).

use chrono::{DateTime, Utc};
use jobcheck_core::config::{LogLevel, MetricSchema, TelemetryConfig};
use jobcheck_core::error::CoreError;
use jobcheck_core::models::metric::{MetricEvent, METRIC_EVENT_TYPE};
use jobcheck_core::ports::clock::{Clock, SystemClock};
use jobcheck_core::ports::sink::EventSink;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::registry::MetricsRegistry;

/// 방출 실패 카운터 이름
pub const EMIT_ERRORS_COUNTER: &str = "metric_emit_errors";

/// 메트릭 방출 선택 인자
#[derive(Debug, Clone, Default)]
pub struct MetricOptions {
    pub info: Option<Map<String, Value>>,
    /// 설정값 대신 쓸 앱 이름
    pub app_name: Option<String>,
    /// 설정값 대신 쓸 앱 종류
    pub app_type: Option<String>,
    pub extra: Option<Map<String, Value>>,
    pub message: Option<String>,
    /// `extra`의 `"labels"` 키로 병합된다
    pub labels: Option<BTreeMap<String, String>>,
}

impl MetricOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(mut self, info: Map<String, Value>) -> Self {
        self.info = Some(info);
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn app_type(mut self, app_type: impl Into<String>) -> Self {
        self.app_type = Some(app_type.into());
        self
    }

    pub fn extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

/// JSON 메트릭 로그 + 레지스트리 갱신 파사드
pub struct MetricEmitter {
    config: TelemetryConfig,
    registry: Arc<MetricsRegistry>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    /// `CallCounter` 스키마의 호출 횟수
    emitted: AtomicU64,
}

impl MetricEmitter {
    pub fn new(
        config: TelemetryConfig,
        registry: Arc<MetricsRegistry>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            registry,
            sink,
            clock: Arc::new(SystemClock),
            emitted: AtomicU64::new(0),
        }
    }

    /// 시각 제공자 교체
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 일반 텍스트 로그. `level`이 설정 임계값 이상일 때만 출력하고 출력 여부를 반환한다.
    pub fn log(
        &self,
        level: LogLevel,
        message: &str,
        info: Option<&Map<String, Value>>,
        extra: Option<&Map<String, Value>>,
    ) -> bool {
        if level < self.config.log_level {
            return false;
        }

        let info = info.map(|m| Value::Object(m.clone())).unwrap_or(Value::Null);
        let extra = extra.map(|m| Value::Object(m.clone())).unwrap_or(Value::Null);
        let app = self.config.app_name.as_str();

        match level {
            LogLevel::Debug => debug!(app, %info, %extra, "{message}"),
            LogLevel::Info => info!(app, %info, %extra, "{message}"),
            LogLevel::Warning => warn!(app, %info, %extra, "{message}"),
            LogLevel::Error => error!(app, %info, %extra, "{message}"),
            LogLevel::Critical => error!(app, critical = true, %info, %extra, "{message}"),
        }
        true
    }

    /// 로그 기반 메트릭 한 줄 출력. `metrics_enabled`가 꺼져 있으면 아무것도 하지 않는다.
    pub fn emit_metric(&self, name: &str, value: f64, options: MetricOptions) {
        if !self.config.metrics_enabled {
            return;
        }

        let event = self.build_event(name, value, options);
        let result = event.to_json_line().and_then(|line| self.sink.write_line(&line));
        if let Err(e) = result {
            self.registry.inc(EMIT_ERRORS_COUNTER);
            warn!(metric = name, "메트릭 출력 실패: {e}");
        }
    }

    /// 통합 진입점
    ///
    /// - `prometheus_enabled`: 카운터를 `value`의 정수부만큼 증가 (음수/NaN은 0)
    /// - `metrics_enabled`: [`MetricEmitter::emit_metric`] 호출. `message`가 없으면 메트릭 이름을 쓴다.
    pub fn record(&self, name: &str, value: f64, mut options: MetricOptions) {
        if self.config.prometheus_enabled {
            // float → int 캐스트는 0 방향 절사, 음수/NaN은 0으로 포화
            self.registry.increment(name, value as u64);
        }

        if self.config.metrics_enabled {
            options.message.get_or_insert_with(|| name.to_string());
            self.emit_metric(name, value, options);
        }
    }

    /// 임의의 직렬화 가능한 레코드를 한 줄 JSON으로 출력 (게이트 없음)
    pub fn emit_json<T: Serialize>(&self, record: &T) -> Result<(), CoreError> {
        let line = serde_json::to_string(record)?;
        self.sink.write_line(&line)
    }

    /// 레지스트리 Prometheus 텍스트
    pub fn metrics_to_prometheus(&self) -> String {
        self.registry.render_text()
    }

    fn build_event(&self, name: &str, value: f64, options: MetricOptions) -> MetricEvent {
        let MetricOptions {
            info,
            app_name,
            app_type,
            extra,
            message,
            labels,
        } = options;

        let mut extra = extra.unwrap_or_default();
        if let Some(labels) = labels {
            let labels: Map<String, Value> = labels
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            extra
                .entry("labels".to_string())
                .or_insert(Value::Object(labels));
        }

        let counter = match self.config.metric_schema {
            MetricSchema::MetricValue => None,
            MetricSchema::CallCounter => Some(self.emitted.fetch_add(1, Ordering::Relaxed) + 1),
        };

        MetricEvent {
            metric_name: name.to_string(),
            metric_value: value,
            info: info.unwrap_or_default(),
            app_name: app_name.unwrap_or_else(|| self.config.app_name.clone()),
            app_type: app_type.unwrap_or_else(|| self.config.app_type.clone()),
            owner: self.config.owner.clone(),
            event_type: METRIC_EVENT_TYPE,
            timestamp: self.clock.now(),
            message,
            counter,
            extra,
        }
    }
}
