//! # jobcheck-telemetry
//!
//! 구조화 로깅 + 메트릭 방출 파사드.
//!
//! - [`registry`] — 프로세스 내 카운터/게이지/히스토그램, Prometheus 텍스트 렌더링
//! - [`emitter`] — JSON 메트릭 로그 방출기 (예약 키 우선 병합)
//! - [`sink`] — 표준 출력/메모리 출력 채널
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use jobcheck_telemetry::emitter::{MetricEmitter, MetricOptions};
//!
//! emitter.record("backup_checks_total", 1.0, MetricOptions::new().message("done"));
//! println!("{}", emitter.metrics_to_prometheus());
//! ```

pub mod emitter;
pub mod registry;
pub mod sink;

pub use emitter::{MetricEmitter, MetricOptions};
pub use registry::MetricsRegistry;
