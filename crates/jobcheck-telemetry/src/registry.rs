//! 프로세스 내 메트릭 레지스트리.
//!
//! 카운터/게이지/히스토그램을 집계하고 Prometheus 텍스트 형식으로 렌더링한다.
//! 전역 싱글턴 대신 `Arc<MetricsRegistry>`로 필요한 컴포넌트에 주입한다.
//! 모든 변경은 하나의 `parking_lot::Mutex` 아래에서 이뤄져 동시 증가가 유실되지 않는다.
//!
//! 히스토그램 샘플은 프로세스 수명 동안 계속 쌓인다. 짧은 배치 작업 기준이며,
//! 장기 실행 서비스에서 쓰려면 샘플 제거 정책이 필요하다.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::warn;

#[derive(Debug, Default)]
struct RegistryState {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, f64>,
    histograms: BTreeMap<String, Vec<f64>>,
}

/// 카운터/게이지/히스토그램 집계기
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    state: Mutex<RegistryState>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 카운터 증가 (없으면 0에서 시작). 카운터는 감소하지 않는다.
    pub fn increment(&self, name: &str, delta: u64) {
        if !valid_name(name) {
            return;
        }
        let mut state = self.state.lock();
        let counter = state.counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(delta);
    }

    /// 카운터 1 증가
    pub fn inc(&self, name: &str) {
        self.increment(name, 1);
    }

    /// 게이지 덮어쓰기 (마지막 쓰기 우선)
    pub fn set_gauge(&self, name: &str, value: f64) {
        if !valid_name(name) {
            return;
        }
        self.state.lock().gauges.insert(name.to_string(), value);
    }

    /// 히스토그램 샘플 추가
    pub fn record_histogram(&self, name: &str, value: f64) {
        if !valid_name(name) {
            return;
        }
        self.state
            .lock()
            .histograms
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.state.lock().counters.get(name).copied()
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.state.lock().gauges.get(name).copied()
    }

    /// 히스토그램 샘플 복제본
    pub fn histogram(&self, name: &str) -> Vec<f64> {
        self.state
            .lock()
            .histograms
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Prometheus 텍스트 형식 렌더링
    ///
    /// 이름순 정렬이라 변경이 없으면 항상 같은 텍스트를 반환한다.
    /// 샘플이 없는 히스토그램은 출력하지 않는다.
    pub fn render_text(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();

        for (name, value) in &state.counters {
            let _ = writeln!(out, "# HELP {name} Counter metric");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }

        for (name, value) in &state.gauges {
            let _ = writeln!(out, "# HELP {name} Gauge metric");
            let _ = writeln!(out, "# TYPE {name} gauge");
            let _ = writeln!(out, "{name} {}", sample_value(*value));
        }

        for (name, values) in &state.histograms {
            if values.is_empty() {
                continue;
            }
            let sum: f64 = values.iter().sum();
            let _ = writeln!(out, "# HELP {name} Histogram metric");
            let _ = writeln!(out, "# TYPE {name} histogram");
            let _ = writeln!(out, "{name}_count {}", values.len());
            let _ = writeln!(out, "{name}_sum {}", sample_value(sum));
        }

        out
    }
}

/// 노출 형식의 실수 표기 (`+Inf`, `-Inf`, `NaN`)
fn sample_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

fn valid_name(name: &str) -> bool {
    if name.is_empty() {
        warn!("빈 메트릭 이름 무시");
        return false;
    }
    true
}
