//! 재시도 실행기.
//!
//! 지정한 실패 종류에 대해서만 exponential backoff로 작업을 다시 호출한다.
//! 총 시도 횟수는 `max_retries + 1`이며, 소진되면 마지막 에러를 그대로 반환한다.
//! 대기는 `tokio::time::sleep`이므로 호출 태스크만 멈추고 런타임은 막지 않는다.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::RetryConfig;

/// 재시도 정책
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 첫 시도 이후 재시도 횟수
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    /// 단계별 대기 상한
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_attempts,
            initial_delay: secs_to_duration(config.initial_delay_secs),
            backoff_factor: config.backoff_factor,
            max_delay: secs_to_duration(config.max_delay_secs),
        }
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// 다음 대기 시간: `min(delay * backoff_factor, max_delay)`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let scaled = delay.as_secs_f64() * self.backoff_factor;
        if !scaled.is_finite() || scaled < 0.0 {
            return self.max_delay;
        }
        secs_to_duration(scaled).min(self.max_delay)
    }

    /// 재시도가 포함된 작업 실행
    ///
    /// `is_retryable`이 거짓인 에러는 대기 없이 즉시 반환한다.
    pub async fn execute<T, E, F, Fut, R>(
        &self,
        operation_name: &str,
        is_retryable: R,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let total_attempts = self.max_retries.saturating_add(1);
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt >= self.max_retries => {
                    error!(
                        operation = operation_name,
                        attempts = total_attempts,
                        "모든 시도 실패: {e}"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        operation = operation_name,
                        "시도 {}/{} 실패: {e}, {:.1}초 후 재시도",
                        attempt + 1,
                        total_attempts,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
            }
        }
    }
}
