//! `EventSink` 구현.
//!
//! - [`StdoutSink`]: 로그 수집 파이프라인용 표준 출력 (운영)
//! - [`MemorySink`]: 출력 줄을 메모리에 보관 (테스트, 임베딩)

use jobcheck_core::error::CoreError;
use jobcheck_core::ports::sink::EventSink;
use parking_lot::Mutex;
use std::io::Write;

/// 표준 출력 싱크 — 호출당 한 줄
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn write_line(&self, line: &str) -> Result<(), CoreError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{line}")?;
        handle.flush()?;
        Ok(())
    }
}

/// 메모리 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 쓰인 줄 (복제본)
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// 쓰인 줄을 모두 꺼내고 비운다
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    /// 각 줄을 JSON으로 파싱
    pub fn json_lines(&self) -> Result<Vec<serde_json::Value>, CoreError> {
        self.lines
            .lock()
            .iter()
            .map(|line| serde_json::from_str(line).map_err(CoreError::from))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn write_line(&self, line: &str) -> Result<(), CoreError> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}
