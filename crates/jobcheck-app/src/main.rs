//! # jobcheck
//!
//! 백업 검증 배치 바이너리 진입점.
//! 설정 로드 → 검증 → 와이어링 → 작업 순차 검사 → 요약 메트릭 출력.
//!
//! 표준 출력에는 JSON 레코드만 쓰고 사람이 읽는 로그는 표준 에러로 보낸다.

mod wiring;

use anyhow::{Context, Result};
use clap::Parser;
use jobcheck_checker::{run_checks, RunSummary};
use jobcheck_core::config::LogLevel;
use jobcheck_core::config_manager::ConfigLoader;
use jobcheck_telemetry::sink::StdoutSink;
use jobcheck_telemetry::MetricOptions;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 실패 작업 수 메트릭
const JOBS_FAILED_METRIC: &str = "backup_jobs_failed";

/// 오브젝트 스토리지 백업 검증기
///
/// 설정된 버킷에서 최근 백업을 찾아 작업별 JSON 검증 레코드를 출력한다.
#[derive(Parser, Debug)]
#[command(name = "jobcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON 설정 파일 경로 (기본: CONFIG_FILE 또는 ./.configs)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 백업 작업 목록 — JSON 배열 문자열 또는 파일 경로 (기본: BACKUP_JOBS_CONFIG)
    #[arg(long, short = 'j')]
    jobs: Option<String>,

    /// 로그 레벨 (debug, info, warning, error, critical). 설정 파일/환경 변수보다 우선
    #[arg(long, short = 'l')]
    log_level: Option<LogLevel>,

    /// 실행 후 Prometheus 텍스트를 표준 출력에 출력
    #[arg(long)]
    print_metrics: bool,

    /// 실패한 작업이 있으면 종료 코드 1
    #[arg(long)]
    fail_on_error: bool,
}

fn init_tracing(level: LogLevel) {
    let directive = level.as_filter_directive();
    let log_filter = format!(
        "jobcheck={directive},jobcheck_core={directive},jobcheck_telemetry={directive},jobcheck_network={directive},jobcheck_checker={directive}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn summary_info(summary: &RunSummary) -> Map<String, Value> {
    let mut info = Map::new();
    info.insert("total".to_string(), json!(summary.total));
    info.insert("succeeded".to_string(), json!(summary.succeeded));
    info.insert("failed".to_string(), json!(summary.failed));
    info
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_settings_file(path.clone());
    }
    if let Some(jobs) = &args.jobs {
        loader = loader.with_jobs_source(jobs.as_str());
    }
    let loaded = loader.load();

    // 설정 로드가 실패해도 에러를 남길 수 있도록 tracing을 먼저 초기화
    let level = args
        .log_level
        .or_else(|| loaded.as_ref().ok().map(|c| c.telemetry.log_level))
        .unwrap_or_default();
    init_tracing(level);

    let mut config = loaded.context("설정 로드 실패")?;
    config.telemetry.log_level = level;

    if let Err(e) = config.validate() {
        error!("설정 검증 실패: {e}");
        return Err(e).context("설정 검증 실패");
    }

    info!(
        app = %config.telemetry.app_name,
        jobs = config.backup_jobs.len(),
        metrics_enabled = config.telemetry.metrics_enabled,
        prometheus_enabled = config.telemetry.prometheus_enabled,
        "jobcheck 시작"
    );

    let components = wiring::build(&config, Arc::new(StdoutSink))?;

    let summary = run_checks(&config.backup_jobs, &components.verifier, &components.reporter).await;

    components.emitter.record(
        JOBS_FAILED_METRIC,
        summary.failed as f64,
        MetricOptions::new()
            .info(summary_info(&summary))
            .message(format!(
                "{}/{} 작업 통과",
                summary.succeeded, summary.total
            )),
    );

    if args.print_metrics {
        print!("{}", components.registry.render_text());
    }

    if args.fail_on_error && !summary.all_passed() {
        error!(failed = summary.failed, "실패한 백업 작업 있음");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
