//! 배치 실행 루프.
//!
//! 작업을 순서대로 검사한다. 한 작업의 실패는 로그와 `failed` 레코드로 남기고 다음 작업으로 넘어간다.

use jobcheck_core::config::BackupJobConfig;
use jobcheck_core::models::backup::CheckStatus;
use tracing::{error, info, warn};

use crate::evaluation::NO_RECENT_BACKUP;
use crate::report::BackupReporter;
use crate::verifier::BackupVerifier;

pub const CHECKS_STARTED: &str = "backup_checks_started";
pub const CHECKS_SUCCESS: &str = "backups_check_success";
pub const CHECKS_FAILURE: &str = "backups_check_failure";
/// 검증 자체가 에러로 끝난 작업
pub const CHECKS_ERRORED: &str = "backup_checks_failed";
pub const CHECKS_COMPLETED: &str = "backup_checks_completed";

/// 실행 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// 모든 작업 검사
pub async fn run_checks(
    jobs: &[BackupJobConfig],
    verifier: &BackupVerifier,
    reporter: &BackupReporter,
) -> RunSummary {
    let emitter = reporter.emitter();
    let registry = emitter.registry();
    registry.inc(CHECKS_STARTED);

    let mut summary = RunSummary {
        total: jobs.len(),
        ..RunSummary::default()
    };

    for job in jobs {
        info!("백업 작업 검사: {} ({})", job.job_name, job.instance_id);

        let output = match verifier.verify(job).await {
            Ok(result) if result.is_success() => {
                registry.inc(CHECKS_SUCCESS);
                summary.succeeded += 1;
                info!(
                    "백업 확인: {}/{} ({} bytes)",
                    job.job_name, job.instance_id, result.size_bytes
                );
                reporter.output_log_entry(job, CheckStatus::Success, Some(&result), "", None, None)
            }
            Ok(result) => {
                registry.inc(CHECKS_FAILURE);
                summary.failed += 1;
                let detail = if result.error_detail.is_empty() {
                    NO_RECENT_BACKUP
                } else {
                    result.error_detail.as_str()
                };
                warn!(
                    "유효한 백업 없음: {}/{} - {detail}",
                    job.job_name, job.instance_id
                );
                reporter.output_log_entry(job, CheckStatus::Failed, Some(&result), detail, None, None)
            }
            Err(e) => {
                error!(
                    "백업 검사 실패 {}/{}: {e}",
                    job.job_name, job.instance_id
                );
                summary.failed += 1;
                let output =
                    reporter.output_log_entry(job, CheckStatus::Failed, None, &e.to_string(), None, None);
                registry.inc(CHECKS_ERRORED);
                output
            }
        };

        if let Err(e) = output {
            error!(job = %job.job_name, "검증 결과 출력 실패: {e}");
        }
    }

    if emitter.config().metrics_enabled {
        info!("메트릭:\n{}", emitter.metrics_to_prometheus());
    }

    registry.inc(CHECKS_COMPLETED);
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "백업 검사 완료"
    );

    summary
}
