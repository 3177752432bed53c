//! # jobcheck-checker
//!
//! 백업 검증 도메인 로직.
//!
//! - [`evaluation`]: 단일 파일 모드 (보존 기간 내 최신 파일)
//! - [`folders`]: 폴더 모드 (daily/weekly/monthly 날짜 폴더)
//! - [`verifier`]: 재시도로 감싼 목록 조회 + 평가, 실패 카운터
//! - [`report`]: `backup_verification` 로그 레코드
//! - [`runner`]: 작업 목록 배치 실행

pub mod evaluation;
pub mod folders;
pub mod report;
pub mod runner;
pub mod verifier;

pub use report::BackupReporter;
pub use runner::{run_checks, RunSummary};
pub use verifier::BackupVerifier;
