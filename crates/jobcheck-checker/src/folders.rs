//! 폴더 모드 평가 (daily/weekly/monthly).
//!
//! 인스턴스 접두사 바로 아래의 날짜 폴더를 종류별로 나누고, 종류마다 가장 최근 폴더를 검사한다.
//!
//! | 종류 | 후보 | 통과 조건 |
//! |------|------|-----------|
//! | daily | daily + weekly + monthly | 폴더 날짜 자정 이후 24시간 이내 |
//! | weekly | weekly | 7일 이내 |
//! | monthly | monthly | 30일 이내 |
//!
//! 모든 종류는 오브젝트 1개 이상, 합계 크기 0 초과여야 통과한다.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use jobcheck_core::models::backup::{BackupCheckResult, BackupKind, CheckStatus, FolderCheck};
use jobcheck_core::models::object::StoredObject;
use std::collections::{BTreeMap, HashMap};

const DATE_LEN: usize = 10;

/// 접두사가 비어 있지 않으면 `/`로 끝나도록 맞춘다
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// 폴더 이름에서 `YYYY-MM-DD` 날짜 추출
///
/// 앞 10글자를 먼저 보고, 아니면 이름 안에서 처음 나오는 날짜 모양 구간을 쓴다
/// (`2024-01-10_daily`, `daily-2024-01-10` 모두 허용).
pub fn parse_folder_date(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() < DATE_LEN {
        return None;
    }
    (0..=bytes.len() - DATE_LEN).find_map(|start| date_window(&bytes[start..start + DATE_LEN]))
}

fn date_window(window: &[u8]) -> Option<NaiveDate> {
    let shaped = window.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }
    let text = std::str::from_utf8(window).ok()?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// 이름으로 종류 판별 (daily > weekly > monthly 순)
pub fn classify(name: &str) -> Option<BackupKind> {
    let lower = name.to_lowercase();
    BackupKind::ALL
        .into_iter()
        .find(|kind| lower.contains(kind.as_str()))
}

/// 접두사 바로 아래 폴더 묶음 (첫 등장 순서 유지)
struct FolderIndex<'a> {
    order: Vec<&'a str>,
    objects: HashMap<&'a str, Vec<&'a StoredObject>>,
}

impl<'a> FolderIndex<'a> {
    fn build(objects: &'a [StoredObject], prefix: &str) -> Self {
        let mut index = Self {
            order: Vec::new(),
            objects: HashMap::new(),
        };

        for object in objects {
            let Some(remainder) = object.name.strip_prefix(prefix) else {
                continue;
            };
            if remainder.is_empty() {
                continue;
            }
            let folder = remainder.split('/').next().unwrap_or(remainder);
            index
                .objects
                .entry(folder)
                .or_insert_with(|| {
                    index.order.push(folder);
                    Vec::new()
                })
                .push(object);
        }

        index
    }

    fn contents(&self, folder: &str) -> &[&'a StoredObject] {
        self.objects.get(folder).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// 종류별 `(날짜, 폴더)` 후보
type Candidates<'a> = BTreeMap<BackupKind, Vec<(NaiveDate, &'a str)>>;

fn collect_candidates<'a>(index: &FolderIndex<'a>) -> Candidates<'a> {
    let mut candidates: Candidates<'a> = BTreeMap::new();
    for &folder in &index.order {
        let Some(date) = parse_folder_date(folder) else {
            continue;
        };
        if let Some(kind) = classify(folder) {
            candidates.entry(kind).or_default().push((date, folder));
        }
    }
    candidates
}

/// 후보 중 날짜가 가장 최근인 폴더 (동률이면 먼저 나온 쪽)
fn newest<'a, I>(entries: I) -> Option<(NaiveDate, &'a str)>
where
    I: IntoIterator<Item = &'a (NaiveDate, &'a str)>,
{
    entries.into_iter().fold(None, |best, &(date, folder)| match best {
        Some((best_date, _)) if date <= best_date => best,
        _ => Some((date, folder)),
    })
}

fn pool<'c, 'a>(candidates: &'c Candidates<'a>, kind: BackupKind) -> Vec<&'c (NaiveDate, &'a str)> {
    let kinds: &[BackupKind] = match kind {
        BackupKind::Daily => &BackupKind::ALL,
        BackupKind::Weekly => &[BackupKind::Weekly],
        BackupKind::Monthly => &[BackupKind::Monthly],
    };
    kinds
        .iter()
        .filter_map(|k| candidates.get(k))
        .flatten()
        .collect()
}

fn within_threshold(kind: BackupKind, hours_since: f64, days_since: i64) -> bool {
    match kind {
        BackupKind::Daily => hours_since <= 24.0,
        BackupKind::Weekly => days_since <= 7,
        BackupKind::Monthly => days_since <= 30,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_folder(
    kind: BackupKind,
    date: NaiveDate,
    folder: &str,
    contents: &[&StoredObject],
    now: DateTime<Utc>,
) -> FolderCheck {
    let size_bytes: i64 = contents.iter().map(|o| o.size.max(0)).sum();
    let file_count = contents.len();

    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let hours_since = (now - midnight).num_milliseconds() as f64 / 3_600_000.0;
    let days_since = (now.date_naive() - date).num_days();

    let passed =
        file_count > 0 && size_bytes > 0 && within_threshold(kind, hours_since, days_since);

    FolderCheck {
        found: true,
        folder_name: Some(folder.to_string()),
        folder_date: Some(date),
        size_bytes: Some(size_bytes),
        file_count: Some(file_count),
        hours_since: Some(round2(hours_since)),
        days_since: Some(days_since),
        passed,
    }
}

/// 폴더 모드 판정
///
/// 세 종류 모두 통과해야 성공이다. 실패 사유는 `"<종류> missing"`(후보 없음) 또는
/// `"<종류> fails"`(조건 미달)를 `", "`로 이어 붙인다. `per_type`은 결과와 무관하게 항상 채운다.
pub fn evaluate_folders(
    objects: &[StoredObject],
    prefix: &str,
    now: DateTime<Utc>,
) -> BackupCheckResult {
    let prefix = normalize_prefix(prefix);
    let index = FolderIndex::build(objects, &prefix);
    let candidates = collect_candidates(&index);

    let mut per_type = BTreeMap::new();
    let mut failures = Vec::new();
    let mut selected: Vec<&str> = Vec::new();
    let mut total_size: i64 = 0;
    let mut total_files: usize = 0;

    for kind in BackupKind::ALL {
        let Some((date, folder)) = newest(pool(&candidates, kind)) else {
            per_type.insert(kind, FolderCheck::missing());
            failures.push(format!("{kind} missing"));
            continue;
        };

        let check = check_folder(kind, date, folder, index.contents(folder), now);
        total_size += check.size_bytes.unwrap_or(0);
        total_files += check.file_count.unwrap_or(0);
        if !check.passed {
            failures.push(format!("{kind} fails"));
        }
        selected.push(folder);
        per_type.insert(kind, check);
    }

    if !failures.is_empty() {
        return BackupCheckResult {
            found: false,
            status: CheckStatus::Failed,
            size_bytes: total_size,
            file_count: total_files,
            recent_count: 0,
            newest_updated: None,
            newest_name: None,
            error_detail: failures.join(", "),
            per_type: Some(per_type),
        };
    }

    let mut newest_object: Option<&StoredObject> = None;
    for object in selected
        .iter()
        .flat_map(|folder| index.contents(folder))
        .copied()
    {
        if newest_object.map_or(true, |n| object.updated > n.updated) {
            newest_object = Some(object);
        }
    }

    BackupCheckResult {
        found: true,
        status: CheckStatus::Success,
        size_bytes: total_size,
        file_count: total_files,
        recent_count: BackupKind::ALL.len(),
        newest_updated: newest_object.map(|o| o.updated),
        newest_name: newest_object.map(|o| o.name.clone()),
        error_detail: String::new(),
        per_type: Some(per_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix("psdb01"), "psdb01/");
        assert_eq!(normalize_prefix("psdb01/"), "psdb01/");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn folder_dates() {
        assert_eq!(parse_folder_date("2024-01-10_daily"), Some(date(2024, 1, 10)));
        assert_eq!(parse_folder_date("daily-2024-01-10"), Some(date(2024, 1, 10)));
        assert_eq!(parse_folder_date("weekly_2024-02-30"), None);
        assert_eq!(parse_folder_date("daily"), None);
        assert_eq!(parse_folder_date("20240110-daily"), None);
        assert_eq!(parse_folder_date("일간-2024-01-10"), Some(date(2024, 1, 10)));
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify("2024-01-10-DAILY"), Some(BackupKind::Daily));
        assert_eq!(classify("weekly-monthly"), Some(BackupKind::Weekly));
        assert_eq!(classify("2024-01-01_Monthly"), Some(BackupKind::Monthly));
        assert_eq!(classify("2024-01-01_adhoc"), None);
    }

    #[test]
    fn monthly_missing_scenario() {
        let objects = vec![
            StoredObject::new("psdb01/daily-2024-01-10/a", 10, at(2024, 1, 10, 1)),
            StoredObject::new("psdb01/weekly-2024-01-08/b", 20, at(2024, 1, 8, 1)),
        ];

        let result = evaluate_folders(&objects, "psdb01", now());

        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.error_detail, "monthly missing");
        assert!(!result.found);
        assert_eq!(result.recent_count, 0);

        let per_type = result.per_type.unwrap();
        let daily = &per_type[&BackupKind::Daily];
        assert!(daily.passed);
        assert_eq!(daily.folder_name.as_deref(), Some("daily-2024-01-10"));
        assert_eq!(daily.hours_since, Some(12.0));
        assert_eq!(daily.days_since, Some(0));

        let weekly = &per_type[&BackupKind::Weekly];
        assert!(weekly.passed);
        assert_eq!(weekly.days_since, Some(2));

        assert_eq!(per_type[&BackupKind::Monthly], FolderCheck::missing());
        assert_eq!(result.size_bytes, 30);
        assert_eq!(result.file_count, 2);
    }

    #[test]
    fn all_kinds_pass() {
        let objects = vec![
            StoredObject::new("psdb01/2024-01-10_daily/base.tar", 100, at(2024, 1, 10, 2)),
            StoredObject::new("psdb01/2024-01-10_daily/wal.tar", 50, at(2024, 1, 10, 3)),
            StoredObject::new("psdb01/2024-01-07_weekly/base.tar", 200, at(2024, 1, 7, 2)),
            StoredObject::new("psdb01/2024-01-01_monthly/base.tar", 300, at(2024, 1, 1, 2)),
        ];

        let result = evaluate_folders(&objects, "psdb01/", now());

        assert!(result.is_success());
        assert!(result.found);
        assert_eq!(result.recent_count, 3);
        assert_eq!(result.size_bytes, 650);
        assert_eq!(result.file_count, 4);
        assert_eq!(result.newest_name.as_deref(), Some("psdb01/2024-01-10_daily/wal.tar"));
        assert_eq!(result.newest_updated, Some(at(2024, 1, 10, 3)));
        assert!(result.error_detail.is_empty());
    }

    #[test]
    fn daily_falls_back_to_newer_weekly() {
        let objects = vec![
            StoredObject::new("psdb01/2024-01-08_daily/a", 10, at(2024, 1, 8, 1)),
            StoredObject::new("psdb01/2024-01-10_weekly/b", 20, at(2024, 1, 10, 1)),
            StoredObject::new("psdb01/2024-01-01_monthly/c", 30, at(2024, 1, 1, 1)),
        ];

        let result = evaluate_folders(&objects, "psdb01", now());

        assert!(result.is_success(), "{}", result.error_detail);
        let per_type = result.per_type.unwrap();
        assert_eq!(
            per_type[&BackupKind::Daily].folder_name.as_deref(),
            Some("2024-01-10_weekly")
        );
    }

    #[test]
    fn stale_and_empty_folders_fail() {
        let objects = vec![
            StoredObject::new("psdb01/2024-01-08_daily/a", 10, at(2024, 1, 8, 1)),
            StoredObject::new("psdb01/2024-01-01_weekly/b", 0, at(2024, 1, 1, 1)),
            StoredObject::new("psdb01/2023-11-30_monthly/c", 30, at(2023, 11, 30, 1)),
        ];

        let result = evaluate_folders(&objects, "psdb01", now());

        assert_eq!(result.error_detail, "daily fails, weekly fails, monthly fails");
        let per_type = result.per_type.unwrap();
        assert_eq!(per_type[&BackupKind::Daily].hours_since, Some(60.0));
        assert_eq!(per_type[&BackupKind::Weekly].size_bytes, Some(0));
        assert_eq!(per_type[&BackupKind::Monthly].days_since, Some(41));
    }

    #[test]
    fn nothing_under_prefix() {
        let objects = vec![StoredObject::new("other/2024-01-10_daily/a", 10, now())];

        let result = evaluate_folders(&objects, "psdb01", now());

        assert_eq!(
            result.error_detail,
            "daily missing, weekly missing, monthly missing"
        );
        assert_eq!(result.file_count, 0);
    }

    #[test]
    fn undated_and_unknown_folders_ignored() {
        let objects = vec![
            StoredObject::new("psdb01/latest/a", 10, now()),
            StoredObject::new("psdb01/2024-01-10_adhoc/a", 10, now()),
            StoredObject::new("psdb01/", 0, now()),
        ];

        let result = evaluate_folders(&objects, "psdb01", now());
        assert_eq!(
            result.error_detail,
            "daily missing, weekly missing, monthly missing"
        );
    }

    #[test]
    fn hours_since_rounded_to_two_places() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 20, 0).unwrap();
        let objects = vec![StoredObject::new("p/2024-01-10_daily/a", 1, now)];

        let result = evaluate_folders(&objects, "p", now);

        let daily = &result.per_type.unwrap()[&BackupKind::Daily];
        assert_eq!(daily.hours_since, Some(0.33));
    }

    fn dated_folders(daily: &str, weekly: &str, monthly: &str) -> Vec<StoredObject> {
        let updated = at(2024, 1, 1, 1);
        vec![
            StoredObject::new(format!("psdb01/{daily}_daily/base.tar"), 10, updated),
            StoredObject::new(format!("psdb01/{weekly}_weekly/base.tar"), 20, updated),
            StoredObject::new(format!("psdb01/{monthly}_monthly/base.tar"), 30, updated),
        ]
    }

    #[test]
    fn thresholds_are_inclusive() {
        let objects = dated_folders("2024-01-30", "2024-01-24", "2024-01-01");

        let result = evaluate_folders(&objects, "psdb01", at(2024, 1, 31, 0));

        assert!(result.is_success(), "{}", result.error_detail);
        let per_type = result.per_type.unwrap();
        assert_eq!(per_type[&BackupKind::Daily].hours_since, Some(24.0));
        assert_eq!(per_type[&BackupKind::Weekly].days_since, Some(7));
        assert_eq!(per_type[&BackupKind::Monthly].days_since, Some(30));
    }

    #[test]
    fn daily_fails_one_second_past_limit() {
        let objects = dated_folders("2024-01-30", "2024-01-24", "2024-01-01");
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 1).unwrap();

        let result = evaluate_folders(&objects, "psdb01", now);

        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.error_detail, "daily fails");
    }

    #[test]
    fn weekly_fails_at_eight_days() {
        let objects = dated_folders("2024-01-31", "2024-01-24", "2024-01-02");

        let result = evaluate_folders(&objects, "psdb01", at(2024, 2, 1, 0));

        assert_eq!(result.error_detail, "weekly fails");
        assert_eq!(result.per_type.unwrap()[&BackupKind::Weekly].days_since, Some(8));
    }

    #[test]
    fn monthly_fails_at_thirty_one_days() {
        let objects = dated_folders("2024-01-31", "2024-01-25", "2024-01-01");

        let result = evaluate_folders(&objects, "psdb01", at(2024, 2, 1, 0));

        assert_eq!(result.error_detail, "monthly fails");
        assert_eq!(result.per_type.unwrap()[&BackupKind::Monthly].days_since, Some(31));
    }
}
