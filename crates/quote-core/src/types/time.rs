//! 날짜/시간 유틸리티.
//!
//! 모든 시각은 `DateTime<Utc>`로 다룹니다. 타임존 정보가 없는 입력은 UTC로 해석합니다.

use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// 날짜 문자열을 UTC 시각으로 해석합니다.
///
/// 지원 형식:
/// - `YYYY-MM-DD` (자정)
/// - `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`
/// - RFC 3339 (`2024-01-01T00:00:00Z`, `+09:00` 등)
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CoreError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(CoreError::InvalidDate(s.to_string()))
}

/// `now` 기준 어제 00:00 UTC.
pub fn start_of_yesterday(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);
    Utc.from_utc_datetime(&yesterday.and_time(chrono::NaiveTime::MIN))
}

/// 저장용 시각 표기 (RFC 3339, `Z` 접미사).
///
/// 정각 초는 초 단위로, 초 미만 값이 있으면 필요한 만큼의 소수 자리를 붙입니다.
pub fn format_rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}
