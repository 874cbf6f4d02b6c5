//! 구간 분할 과거 시세 백필.
//!
//! 임의로 긴 기간을 브로커 요청 한도 크기의 윈도우로 잘라 앞으로 걸어가며 수집합니다.
//!
//! # 동작 방식
//!
//! 1. 상한 = `date_end` (정책이 요구하면 어제 00:00 UTC로 제한)
//! 2. `cursor < 상한`인 동안 윈도우 `[cursor, min(cursor + 증분, 상한))` 요청
//!    - 데이터가 있으면 누적, `cursor = max(윈도우 끝, 페이지 마지막 시각)`
//!    - 실패/빈 페이지면 공백(gap)으로 기록하고 `cursor = 윈도우 끝`
//! 3. 누적된 페이지가 없으면 `NoData`
//! 4. 중복 제거(첫 행 유지) → 구간 필터 → 정렬

use chrono::{DateTime, Utc};
use quote_broker::{normalize, FetchError, PageRequest, QuoteClient, RequestShape};
use quote_core::{start_of_yesterday, CandleTable, Granularity};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::BackfillError;

/// 윈도우 사이 기본 대기 시간.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(250);

/// 한 번의 요청 윈도우 `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 백필 실행 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// 요청한 윈도우 수
    pub windows_requested: usize,
    /// 데이터를 받은 윈도우 수
    pub windows_with_data: usize,
    /// 실패했거나 비어 있던 윈도우
    pub gaps: Vec<FetchWindow>,
}

/// 백필 설정.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// 윈도우 사이 대기 시간 (리미터와 별개)
    pub pause: Duration,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            pause: DEFAULT_PAUSE,
        }
    }
}

/// 백필 실행기.
///
/// 실행 상태는 `collect` 호출마다 새로 만들어지므로 하나의 실행기를 여러 쌍에 공유해도 됩니다.
pub struct BackfillWalker {
    client: Arc<dyn QuoteClient>,
    config: BackfillConfig,
    now: Option<DateTime<Utc>>,
}

impl BackfillWalker {
    pub fn new(client: Arc<dyn QuoteClient>, config: BackfillConfig) -> Self {
        Self {
            client,
            config,
            now: None,
        }
    }

    /// 상한 계산에 쓸 현재 시각을 고정합니다.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn client(&self) -> &Arc<dyn QuoteClient> {
        &self.client
    }

    /// 수집 상한.
    pub fn upper_bound(&self, date_end: DateTime<Utc>) -> DateTime<Utc> {
        if self.client.backfill_policy().clamp_to_yesterday {
            let now = self.now.unwrap_or_else(Utc::now);
            date_end.min(start_of_yesterday(now))
        } else {
            date_end
        }
    }

    /// `[date_start, date_end]` 구간의 캔들을 수집합니다.
    pub async fn collect(
        &self,
        symbol: &str,
        granularity: Granularity,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<(CandleTable, BackfillReport), BackfillError> {
        if self.client.granularity_code(granularity).is_none() {
            return Err(BackfillError::UnsupportedGranularity {
                broker: self.client.name().to_string(),
                granularity,
            });
        }
        if date_start >= date_end {
            return Err(BackfillError::InvalidRange {
                start: date_start,
                end: date_end,
            });
        }

        let policy = self.client.backfill_policy();
        let increment = granularity.span_of(policy.request_limit);
        let upper = self.upper_bound(date_end);
        let client = self.client.as_ref();

        let mut report = BackfillReport::default();
        let mut pages = Vec::new();
        let mut cursor = date_start;

        while cursor < upper {
            let window = FetchWindow {
                start: cursor,
                end: (cursor + increment).min(upper),
            };
            let request = match policy.shape {
                RequestShape::Anchored => PageRequest::Anchored {
                    from: window.start,
                    count: i64::from(policy.request_limit),
                },
                RequestShape::Range => PageRequest::Range {
                    from: window.start,
                    to: window.end,
                },
            };
            report.windows_requested += 1;

            let result = policy
                .window_retry
                .run(FetchError::is_retryable, move || {
                    client.fetch_page(symbol, granularity, request)
                })
                .await;

            match result.map(|page| normalize(page, &policy.price_sets)) {
                Ok(rows) if !rows.is_empty() => {
                    let first = rows.iter().map(|c| c.time).min().unwrap_or(window.start);
                    let last = rows.iter().map(|c| c.time).max().unwrap_or(window.end);
                    debug!(
                        symbol = symbol,
                        granularity = %granularity,
                        cursor = %cursor,
                        rows = rows.len(),
                        first = %first,
                        last = %last,
                        "윈도우 수집"
                    );
                    report.windows_with_data += 1;
                    pages.push(rows);
                    cursor = window.end.max(last);
                }
                Ok(_) | Err(FetchError::EmptyPage(_)) => {
                    debug!(
                        symbol = symbol,
                        granularity = %granularity,
                        cursor = %cursor,
                        window_end = %window.end,
                        "빈 윈도우"
                    );
                    report.gaps.push(window);
                    cursor = window.end;
                }
                Err(e) => {
                    warn!(
                        symbol = symbol,
                        granularity = %granularity,
                        cursor = %cursor,
                        window_end = %window.end,
                        error = %e,
                        "윈도우 요청 실패, 건너뜀"
                    );
                    report.gaps.push(window);
                    cursor = window.end;
                }
            }

            if cursor < upper && !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        if pages.is_empty() {
            return Err(BackfillError::NoData {
                symbol: symbol.to_string(),
                granularity,
            });
        }

        let table = CandleTable::from_pages(pages).finalize(date_start, date_end);
        if table.is_empty() {
            return Err(BackfillError::NoData {
                symbol: symbol.to_string(),
                granularity,
            });
        }

        Ok((table, report))
    }
}
