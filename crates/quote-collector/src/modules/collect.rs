//! (심볼, 간격) 배치 백필 모듈.
//!
//! 쌍마다 백필 → 저장을 수행하고 결과를 `PairStatus`로 남깁니다.
//! 한 쌍의 실패가 배치를 중단시키지 않습니다.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use quote_core::{backfill_span, Granularity};
use quote_data::{BackfillError, BackfillWalker, CandleStore};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::CollectionStats;

/// 쌍 하나의 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    /// 테이블 저장 완료
    Saved { rows: usize, path: PathBuf },
    /// 받은 데이터 없음 (기존 파일 유지)
    NoData,
    /// 수집은 됐지만 저장 실패
    PersistFailed { error: String },
    /// 요청 전에 거부됨 (지원하지 않는 간격, 잘못된 기간)
    Rejected { reason: String },
}

/// 쌍 하나의 결과와 소요 시간.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub symbol: String,
    pub granularity: Granularity,
    pub status: PairStatus,
    pub elapsed: Duration,
}

/// 배치 요청.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub symbols: Vec<String>,
    pub granularities: Vec<Granularity>,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
}

impl BatchRequest {
    pub fn pair_count(&self) -> usize {
        self.symbols.len() * self.granularities.len()
    }
}

/// 쌍 하나를 백필하고 저장합니다.
pub async fn collect_pair(
    walker: &BackfillWalker,
    store: &CandleStore,
    symbol: &str,
    granularity: Granularity,
    date_start: DateTime<Utc>,
    date_end: DateTime<Utc>,
) -> PairStatus {
    let Some(code) = walker.client().granularity_code(granularity) else {
        tracing::warn!(
            symbol = symbol,
            granularity = %granularity,
            broker = walker.client().name(),
            "지원하지 않는 간격, 건너뜀"
        );
        return PairStatus::Rejected {
            reason: format!("{}: unsupported granularity {}", walker.client().name(), granularity),
        };
    };

    let (table, report) = match walker.collect(symbol, granularity, date_start, date_end).await {
        Ok(result) => result,
        Err(BackfillError::NoData { .. }) => {
            tracing::warn!(symbol = symbol, granularity = %granularity, "데이터 없음, 기존 파일 유지");
            return PairStatus::NoData;
        }
        Err(e) => {
            tracing::error!(symbol = symbol, granularity = %granularity, error = %e, "백필 거부");
            return PairStatus::Rejected {
                reason: e.to_string(),
            };
        }
    };

    if !report.gaps.is_empty() {
        tracing::warn!(
            symbol = symbol,
            granularity = %granularity,
            gaps = report.gaps.len(),
            windows = report.windows_requested,
            "일부 윈도우 누락"
        );
    }

    match store.save(&table, symbol, code) {
        Ok(path) => PairStatus::Saved {
            rows: table.len(),
            path,
        },
        Err(e) => {
            tracing::error!(symbol = symbol, granularity = %granularity, error = %e, "저장 실패");
            PairStatus::PersistFailed {
                error: e.to_string(),
            }
        }
    }
}

/// 심볼 × 간격 배치 실행.
///
/// 결과는 (심볼, 간격) 입력 순서로 돌려줍니다. `max_concurrent_pairs`가 1보다 크면
/// 독립된 쌍을 동시에 처리하며, 클라이언트(와 리미터)는 공유됩니다.
pub async fn run_batch(
    walker: &BackfillWalker,
    store: &CandleStore,
    request: &BatchRequest,
    max_concurrent_pairs: usize,
    progress: &ProgressBar,
) -> (Vec<PairOutcome>, CollectionStats) {
    let started = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(
        broker = walker.client().name(),
        symbols = request.symbols.len(),
        granularities = request.granularities.len(),
        date_start = %request.date_start,
        date_end = %request.date_end,
        "배치 수집 시작"
    );

    let pairs = request
        .symbols
        .iter()
        .flat_map(|symbol| request.granularities.iter().map(move |g| (symbol, *g)));

    let mut outcomes: Vec<(usize, PairOutcome)> = stream::iter(pairs.enumerate())
        .map(|(idx, (symbol, granularity))| async move {
            let pair_started = Instant::now();
            let status = collect_pair(
                walker,
                store,
                symbol,
                granularity,
                request.date_start,
                request.date_end,
            )
            .instrument(backfill_span!("pair", symbol, granularity))
            .await;
            let elapsed = pair_started.elapsed();

            tracing::info!(
                symbol = %symbol,
                granularity = %granularity,
                status = ?status,
                elapsed = format!("{:.1}s", elapsed.as_secs_f64()),
                "쌍 처리 완료"
            );
            progress.inc(1);

            (
                idx,
                PairOutcome {
                    symbol: symbol.clone(),
                    granularity,
                    status,
                    elapsed,
                },
            )
        })
        .buffer_unordered(max_concurrent_pairs.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|(idx, _)| *idx);
    let outcomes: Vec<PairOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

    for outcome in &outcomes {
        stats.record(&outcome.status);
    }
    stats.elapsed = started.elapsed();

    (outcomes, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use quote_broker::{
        BackfillPolicy, FetchError, FetchResult, GranularitySpec, PageRequest, QuoteClient,
        RawBar, RawPage, RequestShape, RetryPolicy,
    };
    use quote_core::{Ohlc, PriceSet};
    use quote_data::BackfillConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    static TABLE: [GranularitySpec; 2] = [
        GranularitySpec::new(Granularity::H1, "H1"),
        GranularitySpec::new(Granularity::D1, "D"),
    ];

    /// "EMPTY"는 항상 빈 페이지, 그 외는 요청 구간의 시간봉을 돌려줍니다.
    struct ScriptedBroker;

    impl ScriptedBroker {
        fn bars(from: DateTime<Utc>, to: DateTime<Utc>, spread: f64) -> Vec<RawBar> {
            let hours = (to - from).num_hours();
            (0..hours)
                .map(|i| RawBar {
                    time: from + ChronoDuration::hours(i),
                    ohlc: Ohlc::new(1.0 + spread, 1.1 + spread, 0.9 + spread, 1.0 + spread),
                })
                .collect()
        }
    }

    #[async_trait]
    impl QuoteClient for ScriptedBroker {
        fn name(&self) -> &str {
            "scripted"
        }

        fn granularity_table(&self) -> &'static [GranularitySpec] {
            &TABLE
        }

        fn backfill_policy(&self) -> BackfillPolicy {
            BackfillPolicy {
                request_limit: 24,
                shape: RequestShape::Range,
                clamp_to_yesterday: false,
                window_retry: RetryPolicy::single(),
                price_sets: PriceSet::ALL.to_vec(),
            }
        }

        async fn fetch_page(
            &self,
            symbol: &str,
            _granularity: Granularity,
            request: PageRequest,
        ) -> FetchResult<RawPage> {
            if symbol == "EMPTY" {
                return Err(FetchError::EmptyPage(symbol.to_string()));
            }
            let (from, to) = match request {
                PageRequest::Range { from, to } => (from, to),
                PageRequest::Anchored { from, count } => (from, from + ChronoDuration::hours(count)),
            };
            Ok(RawPage::BidAsk {
                bid: Self::bars(from, to, 0.0),
                ask: Self::bars(from, to, 0.02),
                available_to: None,
            })
        }

        async fn list_symbols(&self) -> FetchResult<Vec<String>> {
            Ok(vec!["EURUSD".to_string()])
        }
    }

    fn walker() -> BackfillWalker {
        BackfillWalker::new(
            Arc::new(ScriptedBroker),
            BackfillConfig {
                pause: Duration::ZERO,
            },
        )
    }

    fn request() -> BatchRequest {
        BatchRequest {
            symbols: vec!["EURUSD".to_string(), "EMPTY".to_string()],
            granularities: vec![Granularity::H1, Granularity::H4],
            date_start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            date_end: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_run_batch_statuses_in_input_order() {
        let dir = TempDir::new().unwrap();
        let store = CandleStore::new(dir.path());
        let progress = ProgressBar::hidden();

        let (outcomes, stats) = run_batch(&walker(), &store, &request(), 1, &progress).await;

        let summary: Vec<(&str, Granularity)> = outcomes
            .iter()
            .map(|o| (o.symbol.as_str(), o.granularity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("EURUSD", Granularity::H1),
                ("EURUSD", Granularity::H4),
                ("EMPTY", Granularity::H1),
                ("EMPTY", Granularity::H4),
            ]
        );

        // 2024-01-01 00:00 ~ 01-03 00:00 포함 구간, 48개 (마지막 경계는 요청 구간 밖)
        match &outcomes[0].status {
            PairStatus::Saved { rows, path } => {
                assert_eq!(*rows, 48);
                assert_eq!(path, &dir.path().join("EURUSD_H1.csv"));
            }
            other => panic!("unexpected status: {:?}", other),
        }
        assert!(matches!(outcomes[1].status, PairStatus::Rejected { .. }));
        assert_eq!(outcomes[2].status, PairStatus::NoData);
        assert!(matches!(outcomes[3].status, PairStatus::Rejected { .. }));

        assert_eq!(stats.total, 4);
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.no_data, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.total_rows, 48);
        assert_eq!(progress.position(), 4);
        assert!(!dir.path().join("EMPTY_H1.csv").exists());
    }

    #[tokio::test]
    async fn test_concurrent_batch_matches_sequential() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let progress = ProgressBar::hidden();

        let (sequential, _) = run_batch(
            &walker(),
            &CandleStore::new(dir_a.path()),
            &request(),
            1,
            &progress,
        )
        .await;
        let (concurrent, _) = run_batch(
            &walker(),
            &CandleStore::new(dir_b.path()),
            &request(),
            3,
            &progress,
        )
        .await;

        let statuses = |outcomes: &[PairOutcome]| {
            outcomes
                .iter()
                .map(|o| std::mem::discriminant(&o.status))
                .collect::<Vec<_>>()
        };
        assert_eq!(statuses(&sequential), statuses(&concurrent));
        assert_eq!(
            std::fs::read(dir_a.path().join("EURUSD_H1.csv")).unwrap(),
            std::fs::read(dir_b.path().join("EURUSD_H1.csv")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();
        let store = CandleStore::new(&blocker);
        let req = request();

        let status = collect_pair(
            &walker(),
            &store,
            "EURUSD",
            Granularity::H1,
            req.date_start,
            req.date_end,
        )
        .await;
        assert!(matches!(status, PairStatus::PersistFailed { .. }));
    }

    #[tokio::test]
    async fn test_daily_pair_uses_broker_code() {
        let dir = TempDir::new().unwrap();
        let store = CandleStore::new(dir.path());
        let req = request();

        let status = collect_pair(
            &walker(),
            &store,
            "EURUSD",
            Granularity::D1,
            req.date_start,
            req.date_end,
        )
        .await;
        match status {
            PairStatus::Saved { path, .. } => assert!(path.ends_with("EURUSD_D.csv")),
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
