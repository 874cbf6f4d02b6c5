//! FxOpen 시세 REST 클라이언트.
//!
//! bid/ask 바를 각각 요청한 뒤 하나의 `RawPage::BidAsk`로 묶습니다.
//! 모든 HTTP 호출은 리미터 대기 후 지수 백오프 재시도로 감싸집니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quote_core::{Granularity, Ohlc, PriceSet};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::config::FxOpenConfig;
use super::instruments::{tradable_instruments, Instrument};
use crate::connector::http::{build_client, join_url, read_json};
use crate::error::{FetchError, FetchResult};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::traits::{
    BackfillPolicy, GranularitySpec, PageRequest, QuoteClient, RawBar, RawPage, RequestShape,
};

/// 요청당 최대 캔들 수.
pub const REQUEST_LIMIT: u32 = 900;

/// 지원 간격.
pub static GRANULARITIES: [GranularitySpec; 7] = [
    GranularitySpec::new(Granularity::M1, "M1"),
    GranularitySpec::new(Granularity::M5, "M5"),
    GranularitySpec::new(Granularity::M15, "M15"),
    GranularitySpec::new(Granularity::M30, "M30"),
    GranularitySpec::new(Granularity::H1, "H1"),
    GranularitySpec::new(Granularity::H4, "H4"),
    GranularitySpec::new(Granularity::D1, "D1"),
];

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FxBar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FxBarsResponse {
    #[serde(default)]
    bars: Vec<FxBar>,
    #[serde(default)]
    available_to: Option<i64>,
}

impl FxBarsResponse {
    fn into_raw_bars(self) -> Vec<RawBar> {
        self.bars
            .into_iter()
            .filter_map(|bar| {
                DateTime::<Utc>::from_timestamp_millis(bar.timestamp).map(|time| RawBar {
                    time,
                    ohlc: Ohlc::new(bar.open, bar.high, bar.low, bar.close),
                })
            })
            .collect()
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// FxOpen 클라이언트.
pub struct FxOpenClient {
    config: FxOpenConfig,
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl FxOpenClient {
    /// 새 클라이언트 생성.
    pub fn new(config: FxOpenConfig) -> FetchResult<Self> {
        let client = build_client(&config.authorization(), config.timeout_secs)?;
        let limiter = RateLimiter::new(config.throttle);
        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    /// 환경 변수에서 생성.
    pub fn from_env() -> FetchResult<Self> {
        Self::new(FxOpenConfig::from_env()?)
    }

    pub fn config(&self) -> &FxOpenConfig {
        &self.config
    }

    /// URL 경로용 심볼 (`#` → `%23`).
    pub fn escape_symbol(symbol: &str) -> String {
        symbol.replace('#', "%23")
    }

    /// 리미터 대기 + 재시도를 거친 GET 요청.
    async fn get_json<T: DeserializeOwned>(
        &self,
        suffix: &str,
        params: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = join_url(&self.config.base_url, suffix);
        let url = url.as_str();
        let client = &self.client;
        let limiter = &self.limiter;

        self.config
            .retry
            .run(FetchError::is_retryable, || async move {
                limiter.await_turn().await;
                debug!("GET {}", url);
                let response = client.get(url).query(params).send().await?;
                read_json(response).await
            })
            .await
    }

    /// 전체 종목 중 과거 시세가 있는 일반 종목.
    pub async fn list_instruments(&self) -> FetchResult<Vec<Instrument>> {
        let all: Vec<Instrument> = self.get_json("symbol", &[]).await?;
        let with_history: Vec<String> = self.get_json("quotehistory/symbols", &[]).await?;
        debug!(
            all = all.len(),
            with_history = with_history.len(),
            "FxOpen 종목 목록 조회"
        );
        Ok(tradable_instruments(all, &with_history))
    }

    /// 심볼이 지원하는 주기 목록.
    pub async fn periodicities(&self, symbol: &str) -> FetchResult<Vec<String>> {
        let suffix = format!("quotehistory/{}/periodicities", Self::escape_symbol(symbol));
        self.get_json(&suffix, &[]).await
    }
}

#[async_trait]
impl QuoteClient for FxOpenClient {
    fn name(&self) -> &str {
        "fxopen"
    }

    fn granularity_table(&self) -> &'static [GranularitySpec] {
        &GRANULARITIES
    }

    fn backfill_policy(&self) -> BackfillPolicy {
        BackfillPolicy {
            request_limit: REQUEST_LIMIT,
            shape: RequestShape::Anchored,
            clamp_to_yesterday: true,
            window_retry: RetryPolicy::single(),
            price_sets: PriceSet::ALL.to_vec(),
        }
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        granularity: Granularity,
        request: PageRequest,
    ) -> FetchResult<RawPage> {
        let code = self
            .granularity_code(granularity)
            .ok_or(FetchError::UnsupportedGranularity(granularity))?;

        let (from, count) = match request {
            PageRequest::Anchored { from, count } => (from, count),
            PageRequest::Range { from, to } => {
                let candles = (to - from).num_minutes() / granularity.unit_minutes();
                (from, candles.clamp(1, i64::from(REQUEST_LIMIT)))
            }
        };
        // 과거 방향 요청은 기준 바를 포함하므로 1을 더해 보냅니다.
        let count = if count < 0 { count + 1 } else { count };

        let params = [
            ("timestamp", from.timestamp_millis().to_string()),
            ("count", count.to_string()),
        ];
        let base = format!("quotehistory/{}/{}/bars", Self::escape_symbol(symbol), code);

        let bid: FxBarsResponse = self.get_json(&format!("{}/bid", base), &params).await?;
        let ask: FxBarsResponse = self.get_json(&format!("{}/ask", base), &params).await?;

        if bid.bars.is_empty() && ask.bars.is_empty() {
            return Err(FetchError::EmptyPage(format!("{} {} @ {}", symbol, code, from)));
        }

        let available_to = bid
            .available_to
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Ok(RawPage::BidAsk {
            bid: bid.into_raw_bars(),
            ask: ask.into_raw_bars(),
            available_to,
        })
    }

    async fn list_symbols(&self) -> FetchResult<Vec<String>> {
        let instruments = self.list_instruments().await?;
        Ok(instruments.into_iter().map(|i| i.symbol).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::fxopen::config::DEFAULT_THROTTLE;
    use chrono::TimeZone;
    use mockito::Matcher;
    use std::time::Duration;

    fn test_client(url: &str) -> FxOpenClient {
        let config = FxOpenConfig::new(url, "id", "key", "secret")
            .with_throttle(Duration::ZERO)
            .with_retry(RetryPolicy::immediate(3));
        FxOpenClient::new(config).unwrap()
    }

    fn bars_body(bars: &[(i64, f64)], available_to: i64) -> String {
        let bars: Vec<_> = bars
            .iter()
            .map(|(ts, p)| {
                serde_json::json!({
                    "Open": p, "High": p, "Low": p, "Close": p,
                    "Volume": 10, "Timestamp": ts
                })
            })
            .collect();
        serde_json::json!({
            "Symbol": "EURUSD",
            "AvailableFrom": 0,
            "AvailableTo": available_to,
            "Bars": bars
        })
        .to_string()
    }

    #[test]
    fn test_escape_symbol() {
        assert_eq!(FxOpenClient::escape_symbol("#AAPL"), "%23AAPL");
        assert_eq!(FxOpenClient::escape_symbol("EURUSD"), "EURUSD");
    }

    #[test]
    fn test_granularity_table() {
        let client = test_client("http://localhost");
        assert_eq!(client.granularity_code(Granularity::D1), Some("D1"));
        assert_eq!(client.granularity_code(Granularity::H2), None);
        assert_eq!(client.backfill_policy().request_limit, 900);
        assert!(client.backfill_policy().clamp_to_yesterday);
    }

    #[tokio::test]
    async fn test_fetch_page_merges_bid_and_ask() {
        let mut server = mockito::Server::new_async().await;
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ts = from.timestamp_millis();
        let query = Matcher::AllOf(vec![
            Matcher::UrlEncoded("timestamp".into(), ts.to_string()),
            Matcher::UrlEncoded("count".into(), "900".into()),
        ]);

        let bid = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/bid")
            .match_query(query.clone())
            .match_header("authorization", "Basic id:key:secret")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(bars_body(&[(ts, 1.10), (ts + 3_600_000, 1.11)], ts + 7_200_000))
            .create_async()
            .await;
        let ask = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/ask")
            .match_query(query)
            .with_status(200)
            .with_body(bars_body(&[(ts, 1.12), (ts + 3_600_000, 1.13)], ts + 7_200_000))
            .create_async()
            .await;

        let client = test_client(&server.url());
        let page = client
            .fetch_page(
                "EURUSD",
                Granularity::H1,
                PageRequest::Anchored { from, count: 900 },
            )
            .await
            .unwrap();

        bid.assert_async().await;
        ask.assert_async().await;
        match page {
            RawPage::BidAsk {
                bid,
                ask,
                available_to,
            } => {
                assert_eq!(bid.len(), 2);
                assert_eq!(ask.len(), 2);
                assert_eq!(bid[0].time, from);
                assert_eq!(available_to, Some(from + chrono::Duration::hours(2)));
            }
            other => panic!("unexpected page: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_negative_count_sent_plus_one() {
        let mut server = mockito::Server::new_async().await;
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let bid = server
            .mock("GET", "/quotehistory/EURUSD/M5/bars/bid")
            .match_query(Matcher::UrlEncoded("count".into(), "-9".into()))
            .with_status(200)
            .with_body(bars_body(&[(from.timestamp_millis(), 1.0)], 0))
            .create_async()
            .await;
        let _ask = server
            .mock("GET", "/quotehistory/EURUSD/M5/bars/ask")
            .match_query(Matcher::UrlEncoded("count".into(), "-9".into()))
            .with_status(200)
            .with_body(bars_body(&[(from.timestamp_millis(), 1.0)], 0))
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .fetch_page(
                "EURUSD",
                Granularity::M5,
                PageRequest::Anchored { from, count: -10 },
            )
            .await
            .unwrap();
        bid.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_bars_is_empty_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex(r"^/quotehistory/EURUSD/D1/bars/(bid|ask)$".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"Bars": []}"#)
            .expect(2)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .fetch_page(
                "EURUSD",
                Granularity::D1,
                PageRequest::Anchored {
                    from: Utc::now(),
                    count: 900,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_empty_page());
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/bid")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .fetch_page(
                "EURUSD",
                Granularity::H1,
                PageRequest::Anchored {
                    from: Utc::now(),
                    count: 900,
                },
            )
            .await
            .unwrap_err();

        m.assert_async().await;
        assert_eq!(
            err,
            FetchError::Status {
                status: 503,
                body: "unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/bid")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .fetch_page(
                "EURUSD",
                Granularity::H1,
                PageRequest::Anchored {
                    from: Utc::now(),
                    count: 900,
                },
            )
            .await
            .unwrap_err();

        m.assert_async().await;
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unsupported_granularity_makes_no_request() {
        let client = test_client("http://127.0.0.1:9");
        let err = client
            .fetch_page(
                "EURUSD",
                Granularity::H2,
                PageRequest::Anchored {
                    from: Utc::now(),
                    count: 900,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::UnsupportedGranularity(Granularity::H2));
    }

    #[tokio::test]
    async fn test_default_throttle_spaces_bid_and_ask() {
        let mut server = mockito::Server::new_async().await;
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let body = bars_body(&[(from.timestamp_millis(), 1.0)], 0);
        let bid = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/bid")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;
        let ask = server
            .mock("GET", "/quotehistory/EURUSD/H1/bars/ask")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let config = FxOpenConfig::new(server.url(), "id", "key", "secret")
            .with_retry(RetryPolicy::single());
        assert_eq!(config.throttle, DEFAULT_THROTTLE);
        let client = FxOpenClient::new(config).unwrap();

        let started = std::time::Instant::now();
        client
            .fetch_page(
                "EURUSD",
                Granularity::H1,
                PageRequest::Anchored { from, count: 900 },
            )
            .await
            .unwrap();

        bid.assert_async().await;
        ask.assert_async().await;
        // ask 요청은 bid 요청 후 최소 간격만큼 기다림
        assert!(started.elapsed() >= DEFAULT_THROTTLE);
    }

    #[tokio::test]
    async fn test_periodicities_escapes_symbol() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/quotehistory/%23AAPL/periodicities")
            .with_status(200)
            .with_body(r#"["M1", "M5", "H1", "D1", "W1", "MN1"]"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let periodicities = client.periodicities("#AAPL").await.unwrap();

        m.assert_async().await;
        assert_eq!(periodicities, vec!["M1", "M5", "H1", "D1", "W1", "MN1"]);
    }

    #[tokio::test]
    async fn test_list_symbols_intersects_history() {
        let mut server = mockito::Server::new_async().await;
        let _all = server
            .mock("GET", "/symbol")
            .with_status(200)
            .with_body(
                serde_json::json!([
                    {"Symbol": "EURUSD", "StatusGroupId": "Forex"},
                    {"Symbol": "EURUSD_L", "StatusGroupId": "Forex"},
                    {"Symbol": "NOHIST", "StatusGroupId": "Forex"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let _hist = server
            .mock("GET", "/quotehistory/symbols")
            .with_status(200)
            .with_body(r#"["EURUSD", "EURUSD_L"]"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.list_symbols().await.unwrap(), vec!["EURUSD"]);
    }
}
