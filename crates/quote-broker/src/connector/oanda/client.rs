//! Oanda v3 시세 REST 클라이언트.
//!
//! 구간 요청(`from`/`to`) 한 번으로 mid/bid/ask가 합쳐진 캔들을 받습니다.
//! 클라이언트 단 재시도는 없고, 윈도우 재시도는 백필 정책으로 위임합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quote_core::{Granularity, PriceSet};
use serde::Deserialize;
use tracing::debug;

use super::config::OandaConfig;
use crate::connector::http::{build_client, join_url, read_json};
use crate::error::{FetchError, FetchResult};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::traits::{
    BackfillPolicy, GranularitySpec, PageRequest, QuoteClient, RawCandle, RawPage, RequestShape,
};

/// 요청당 최대 캔들 수.
pub const REQUEST_LIMIT: u32 = 3000;

/// `from`/`to` 쿼리 시각 형식.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 지원 간격.
pub static GRANULARITIES: [GranularitySpec; 8] = [
    GranularitySpec::new(Granularity::M1, "M1"),
    GranularitySpec::new(Granularity::M5, "M5"),
    GranularitySpec::new(Granularity::M15, "M15"),
    GranularitySpec::new(Granularity::M30, "M30"),
    GranularitySpec::new(Granularity::H1, "H1"),
    GranularitySpec::new(Granularity::H2, "H2"),
    GranularitySpec::new(Granularity::H4, "H4"),
    GranularitySpec::new(Granularity::D1, "D"),
];

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct AccountInstrument {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AccountInstrumentsResponse {
    instruments: Vec<AccountInstrument>,
}

/// Oanda 클라이언트.
pub struct OandaClient {
    config: OandaConfig,
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl OandaClient {
    /// 새 클라이언트 생성.
    pub fn new(config: OandaConfig) -> FetchResult<Self> {
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
        Self::new(OandaConfig::from_env()?)
    }

    pub fn config(&self) -> &OandaConfig {
        &self.config
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        suffix: &str,
        params: &[(&str, String)],
    ) -> FetchResult<T> {
        self.limiter.await_turn().await;
        let url = join_url(&self.config.base_url, suffix);
        debug!("GET {}", url);
        let response = self.client.get(&url).query(params).send().await?;
        read_json(response).await
    }

    fn format_time(time: &DateTime<Utc>) -> String {
        time.format(DATE_FORMAT).to_string()
    }
}

#[async_trait]
impl QuoteClient for OandaClient {
    fn name(&self) -> &str {
        "oanda"
    }

    fn granularity_table(&self) -> &'static [GranularitySpec] {
        &GRANULARITIES
    }

    fn backfill_policy(&self) -> BackfillPolicy {
        BackfillPolicy {
            request_limit: REQUEST_LIMIT,
            shape: RequestShape::Range,
            clamp_to_yesterday: false,
            window_retry: RetryPolicy::immediate(self.config.window_attempts),
            price_sets: vec![PriceSet::Mid, PriceSet::Bid, PriceSet::Ask],
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

        let mut params = vec![
            ("granularity", code.to_string()),
            ("price", "MBA".to_string()),
        ];
        match request {
            PageRequest::Range { from, to } => {
                params.push(("from", Self::format_time(&from)));
                params.push(("to", Self::format_time(&to)));
            }
            PageRequest::Anchored { from, count } => {
                params.push(("from", Self::format_time(&from)));
                params.push(("count", count.clamp(1, i64::from(REQUEST_LIMIT)).to_string()));
            }
        }

        let suffix = format!("instruments/{}/candles", symbol);
        let response: CandlesResponse = self.get_json(&suffix, &params).await?;

        if response.candles.is_empty() {
            return Err(FetchError::EmptyPage(format!("{} {}", symbol, code)));
        }
        Ok(RawPage::Combined(response.candles))
    }

    async fn list_symbols(&self) -> FetchResult<Vec<String>> {
        let suffix = format!("accounts/{}/instruments", self.config.account_id);
        let response: AccountInstrumentsResponse = self.get_json(&suffix, &[]).await?;
        Ok(response.instruments.into_iter().map(|i| i.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn test_client(url: &str) -> OandaClient {
        OandaClient::new(OandaConfig::new(url, "token", "001-001-1")).unwrap()
    }

    #[test]
    fn test_policy() {
        let client = test_client("http://localhost");
        let policy = client.backfill_policy();
        assert_eq!(policy.request_limit, 3000);
        assert_eq!(policy.shape, RequestShape::Range);
        assert!(!policy.clamp_to_yesterday);
        assert_eq!(policy.window_retry.max_attempts, 3);
        assert_eq!(client.granularity_code(Granularity::D1), Some("D"));
        assert_eq!(client.granularity_code(Granularity::H2), Some("H2"));
    }

    #[tokio::test]
    async fn test_fetch_range_page() {
        let mut server = mockito::Server::new_async().await;
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let m = server
            .mock("GET", "/instruments/EUR_USD/candles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("granularity".into(), "D".into()),
                Matcher::UrlEncoded("price".into(), "MBA".into()),
                Matcher::UrlEncoded("from".into(), "2024-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("to".into(), "2024-01-02T00:00:00Z".into()),
            ]))
            .match_header("authorization", "Bearer token")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "instrument": "EUR_USD",
                    "granularity": "D",
                    "candles": [{
                        "complete": true,
                        "volume": 1200,
                        "time": "2024-01-01T00:00:00.000000000Z",
                        "bid": {"o": "1.1000", "h": "1.1100", "l": "1.0900", "c": "1.1050"},
                        "mid": {"o": "1.1001", "h": "1.1101", "l": "1.0901", "c": "1.1051"},
                        "ask": {"o": "1.1002", "h": "1.1102", "l": "1.0902", "c": "1.1052"}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let page = client
            .fetch_page("EUR_USD", Granularity::D1, PageRequest::Range { from, to })
            .await
            .unwrap();

        m.assert_async().await;
        match page {
            RawPage::Combined(candles) => {
                assert_eq!(candles.len(), 1);
                assert_eq!(candles[0].volume, Some(1200));
                assert_eq!(candles[0].mid.as_ref().unwrap().c, "1.1051");
            }
            other => panic!("unexpected page: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candles_is_empty_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/instruments/EUR_USD/candles")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"instrument": "EUR_USD", "granularity": "H1", "candles": []}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let now = Utc::now();
        let err = client
            .fetch_page(
                "EUR_USD",
                Granularity::H1,
                PageRequest::Range {
                    from: now - chrono::Duration::hours(5),
                    to: now,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_empty_page());
    }

    #[tokio::test]
    async fn test_missing_candles_key_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/instruments/EUR_USD/candles")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"errorMessage": "nope"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let now = Utc::now();
        let err = client
            .fetch_page(
                "EUR_USD",
                Granularity::H1,
                PageRequest::Range {
                    from: now - chrono::Duration::hours(5),
                    to: now,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_list_symbols() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/accounts/001-001-1/instruments")
            .with_status(200)
            .with_body(
                r#"{"instruments": [{"name": "EUR_USD", "type": "CURRENCY"}, {"name": "XAU_USD", "type": "METAL"}]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.list_symbols().await.unwrap(), vec!["EUR_USD", "XAU_USD"]);
    }
}
