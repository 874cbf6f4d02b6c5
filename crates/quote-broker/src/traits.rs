//! 브로커 시세 클라이언트 trait과 페이지 타입.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quote_core::{Granularity, Ohlc, PriceSet};
use serde::Deserialize;

use crate::error::FetchResult;
use crate::retry::RetryPolicy;

// ============================================================================
// 간격/요청
// ============================================================================

/// 브로커가 지원하는 간격과 와이어 코드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranularitySpec {
    pub granularity: Granularity,
    /// URL/쿼리에 쓰는 코드 (예: Oanda 일봉은 "D")
    pub code: &'static str,
}

impl GranularitySpec {
    pub const fn new(granularity: Granularity, code: &'static str) -> Self {
        Self { granularity, code }
    }
}

/// 한 번의 페이지 요청.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// `from`부터 `count`개 (음수면 과거 방향)
    Anchored { from: DateTime<Utc>, count: i64 },
    /// `[from, to)` 구간
    Range { from: DateTime<Utc>, to: DateTime<Utc> },
}

/// 브로커가 받는 요청 형태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    Anchored,
    Range,
}

/// 브로커별 백필 정책.
///
/// 백필 루프는 이 값만 보고 윈도우 크기, 요청 형태, 상한 클램프, 윈도우 재시도를 결정합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillPolicy {
    /// 요청당 최대 캔들 수
    pub request_limit: u32,
    pub shape: RequestShape,
    /// 수집 상한을 어제 00:00 UTC로 제한할지 여부
    pub clamp_to_yesterday: bool,
    /// 윈도우 단위 재시도
    pub window_retry: RetryPolicy,
    /// 정규화 결과에 남길 가격 세트
    pub price_sets: Vec<PriceSet>,
}

// ============================================================================
// 원시 페이지
// ============================================================================

/// 단일 가격 세트 바 (bid 또는 ask 페이지의 한 행).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub time: DateTime<Utc>,
    pub ohlc: Ohlc,
}

/// 문자열로 전달되는 OHLC 블록.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPriceBlock {
    pub o: String,
    pub h: String,
    pub l: String,
    pub c: String,
}

/// 여러 가격 세트를 함께 담은 캔들.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawCandle {
    pub time: String,
    #[serde(default = "default_complete")]
    pub complete: bool,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub bid: Option<RawPriceBlock>,
    #[serde(default)]
    pub ask: Option<RawPriceBlock>,
    #[serde(default)]
    pub mid: Option<RawPriceBlock>,
}

fn default_complete() -> bool {
    true
}

impl RawCandle {
    pub fn block(&self, set: PriceSet) -> Option<&RawPriceBlock> {
        match set {
            PriceSet::Bid => self.bid.as_ref(),
            PriceSet::Ask => self.ask.as_ref(),
            PriceSet::Mid => self.mid.as_ref(),
        }
    }
}

/// 정규화 전 브로커 응답.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPage {
    /// bid/ask를 따로 받은 페이지
    BidAsk {
        bid: Vec<RawBar>,
        ask: Vec<RawBar>,
        /// 브로커가 데이터를 보유한 마지막 시각 (형성 중인 바 판별용)
        available_to: Option<DateTime<Utc>>,
    },
    /// 가격 세트가 합쳐진 캔들 목록
    Combined(Vec<RawCandle>),
}

// ============================================================================
// 클라이언트 trait
// ============================================================================

/// 브로커 시세 클라이언트.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    /// 브로커 이름.
    fn name(&self) -> &str;

    /// 지원 간격 테이블.
    fn granularity_table(&self) -> &'static [GranularitySpec];

    /// 백필 정책.
    fn backfill_policy(&self) -> BackfillPolicy;

    /// 간격의 와이어 코드 조회.
    fn granularity_code(&self, granularity: Granularity) -> Option<&'static str> {
        self.granularity_table()
            .iter()
            .find(|spec| spec.granularity == granularity)
            .map(|spec| spec.code)
    }

    /// 페이지 하나 요청.
    async fn fetch_page(
        &self,
        symbol: &str,
        granularity: Granularity,
        request: PageRequest,
    ) -> FetchResult<RawPage>;

    /// 과거 시세를 받을 수 있는 심볼 목록.
    async fn list_symbols(&self) -> FetchResult<Vec<String>>;
}
