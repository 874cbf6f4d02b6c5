//! 가격 세트(bid/ask/mid)와 OHLC 값.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들이 담을 수 있는 가격 세트.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSet {
    /// 매수 호가
    Bid,
    /// 매도 호가
    Ask,
    /// bid/ask 중간값
    Mid,
}

impl PriceSet {
    /// 컬럼 출력 순서.
    pub const ALL: [PriceSet; 3] = [PriceSet::Bid, PriceSet::Ask, PriceSet::Mid];

    /// 컬럼 이름 접두사 ("bid", "ask", "mid").
    pub fn prefix(&self) -> &'static str {
        match self {
            PriceSet::Bid => "bid",
            PriceSet::Ask => "ask",
            PriceSet::Mid => "mid",
        }
    }
}

impl fmt::Display for PriceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for PriceSet {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bid" | "b" => Ok(PriceSet::Bid),
            "ask" | "a" => Ok(PriceSet::Ask),
            "mid" | "m" => Ok(PriceSet::Mid),
            _ => Err(CoreError::InvalidPriceSet(s.to_string())),
        }
    }
}

/// 하나의 가격 세트에 대한 시가/고가/저가/종가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    /// bid/ask 두 값의 필드별 산술 평균.
    ///
    /// 고가/저가도 필드별로 평균하므로 실제 mid 호가의 고가/저가와는 다를 수 있습니다.
    pub fn midpoint(bid: &Ohlc, ask: &Ohlc) -> Ohlc {
        Ohlc {
            open: (bid.open + ask.open) / 2.0,
            high: (bid.high + ask.high) / 2.0,
            low: (bid.low + ask.low) / 2.0,
            close: (bid.close + ask.close) / 2.0,
        }
    }

    /// o/h/l/c 순서의 배열.
    pub fn to_array(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }
}
