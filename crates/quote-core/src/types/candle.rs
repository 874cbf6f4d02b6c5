//! 정규화된 캔들 한 개.

use super::price_set::{Ohlc, PriceSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 정규화된 캔들.
///
/// 시각은 항상 UTC 캔들 시작 시각입니다. 가격 세트는 브로커/요청에 따라
/// 일부만 채워질 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub bid: Option<Ohlc>,
    pub ask: Option<Ohlc>,
    pub mid: Option<Ohlc>,
    /// 틱 볼륨 (제공하는 브로커만)
    pub volume: Option<i64>,
}

impl Candle {
    /// 가격 없이 시각만 가진 캔들 생성.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            bid: None,
            ask: None,
            mid: None,
            volume: None,
        }
    }

    /// 가격 세트를 채운 새 캔들 반환.
    pub fn with_price(mut self, set: PriceSet, ohlc: Ohlc) -> Self {
        self.set_price(set, ohlc);
        self
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn price(&self, set: PriceSet) -> Option<&Ohlc> {
        match set {
            PriceSet::Bid => self.bid.as_ref(),
            PriceSet::Ask => self.ask.as_ref(),
            PriceSet::Mid => self.mid.as_ref(),
        }
    }

    pub fn set_price(&mut self, set: PriceSet, ohlc: Ohlc) {
        match set {
            PriceSet::Bid => self.bid = Some(ohlc),
            PriceSet::Ask => self.ask = Some(ohlc),
            PriceSet::Mid => self.mid = Some(ohlc),
        }
    }

    /// 요청한 가격 세트 외의 값을 제거합니다.
    pub fn retain_sets(&mut self, sets: &[PriceSet]) {
        for set in PriceSet::ALL {
            if !sets.contains(&set) {
                match set {
                    PriceSet::Bid => self.bid = None,
                    PriceSet::Ask => self.ask = None,
                    PriceSet::Mid => self.mid = None,
                }
            }
        }
    }
}
