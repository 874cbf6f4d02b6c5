//! 캔들 테이블.
//!
//! 백필 결과를 담는 테이블입니다. `finalize` 이후에는 다음이 보장됩니다:
//! - 시각 오름차순 정렬
//! - 중복 시각 없음
//! - 모든 시각이 요청 구간 `[start, end]` 안에 있음

use super::candle::Candle;
use super::price_set::PriceSet;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// 정규화된 캔들의 테이블.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleTable {
    rows: Vec<Candle>,
}

impl CandleTable {
    pub fn new(rows: Vec<Candle>) -> Self {
        Self { rows }
    }

    /// 여러 페이지를 순서대로 이어 붙입니다 (정렬/중복 제거 없음).
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Vec<Candle>>,
    {
        Self {
            rows: pages.into_iter().flatten().collect(),
        }
    }

    /// 중복 제거, 구간 필터, 정렬.
    ///
    /// 같은 시각이 여러 번 나오면 처음 나온 행을 유지합니다. 정렬은 안정 정렬입니다.
    pub fn finalize(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let mut seen = HashSet::with_capacity(self.rows.len());
        let mut rows: Vec<Candle> = self
            .rows
            .into_iter()
            .filter(|c| seen.insert(c.time))
            .filter(|c| c.time >= start && c.time <= end)
            .collect();
        rows.sort_by_key(|c| c.time);
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Candle> {
        self.rows
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|c| c.time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(|c| c.time)
    }

    /// 하나 이상의 행에 값이 있는 가격 세트 (bid, ask, mid 순서).
    pub fn price_sets(&self) -> Vec<PriceSet> {
        PriceSet::ALL
            .into_iter()
            .filter(|set| self.rows.iter().any(|c| c.price(*set).is_some()))
            .collect()
    }

    /// 볼륨 컬럼이 필요한지 여부.
    pub fn has_volume(&self) -> bool {
        self.rows.iter().any(|c| c.volume.is_some())
    }

    /// 시각이 순증가(중복 없음)인지 확인합니다.
    pub fn is_strictly_increasing(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].time < w[1].time)
    }
}
