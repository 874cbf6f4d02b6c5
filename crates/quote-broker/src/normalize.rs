//! 원시 페이지 → 정규화 캔들 변환.
//!
//! - bid/ask 페이지: 시각 기준 inner join 후 mid 계산, 형성 중인 마지막 바 제거
//! - 합쳐진 페이지: 미완성 캔들 제거, 요청한 가격 세트만 투영
//!
//! 출력은 페이지 순서를 그대로 유지합니다. 정렬/중복 제거는 백필 단계에서 합니다.

use chrono::{DateTime, Utc};
use quote_core::{Candle, Ohlc, PriceSet};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::traits::{RawBar, RawCandle, RawPriceBlock, RawPage};

/// 원시 페이지를 정규화합니다.
pub fn normalize(page: RawPage, price_sets: &[PriceSet]) -> Vec<Candle> {
    match page {
        RawPage::BidAsk {
            bid,
            ask,
            available_to,
        } => join_bid_ask(&bid, &ask, available_to, price_sets),
        RawPage::Combined(candles) => project_combined(&candles, price_sets),
    }
}

fn join_bid_ask(
    bid: &[RawBar],
    ask: &[RawBar],
    available_to: Option<DateTime<Utc>>,
    price_sets: &[PriceSet],
) -> Vec<Candle> {
    if bid.is_empty() || ask.is_empty() {
        debug!(bid = bid.len(), ask = ask.len(), "bid/ask 중 빈 페이지");
        return Vec::new();
    }

    let mut ask_by_time: HashMap<DateTime<Utc>, &Ohlc> = HashMap::with_capacity(ask.len());
    for bar in ask {
        ask_by_time.entry(bar.time).or_insert(&bar.ohlc);
    }

    let mut rows: Vec<Candle> = bid
        .iter()
        .filter_map(|b| {
            ask_by_time.get(&b.time).map(|a| {
                let mut candle = Candle::new(b.time)
                    .with_price(PriceSet::Bid, b.ohlc)
                    .with_price(PriceSet::Ask, **a)
                    .with_price(PriceSet::Mid, Ohlc::midpoint(&b.ohlc, a));
                candle.retain_sets(price_sets);
                candle
            })
        })
        .collect();

    let unmatched = bid.len().max(ask.len()) - rows.len();
    if unmatched > 0 {
        debug!(
            bid = bid.len(),
            ask = ask.len(),
            joined = rows.len(),
            "bid/ask 시각 불일치 행 제외"
        );
    }

    if let (Some(last), Some(available_to)) = (rows.last(), available_to) {
        if last.time == available_to {
            debug!(time = %available_to, "형성 중인 마지막 바 제외");
            rows.pop();
        }
    }

    rows
}

fn project_combined(candles: &[RawCandle], price_sets: &[PriceSet]) -> Vec<Candle> {
    candles
        .iter()
        .filter(|c| c.complete)
        .filter_map(|raw| {
            let time = match DateTime::parse_from_rfc3339(&raw.time) {
                Ok(t) => t.with_timezone(&Utc),
                Err(e) => {
                    warn!(time = %raw.time, error = %e, "캔들 시각 파싱 실패, 건너뜀");
                    return None;
                }
            };

            let mut candle = Candle::new(time);
            candle.volume = raw.volume;
            for set in price_sets {
                if let Some(block) = raw.block(*set) {
                    match parse_block(block) {
                        Some(ohlc) => candle.set_price(*set, ohlc),
                        None => warn!(
                            time = %raw.time,
                            price_set = %set,
                            "가격 문자열 파싱 실패, 블록 제외"
                        ),
                    }
                }
            }
            Some(candle)
        })
        .collect()
}

fn parse_block(block: &RawPriceBlock) -> Option<Ohlc> {
    Some(Ohlc::new(
        block.o.trim().parse().ok()?,
        block.h.trim().parse().ok()?,
        block.l.trim().parse().ok()?,
        block.c.trim().parse().ok()?,
    ))
}
