//! 저장된 데이터셋의 완결성 평가.
//!
//! 간격별 기대 캔들 수:
//! `일일 캔들 수 × 252 × 기간(년) × able_pct`
//!
//! 일일 캔들 수는 하루 6.5 거래시간을 가정합니다.
//! 모든 간격에서 기대치 이상인 심볼을 "백테스트 가능"으로 분류합니다.

use chrono::{DateTime, Utc};
use quote_core::Granularity;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StoreResult;
use crate::storage::CandleStore;

/// 하루 거래 시간.
pub const DAILY_TRADING_HOURS: f64 = 6.5;
/// 연간 거래일.
pub const YEARLY_TRADING_DAYS: f64 = 252.0;
/// 기대치 대비 최소 비율 기본값.
pub const DEFAULT_ABLE_PCT: f64 = 0.6;

/// 하루에 기대하는 캔들 수.
pub fn daily_candles(granularity: Granularity) -> f64 {
    (DAILY_TRADING_HOURS * 60.0 / granularity.unit_minutes() as f64).ceil()
}

/// 기간(년). 일 단위로 내림한 뒤 365.25로 나눕니다.
pub fn years_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_days() as f64 / 365.25
}

/// 기대 캔들 수.
pub fn expected_candles(
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    able_pct: f64,
) -> f64 {
    daily_candles(granularity) * YEARLY_TRADING_DAYS * years_between(start, end) * able_pct
}

/// 평가 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetEvaluation {
    /// 심볼 → (간격 코드 → 기대치 충족 여부)
    pub has_candles: BTreeMap<String, BTreeMap<String, bool>>,
    /// 모든 간격을 충족한 심볼 (입력 순서)
    pub able_symbols: Vec<String>,
}

impl DatasetEvaluation {
    /// `has_candles.json`, `able_symbols.json`을 `dir`에 씁니다.
    pub fn write_refs(&self, dir: &Path) -> StoreResult<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)?;
        let has_candles = dir.join("has_candles.json");
        let able = dir.join("able_symbols.json");
        fs::write(&has_candles, serde_json::to_string_pretty(&self.has_candles)?)?;
        fs::write(&able, serde_json::to_string_pretty(&self.able_symbols)?)?;
        Ok((has_candles, able))
    }
}

/// 저장소의 (심볼, 간격) 테이블을 평가합니다.
///
/// `granularities`는 (간격, 저장 코드) 쌍입니다. 파일이 없으면 0개로 봅니다.
pub fn evaluate_datasets(
    store: &CandleStore,
    symbols: &[String],
    granularities: &[(Granularity, &str)],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    able_pct: f64,
) -> StoreResult<DatasetEvaluation> {
    let mut evaluation = DatasetEvaluation::default();

    for symbol in symbols {
        let mut per_granularity = BTreeMap::new();
        for (granularity, code) in granularities {
            let expected = expected_candles(*granularity, start, end, able_pct);
            let found = store.count_rows(symbol, code)?.unwrap_or(0);
            per_granularity.insert(code.to_string(), found as f64 >= expected);
        }

        if per_granularity.values().all(|ok| *ok) {
            evaluation.able_symbols.push(symbol.clone());
        }
        evaluation.has_candles.insert(symbol.clone(), per_granularity);
    }

    info!(
        symbols = symbols.len(),
        able = evaluation.able_symbols.len(),
        "데이터셋 평가 완료"
    );
    Ok(evaluation)
}
