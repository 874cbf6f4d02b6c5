//! 데이터셋 완결성 평가 모듈.

use chrono::{DateTime, Utc};
use quote_core::Granularity;
use quote_data::{evaluate_datasets, DatasetEvaluation, StoreError};
use std::fs;
use std::path::Path;

use crate::{Broker, CollectorConfig, CollectorError, Result};

/// `refs/filtered_symbols.json`에서 심볼 목록 로드 (없으면 `None`)
pub fn load_filtered_symbols(refs_dir: &Path) -> Result<Option<Vec<String>>> {
    let path = refs_dir.join("filtered_symbols.json");
    if !path.exists() {
        return Ok(None);
    }
    let body = fs::read_to_string(&path).map_err(StoreError::from)?;
    let symbols = serde_json::from_str(&body).map_err(StoreError::from)?;
    Ok(Some(symbols))
}

/// 저장된 테이블을 평가하고 결과를 참조 디렉터리에 씁니다.
pub fn evaluate_store(
    config: &CollectorConfig,
    broker: Broker,
    symbols: &[String],
    granularities: &[Granularity],
    date_start: DateTime<Utc>,
    date_end: DateTime<Utc>,
    able_pct: f64,
) -> Result<DatasetEvaluation> {
    let mut coded = Vec::with_capacity(granularities.len());
    for granularity in granularities {
        let code = broker.granularity_code(*granularity).ok_or_else(|| {
            CollectorError::Config(format!(
                "{}에서 지원하지 않는 간격: {}",
                broker, granularity
            ))
        })?;
        coded.push((*granularity, code));
    }

    let evaluation = evaluate_datasets(
        &config.store(),
        symbols,
        &coded,
        date_start,
        date_end,
        able_pct,
    )?;
    let (has_candles, able) = evaluation.write_refs(&config.refs_dir())?;

    tracing::info!(
        has_candles = %has_candles.display(),
        able_symbols = %able.display(),
        "평가 결과 저장"
    );
    Ok(evaluation)
}
