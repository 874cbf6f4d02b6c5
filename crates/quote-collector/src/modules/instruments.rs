//! 종목 목록 동기화 모듈.
//!
//! FxOpen 종목 참조 데이터를 `refs/tradables.json`에,
//! 상태 그룹으로 거른 심볼 목록을 `refs/filtered_symbols.json`에 씁니다.
//! 심볼별 지원 주기는 `refs/periodicities.json`에 씁니다.

use quote_broker::{filter_by_status_group, instrument_map, FxOpenClient, QuoteClient};
use quote_data::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::{Broker, CollectorConfig, Result};

/// 동기화 결과
#[derive(Debug, Clone)]
pub struct InstrumentSync {
    /// 과거 시세가 있는 종목 수
    pub tradable: usize,
    /// 상태 그룹 필터를 통과한 심볼
    pub filtered: Vec<String>,
    pub tradables_path: PathBuf,
    pub filtered_path: PathBuf,
}

/// FxOpen 종목 목록을 받아 참조 파일로 저장
pub async fn sync_instruments<S: AsRef<str>>(
    client: &FxOpenClient,
    refs_dir: &Path,
    status_groups: &[S],
) -> Result<InstrumentSync> {
    let start = Instant::now();
    tracing::info!("종목 목록 동기화 시작");

    let instruments = client.list_instruments().await?;
    let filtered = filter_by_status_group(&instruments, status_groups);

    fs::create_dir_all(refs_dir).map_err(StoreError::from)?;
    let tradables_path = refs_dir.join("tradables.json");
    let filtered_path = refs_dir.join("filtered_symbols.json");
    write_json(&tradables_path, &instrument_map(&instruments))?;
    write_json(&filtered_path, &filtered)?;

    tracing::info!(
        tradable = instruments.len(),
        filtered = filtered.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "종목 목록 동기화 완료"
    );

    Ok(InstrumentSync {
        tradable: instruments.len(),
        filtered,
        tradables_path,
        filtered_path,
    })
}

/// 심볼별 FxOpen 지원 주기를 조회해 참조 파일로 저장
pub async fn sync_periodicities<S: AsRef<str>>(
    client: &FxOpenClient,
    refs_dir: &Path,
    symbols: &[S],
) -> Result<(BTreeMap<String, Vec<String>>, PathBuf)> {
    let mut periodicities = BTreeMap::new();
    for symbol in symbols {
        let symbol = symbol.as_ref();
        let codes = client.periodicities(symbol).await?;
        tracing::debug!(symbol = symbol, periodicities = ?codes, "지원 주기 조회");
        periodicities.insert(symbol.to_string(), codes);
    }

    fs::create_dir_all(refs_dir).map_err(StoreError::from)?;
    let path = refs_dir.join("periodicities.json");
    write_json(&path, &periodicities)?;

    tracing::info!(symbols = periodicities.len(), path = %path.display(), "지원 주기 저장");
    Ok((periodicities, path))
}

/// 브로커의 전체 수집 대상 심볼.
///
/// FxOpen은 상태 그룹 필터를 적용하고 참조 파일을 갱신합니다.
pub async fn universe_symbols<S: AsRef<str>>(
    config: &CollectorConfig,
    broker: Broker,
    status_groups: &[S],
) -> Result<Vec<String>> {
    match broker {
        Broker::FxOpen => {
            let client = config.fxopen_client()?;
            let sync = sync_instruments(&client, &config.refs_dir(), status_groups).await?;
            Ok(sync.filtered)
        }
        Broker::Oanda => {
            let client = config.oanda_client()?;
            let symbols = client.list_symbols().await?;
            tracing::info!(count = symbols.len(), "Oanda 종목 조회 완료");
            Ok(symbols)
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(StoreError::from)?;
    fs::write(path, body).map_err(StoreError::from)?;
    Ok(())
}
