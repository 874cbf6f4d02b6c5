//! FxOpen 종목 참조 데이터.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 기본 수집 대상 상태 그룹.
pub const DEFAULT_STATUS_GROUPS: [&str; 4] = ["Forex", "Crypto", "CFD 00-01", "US Stocks"];

/// 별도 레버리지 변형 심볼 접미사.
const LEVERAGED_SUFFIX: &str = "_L";

/// FxOpen `symbol` 엔드포인트의 종목 정보 (필요한 필드만).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub contract_size: Option<f64>,
    #[serde(default)]
    pub margin_hedged: Option<f64>,
    #[serde(default)]
    pub margin_factor: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status_group_id: Option<String>,
    #[serde(default)]
    pub precision: Option<i32>,
    #[serde(default)]
    pub min_trade_amount: Option<f64>,
    #[serde(default)]
    pub max_trade_amount: Option<f64>,
    #[serde(default)]
    pub trade_amount_step: Option<f64>,
    #[serde(default)]
    pub commission_type: Option<String>,
    #[serde(default)]
    pub commission_charge_type: Option<String>,
    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(default)]
    pub default_slippage: Option<f64>,
    #[serde(default)]
    pub slippage_type: Option<String>,
}

/// 과거 시세가 있는 일반 종목만 남깁니다.
///
/// `_L` 접미사 종목은 제외합니다. 입력 순서를 유지합니다.
pub fn tradable_instruments(all: Vec<Instrument>, with_history: &[String]) -> Vec<Instrument> {
    let history: HashSet<&str> = with_history.iter().map(String::as_str).collect();
    all.into_iter()
        .filter(|i| !i.symbol.ends_with(LEVERAGED_SUFFIX))
        .filter(|i| history.contains(i.symbol.as_str()))
        .collect()
}

/// 심볼 → 종목 정보 맵 (JSON 저장용, 키 정렬).
pub fn instrument_map(instruments: &[Instrument]) -> BTreeMap<String, Instrument> {
    instruments
        .iter()
        .map(|i| (i.symbol.clone(), i.clone()))
        .collect()
}

/// 지정한 상태 그룹에 속한 심볼 (정렬됨).
pub fn filter_by_status_group<S: AsRef<str>>(instruments: &[Instrument], groups: &[S]) -> Vec<String> {
    let mut symbols: Vec<String> = instruments
        .iter()
        .filter(|i| {
            i.status_group_id
                .as_deref()
                .map(|g| groups.iter().any(|chosen| chosen.as_ref() == g))
                .unwrap_or(false)
        })
        .map(|i| i.symbol.clone())
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}
