//! FxOpen 커넥터.
//!
//! - 요청 형태: 기준 시각 + 개수 (`timestamp` ms, `count`)
//! - bid/ask 바를 따로 받아 정규화 단계에서 합칩니다.
//! - 인증: `Basic {api_id}:{api_key}:{api_secret}`

pub mod client;
pub mod config;
pub mod instruments;

pub use client::{FxOpenClient, GRANULARITIES as FXOPEN_GRANULARITIES, REQUEST_LIMIT as FXOPEN_REQUEST_LIMIT};
pub use config::FxOpenConfig;
pub use instruments::{
    filter_by_status_group, instrument_map, tradable_instruments, Instrument,
    DEFAULT_STATUS_GROUPS,
};
