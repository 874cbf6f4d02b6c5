//! 브로커 커넥터.

pub(crate) mod http;

pub mod fxopen;
pub mod oanda;

pub use fxopen::{
    filter_by_status_group, instrument_map, tradable_instruments, FxOpenClient, FxOpenConfig,
    Instrument, DEFAULT_STATUS_GROUPS, FXOPEN_GRANULARITIES, FXOPEN_REQUEST_LIMIT,
};
pub use oanda::{OandaClient, OandaConfig, OANDA_GRANULARITIES, OANDA_REQUEST_LIMIT};

use secrecy::SecretString;

use crate::error::{FetchError, FetchResult};

pub(crate) fn secret(value: String) -> SecretString {
    SecretString::new(value.into_boxed_str())
}

pub(crate) fn required_env(key: &str) -> FetchResult<String> {
    std::env::var(key).map_err(|_| FetchError::Config(format!("{} 환경 변수가 없습니다", key)))
}
