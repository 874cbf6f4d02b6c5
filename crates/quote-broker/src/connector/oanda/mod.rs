//! Oanda 커넥터.
//!
//! - 요청 형태: `from`/`to` 구간, `price=MBA`
//! - 인증: `Bearer {api_key}`

pub mod client;
pub mod config;

pub use client::{OandaClient, GRANULARITIES as OANDA_GRANULARITIES, REQUEST_LIMIT as OANDA_REQUEST_LIMIT};
pub use config::OandaConfig;
