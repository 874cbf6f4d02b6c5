//! 에러 타입 정의.

use quote_broker::FetchError;
use quote_core::CoreError;
use quote_data::{BackfillError, StoreError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러 (환경 변수, 배치 계획 파일, 인자)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 브로커 요청 에러
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// 백필 에러
    #[error("Backfill error: {0}")]
    Backfill(#[from] BackfillError),

    /// 저장소 에러
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
