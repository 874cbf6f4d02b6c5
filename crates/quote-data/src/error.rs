//! 데이터 모듈 오류 타입.

use chrono::{DateTime, Utc};
use quote_core::Granularity;
use thiserror::Error;

/// 로컬 테이블 저장/로드 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 파일 시스템 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 읽기/쓰기 오류
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON 참조 파일 오류
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 저장된 값 해석 실패
    #[error("Parse error: {0}")]
    Parse(String),
}

/// 백필 실행 오류.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackfillError {
    /// 모든 윈도우가 실패했거나 비어 있음
    #[error("No data returned for {symbol} {granularity}")]
    NoData {
        symbol: String,
        granularity: Granularity,
    },

    /// 시작 시각이 종료 시각 이후
    #[error("Invalid range: {start} >= {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// 브로커가 지원하지 않는 간격
    #[error("{broker} does not support granularity {granularity}")]
    UnsupportedGranularity {
        broker: String,
        granularity: Granularity,
    },
}

/// 저장소 작업 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;
