//! # Quote Core
//!
//! 과거 시세 백필 파이프라인의 핵심 타입을 제공합니다.
//!
//! - 캔들 간격 (`Granularity`)
//! - 가격 세트와 OHLC (`PriceSet`, `Ohlc`)
//! - 정규화된 캔들과 테이블 (`Candle`, `CandleTable`)
//! - UTC 날짜 유틸리티
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod types;

pub use error::*;
pub use logging::*;
pub use types::*;
