//! 과거 시세 배치 수집기.
//!
//! 이 crate는 브로커 API에서 과거 캔들을 받아 로컬 CSV 테이블로 저장하는 바이너리를 제공합니다:
//! - 심볼 × 간격 배치 백필 (FxOpen, Oanda)
//! - FxOpen 종목 목록 및 지원 주기 동기화
//! - 저장된 데이터셋 완결성 평가

pub mod config;
pub mod error;
pub mod modules;
pub mod plan;
pub mod stats;

pub use config::{Broker, CollectorConfig};
pub use error::{CollectorError, Result};
pub use plan::BatchPlan;
pub use stats::CollectionStats;
