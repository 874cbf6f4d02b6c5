//! 과거 시세 백필과 로컬 저장.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `BackfillWalker`: 요청 한도 단위로 기간을 나눠 수집하는 백필 루프
//! - `CandleStore`: (심볼, 간격)별 CSV 테이블 저장소
//! - 데이터셋 완결성 평가

pub mod backfill;
pub mod error;
pub mod evaluate;
pub mod storage;

pub use backfill::{BackfillConfig, BackfillReport, BackfillWalker, FetchWindow, DEFAULT_PAUSE};
pub use error::{BackfillError, StoreError, StoreResult};
pub use evaluate::{evaluate_datasets, DatasetEvaluation, DEFAULT_ABLE_PCT};
pub use storage::CandleStore;
