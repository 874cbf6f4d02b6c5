//! 수집 작업 모듈.

pub mod collect;
pub mod evaluate;
pub mod instruments;

pub use collect::{collect_pair, run_batch, BatchRequest, PairOutcome, PairStatus};
pub use evaluate::{evaluate_store, load_filtered_symbols};
pub use instruments::{sync_instruments, sync_periodicities, universe_symbols, InstrumentSync};
