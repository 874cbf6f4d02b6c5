//! 로컬 테이블 저장소.

pub mod csv_store;

pub use csv_store::CandleStore;
