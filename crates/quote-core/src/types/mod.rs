//! 백필 전반에서 사용하는 기본 타입.

pub mod candle;
pub mod granularity;
pub mod price_set;
pub mod table;
pub mod time;

pub use candle::*;
pub use granularity::*;
pub use price_set::*;
pub use table::*;
pub use time::*;
