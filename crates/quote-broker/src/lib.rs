//! 브로커 시세 클라이언트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `QuoteClient` trait: 페이지 단위 과거 시세 요청 인터페이스
//! - FxOpen / Oanda REST 커넥터
//! - 요청 간 최소 간격 리미터
//! - 지수 백오프 재시도 정책
//! - 원시 페이지 → 캔들 정규화

pub mod connector;
pub mod error;
pub mod normalize;
pub mod rate_limit;
pub mod retry;
pub mod traits;

pub use connector::{
    filter_by_status_group, instrument_map, FxOpenClient, FxOpenConfig, Instrument, OandaClient,
    OandaConfig, DEFAULT_STATUS_GROUPS,
};
pub use error::*;
pub use normalize::normalize;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use traits::*;
