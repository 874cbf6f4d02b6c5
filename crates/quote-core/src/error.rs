//! 코어 타입 파싱 에러.
//!
//! 이 모듈은 캔들/타임프레임/가격 세트 값을 해석할 때 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 코어 타입 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 지원하지 않는 캔들 간격
    #[error("잘못된 타임프레임: {0}")]
    InvalidGranularity(String),

    /// 알 수 없는 가격 세트 (bid/ask/mid 외)
    #[error("잘못된 가격 세트: {0}")]
    InvalidPriceSet(String),

    /// 해석할 수 없는 날짜/시간 문자열
    #[error("잘못된 날짜 형식: {0}")]
    InvalidDate(String),

    /// 시작 시각이 종료 시각 이후인 범위
    #[error("잘못된 기간: {start} ~ {end}")]
    InvalidRange { start: String, end: String },
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
