//! 브로커 요청 에러 타입.

use quote_core::Granularity;
use thiserror::Error;

/// 단일 브로커 요청 실패.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 연결/전송 계층 에러
    #[error("Transport error: {0}")]
    Transport(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 응답 본문을 해석할 수 없음
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// 요청은 성공했지만 캔들이 없음
    #[error("Empty page: {0}")]
    EmptyPage(String),

    /// 브로커가 지원하지 않는 간격
    #[error("Unsupported granularity: {0}")]
    UnsupportedGranularity(Granularity),

    /// 자격증명/클라이언트 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 전송 에러, 타임아웃, 408/429/5xx 상태만 재시도합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// 빈 페이지인지 확인.
    pub fn is_empty_page(&self) -> bool {
        matches!(self, FetchError::EmptyPage(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// 브로커 요청 결과 타입.
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(FetchError::Timeout("30s".into()).is_retryable());
        assert!(status(408).is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());

        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!FetchError::Malformed("eof".into()).is_retryable());
        assert!(!FetchError::EmptyPage("EURUSD".into()).is_retryable());
        assert!(!FetchError::UnsupportedGranularity(Granularity::H2).is_retryable());
    }

    #[test]
    fn test_from_serde_error() {
        let err: FetchError = serde_json::from_str::<Vec<i32>>("{").unwrap_err().into();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
