//! FxOpen 클라이언트 설정.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

use crate::connector::{required_env, secret};
use crate::error::FetchResult;
use crate::retry::RetryPolicy;

/// 요청 간 최소 간격 기본값.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(250);

/// FxOpen 클라이언트 설정.
///
/// # 보안
/// - `api_key`, `api_secret`은 `SecretString`으로 보관하며 `Debug` 출력에서 마스킹됩니다.
pub struct FxOpenConfig {
    /// REST 기본 URL (`FX_URL`)
    pub base_url: String,
    /// 로그인 ID (`FX_LOGIN`, 선택)
    pub login: Option<String>,
    /// API ID
    pub api_id: String,
    /// API 키
    pub api_key: SecretString,
    /// API 시크릿
    pub api_secret: SecretString,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 요청 간 최소 간격
    pub throttle: Duration,
    /// 요청 단위 재시도 정책
    pub retry: RetryPolicy,
}

impl fmt::Debug for FxOpenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.api_id.chars().collect();
        let masked_id = if chars.len() > 8 {
            let head: String = chars.iter().take(4).collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else {
            "***REDACTED***".to_string()
        };

        f.debug_struct("FxOpenConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("api_id", &masked_id)
            .field("api_key", &"***REDACTED***")
            .field("api_secret", &"***REDACTED***")
            .field("timeout_secs", &self.timeout_secs)
            .field("throttle", &self.throttle)
            .field("retry", &self.retry)
            .finish()
    }
}

impl FxOpenConfig {
    /// 새 설정 생성.
    pub fn new(
        base_url: impl Into<String>,
        api_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            login: None,
            api_id: api_id.into(),
            api_key: secret(api_key.into()),
            api_secret: secret(api_secret.into()),
            timeout_secs: 30,
            throttle: DEFAULT_THROTTLE,
            retry: RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(10)),
        }
    }

    /// 환경 변수에서 생성.
    ///
    /// `FX_URL`, `FX_API_ID`, `FX_API_KEY`, `FX_API_SECRET`은 필수, `FX_LOGIN`은 선택입니다.
    pub fn from_env() -> FetchResult<Self> {
        let mut config = Self::new(
            required_env("FX_URL")?,
            required_env("FX_API_ID")?,
            required_env("FX_API_KEY")?,
            required_env("FX_API_SECRET")?,
        );
        config.login = std::env::var("FX_LOGIN").ok();
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `Authorization` 헤더 값.
    pub(crate) fn authorization(&self) -> String {
        format!(
            "Basic {}:{}:{}",
            self.api_id,
            self.api_key.expose_secret(),
            self.api_secret.expose_secret()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_secrets() {
        let config = FxOpenConfig::new(
            "https://marginalttlivewebapi.fxopen.net/api/v2",
            "0123456789abcdef",
            "super-secret-key",
            "super-secret-secret",
        );

        let debug = format!("{:?}", config);
        assert!(debug.contains("0123...cdef"));
        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains("super-secret-secret"));
    }

    #[test]
    fn test_debug_masks_by_char_not_byte() {
        let config = FxOpenConfig::new("http://localhost", "키값-0123-가나다라", "k", "s");
        let debug = format!("{:?}", config);
        assert!(debug.contains("키값-0...가나다라"));

        let short = FxOpenConfig::new("http://localhost", "아이디", "k", "s");
        let debug = format!("{:?}", short);
        assert!(debug.contains("***REDACTED***"));
        assert!(!debug.contains("아이디"));
    }

    #[test]
    fn test_authorization_header() {
        let config = FxOpenConfig::new("http://localhost", "id", "key", "secret");
        assert_eq!(config.authorization(), "Basic id:key:secret");
    }

    #[test]
    fn test_defaults() {
        let config = FxOpenConfig::new("http://localhost", "id", "key", "secret");
        assert_eq!(config.throttle, Duration::from_millis(250));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.timeout_secs, 30);
    }
}
