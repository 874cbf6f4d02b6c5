//! Oanda 클라이언트 설정.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

use crate::connector::{required_env, secret};
use crate::error::FetchResult;

/// Oanda 클라이언트 설정.
pub struct OandaConfig {
    /// REST 기본 URL (`OANDA_URL`, 예: `https://api-fxpractice.oanda.com/v3`)
    pub base_url: String,
    /// API 토큰
    pub api_key: SecretString,
    /// 계좌 ID (종목 목록 조회용)
    pub account_id: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 요청 간 최소 간격 (기본 0)
    pub throttle: Duration,
    /// 윈도우당 시도 횟수
    pub window_attempts: u32,
}

impl fmt::Debug for OandaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OandaConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***REDACTED***")
            .field("account_id", &self.account_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("throttle", &self.throttle)
            .field("window_attempts", &self.window_attempts)
            .finish()
    }
}

impl OandaConfig {
    /// 새 설정 생성.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: secret(api_key.into()),
            account_id: account_id.into(),
            timeout_secs: 30,
            throttle: Duration::ZERO,
            window_attempts: 3,
        }
    }

    /// 환경 변수(`OANDA_URL`, `OANDA_API_KEY`, `OANDA_ACCOUNT_ID`)에서 생성.
    pub fn from_env() -> FetchResult<Self> {
        Ok(Self::new(
            required_env("OANDA_URL")?,
            required_env("OANDA_API_KEY")?,
            required_env("OANDA_ACCOUNT_ID")?,
        ))
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }
}
