//! 환경변수 기반 설정 모듈.

use crate::{CollectorError, Result};
use quote_broker::connector::{FXOPEN_GRANULARITIES, OANDA_GRANULARITIES};
use quote_broker::{
    FxOpenClient, FxOpenConfig, GranularitySpec, OandaClient, OandaConfig, QuoteClient,
};
use quote_core::Granularity;
use quote_data::{BackfillConfig, CandleStore};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// 수집 대상 브로커.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Broker {
    /// FxOpen (bid/ask 페이지, 앵커 요청)
    #[value(name = "fxopen")]
    FxOpen,
    /// Oanda (mid/bid/ask 캔들, 구간 요청)
    Oanda,
}

impl Broker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FxOpen => "fxopen",
            Self::Oanda => "oanda",
        }
    }

    /// 브로커 간격 표 (네트워크 없이 저장 코드 조회용).
    pub fn granularity_table(&self) -> &'static [GranularitySpec] {
        match self {
            Self::FxOpen => &FXOPEN_GRANULARITIES,
            Self::Oanda => &OANDA_GRANULARITIES,
        }
    }

    /// 간격의 저장/요청 코드.
    pub fn granularity_code(&self, granularity: Granularity) -> Option<&'static str> {
        self.granularity_table()
            .iter()
            .find(|spec| spec.granularity == granularity)
            .map(|spec| spec.code)
    }
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Broker {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fxopen" | "fx" => Ok(Self::FxOpen),
            "oanda" => Ok(Self::Oanda),
            _ => Err(CollectorError::Config(format!("알 수 없는 브로커: {}", s))),
        }
    }
}

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 캔들 테이블 저장 디렉터리
    pub quotes_dir: PathBuf,
    /// 윈도우 사이 대기 (밀리초)
    pub backfill_pause_ms: u64,
    /// FxOpen 요청 간 최소 간격 (밀리초)
    pub fx_throttle_ms: u64,
    /// Oanda 요청 간 최소 간격 (밀리초)
    pub oanda_throttle_ms: u64,
    /// HTTP 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// 동시에 처리할 (심볼, 간격) 쌍 수
    pub max_concurrent_pairs: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            quotes_dir: PathBuf::from("hist_quotes"),
            backfill_pause_ms: 250,
            fx_throttle_ms: 250,
            oanda_throttle_ms: 0,
            http_timeout_secs: 30,
            max_concurrent_pairs: 1,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            quotes_dir: std::env::var("QUOTES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.quotes_dir),
            backfill_pause_ms: env_var_parse("BACKFILL_PAUSE_MS", defaults.backfill_pause_ms),
            fx_throttle_ms: env_var_parse("FX_THROTTLE_MS", defaults.fx_throttle_ms),
            oanda_throttle_ms: env_var_parse("OANDA_THROTTLE_MS", defaults.oanda_throttle_ms),
            http_timeout_secs: env_var_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            max_concurrent_pairs: env_var_parse(
                "MAX_CONCURRENT_PAIRS",
                defaults.max_concurrent_pairs,
            )
            .max(1),
        }
    }

    /// 참조 JSON 저장 디렉터리 (`{quotes_dir}/refs`)
    pub fn refs_dir(&self) -> PathBuf {
        self.quotes_dir.join("refs")
    }

    pub fn store(&self) -> CandleStore {
        CandleStore::new(&self.quotes_dir)
    }

    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            pause: Duration::from_millis(self.backfill_pause_ms),
        }
    }

    /// 환경 변수 자격증명으로 FxOpen 클라이언트 생성
    pub fn fxopen_client(&self) -> Result<FxOpenClient> {
        let config = FxOpenConfig::from_env()?
            .with_timeout(self.http_timeout_secs)
            .with_throttle(Duration::from_millis(self.fx_throttle_ms));
        Ok(FxOpenClient::new(config)?)
    }

    /// 환경 변수 자격증명으로 Oanda 클라이언트 생성
    pub fn oanda_client(&self) -> Result<OandaClient> {
        let config = OandaConfig::from_env()?
            .with_timeout(self.http_timeout_secs)
            .with_throttle(Duration::from_millis(self.oanda_throttle_ms));
        Ok(OandaClient::new(config)?)
    }

    pub fn quote_client(&self, broker: Broker) -> Result<Arc<dyn QuoteClient>> {
        Ok(match broker {
            Broker::FxOpen => Arc::new(self.fxopen_client()?),
            Broker::Oanda => Arc::new(self.oanda_client()?),
        })
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
