//! 배치 수집 계획.
//!
//! TOML 파일과 `QUOTES__` 접두사 환경 변수에서 읽습니다.
//!
//! ```toml
//! symbols = ["EURUSD", "GBPUSD"]
//! granularities = ["D1", "H1"]
//! date_start = "2019-01-01T00:00:00"
//! date_end = "2025-09-10T00:00:00"
//! status_groups = ["Forex", "Crypto"]
//! able_pct = 0.6
//! ```

use chrono::{DateTime, Utc};
use quote_broker::DEFAULT_STATUS_GROUPS;
use quote_core::{parse_datetime, CoreError, Granularity};
use quote_data::DEFAULT_ABLE_PCT;
use serde::Deserialize;
use std::path::Path;

use crate::{CollectorError, Result};

/// 배치 수집 계획.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchPlan {
    /// 수집할 심볼
    #[serde(default)]
    pub symbols: Vec<String>,
    /// 수집할 간격 (예: "D1", "H1")
    #[serde(default)]
    pub granularities: Vec<String>,
    /// 시작 시각
    #[serde(default)]
    pub date_start: Option<String>,
    /// 종료 시각
    #[serde(default)]
    pub date_end: Option<String>,
    /// FxOpen 종목 필터용 상태 그룹
    #[serde(default = "default_status_groups")]
    pub status_groups: Vec<String>,
    /// 완결성 평가 기준 비율
    #[serde(default = "default_able_pct")]
    pub able_pct: f64,
}

fn default_status_groups() -> Vec<String> {
    DEFAULT_STATUS_GROUPS.iter().map(|g| g.to_string()).collect()
}

fn default_able_pct() -> f64 {
    DEFAULT_ABLE_PCT
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            granularities: Vec::new(),
            date_start: None,
            date_end: None,
            status_groups: default_status_groups(),
            able_pct: DEFAULT_ABLE_PCT,
        }
    }
}

impl BatchPlan {
    /// 파일과 환경 변수에서 계획을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드 (목록은 쉼표 구분)
            .add_source(
                config::Environment::with_prefix("QUOTES")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("symbols")
                    .with_list_parse_key("granularities")
                    .with_list_parse_key("status_groups"),
            );

        let plan: Self = builder.build()?.try_deserialize()?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if !(self.able_pct > 0.0 && self.able_pct <= 1.0) {
            return Err(CollectorError::Config(format!(
                "able_pct는 (0, 1] 범위여야 합니다: {}",
                self.able_pct
            )));
        }
        Ok(())
    }

    /// 간격 문자열 해석 (중복 제거, 입력 순서 유지).
    pub fn parsed_granularities(&self) -> std::result::Result<Vec<Granularity>, CoreError> {
        let mut parsed = Vec::with_capacity(self.granularities.len());
        for raw in &self.granularities {
            let granularity: Granularity = raw.parse()?;
            if !parsed.contains(&granularity) {
                parsed.push(granularity);
            }
        }
        Ok(parsed)
    }

    /// 수집 기간 (UTC).
    pub fn date_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self
            .date_start
            .as_deref()
            .ok_or_else(|| CollectorError::Config("date_start가 없습니다".to_string()))?;
        let end = self
            .date_end
            .as_deref()
            .ok_or_else(|| CollectorError::Config("date_end가 없습니다".to_string()))?;

        let (start, end) = (parse_datetime(start)?, parse_datetime(end)?);
        if start >= end {
            return Err(CoreError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            }
            .into());
        }
        Ok((start, end))
    }
}
