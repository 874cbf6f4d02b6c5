//! 캔들 간격(granularity) 정의.
//!
//! 브로커마다 지원하는 간격과 와이어 코드가 다르므로, 여기서는 브로커 중립적인
//! 간격만 정의하고 코드 매핑은 각 브로커 클라이언트가 담당합니다.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    /// 1분봉
    M1,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 2시간봉
    H2,
    /// 4시간봉
    H4,
    /// 일봉
    D1,
}

impl Granularity {
    /// 작은 간격부터 정렬된 전체 목록.
    pub const ALL: [Granularity; 8] = [
        Granularity::M1,
        Granularity::M5,
        Granularity::M15,
        Granularity::M30,
        Granularity::H1,
        Granularity::H2,
        Granularity::H4,
        Granularity::D1,
    ];

    /// 캔들 하나의 길이(분).
    pub fn unit_minutes(&self) -> i64 {
        match self {
            Granularity::M1 => 1,
            Granularity::M5 => 5,
            Granularity::M15 => 15,
            Granularity::M30 => 30,
            Granularity::H1 => 60,
            Granularity::H2 => 120,
            Granularity::H4 => 240,
            Granularity::D1 => 1440,
        }
    }

    /// 캔들 하나의 길이.
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.unit_minutes())
    }

    /// 요청 한도(캔들 수)만큼의 시간 폭.
    ///
    /// 백필 윈도우 하나의 명목 폭으로 사용됩니다.
    pub fn span_of(&self, candles: u32) -> chrono::Duration {
        chrono::Duration::minutes(self.unit_minutes() * i64::from(candles))
    }

    /// 정규 표기 ("M1", ..., "D1").
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M5 => "M5",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H2 => "H2",
            Granularity::H4 => "H4",
            Granularity::D1 => "D1",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    /// "D"와 "D1"을 모두 일봉으로 받습니다 (브로커별 표기 차이).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Granularity::M1),
            "M5" => Ok(Granularity::M5),
            "M15" => Ok(Granularity::M15),
            "M30" => Ok(Granularity::M30),
            "H1" => Ok(Granularity::H1),
            "H2" => Ok(Granularity::H2),
            "H4" => Ok(Granularity::H4),
            "D" | "D1" => Ok(Granularity::D1),
            _ => Err(CoreError::InvalidGranularity(s.to_string())),
        }
    }
}
