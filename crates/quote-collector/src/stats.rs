//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::modules::collect::PairStatus;

/// 배치 수집 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 처리한 (심볼, 간격) 쌍 수
    pub total: usize,
    /// 저장 성공
    pub saved: usize,
    /// 데이터 없음 (기존 파일 유지)
    pub no_data: usize,
    /// 저장 실패
    pub persist_failed: usize,
    /// 요청 전에 거부된 쌍 (지원하지 않는 간격 등)
    pub rejected: usize,
    /// 저장된 총 캔들 수
    pub total_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 쌍 하나의 결과 반영
    pub fn record(&mut self, status: &PairStatus) {
        self.total += 1;
        match status {
            PairStatus::Saved { rows, .. } => {
                self.saved += 1;
                self.total_rows += rows;
            }
            PairStatus::NoData => self.no_data += 1,
            PairStatus::PersistFailed { .. } => self.persist_failed += 1,
            PairStatus::Rejected { .. } => self.rejected += 1,
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.saved as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            saved = self.saved,
            no_data = self.no_data,
            persist_failed = self.persist_failed,
            rejected = self.rejected,
            total_rows = self.total_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
