//! CSV 캔들 테이블 저장소.
//!
//! (심볼, 간격 코드)마다 파일 하나: `{root}/{symbol}_{code}.csv`
//!
//! 컬럼: `time`, (있으면) `volume`, 이어서 존재하는 가격 세트별 `{set}_o/h/l/c`
//! (bid, ask, mid 순서).
//!
//! 저장은 `{file}.tmp`에 쓰고 동기화한 뒤 기존 파일 위로 rename합니다.

use chrono::{DateTime, Utc};
use quote_core::{format_rfc3339, Candle, CandleTable, Ohlc, PriceSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

const OHLC_SUFFIXES: [&str; 4] = ["o", "h", "l", "c"];

/// 로컬 캔들 테이블 저장소.
#[derive(Debug, Clone)]
pub struct CandleStore {
    root: PathBuf,
}

impl CandleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 테이블 파일 경로. 심볼의 경로 구분자는 `_`로 바꿉니다.
    pub fn path_for(&self, symbol: &str, granularity_code: &str) -> PathBuf {
        let safe_symbol: String = symbol
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root
            .join(format!("{}_{}.csv", safe_symbol, granularity_code))
    }

    /// 테이블 저장 (기존 파일 교체).
    pub fn save(
        &self,
        table: &CandleTable,
        symbol: &str,
        granularity_code: &str,
    ) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(symbol, granularity_code);
        let tmp = tmp_path(&path);

        if let Err(e) = write_table(&tmp, table) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &path)?;

        info!(
            symbol = symbol,
            granularity = granularity_code,
            rows = table.len(),
            path = %path.display(),
            "테이블 저장 완료"
        );
        Ok(path)
    }

    /// 테이블 로드. 파일이 없으면 `None`.
    pub fn load(&self, symbol: &str, granularity_code: &str) -> StoreResult<Option<CandleTable>> {
        let path = self.path_for(symbol, granularity_code);
        if !path.exists() {
            debug!(path = %path.display(), "저장된 테이블 없음");
            return Ok(None);
        }
        read_table(&path).map(Some)
    }

    /// 저장된 행 수. 파일이 없으면 `None`.
    pub fn count_rows(&self, symbol: &str, granularity_code: &str) -> StoreResult<Option<usize>> {
        let path = self.path_for(symbol, granularity_code);
        if !path.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(Some(count))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn header(sets: &[PriceSet], with_volume: bool) -> Vec<String> {
    let mut columns = vec!["time".to_string()];
    if with_volume {
        columns.push("volume".to_string());
    }
    for set in sets {
        for suffix in OHLC_SUFFIXES {
            columns.push(format!("{}_{}", set.prefix(), suffix));
        }
    }
    columns
}

fn write_table(path: &Path, table: &CandleTable) -> StoreResult<()> {
    let sets = table.price_sets();
    let with_volume = table.has_volume();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header(&sets, with_volume))?;

    for candle in table.rows() {
        let mut record = Vec::with_capacity(2 + sets.len() * 4);
        record.push(format_rfc3339(&candle.time));
        if with_volume {
            record.push(candle.volume.map(|v| v.to_string()).unwrap_or_default());
        }
        for set in &sets {
            match candle.price(*set) {
                Some(ohlc) => record.extend(ohlc.to_array().iter().map(|v| v.to_string())),
                None => record.extend(std::iter::repeat(String::new()).take(4)),
            }
        }
        writer.write_record(&record)?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

/// 헤더에서 찾은 컬럼 위치.
struct Layout {
    volume: Option<usize>,
    sets: Vec<(PriceSet, [usize; 4])>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> StoreResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        if find("time") != Some(0) {
            return Err(StoreError::Parse("first column must be `time`".to_string()));
        }

        let mut sets = Vec::new();
        for set in PriceSet::ALL {
            let cols: Vec<Option<usize>> = OHLC_SUFFIXES
                .iter()
                .map(|s| find(format!("{}_{}", set.prefix(), s).as_str()))
                .collect();
            match cols.as_slice() {
                [Some(o), Some(h), Some(l), Some(c)] => sets.push((set, [*o, *h, *l, *c])),
                [None, None, None, None] => {}
                _ => {
                    return Err(StoreError::Parse(format!(
                        "incomplete `{}` columns",
                        set.prefix()
                    )))
                }
            }
        }

        Ok(Self {
            volume: find("volume"),
            sets,
        })
    }
}

fn read_table(path: &Path) -> StoreResult<CandleTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let layout = Layout::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let time = DateTime::parse_from_rfc3339(field(0))
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::Parse(format!("row {}: time: {}", line + 1, e)))?;
        let mut candle = Candle::new(time);

        if let Some(i) = layout.volume {
            let raw = field(i);
            if !raw.is_empty() {
                candle.volume = Some(raw.parse::<i64>().map_err(|e| {
                    StoreError::Parse(format!("row {}: volume: {}", line + 1, e))
                })?);
            }
        }

        for (set, cols) in &layout.sets {
            if field(cols[0]).is_empty() {
                continue;
            }
            let mut values = [0.0f64; 4];
            for (value, col) in values.iter_mut().zip(cols) {
                *value = field(*col).parse::<f64>().map_err(|e| {
                    StoreError::Parse(format!("row {}: {}: {}", line + 1, set.prefix(), e))
                })?;
            }
            candle.set_price(*set, Ohlc::new(values[0], values[1], values[2], values[3]));
        }

        rows.push(candle);
    }

    Ok(CandleTable::new(rows))
}
