//! 离线回放工具：CSV 载入为 `BarSeries`，结构文档落地为 JSON / parquet。

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chanlun::frame;
use chanlun::{BarSeries, DataError, MarketBarInput, StructureDocument, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::{DataFrame, ParquetWriter};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    datetime: String,
    #[serde(alias = "open")]
    open_price: f64,
    #[serde(alias = "high")]
    high_price: f64,
    #[serde(alias = "low")]
    low_price: f64,
    #[serde(alias = "close")]
    close_price: f64,
    #[serde(default)]
    volume: f64,
}

pub fn load_market_bar_inputs(
    file_path: impl AsRef<Path>,
    max_rows: Option<usize>,
) -> Result<Vec<MarketBarInput>, DataError> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut out = Vec::new();

    for row in reader
        .deserialize::<CsvBarRow>()
        .take(max_rows.unwrap_or(usize::MAX))
    {
        let row = row?;
        let datetime = parse_datetime(&row.datetime)?;
        out.push(MarketBarInput {
            datetime,
            open_price: row.open_price,
            high_price: row.high_price,
            low_price: row.low_price,
            close_price: row.close_price,
            volume: row.volume,
        });
    }

    Ok(out)
}

/// 载入 CSV；`as_of` 取最后一根 bar 的时间，保证同一文件总得到同一输入。
pub fn load_bar_series(
    file_path: impl AsRef<Path>,
    symbol: &str,
    timeframe: Timeframe,
    max_rows: Option<usize>,
) -> Result<BarSeries, DataError> {
    let inputs = load_market_bar_inputs(file_path, max_rows)?;
    let as_of = inputs
        .last()
        .map(|x| x.datetime)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Ok(BarSeries::new(symbol, timeframe, as_of, inputs))
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, DataError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let patterns = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y%m%d%H%M%S%.f",
    ];

    for pattern in patterns {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }

    Err(DataError::InvalidDatetime(value.to_string()))
}

pub fn write_json(doc: &StructureDocument, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, doc.to_json_pretty()?)?;
    Ok(())
}

/// 将各表格视图写成 `<kind>_<timeframe>.parquet`，返回写出的文件路径。
pub fn write_parquet_snapshot(
    doc: &StructureDocument,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, DataError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    let tf = doc.meta.timeframe.as_str();

    let tables: [(&str, DataFrame); 5] = [
        ("cbar", frame::merged_bars_frame(doc)?),
        ("stroke", frame::strokes_frame(doc)?),
        ("segment", frame::segments_frame(doc)?),
        ("pivot", frame::pivots_frame(doc)?),
        ("point", frame::points_frame(doc)?),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, mut df) in tables {
        let path = output_dir.join(format!("{name}_{tf}.parquet"));
        let mut file = File::create(&path)?;
        ParquetWriter::new(&mut file).finish(&mut df)?;
        written.push(path);
    }
    info!(dir = %output_dir.display(), files = written.len(), "parquet snapshot written");
    Ok(written)
}
