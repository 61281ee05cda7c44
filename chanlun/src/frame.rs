//! 结构文档的表格视图（polars `DataFrame`）。

use polars::df;
use polars::prelude::DataFrame;

use crate::constant::{DataError, Direction};
use crate::export::StructureDocument;

fn direction_sign(direction: Direction) -> i64 {
    match direction {
        Direction::Up => 1,
        Direction::Down => -1,
    }
}

pub fn merged_bars_frame(doc: &StructureDocument) -> Result<DataFrame, DataError> {
    let rows = &doc.merged_bars;
    let index: Vec<u64> = rows.iter().map(|x| x.index as u64).collect();
    let sbar_start: Vec<u64> = rows.iter().map(|x| x.sbar_start as u64).collect();
    let sbar_end: Vec<u64> = rows.iter().map(|x| x.sbar_end as u64).collect();
    let high_price: Vec<f64> = rows.iter().map(|x| x.high_price).collect();
    let low_price: Vec<f64> = rows.iter().map(|x| x.low_price).collect();
    let datetime: Vec<i64> = rows.iter().map(|x| x.datetime.timestamp_millis()).collect();

    Ok(df!(
        "index" => index,
        "sbar_start" => sbar_start,
        "sbar_end" => sbar_end,
        "high_price" => high_price,
        "low_price" => low_price,
        "datetime" => datetime
    )?)
}

pub fn strokes_frame(doc: &StructureDocument) -> Result<DataFrame, DataError> {
    let rows = &doc.strokes;
    let index: Vec<u64> = rows.iter().map(|x| x.index as u64).collect();
    let direction: Vec<i64> = rows.iter().map(|x| direction_sign(x.direction)).collect();
    let start_cbar: Vec<u64> = rows.iter().map(|x| x.start_cbar as u64).collect();
    let end_cbar: Vec<u64> = rows.iter().map(|x| x.end_cbar as u64).collect();
    let start_price: Vec<f64> = rows.iter().map(|x| x.start_price).collect();
    let end_price: Vec<f64> = rows.iter().map(|x| x.end_price).collect();
    let start_datetime: Vec<i64> = rows
        .iter()
        .map(|x| x.start_datetime.timestamp_millis())
        .collect();
    let end_datetime: Vec<i64> = rows
        .iter()
        .map(|x| x.end_datetime.timestamp_millis())
        .collect();

    Ok(df!(
        "index" => index,
        "direction" => direction,
        "start_cbar" => start_cbar,
        "end_cbar" => end_cbar,
        "start_price" => start_price,
        "end_price" => end_price,
        "start_datetime" => start_datetime,
        "end_datetime" => end_datetime
    )?)
}

pub fn segments_frame(doc: &StructureDocument) -> Result<DataFrame, DataError> {
    let rows = &doc.segments;
    let index: Vec<u64> = rows.iter().map(|x| x.index as u64).collect();
    let direction: Vec<i64> = rows.iter().map(|x| direction_sign(x.direction)).collect();
    let stroke_count: Vec<u64> = rows.iter().map(|x| x.stroke_count() as u64).collect();
    let start_cbar: Vec<u64> = rows.iter().map(|x| x.start_cbar as u64).collect();
    let end_cbar: Vec<u64> = rows.iter().map(|x| x.end_cbar as u64).collect();
    let high_price: Vec<f64> = rows.iter().map(|x| x.high_price).collect();
    let low_price: Vec<f64> = rows.iter().map(|x| x.low_price).collect();
    let sealed: Vec<bool> = rows.iter().map(|x| x.is_sealed()).collect();

    Ok(df!(
        "index" => index,
        "direction" => direction,
        "stroke_count" => stroke_count,
        "start_cbar" => start_cbar,
        "end_cbar" => end_cbar,
        "high_price" => high_price,
        "low_price" => low_price,
        "sealed" => sealed
    )?)
}

pub fn pivots_frame(doc: &StructureDocument) -> Result<DataFrame, DataError> {
    let rows = &doc.pivots;
    let level: Vec<String> = rows.iter().map(|x| x.level.as_str().to_string()).collect();
    let index: Vec<u64> = rows.iter().map(|x| x.index as u64).collect();
    let zg: Vec<f64> = rows.iter().map(|x| x.zg).collect();
    let zd: Vec<f64> = rows.iter().map(|x| x.zd).collect();
    let gg: Vec<f64> = rows.iter().map(|x| x.gg).collect();
    let dd: Vec<f64> = rows.iter().map(|x| x.dd).collect();
    let run_count: Vec<u64> = rows.iter().map(|x| x.runs.len() as u64).collect();
    let open: Vec<bool> = rows.iter().map(|x| x.is_open()).collect();
    let start_cbar: Vec<u64> = rows.iter().map(|x| x.start_cbar as u64).collect();
    let end_cbar: Vec<u64> = rows.iter().map(|x| x.end_cbar as u64).collect();

    Ok(df!(
        "level" => level,
        "index" => index,
        "zg" => zg,
        "zd" => zd,
        "gg" => gg,
        "dd" => dd,
        "run_count" => run_count,
        "open" => open,
        "start_cbar" => start_cbar,
        "end_cbar" => end_cbar
    )?)
}

pub fn points_frame(doc: &StructureDocument) -> Result<DataFrame, DataError> {
    let rows = &doc.buy_sell_points;
    let kind: Vec<String> = rows.iter().map(|x| x.kind.as_str().to_string()).collect();
    let level: Vec<String> = rows.iter().map(|x| x.level.as_str().to_string()).collect();
    let run_index: Vec<u64> = rows.iter().map(|x| x.run_index as u64).collect();
    let cbar_index: Vec<u64> = rows.iter().map(|x| x.cbar_index as u64).collect();
    let price: Vec<f64> = rows.iter().map(|x| x.price).collect();
    let datetime: Vec<i64> = rows.iter().map(|x| x.datetime.timestamp_millis()).collect();

    Ok(df!(
        "kind" => kind,
        "level" => level,
        "run_index" => run_index,
        "cbar_index" => cbar_index,
        "price" => price,
        "datetime" => datetime
    )?)
}
