//! 结构文档（StructureExporter 的输出）及派生查询。
//!
//! 文档中的所有交叉引用都是整数下标：分型、笔、线段指向合并 K 线序列，
//! 中枢指向其级别的走势序列，买卖点同时给出走势、合并 K 线与原始 bar 下标。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::Anomaly;
use crate::bar::{CBar, Fractal};
use crate::constant::{DataError, Direction, Level, Timeframe};
use crate::divergence::DivergenceSignal;
use crate::pivot::Pivot;
use crate::segment::Segment;
use crate::signal::BuySellPoint;
use crate::stroke::Stroke;
use crate::utils::unique_sorted;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub as_of: DateTime<Utc>,
    pub bar_count: usize,
    pub merged_bar_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDocument {
    pub meta: DocumentMeta,
    pub merged_bars: Vec<CBar>,
    pub fractals: Vec<Fractal>,
    pub strokes: Vec<Stroke>,
    pub provisional_stroke: Option<Stroke>,
    pub segments: Vec<Segment>,
    pub unattached_strokes: Vec<usize>,
    pub pivots: Vec<Pivot>,
    pub divergence_signals: Vec<DivergenceSignal>,
    pub buy_sell_points: Vec<BuySellPoint>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotPosition {
    Inside,
    Above,
    Below,
    NoOpenPivot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPivotBrief {
    pub level: Level,
    pub index: usize,
    pub zg: f64,
    pub zd: f64,
    pub run_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub merged_bar_count: usize,
    pub fractal_count: usize,
    pub stroke_count: usize,
    pub segment_count: usize,
    pub pivot_count: usize,
    pub latest_stroke_direction: Option<Direction>,
    pub latest_price: f64,
    pub stroke_pivot_position: PivotPosition,
    pub segment_pivot_position: PivotPosition,
    pub open_pivots: Vec<OpenPivotBrief>,
    pub signals: Vec<String>,
    pub divergences: Vec<String>,
    pub anomaly_count: usize,
}

impl StructureDocument {
    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn pivots_at(&self, level: Level) -> impl Iterator<Item = &Pivot> {
        self.pivots.iter().filter(move |x| x.level == level)
    }

    pub fn open_pivot(&self, level: Level) -> Option<&Pivot> {
        self.pivots_at(level).filter(|x| x.is_open()).last()
    }

    /// 当前价格相对该级别未结束中枢的位置，边界算作中枢内。
    pub fn pivot_position(&self, level: Level, price: f64) -> PivotPosition {
        let Some(pivot) = self.open_pivot(level) else {
            return PivotPosition::NoOpenPivot;
        };
        if pivot.contains(price) {
            PivotPosition::Inside
        } else if price > pivot.zg {
            PivotPosition::Above
        } else {
            PivotPosition::Below
        }
    }

    pub fn summary(&self, latest_price: f64) -> StructureSummary {
        let open_pivots = [Level::Stroke, Level::Segment]
            .into_iter()
            .filter_map(|level| self.open_pivot(level))
            .map(|x| OpenPivotBrief {
                level: x.level,
                index: x.index,
                zg: x.zg,
                zd: x.zd,
                run_count: x.runs.len(),
            })
            .collect();

        let signals = unique_sorted(
            self.buy_sell_points
                .iter()
                .map(|x| format!("{}:{}", x.level.as_str(), x.kind.as_str())),
        );
        let divergences = unique_sorted(
            self.divergence_signals
                .iter()
                .filter(|x| x.flagged)
                .map(|x| format!("{}:{}", x.level.as_str(), x.direction.as_str())),
        );

        StructureSummary {
            symbol: self.meta.symbol.clone(),
            timeframe: self.meta.timeframe,
            bar_count: self.meta.bar_count,
            merged_bar_count: self.meta.merged_bar_count,
            fractal_count: self.fractals.len(),
            stroke_count: self.strokes.len(),
            segment_count: self.segments.len(),
            pivot_count: self.pivots.len(),
            latest_stroke_direction: self
                .provisional_stroke
                .as_ref()
                .or(self.strokes.last())
                .map(|x| x.direction),
            latest_price,
            stroke_pivot_position: self.pivot_position(Level::Stroke, latest_price),
            segment_pivot_position: self.pivot_position(Level::Segment, latest_price),
            open_pivots,
            signals,
            divergences,
            anomaly_count: self.anomalies.len(),
        }
    }
}
