//! 笔（StrokeBuilder）。
//!
//! 只使用已确认分型。以“锚点”分型为起点：
//! - 同类且更极端的分型替换锚点；若锚点正是上一笔终点，同时延伸上一笔；
//! - 异类分型满足最小间隔且价格方向有效时成笔，成为新锚点；
//! - 间隔不足的异类分型被跳过，下一分型继续与同一锚点比较。
//!
//! 数据末尾尚未成立的部分以 `provisional` 给出，不计入正式笔序列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bar::{CBar, Fractal};
use crate::constant::{Direction, FractalType};
use crate::engine::AnalysisContext;
use crate::run::Run;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub index: usize,
    pub direction: Direction,
    pub start_fractal: usize,
    /// 临时笔没有终点分型。
    pub end_fractal: Option<usize>,
    pub start_cbar: usize,
    pub end_cbar: usize,
    pub start_sbar: usize,
    pub end_sbar: usize,
    pub start_price: f64,
    pub end_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub confirmed: bool,
}

impl Stroke {
    fn between(index: usize, start_fractal: usize, start: &Fractal, end_fractal: usize, end: &Fractal) -> Self {
        let mut stroke = Self {
            index,
            direction: Direction::from_start(start.kind),
            start_fractal,
            end_fractal: None,
            start_cbar: start.cbar_index,
            end_cbar: start.cbar_index,
            start_sbar: start.sbar_index,
            end_sbar: start.sbar_index,
            start_price: start.price,
            end_price: start.price,
            high_price: start.price,
            low_price: start.price,
            start_datetime: start.datetime,
            end_datetime: start.datetime,
            confirmed: true,
        };
        stroke.set_end(end_fractal, end);
        stroke
    }

    fn set_end(&mut self, end_fractal: usize, end: &Fractal) {
        self.end_fractal = Some(end_fractal);
        self.end_cbar = end.cbar_index;
        self.end_sbar = end.sbar_index;
        self.end_price = end.price;
        self.end_datetime = end.datetime;
        self.high_price = self.start_price.max(self.end_price);
        self.low_price = self.start_price.min(self.end_price);
    }

    pub fn span(&self) -> usize {
        self.end_cbar - self.start_cbar
    }
}

impl Run for Stroke {
    fn direction(&self) -> Direction {
        self.direction
    }
    fn start_price(&self) -> f64 {
        self.start_price
    }
    fn end_price(&self) -> f64 {
        self.end_price
    }
    fn high_price(&self) -> f64 {
        self.high_price
    }
    fn low_price(&self) -> f64 {
        self.low_price
    }
    fn start_cbar(&self) -> usize {
        self.start_cbar
    }
    fn end_cbar(&self) -> usize {
        self.end_cbar
    }
    fn start_sbar(&self) -> usize {
        self.start_sbar
    }
    fn end_sbar(&self) -> usize {
        self.end_sbar
    }
    fn end_datetime(&self) -> DateTime<Utc> {
        self.end_datetime
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeOutput {
    pub strokes: Vec<Stroke>,
    pub provisional: Option<Stroke>,
}

pub struct StrokeBuilder;

impl StrokeBuilder {
    pub fn build(cbars: &[CBar], fractals: &[Fractal], ctx: &mut AnalysisContext<'_>) -> StrokeOutput {
        let min_span = ctx.config.min_stroke_span;
        let mut strokes: Vec<Stroke> = Vec::new();
        let mut anchor: Option<usize> = None;

        for (idx, fractal) in fractals.iter().enumerate() {
            if !fractal.confirmed {
                continue;
            }
            let Some(anchor_idx) = anchor else {
                anchor = Some(idx);
                continue;
            };
            let start = &fractals[anchor_idx];

            if fractal.kind == start.kind {
                if start.is_exceeded_by(fractal) {
                    anchor = Some(idx);
                    if let Some(last) = strokes.last_mut() {
                        if last.end_fractal == Some(anchor_idx) {
                            last.set_end(idx, fractal);
                        }
                    }
                }
                continue;
            }

            let span = fractal.cbar_index.saturating_sub(start.cbar_index);
            if span < min_span || !price_progresses(start, fractal) {
                continue;
            }
            strokes.push(Stroke::between(strokes.len(), anchor_idx, start, idx, fractal));
            anchor = Some(idx);
        }

        let provisional = anchor.and_then(|idx| provisional_stroke(cbars, fractals, idx, strokes.len()));
        debug!(
            strokes = strokes.len(),
            provisional = provisional.is_some(),
            "stroke building done"
        );
        StrokeOutput {
            strokes,
            provisional,
        }
    }
}

/// 向上笔终点必须高于起点，向下笔终点必须低于起点。
fn price_progresses(start: &Fractal, end: &Fractal) -> bool {
    match start.kind {
        FractalType::Bottom => end.price > start.price,
        FractalType::Top => end.price < start.price,
    }
}

/// 锚点之后反向最极端的合并 K 线作为临时终点。
fn provisional_stroke(cbars: &[CBar], fractals: &[Fractal], anchor: usize, index: usize) -> Option<Stroke> {
    let start = &fractals[anchor];
    let target = start.kind.opposite();
    let mut best: Option<&CBar> = None;
    for cbar in cbars.iter().skip(start.cbar_index + 1) {
        let better = match best {
            None => true,
            Some(prev) => match target {
                FractalType::Top => cbar.high_price > prev.high_price,
                FractalType::Bottom => cbar.low_price < prev.low_price,
            },
        };
        if better {
            best = Some(cbar);
        }
    }
    let end = best?;
    let tip = Fractal {
        kind: target,
        cbar_index: end.index,
        sbar_index: end.extreme_sbar(target),
        price: end.extreme(target),
        datetime: end.datetime,
        confirmed: false,
    };
    if !price_progresses(start, &tip) {
        return None;
    }

    let mut stroke = Stroke::between(index, anchor, start, anchor, &tip);
    stroke.end_fractal = None;
    stroke.confirmed = false;
    Some(stroke)
}
