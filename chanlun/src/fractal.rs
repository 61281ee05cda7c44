//! 分型识别（FractalDetector）。
//!
//! 在合并 K 线序列上以三根窗口扫描局部极值：
//! - 中间 bar 的高点严格高于左右两根 -> 顶分型候选；
//! - 中间 bar 的低点严格低于左右两根 -> 底分型候选；
//! - 之后 `fractal_confirm_bars` 根合并 K 线均未再创新极值才算确认；
//!   窗口内被超越的候选直接丢弃，只有序列末尾来不及确认的候选以未确认状态保留；
//! - 相邻的同类分型只保留更极端的一个，保证输出顶底交替。

use tracing::debug;

use crate::anomaly::{Anomaly, AnomalyKind, StructureError};
use crate::bar::{CBar, Fractal, bottom_excursion, top_excursion};
use crate::constant::{Const, FractalType};
use crate::engine::AnalysisContext;

pub struct FractalDetector;

impl FractalDetector {
    pub fn detect(
        cbars: &[CBar],
        ctx: &mut AnalysisContext<'_>,
    ) -> Result<Vec<Fractal>, StructureError> {
        if cbars.len() < Const::FRACTAL_WINDOW {
            return Err(StructureError::InsufficientData {
                stage: "fractal",
                required: Const::FRACTAL_WINDOW,
                available: cbars.len(),
            });
        }

        let confirm_bars = ctx.config.fractal_confirm_bars;
        let mut rows: Vec<Fractal> = Vec::new();
        for middle in 1..cbars.len() - 1 {
            let left = &cbars[middle - 1];
            let right = &cbars[middle + 1];
            let center = &cbars[middle];

            let kind = match (
                top_excursion(left, center, right),
                bottom_excursion(left, center, right),
            ) {
                (Some(top), Some(bottom)) => {
                    let kind = resolve_ambiguous(top, bottom, rows.last().map(|x| x.kind));
                    ctx.record(
                        Anomaly::new(
                            AnomalyKind::AmbiguousFractal,
                            format!(
                                "merged bar is both top ({top}) and bottom ({bottom}), kept {}",
                                kind.as_str()
                            ),
                        )
                        .at(middle),
                    );
                    kind
                }
                (Some(_), None) => FractalType::Top,
                (None, Some(_)) => FractalType::Bottom,
                (None, None) => continue,
            };

            let confirmed = is_confirmed(cbars, middle, kind, confirm_bars);
            if !confirmed && middle + confirm_bars < cbars.len() {
                // 确认窗口内已被新极值超越，由之后更极端的候选接替
                debug!(cbar = middle, kind = kind.as_str(), "fractal exceeded before confirmation");
                continue;
            }

            let fractal = Fractal {
                kind,
                cbar_index: middle,
                sbar_index: center.extreme_sbar(kind),
                price: center.extreme(kind),
                datetime: center.datetime,
                confirmed,
            };
            push_collapsed(&mut rows, fractal);
        }

        debug!(
            fractals = rows.len(),
            confirmed = rows.iter().filter(|x| x.confirmed).count(),
            "fractal detection done"
        );
        Ok(rows)
    }
}

fn resolve_ambiguous(top: f64, bottom: f64, previous: Option<FractalType>) -> FractalType {
    if top > bottom {
        FractalType::Top
    } else if bottom > top {
        FractalType::Bottom
    } else {
        previous.map(FractalType::opposite).unwrap_or(FractalType::Top)
    }
}

fn is_confirmed(cbars: &[CBar], middle: usize, kind: FractalType, confirm_bars: usize) -> bool {
    if middle + confirm_bars >= cbars.len() {
        return false;
    }
    let price = cbars[middle].extreme(kind);
    cbars[middle + 1..=middle + confirm_bars]
        .iter()
        .all(|x| match kind {
            FractalType::Top => x.high_price <= price,
            FractalType::Bottom => x.low_price >= price,
        })
}

/// 同类分型相邻时保留更极端的一个，相等保留较早者。
fn push_collapsed(rows: &mut Vec<Fractal>, fractal: Fractal) {
    match rows.last_mut() {
        Some(last) if last.kind == fractal.kind => {
            if last.is_exceeded_by(&fractal) {
                *last = fractal;
            }
        }
        _ => rows.push(fractal),
    }
}
