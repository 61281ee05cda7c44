//! 背驰（DivergenceAnalyzer）。
//!
//! 比较同向且中间恰好隔一段反向走势的两段走势 A（较早）与 B（较晚）：
//! B 创出新极值而 MACD 柱面积严格小于 A 时标记背驰。
//! 力度窗口为走势起点之后到终点为止的原始 bar，即 `(start_sbar, end_sbar]`，
//! 相邻走势因此不会重复计数。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StrengthMode;
use crate::constant::{Direction, Level};
use crate::run::Run;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceSignal {
    pub level: Level,
    pub direction: Direction,
    pub reference_run: usize,
    pub comparison_run: usize,
    /// 两段走势终点所在的合并 K 线序号。
    pub reference_end_cbar: usize,
    pub comparison_end_cbar: usize,
    pub reference_strength: f64,
    pub comparison_strength: f64,
    /// B 的终点是否比 A 更极端。
    pub new_extreme: bool,
    pub flagged: bool,
}

pub struct DivergenceAnalyzer;

impl DivergenceAnalyzer {
    pub fn analyze<R: Run>(
        level: Level,
        runs: &[R],
        histogram: &[f64],
        mode: StrengthMode,
    ) -> Vec<DivergenceSignal> {
        let mut rows = Vec::new();
        for idx in 2..runs.len() {
            let reference = &runs[idx - 2];
            let between = &runs[idx - 1];
            let comparison = &runs[idx];
            if reference.direction() != comparison.direction()
                || between.direction() == comparison.direction()
            {
                continue;
            }

            let reference_strength = strength(reference, histogram, mode);
            let comparison_strength = strength(comparison, histogram, mode);
            let new_extreme = comparison.extends_beyond(reference.end_price());
            rows.push(DivergenceSignal {
                level,
                direction: comparison.direction(),
                reference_run: idx - 2,
                comparison_run: idx,
                reference_end_cbar: reference.end_cbar(),
                comparison_end_cbar: comparison.end_cbar(),
                reference_strength,
                comparison_strength,
                new_extreme,
                flagged: new_extreme && comparison_strength < reference_strength,
            });
        }
        debug!(
            level = level.as_str(),
            pairs = rows.len(),
            flagged = rows.iter().filter(|x| x.flagged).count(),
            "divergence analysis done"
        );
        rows
    }
}

/// 走势力度：窗口内 MACD 柱按方向调整符号后的累加值，数值越大力度越强。
pub fn strength<R: Run + ?Sized>(run: &R, histogram: &[f64], mode: StrengthMode) -> f64 {
    let begin = (run.start_sbar() + 1).min(histogram.len());
    let end = (run.end_sbar() + 1).min(histogram.len());
    if begin >= end {
        return 0.0;
    }
    let window = &histogram[begin..end];
    match mode {
        StrengthMode::Absolute => window.iter().map(|x| x.abs()).sum(),
        StrengthMode::SameSign => match run.direction() {
            Direction::Up => window.iter().filter(|x| **x > 0.0).sum(),
            Direction::Down => window.iter().filter(|x| **x < 0.0).map(|x| -x).sum(),
        },
    }
}
