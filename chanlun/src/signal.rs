//! 买卖点（BuySellClassifier）。
//!
//! 在中枢与背驰结果之上按级别分类，卖点规则与买点对称：
//! - 一买：带背驰标记的向下走势终点；
//! - 二买：一买之后下一段向下走势，低点不破一买低点；
//!   跌破但中间反弹回到中枢下沿 ZD 之上的为类二买；
//! - 三买：从上方结束中枢的向下走势（回抽不回到 ZG 之下），
//!   距离 ZG 在 `pivot_touch_ratio` 倍中枢高度以内的为类三买。
//!
//! 找不到参照中枢时不产生买卖点。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::constant::{Direction, Level};
use crate::divergence::DivergenceSignal;
use crate::pivot::Pivot;
use crate::run::Run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuySellKind {
    Buy1,
    Buy2,
    QuasiBuy2,
    Buy3,
    QuasiBuy3,
    Sell1,
    Sell2,
    QuasiSell2,
    Sell3,
    QuasiSell3,
}

impl BuySellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy1 => "buy1",
            Self::Buy2 => "buy2",
            Self::QuasiBuy2 => "quasi_buy2",
            Self::Buy3 => "buy3",
            Self::QuasiBuy3 => "quasi_buy3",
            Self::Sell1 => "sell1",
            Self::Sell2 => "sell2",
            Self::QuasiSell2 => "quasi_sell2",
            Self::Sell3 => "sell3",
            Self::QuasiSell3 => "quasi_sell3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuySellPoint {
    pub kind: BuySellKind,
    pub level: Level,
    /// 锚定走势（笔或线段）的序号，买卖点位于其终点。
    pub run_index: usize,
    pub cbar_index: usize,
    pub sbar_index: usize,
    pub price: f64,
    pub datetime: DateTime<Utc>,
    /// 同级别中枢序号。
    pub pivot_index: usize,
}

pub struct BuySellClassifier;

impl BuySellClassifier {
    pub fn classify<R: Run>(
        level: Level,
        runs: &[R],
        pivots: &[Pivot],
        divergences: &[DivergenceSignal],
        config: &EngineConfig,
    ) -> Vec<BuySellPoint> {
        let mut rows: Vec<BuySellPoint> = Vec::new();

        for signal in divergences.iter().filter(|x| x.flagged && x.level == level) {
            let first = signal.comparison_run;
            let Some(pivot) = reference_pivot(pivots, first) else {
                continue;
            };
            let (kind1, kind2, quasi2) = match signal.direction {
                Direction::Down => (BuySellKind::Buy1, BuySellKind::Buy2, BuySellKind::QuasiBuy2),
                Direction::Up => (BuySellKind::Sell1, BuySellKind::Sell2, BuySellKind::QuasiSell2),
            };
            rows.push(point(kind1, level, first, &runs[first], pivot));

            let second = first + 2;
            if second >= runs.len() {
                continue;
            }
            let rebound = &runs[first + 1];
            let retest = &runs[second];
            if retest.direction() != signal.direction {
                continue;
            }
            let Some(pivot) = reference_pivot(pivots, second) else {
                continue;
            };
            let holds = !retest.extends_beyond(runs[first].end_price());
            let reenters = match signal.direction {
                Direction::Down => rebound.high_price() >= pivot.zd,
                Direction::Up => rebound.low_price() <= pivot.zg,
            };
            if holds {
                rows.push(point(kind2, level, second, retest, pivot));
            } else if reenters {
                rows.push(point(quasi2, level, second, retest, pivot));
            }
        }

        for pivot in pivots.iter().filter(|x| x.level == level) {
            let Some(closing) = pivot.closing_run else {
                continue;
            };
            if closing == 0 || closing >= runs.len() {
                continue;
            }
            let leave = &runs[closing - 1];
            let back = &runs[closing];
            let touch = config.pivot_touch_ratio * pivot.height();
            let kind = match back.direction() {
                Direction::Down if back.low_price() >= pivot.zg && leave.high_price() > pivot.zg => {
                    if back.low_price() - pivot.zg <= touch {
                        BuySellKind::QuasiBuy3
                    } else {
                        BuySellKind::Buy3
                    }
                }
                Direction::Up if back.high_price() <= pivot.zd && leave.low_price() < pivot.zd => {
                    if pivot.zd - back.high_price() <= touch {
                        BuySellKind::QuasiSell3
                    } else {
                        BuySellKind::Sell3
                    }
                }
                _ => continue,
            };
            rows.push(point(kind, level, closing, back, pivot));
        }

        rows.sort_by(|a, b| a.run_index.cmp(&b.run_index).then(a.kind.cmp(&b.kind)));
        rows.dedup_by(|a, b| a.run_index == b.run_index && a.kind == b.kind);
        debug!(level = level.as_str(), points = rows.len(), "buy/sell classification done");
        rows
    }
}

/// 首个成员早于 `run` 的最近一个中枢。
fn reference_pivot(pivots: &[Pivot], run: usize) -> Option<&Pivot> {
    pivots.iter().rev().find(|x| x.first_run() < run)
}

fn point<R: Run>(kind: BuySellKind, level: Level, run_index: usize, run: &R, pivot: &Pivot) -> BuySellPoint {
    BuySellPoint {
        kind,
        level,
        run_index,
        cbar_index: run.end_cbar(),
        sbar_index: run.end_sbar(),
        price: run.end_price(),
        datetime: run.end_datetime(),
        pivot_index: pivot.index,
    }
}
