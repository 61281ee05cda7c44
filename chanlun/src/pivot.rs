//! 中枢（PivotBuilder）。
//!
//! 笔级别与线段级别使用同一算法，互不影响：
//! - 连续三段走势的高点最小值为 ZG、低点最大值为 ZD，ZG > ZD 时中枢成立；
//! - 之后每段走势与 [ZD, ZG] 严格重叠则延伸中枢，ZG/ZD 不变；
//! - 第一段不重叠的走势结束中枢，并作为下一个中枢的起点；
//! - 同一级别同一时刻至多一个未结束的中枢。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anomaly::{Anomaly, AnomalyKind};
use crate::constant::{Const, Level};
use crate::engine::AnalysisContext;
use crate::run::Run;
use crate::utils::approx_eq_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotStatus {
    Forming,
    Extended,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// 同一级别内的序号。
    pub index: usize,
    pub level: Level,
    pub zg: f64,
    pub zd: f64,
    /// 全部成员走势的最高点。
    pub gg: f64,
    /// 全部成员走势的最低点。
    pub dd: f64,
    /// 成员走势序号（笔或线段）。
    pub runs: Vec<usize>,
    pub status: PivotStatus,
    pub closing_run: Option<usize>,
    pub start_cbar: usize,
    pub end_cbar: usize,
    pub start_sbar: usize,
    pub end_sbar: usize,
}

impl Pivot {
    pub fn is_open(&self) -> bool {
        self.status != PivotStatus::Completed
    }

    pub fn height(&self) -> f64 {
        self.zg - self.zd
    }

    pub fn first_run(&self) -> usize {
        self.runs.first().copied().unwrap_or_default()
    }

    /// 价格落在 [ZD, ZG] 内，边界算在内。
    pub fn contains(&self, price: f64) -> bool {
        price >= self.zd && price <= self.zg
    }

    fn absorb<R: Run>(&mut self, idx: usize, run: &R) {
        self.runs.push(idx);
        self.gg = self.gg.max(run.high_price());
        self.dd = self.dd.min(run.low_price());
        self.end_cbar = run.end_cbar();
        self.end_sbar = run.end_sbar();
    }
}

pub struct PivotBuilder;

impl PivotBuilder {
    pub fn build<R: Run>(level: Level, runs: &[R], ctx: &mut AnalysisContext<'_>) -> Vec<Pivot> {
        let seed_len = Const::PIVOT_SEED_RUNS;
        let mut pivots: Vec<Pivot> = Vec::new();
        let mut discarded = 0usize;

        let mut k = 0;
        while k + seed_len <= runs.len() {
            let Some(mut pivot) = seed(level, pivots.len(), runs, k, seed_len) else {
                discarded += 1;
                k += 1;
                continue;
            };

            let mut next = k + seed_len;
            while next < runs.len() {
                let run = &runs[next];
                if !run.overlaps(pivot.zg, pivot.zd) {
                    pivot.status = PivotStatus::Completed;
                    pivot.closing_run = Some(next);
                    break;
                }
                pivot.absorb(next, run);
                pivot.status = PivotStatus::Extended;
                next += 1;
            }
            pivots.push(pivot);
            k = next;
        }

        if discarded > 0 {
            ctx.record(
                Anomaly::new(
                    AnomalyKind::NoOverlap,
                    format!("{discarded} pivot seeds without overlap discarded"),
                )
                .with_level(level),
            );
        }
        debug!(level = level.as_str(), pivots = pivots.len(), discarded, "pivot building done");
        pivots
    }
}

fn seed<R: Run>(level: Level, index: usize, runs: &[R], start: usize, len: usize) -> Option<Pivot> {
    let members = &runs[start..start + len];
    let zg = members.iter().map(|x| x.high_price()).fold(f64::MAX, f64::min);
    let zd = members.iter().map(|x| x.low_price()).fold(f64::MIN, f64::max);
    if zg <= zd || approx_eq_f64(zg, zd) {
        return None;
    }
    let head = &members[0];
    let tail = &members[len - 1];
    Some(Pivot {
        index,
        level,
        zg,
        zd,
        gg: members.iter().map(|x| x.high_price()).fold(f64::MIN, f64::max),
        dd: members.iter().map(|x| x.low_price()).fold(f64::MAX, f64::min),
        runs: (start..start + len).collect(),
        status: PivotStatus::Forming,
        closing_run: None,
        start_cbar: head.start_cbar(),
        end_cbar: tail.end_cbar(),
        start_sbar: head.start_sbar(),
        end_sbar: tail.end_sbar(),
    })
}
