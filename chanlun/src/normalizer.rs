//! 包含关系处理（BarNormalizer）。
//!
//! 负责：
//! - 从左到右扫描原始 bar，合并存在包含关系的相邻 bar；
//! - 合并方向取决于前两根合并 K 线的走向：向上取高高，向下取低低；
//! - 序列起始处尚无方向时，按朴素极值（最高高、最低低）合并。

use crate::bar::{CBar, SBar};
use crate::constant::Direction;

#[derive(Debug, Default)]
pub struct BarNormalizer {
    rows: Vec<CBar>,
}

impl BarNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 一次性处理整段序列。
    pub fn normalize(sbars: &[SBar]) -> Vec<CBar> {
        let mut normalizer = Self::new();
        for sbar in sbars {
            normalizer.push(sbar);
        }
        normalizer.into_rows()
    }

    pub fn push(&mut self, sbar: &SBar) {
        let incoming = CBar::from_sbar(self.rows.len(), sbar);
        let Some(last) = self.rows.last() else {
            self.rows.push(incoming);
            return;
        };
        if !last.is_inclusive(&incoming) {
            self.rows.push(incoming);
            return;
        }

        let direction = self.trend_before_last();
        if let Some(last) = self.rows.last_mut() {
            merge_into(last, &incoming, direction);
        }

        // 合并后的 bar 若又与前一根构成包含，则继续向前合并
        while self.rows.len() >= 2 {
            let len = self.rows.len();
            if !self.rows[len - 2].is_inclusive(&self.rows[len - 1]) {
                break;
            }
            let Some(merged) = self.rows.pop() else {
                break;
            };
            let direction = self.trend_before_last();
            if let Some(prev) = self.rows.last_mut() {
                merge_into(prev, &merged, direction);
            }
        }
    }

    pub fn rows(&self) -> &[CBar] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CBar> {
        self.rows
    }

    /// 最后一根合并 K 线相对于其前一根的方向；不足两根时无方向。
    fn trend_before_last(&self) -> Option<Direction> {
        let len = self.rows.len();
        if len < 2 {
            return None;
        }
        Some(self.rows[len - 1].direction_from(&self.rows[len - 2]))
    }
}

fn merge_into(target: &mut CBar, incoming: &CBar, direction: Option<Direction>) {
    let (take_high, take_low) = match direction {
        Some(Direction::Up) => (
            incoming.high_price > target.high_price,
            incoming.low_price > target.low_price,
        ),
        Some(Direction::Down) => (
            incoming.high_price < target.high_price,
            incoming.low_price < target.low_price,
        ),
        None => (
            incoming.high_price > target.high_price,
            incoming.low_price < target.low_price,
        ),
    };

    if take_high {
        target.high_price = incoming.high_price;
        target.high_sbar = incoming.high_sbar;
    }
    if take_low {
        target.low_price = incoming.low_price;
        target.low_sbar = incoming.low_sbar;
    }
    target.sbar_end = incoming.sbar_end;
    target.datetime = incoming.datetime;
}
