//! 笔与线段共用的走势抽象，中枢、背驰、买卖点都只依赖这一层接口。

use chrono::{DateTime, Utc};

use crate::constant::Direction;

pub trait Run {
    fn direction(&self) -> Direction;
    fn start_price(&self) -> f64;
    fn end_price(&self) -> f64;
    fn high_price(&self) -> f64;
    fn low_price(&self) -> f64;
    fn start_cbar(&self) -> usize;
    fn end_cbar(&self) -> usize;
    /// 起点所在的原始 bar。
    fn start_sbar(&self) -> usize;
    /// 终点所在的原始 bar。
    fn end_sbar(&self) -> usize;
    fn end_datetime(&self) -> DateTime<Utc>;

    /// 终点是否比给定价格走得更远（向上更高，向下更低）。
    fn extends_beyond(&self, price: f64) -> bool {
        match self.direction() {
            Direction::Up => self.end_price() > price,
            Direction::Down => self.end_price() < price,
        }
    }

    fn overlaps(&self, high: f64, low: f64) -> bool {
        self.low_price() < high && self.high_price() > low
    }
}
