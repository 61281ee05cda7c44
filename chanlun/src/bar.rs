use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constant::{Direction, FractalType};

/// 原始 K 线。`index` 为其在输入序列中的位置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SBar {
    pub index: usize,
    pub datetime: DateTime<Utc>,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

impl SBar {
    /// 校验单根 bar 的 OHLC 约束，返回违反原因。
    pub fn check_ohlc(&self) -> Result<(), String> {
        let prices = [
            self.open_price,
            self.high_price,
            self.low_price,
            self.close_price,
        ];
        if prices.iter().any(|x| !x.is_finite()) {
            return Err("non-finite price".to_string());
        }
        if self.high_price < self.low_price {
            return Err(format!("high {} < low {}", self.high_price, self.low_price));
        }
        if self.high_price < self.open_price.max(self.close_price) {
            return Err(format!("high {} below open/close", self.high_price));
        }
        if self.low_price > self.open_price.min(self.close_price) {
            return Err(format!("low {} above open/close", self.low_price));
        }
        Ok(())
    }
}

/// 合并 K 线（处理包含关系之后的 bar）。
///
/// 只通过 `sbar_start..=sbar_end` 引用原始 bar，不持有原始数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CBar {
    pub index: usize,
    pub sbar_start: usize,
    pub sbar_end: usize,
    pub high_price: f64,
    pub low_price: f64,
    /// 高点所在的原始 bar。
    pub high_sbar: usize,
    /// 低点所在的原始 bar。
    pub low_sbar: usize,
    pub datetime: DateTime<Utc>,
}

impl CBar {
    pub fn from_sbar(index: usize, sbar: &SBar) -> Self {
        Self {
            index,
            sbar_start: sbar.index,
            sbar_end: sbar.index,
            high_price: sbar.high_price,
            low_price: sbar.low_price,
            high_sbar: sbar.index,
            low_sbar: sbar.index,
            datetime: sbar.datetime,
        }
    }

    pub fn is_inclusive(&self, other: &Self) -> bool {
        is_inclusive(self.high_price, self.low_price, other.high_price, other.low_price)
    }

    /// 按分型类型取极值价。
    pub fn extreme(&self, kind: FractalType) -> f64 {
        match kind {
            FractalType::Top => self.high_price,
            FractalType::Bottom => self.low_price,
        }
    }

    pub fn extreme_sbar(&self, kind: FractalType) -> usize {
        match kind {
            FractalType::Top => self.high_sbar,
            FractalType::Bottom => self.low_sbar,
        }
    }

    /// 相邻两根合并 K 线之间的方向（非包含时必然严格）。
    pub fn direction_from(&self, prev: &Self) -> Direction {
        if self.high_price > prev.high_price {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

pub(crate) fn is_inclusive(a_high: f64, a_low: f64, b_high: f64, b_low: f64) -> bool {
    (a_high >= b_high && a_low <= b_low) || (a_high <= b_high && a_low >= b_low)
}

/// 已识别的分型。`cbar_index` 指向合并 K 线序列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fractal {
    pub kind: FractalType,
    pub cbar_index: usize,
    pub sbar_index: usize,
    pub price: f64,
    pub datetime: DateTime<Utc>,
    pub confirmed: bool,
}

impl Fractal {
    /// `other` 是否比自身更极端（同类型比较）。
    pub fn is_exceeded_by(&self, other: &Fractal) -> bool {
        match self.kind {
            FractalType::Top => other.price > self.price,
            FractalType::Bottom => other.price < self.price,
        }
    }
}

pub(crate) fn top_excursion(left: &CBar, middle: &CBar, right: &CBar) -> Option<f64> {
    let excursion = middle.high_price - left.high_price.max(right.high_price);
    (excursion > 0.0).then_some(excursion)
}

pub(crate) fn bottom_excursion(left: &CBar, middle: &CBar, right: &CBar) -> Option<f64> {
    let excursion = left.low_price.min(right.low_price) - middle.low_price;
    (excursion > 0.0).then_some(excursion)
}
