//! 引擎输入：带周期元信息的有序 bar 序列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{Anomaly, StructureError};
use crate::bar::SBar;
use crate::constant::Timeframe;

/// 外部行情协作方提供的标准化 bar 输入。
#[derive(Debug, Clone)]
pub struct MarketBarInput {
    pub datetime: DateTime<Utc>,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

impl MarketBarInput {
    pub fn into_sbar(self, index: usize) -> SBar {
        SBar {
            index,
            datetime: self.datetime,
            open_price: self.open_price,
            high_price: self.high_price,
            low_price: self.low_price,
            close_price: self.close_price,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub as_of: DateTime<Utc>,
    pub bars: Vec<SBar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        as_of: DateTime<Utc>,
        inputs: Vec<MarketBarInput>,
    ) -> Self {
        let bars = inputs
            .into_iter()
            .enumerate()
            .map(|(idx, input)| input.into_sbar(idx))
            .collect();
        Self {
            symbol: symbol.into(),
            timeframe,
            as_of,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 返回满足约束的最长前缀。
    ///
    /// 第一根违反 OHLC 约束或时间未严格递增的 bar 及其之后的全部 bar 被排除，
    /// 并以 `MalformedBar` 异常返回原因。`index` 统一重排为序列位置。
    pub fn validated(&self) -> (Vec<SBar>, Option<Anomaly>) {
        let mut out: Vec<SBar> = Vec::with_capacity(self.bars.len());
        for (position, bar) in self.bars.iter().enumerate() {
            if let Err(reason) = check_bar(bar, out.last()) {
                let error = StructureError::MalformedBar {
                    index: position,
                    reason: format!("{reason}; {} trailing bars excluded", self.bars.len() - position),
                };
                return (out, Some(error.into()));
            }
            let mut accepted = bar.clone();
            accepted.index = position;
            out.push(accepted);
        }
        (out, None)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|x| x.close_price)
    }
}

fn check_bar(bar: &SBar, prev: Option<&SBar>) -> Result<(), String> {
    bar.check_ohlc()?;
    if let Some(prev) = prev {
        if bar.datetime <= prev.datetime {
            return Err(format!(
                "datetime {} not after previous {}",
                bar.datetime, prev.datetime
            ));
        }
    }
    Ok(())
}
