pub mod core;
pub mod ema;
pub mod macd;

pub use self::core::Indicator;
pub use ema::EmaIndicator;
pub use macd::Macd;

use crate::bar::SBar;
use crate::config::EngineConfig;

/// 为每根原始 bar 计算一个 MACD 柱值，长度与输入一致。
pub fn histogram_series(bars: &[SBar], config: &EngineConfig) -> Vec<f64> {
    let mut macd = Macd::new(config.macd_fast, config.macd_slow, config.macd_signal);
    let closes = bars.iter().map(|x| x.close_price).collect::<Vec<_>>();
    macd.backfill(&closes, 0)
        .into_iter()
        .map(|x| x.unwrap_or(0.0))
        .collect()
}
