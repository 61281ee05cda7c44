use super::core::Indicator;
use super::ema::EmaIndicator;

/// MACD 柱：DIF = EMA(fast) - EMA(slow)，DEA = EMA(signal) of DIF，柱 = 2 * (DIF - DEA)。
#[derive(Debug, Clone)]
pub struct Macd {
    fast: EmaIndicator,
    slow: EmaIndicator,
    signal: EmaIndicator,
    dif: Option<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: EmaIndicator::new(fast),
            slow: EmaIndicator::new(slow),
            signal: EmaIndicator::new(signal),
            dif: None,
        }
    }

    pub fn dif(&self) -> Option<f64> {
        self.dif
    }

    fn step(&mut self, close: f64) -> f64 {
        let dif = self.fast.next_value(close) - self.slow.next_value(close);
        let dea = self.signal.next_value(dif);
        self.dif = Some(dif);
        2.0 * (dif - dea)
    }
}

impl Indicator for Macd {
    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.dif = None;
    }

    fn backfill(&mut self, closes: &[f64], start_index: usize) -> Vec<Option<f64>> {
        if start_index == 0 {
            self.reset();
        }
        closes
            .iter()
            .skip(start_index)
            .map(|close| Some(self.step(*close)))
            .collect()
    }
}
