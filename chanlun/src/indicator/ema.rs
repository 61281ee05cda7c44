use super::core::Indicator;

#[derive(Debug, Clone)]
pub struct EmaIndicator {
    alpha: f64,
    value: Option<f64>,
}

impl EmaIndicator {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    /// 以原始数值推进一步，供组合指标（如 MACD 的 DEA）复用。
    pub fn next_value(&mut self, price: f64) -> f64 {
        let next = match self.value {
            None => price,
            Some(prev) => prev + self.alpha * (price - prev),
        };
        self.value = Some(next);
        next
    }
}

impl Indicator for EmaIndicator {
    fn reset(&mut self) {
        self.value = None;
    }

    fn backfill(&mut self, closes: &[f64], start_index: usize) -> Vec<Option<f64>> {
        if start_index == 0 {
            self.reset();
        }
        closes
            .iter()
            .skip(start_index)
            .map(|price| Some(self.next_value(*price)))
            .collect()
    }
}
