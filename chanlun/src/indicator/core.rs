pub trait Indicator: Send {
    fn reset(&mut self);
    /// 从 `start_index` 起推进，`start_index == 0` 时先重置状态。
    fn backfill(&mut self, closes: &[f64], start_index: usize) -> Vec<Option<f64>>;
}
