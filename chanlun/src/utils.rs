/// 浮点比较容差，用于价格相等判断。
pub(crate) fn approx_eq_f64(a: f64, b: f64) -> bool {
    (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// 排序并去重。
pub fn unique_sorted<T: Ord + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut rows: Vec<T> = items.into_iter().collect();
    rows.sort();
    rows.dedup();
    rows
}
