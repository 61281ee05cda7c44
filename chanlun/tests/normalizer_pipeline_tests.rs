use chrono::{Duration, TimeZone, Utc};

use chanlun::{BarNormalizer, SBar};

fn sample_bars(count: usize) -> Vec<SBar> {
    let base_dt = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
    let mut bars = Vec::with_capacity(count);
    let mut price: f64 = 100.0;
    let cycle = [0.0_f64, 2.8, -2.4, 3.7, -3.1, 2.2, -1.6, 3.4, -2.9, 1.8];
    for i in 0..count {
        let open = price;
        let drift = (i as f64) * 0.03;
        let close = (100.0 + drift + cycle[i % cycle.len()]).max(1.0);
        let high = open.max(close) + 0.8;
        let low = open.min(close) - 0.8;
        price = close;

        bars.push(SBar {
            index: i,
            datetime: base_dt + Duration::minutes((i as i64) * 15),
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            volume: 120.0 + (i as f64 * 2.0),
        });
    }
    bars
}

#[test]
fn cbar_ranges_cover_all_sbars_without_gap_or_overlap() {
    let sbars = sample_bars(120);
    let cbars = BarNormalizer::normalize(&sbars);
    assert!(!cbars.is_empty(), "cbar sequence should not be empty");

    let mut expected_start = 0usize;
    for (position, row) in cbars.iter().enumerate() {
        assert_eq!(row.index, position, "cbar index should match its position");
        assert_eq!(
            row.sbar_start, expected_start,
            "cbar range should start right after the previous one"
        );
        assert!(row.sbar_end >= row.sbar_start);
        expected_start = row.sbar_end + 1;
    }
    assert_eq!(expected_start, sbars.len(), "cbar ranges should cover all sbars exactly once");
}

#[test]
fn cbar_adjacent_rows_are_non_inclusive() {
    let cbars = BarNormalizer::normalize(&sample_bars(120));
    assert!(cbars.len() > 10, "need enough cbar rows for inclusion check");

    for pair in cbars.windows(2) {
        assert!(
            !pair[0].is_inclusive(&pair[1]),
            "adjacent cbar rows should not be inclusive: left#{} right#{}",
            pair[0].index,
            pair[1].index
        );
    }
}

#[test]
fn cbar_extreme_sbars_point_inside_range() {
    let sbars = sample_bars(200);
    let cbars = BarNormalizer::normalize(&sbars);

    for row in &cbars {
        assert!(row.high_sbar >= row.sbar_start && row.high_sbar <= row.sbar_end);
        assert!(row.low_sbar >= row.sbar_start && row.low_sbar <= row.sbar_end);
        assert_eq!(sbars[row.high_sbar].high_price, row.high_price);
        assert_eq!(sbars[row.low_sbar].low_price, row.low_price);
        assert_eq!(row.datetime, sbars[row.sbar_end].datetime);
    }
}

#[test]
fn normalization_is_deterministic() {
    let sbars = sample_bars(150);
    assert_eq!(BarNormalizer::normalize(&sbars), BarNormalizer::normalize(&sbars));
}
