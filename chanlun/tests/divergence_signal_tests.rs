use chrono::{DateTime, Duration, TimeZone, Utc};

use chanlun::divergence::strength;
use chanlun::{
    AnalysisContext, BuySellClassifier, BuySellKind, DivergenceAnalyzer, Direction,
    EngineConfig, Level, PivotBuilder, StrengthMode, Stroke,
};

fn at(sbar: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::minutes(sbar as i64)
}

fn stroke(index: usize, start_price: f64, end_price: f64) -> Stroke {
    let direction = if end_price > start_price {
        Direction::Up
    } else {
        Direction::Down
    };
    let (start, end) = (index * 4, index * 4 + 4);
    Stroke {
        index,
        direction,
        start_fractal: index,
        end_fractal: Some(index + 1),
        start_cbar: start,
        end_cbar: end,
        start_sbar: start,
        end_sbar: end,
        start_price,
        end_price,
        high_price: start_price.max(end_price),
        low_price: start_price.min(end_price),
        start_datetime: at(start),
        end_datetime: at(end),
        confirmed: true,
    }
}

fn strokes_from_path(path: &[f64]) -> Vec<Stroke> {
    path.windows(2)
        .enumerate()
        .map(|(idx, pair)| stroke(idx, pair[0], pair[1]))
        .collect()
}

/// 每段走势窗口 `(start_sbar, end_sbar]` 内填充同一个柱值。
fn histogram_for(runs: &[Stroke], per_run: &[f64]) -> Vec<f64> {
    let len = runs.last().map(|x| x.end_sbar + 1).unwrap_or_default();
    let mut out = vec![0.0; len];
    for (run, value) in runs.iter().zip(per_run) {
        for slot in &mut out[run.start_sbar + 1..=run.end_sbar] {
            *slot = *value;
        }
    }
    out
}

#[test]
fn weaker_new_low_is_flagged() {
    let runs = strokes_from_path(&[20.0, 10.0, 15.0, 8.0]);
    let histogram = histogram_for(&runs, &[-2.0, 1.0, -1.0]);
    let rows = DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, StrengthMode::SameSign);

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!((row.reference_run, row.comparison_run), (0, 2));
    assert_eq!((row.reference_end_cbar, row.comparison_end_cbar), (4, 12));
    assert_eq!(row.direction, Direction::Down);
    assert_eq!(row.reference_strength, 8.0);
    assert_eq!(row.comparison_strength, 4.0);
    assert!(row.new_extreme);
    assert!(row.flagged);
}

#[test]
fn stronger_new_low_is_not_flagged() {
    let runs = strokes_from_path(&[20.0, 10.0, 15.0, 8.0]);
    let histogram = histogram_for(&runs, &[-1.0, 1.0, -2.0]);
    let rows = DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, StrengthMode::SameSign);

    assert_eq!(rows.len(), 1);
    assert!(rows[0].new_extreme);
    assert!(rows[0].comparison_strength > rows[0].reference_strength);
    assert!(!rows[0].flagged);
}

#[test]
fn no_new_extreme_is_never_flagged() {
    let runs = strokes_from_path(&[10.0, 20.0, 15.0, 19.0]);
    let histogram = histogram_for(&runs, &[3.0, -1.0, 1.0]);
    let rows = DivergenceAnalyzer::analyze(Level::Segment, &runs, &histogram, StrengthMode::SameSign);

    assert_eq!(rows.len(), 1);
    assert!(!rows[0].new_extreme);
    assert!(!rows[0].flagged);
    assert_eq!(rows[0].level, Level::Segment);
}

#[test]
fn strength_modes_differ_on_mixed_histogram() {
    let run = stroke(0, 10.0, 20.0);
    let histogram = [9.0, 1.0, -2.0, 3.0, -1.0];
    assert_eq!(strength(&run, &histogram, StrengthMode::SameSign), 4.0);
    assert_eq!(strength(&run, &histogram, StrengthMode::Absolute), 7.0);
    assert_eq!(strength(&run, &[], StrengthMode::Absolute), 0.0);
}

#[test]
fn first_and_second_buy_after_divergence() {
    let runs = strokes_from_path(&[20.0, 14.0, 18.0, 13.0, 17.0, 10.0, 12.0, 11.0]);
    let histogram = histogram_for(&runs, &[-1.0, 1.0, -3.0, 1.0, -1.0, 1.0, -1.0]);
    let config = EngineConfig::default();
    let mut ctx = AnalysisContext::new(&config);

    let pivots = PivotBuilder::build(Level::Stroke, &runs, &mut ctx);
    assert_eq!(pivots.len(), 1);
    assert_eq!((pivots[0].zg, pivots[0].zd), (18.0, 14.0));
    assert_eq!(pivots[0].closing_run, Some(5));

    let divergences = DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, config.strength_mode);
    let points = BuySellClassifier::classify(Level::Stroke, &runs, &pivots, &divergences, &config);

    let kinds = points.iter().map(|x| (x.run_index, x.kind)).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            (4, BuySellKind::Buy1),
            (5, BuySellKind::Sell3),
            (6, BuySellKind::Buy2),
        ]
    );
    assert_eq!(points[0].price, 10.0);
    assert_eq!(points[0].sbar_index, runs[4].end_sbar);
    assert!(points.iter().all(|x| x.pivot_index == 0));
}

#[test]
fn breached_low_with_rebound_into_pivot_is_quasi_second_buy() {
    let runs = strokes_from_path(&[20.0, 14.0, 18.0, 13.0, 17.0, 10.0, 15.0, 9.0]);
    let histogram = histogram_for(&runs, &[-1.0, 1.0, -3.0, 1.0, -1.0, 1.0, -1.0]);
    let config = EngineConfig::default();
    let mut ctx = AnalysisContext::new(&config);

    let pivots = PivotBuilder::build(Level::Stroke, &runs, &mut ctx);
    let divergences = DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, config.strength_mode);
    let points = BuySellClassifier::classify(Level::Stroke, &runs, &pivots, &divergences, &config);

    let kinds = points.iter().map(|x| (x.run_index, x.kind)).collect::<Vec<_>>();
    assert!(kinds.contains(&(4, BuySellKind::Buy1)));
    assert!(kinds.contains(&(6, BuySellKind::QuasiBuy2)));
    assert!(!kinds.iter().any(|(_, kind)| *kind == BuySellKind::Buy2));
}

#[test]
fn pullback_above_pivot_is_third_buy() {
    let config = EngineConfig::default();
    for (pullback, expected) in [(18.0, BuySellKind::Buy3), (15.1, BuySellKind::QuasiBuy3)] {
        let runs = strokes_from_path(&[10.0, 16.0, 12.0, 15.0, 13.0, 22.0, pullback]);
        let mut ctx = AnalysisContext::new(&config);
        let pivots = PivotBuilder::build(Level::Stroke, &runs, &mut ctx);
        assert_eq!((pivots[0].zg, pivots[0].zd), (15.0, 12.0));
        assert_eq!(pivots[0].closing_run, Some(5));

        let histogram = vec![0.0; runs[5].end_sbar + 1];
        let divergences =
            DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, config.strength_mode);
        let points = BuySellClassifier::classify(Level::Stroke, &runs, &pivots, &divergences, &config);

        assert_eq!(points.len(), 1, "pullback {pullback} should yield one point");
        assert_eq!(points[0].kind, expected);
        assert_eq!(points[0].run_index, 5);
        assert_eq!(points[0].price, pullback);
    }
}

#[test]
fn no_pivot_means_no_points() {
    let runs = strokes_from_path(&[20.0, 10.0, 15.0, 8.0]);
    let histogram = histogram_for(&runs, &[-2.0, 1.0, -1.0]);
    let config = EngineConfig::default();
    let divergences = DivergenceAnalyzer::analyze(Level::Stroke, &runs, &histogram, config.strength_mode);
    assert!(divergences[0].flagged);

    let points = BuySellClassifier::classify(Level::Stroke, &runs, &[], &divergences, &config);
    assert!(points.is_empty());
}
