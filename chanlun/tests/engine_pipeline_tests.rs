use chrono::{Duration, TimeZone, Utc};

use chanlun::{
    AnomalyKind, BarSeries, Direction, EngineConfig, Level, MarketBarInput, Pivot,
    PivotPosition, PivotStatus, StructureDocument, StructureEngine, Timeframe, analyze_batch,
    frame,
};

fn sample_inputs(count: usize, phase: f64) -> Vec<MarketBarInput> {
    let base = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
    let mut prev_close = 3000.0;
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 3000.0
                + 90.0 * (t / 27.0 + phase).sin()
                + 35.0 * (t / 7.0).sin()
                + 10.0 * (t / 1.9).cos();
            let open: f64 = prev_close;
            prev_close = close;
            MarketBarInput {
                datetime: base + Duration::hours(i as i64),
                open_price: open,
                high_price: open.max(close) + 3.0,
                low_price: open.min(close) - 3.0,
                close_price: close,
                volume: 1_000.0 + t,
            }
        })
        .collect()
}

fn sample_series(symbol: &str, count: usize, phase: f64) -> BarSeries {
    let as_of = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
    BarSeries::new(symbol, Timeframe::H1, as_of, sample_inputs(count, phase))
}

#[test]
fn repeated_runs_produce_identical_documents() {
    let engine = StructureEngine::default();
    let series = sample_series("ETH/USDT", 700, 0.4);

    let first = engine.analyze(&series).to_json().expect("serialize first");
    let second = engine.analyze(&series).to_json().expect("serialize second");
    assert_eq!(first, second, "pipeline should be idempotent");

    let other_engine = StructureEngine::new(EngineConfig::default()).expect("default config is valid");
    let third = other_engine.analyze(&series).to_json().expect("serialize third");
    assert_eq!(first, third, "a fresh engine should not carry state");
}

#[test]
fn document_exposes_all_sections() {
    let series = sample_series("ETH/USDT", 700, 0.4);
    let doc = StructureEngine::default().analyze(&series);

    assert_eq!(doc.meta.symbol, "ETH/USDT");
    assert_eq!(doc.meta.timeframe, Timeframe::H1);
    assert_eq!(doc.meta.as_of, series.as_of);
    assert_eq!(doc.meta.bar_count, 700);
    assert_eq!(doc.meta.merged_bar_count, doc.merged_bars.len());
    assert!(!doc.fractals.is_empty());
    assert!(!doc.strokes.is_empty());
    assert!(!doc.divergence_signals.is_empty());

    let value: serde_json::Value =
        serde_json::from_str(&doc.to_json().expect("serialize")).expect("valid json");
    for key in [
        "meta",
        "merged_bars",
        "fractals",
        "strokes",
        "provisional_stroke",
        "segments",
        "unattached_strokes",
        "pivots",
        "divergence_signals",
        "buy_sell_points",
        "anomalies",
    ] {
        assert!(value.get(key).is_some(), "document should contain `{key}`");
    }
    assert_eq!(value["meta"]["timeframe"], "1h");

    let parsed = StructureDocument::from_json(&doc.to_json_pretty().expect("pretty json"))
        .expect("document should parse back");
    assert_eq!(parsed.strokes.len(), doc.strokes.len());
    assert_eq!(parsed.pivots.len(), doc.pivots.len());
    assert_eq!(parsed.buy_sell_points.len(), doc.buy_sell_points.len());
}

#[test]
fn cross_references_stay_in_bounds() {
    let doc = StructureEngine::default().analyze(&sample_series("BTC/USDT", 900, 1.3));

    for fractal in &doc.fractals {
        assert!(fractal.cbar_index < doc.merged_bars.len());
    }
    for stroke in &doc.strokes {
        assert!(stroke.end_cbar < doc.merged_bars.len());
        assert!(stroke.end_sbar < doc.meta.bar_count);
    }
    for pivot in &doc.pivots {
        let len = match pivot.level {
            Level::Stroke => doc.strokes.len(),
            Level::Segment => doc.segments.iter().filter(|x| x.is_sealed()).count(),
        };
        assert!(pivot.runs.iter().all(|x| *x < len));
    }
    for point in &doc.buy_sell_points {
        assert!(point.cbar_index < doc.merged_bars.len());
        assert!(doc.pivots_at(point.level).any(|x| x.index == point.pivot_index));
    }
    for signal in &doc.divergence_signals {
        assert!(signal.reference_run + 2 == signal.comparison_run);
        assert!(signal.reference_end_cbar < signal.comparison_end_cbar);
        assert!(signal.comparison_end_cbar < doc.merged_bars.len());
        if signal.level == Level::Stroke {
            assert_eq!(signal.comparison_end_cbar, doc.strokes[signal.comparison_run].end_cbar);
        }
        if signal.new_extreme && signal.comparison_strength > signal.reference_strength {
            assert!(!signal.flagged, "stronger new extreme should never be flagged");
        }
    }
    let mut sorted = doc.buy_sell_points.clone();
    sorted.sort_by_key(|x| (x.level, x.run_index, x.kind));
    assert_eq!(sorted, doc.buy_sell_points);
}

#[test]
fn malformed_bar_truncates_but_keeps_prefix_structure() {
    let mut inputs = sample_inputs(400, 0.0);
    inputs[300].high_price = inputs[300].low_price - 1.0;
    let series = BarSeries::new(
        "BTC/USDT",
        Timeframe::H1,
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        inputs,
    );
    let doc = StructureEngine::default().analyze(&series);

    assert_eq!(doc.meta.bar_count, 300);
    let malformed = doc
        .anomalies
        .iter()
        .find(|x| x.kind == AnomalyKind::MalformedBar)
        .expect("malformed bar should be reported");
    assert_eq!(malformed.index, Some(300));
    assert!(!doc.strokes.is_empty(), "prefix structure should still be returned");
}

#[test]
fn empty_series_returns_empty_document() {
    let series = BarSeries::new(
        "BTC/USDT",
        Timeframe::D1,
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        Vec::new(),
    );
    let doc = StructureEngine::default().analyze(&series);
    assert_eq!(doc.meta.bar_count, 0);
    assert!(doc.merged_bars.is_empty());
    assert!(doc.segments.is_empty());
    assert_eq!(doc.anomalies.len(), 1);
    assert_eq!(doc.anomalies[0].kind, AnomalyKind::InsufficientData);
}

#[test]
fn pivot_position_tracks_open_pivot() {
    let mut doc = StructureEngine::default().analyze(&sample_series("ETH/USDT", 50, 0.0));
    doc.pivots = vec![Pivot {
        index: 0,
        level: Level::Stroke,
        zg: 3050.0,
        zd: 2980.0,
        gg: 3100.0,
        dd: 2900.0,
        runs: vec![0, 1, 2],
        status: PivotStatus::Forming,
        closing_run: None,
        start_cbar: 0,
        end_cbar: 10,
        start_sbar: 0,
        end_sbar: 12,
    }];

    assert_eq!(doc.pivot_position(Level::Stroke, 3000.0), PivotPosition::Inside);
    assert_eq!(doc.pivot_position(Level::Stroke, 3050.0), PivotPosition::Inside);
    assert_eq!(doc.pivot_position(Level::Stroke, 3060.0), PivotPosition::Above);
    assert_eq!(doc.pivot_position(Level::Stroke, 2900.0), PivotPosition::Below);
    assert_eq!(doc.pivot_position(Level::Segment, 3000.0), PivotPosition::NoOpenPivot);

    doc.pivots[0].status = PivotStatus::Completed;
    assert_eq!(doc.pivot_position(Level::Stroke, 3000.0), PivotPosition::NoOpenPivot);
}

#[test]
fn summary_reports_counts_and_sorted_names() {
    let series = sample_series("ETH/USDT", 700, 0.4);
    let doc = StructureEngine::default().analyze(&series);
    let last = series.last_close().expect("series has bars");
    let summary = doc.summary(last);

    assert_eq!(summary.stroke_count, doc.strokes.len());
    assert_eq!(summary.pivot_count, doc.pivots.len());
    assert_eq!(summary.stroke_pivot_position, doc.pivot_position(Level::Stroke, last));
    assert!(summary.open_pivots.len() <= 2);

    let mut names = summary.signals.clone();
    names.sort();
    names.dedup();
    assert_eq!(names, summary.signals);

    let expected_direction: Option<Direction> = doc
        .provisional_stroke
        .as_ref()
        .or(doc.strokes.last())
        .map(|x| x.direction);
    assert_eq!(summary.latest_stroke_direction, expected_direction);
}

#[test]
fn batch_matches_sequential_results_in_order() {
    let engine = StructureEngine::default();
    let batch = (0..6)
        .map(|i| sample_series(&format!("SYM{i}"), 300 + i * 40, i as f64 * 0.5))
        .collect::<Vec<_>>();

    let parallel = analyze_batch(&engine, &batch, 3).expect("batch analysis");
    assert_eq!(parallel.len(), batch.len());
    for (series, doc) in batch.iter().zip(&parallel) {
        assert_eq!(doc.meta.symbol, series.symbol);
        assert_eq!(doc, &engine.analyze(series));
    }
    assert!(analyze_batch(&engine, &[], 4).expect("empty batch").is_empty());
}

#[test]
fn frames_have_one_row_per_entity() {
    let doc = StructureEngine::default().analyze(&sample_series("ETH/USDT", 500, 0.2));

    assert_eq!(frame::merged_bars_frame(&doc).expect("cbar frame").height(), doc.merged_bars.len());
    assert_eq!(frame::strokes_frame(&doc).expect("stroke frame").height(), doc.strokes.len());
    assert_eq!(frame::segments_frame(&doc).expect("segment frame").height(), doc.segments.len());
    assert_eq!(frame::pivots_frame(&doc).expect("pivot frame").height(), doc.pivots.len());
    assert_eq!(frame::points_frame(&doc).expect("point frame").height(), doc.buy_sell_points.len());
}
