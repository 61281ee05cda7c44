use tracing::{debug, warn};

use crate::anomaly::Anomaly;
use crate::config::EngineConfig;
use crate::constant::{DataError, Level};
use crate::divergence::DivergenceAnalyzer;
use crate::export::{DocumentMeta, StructureDocument};
use crate::fractal::FractalDetector;
use crate::indicator::histogram_series;
use crate::normalizer::BarNormalizer;
use crate::pivot::PivotBuilder;
use crate::segment::SegmentBuilder;
use crate::series::BarSeries;
use crate::signal::BuySellClassifier;
use crate::stroke::StrokeBuilder;

/// 单次计算的可变上下文，由调用方持有并逐阶段传递，计算结束即丢弃。
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    pub config: &'a EngineConfig,
    pub anomalies: Vec<Anomaly>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            anomalies: Vec::new(),
        }
    }

    pub fn record(&mut self, anomaly: Anomaly) {
        warn!(kind = ?anomaly.kind, index = ?anomaly.index, "{}", anomaly.note);
        self.anomalies.push(anomaly);
    }
}

/// 结构分解引擎：纯函数式批处理，同一输入总是得到相同文档。
#[derive(Debug, Clone, Default)]
pub struct StructureEngine {
    config: EngineConfig,
}

impl StructureEngine {
    pub fn new(config: EngineConfig) -> Result<Self, DataError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, series: &BarSeries) -> StructureDocument {
        let mut ctx = AnalysisContext::new(&self.config);

        let (bars, malformed) = series.validated();
        if let Some(anomaly) = malformed {
            ctx.record(anomaly);
        }

        let merged_bars = BarNormalizer::normalize(&bars);
        debug!(
            symbol = %series.symbol,
            timeframe = series.timeframe.as_str(),
            bars = bars.len(),
            merged = merged_bars.len(),
            "bars normalized"
        );

        let fractals = match FractalDetector::detect(&merged_bars, &mut ctx) {
            Ok(rows) => rows,
            Err(err) => {
                ctx.record(err.into());
                Vec::new()
            }
        };

        let stroke_out = StrokeBuilder::build(&merged_bars, &fractals, &mut ctx);
        let segment_out = SegmentBuilder::build(&stroke_out.strokes, &mut ctx);
        let sealed = segment_out.sealed();

        let stroke_pivots = PivotBuilder::build(Level::Stroke, &stroke_out.strokes, &mut ctx);
        let segment_pivots = PivotBuilder::build(Level::Segment, sealed, &mut ctx);

        let histogram = histogram_series(&bars, &self.config);
        let mode = self.config.strength_mode;
        let stroke_divergence =
            DivergenceAnalyzer::analyze(Level::Stroke, &stroke_out.strokes, &histogram, mode);
        let segment_divergence = DivergenceAnalyzer::analyze(Level::Segment, sealed, &histogram, mode);

        let mut buy_sell_points = BuySellClassifier::classify(
            Level::Stroke,
            &stroke_out.strokes,
            &stroke_pivots,
            &stroke_divergence,
            &self.config,
        );
        buy_sell_points.extend(BuySellClassifier::classify(
            Level::Segment,
            sealed,
            &segment_pivots,
            &segment_divergence,
            &self.config,
        ));

        let mut pivots = stroke_pivots;
        pivots.extend(segment_pivots);
        let mut divergence_signals = stroke_divergence;
        divergence_signals.extend(segment_divergence);

        StructureDocument {
            meta: DocumentMeta {
                symbol: series.symbol.clone(),
                timeframe: series.timeframe,
                as_of: series.as_of,
                bar_count: bars.len(),
                merged_bar_count: merged_bars.len(),
            },
            merged_bars,
            fractals,
            strokes: stroke_out.strokes,
            provisional_stroke: stroke_out.provisional,
            segments: segment_out.segments,
            unattached_strokes: segment_out.unattached_strokes,
            pivots,
            divergence_signals,
            buy_sell_points,
            anomalies: ctx.anomalies,
        }
    }
}
