pub mod anomaly;
pub mod bar;
pub mod batch;
pub mod config;
pub mod constant;
pub mod divergence;
pub mod engine;
pub mod export;
pub mod fractal;
pub mod frame;
pub mod indicator;
pub mod logging;
pub mod normalizer;
pub mod pivot;
pub mod run;
pub mod segment;
pub mod series;
pub mod signal;
pub mod stroke;
pub mod utils;

pub use anomaly::{Anomaly, AnomalyKind, StructureError};
pub use bar::{CBar, Fractal, SBar};
pub use batch::analyze_batch;
pub use config::{EngineConfig, EngineConfigPatch, EngineProfileConfig, StrengthMode};
pub use constant::{DataError, Direction, FractalType, Level, Timeframe};
pub use divergence::{DivergenceAnalyzer, DivergenceSignal};
pub use engine::{AnalysisContext, StructureEngine};
pub use export::{
    DocumentMeta, OpenPivotBrief, PivotPosition, StructureDocument, StructureSummary,
};
pub use fractal::FractalDetector;
pub use logging::{init_logging, init_logging_with_level};
pub use normalizer::BarNormalizer;
pub use pivot::{Pivot, PivotBuilder, PivotStatus};
pub use run::Run;
pub use segment::{Segment, SegmentBuilder, SegmentOutput, SegmentStatus};
pub use series::{BarSeries, MarketBarInput};
pub use signal::{BuySellClassifier, BuySellKind, BuySellPoint};
pub use stroke::{Stroke, StrokeBuilder, StrokeOutput};
