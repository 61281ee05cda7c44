use std::path::PathBuf;

use chanlun::{EngineConfig, EngineProfileConfig, StructureEngine, Timeframe, init_logging};
use replay::{load_bar_series, write_json, write_parquet_snapshot};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "usage: cargo run -p replay --bin export_structures -- <csv_path> <symbol> <timeframe:1m|5m|15m|30m|1h|4h|1d> [output_json] [config_yaml] [max_rows]"
        );
        std::process::exit(2);
    }

    let csv_path = PathBuf::from(&args[1]);
    let symbol = args[2].clone();
    let timeframe = Timeframe::parse(&args[3])?;
    let output = if args.len() >= 5 {
        PathBuf::from(&args[4])
    } else {
        PathBuf::from(format!(
            "output/{}_{}_structures.json",
            symbol.replace(['/', '.'], "_").to_ascii_lowercase(),
            timeframe.as_str()
        ))
    };
    let config = if args.len() >= 6 && !args[5].is_empty() {
        EngineProfileConfig::from_yaml_file(&args[5])?.resolve_for(&symbol, timeframe)?
    } else {
        EngineConfig::default()
    };
    let max_rows = if args.len() >= 7 {
        Some(args[6].parse::<usize>()?)
    } else {
        None
    };

    let series = load_bar_series(&csv_path, &symbol, timeframe, max_rows)?;
    let engine = StructureEngine::new(config)?;
    let doc = engine.analyze(&series);

    write_json(&doc, &output)?;
    let parquet_dir = output
        .parent()
        .map(|x| x.join("parquet"))
        .unwrap_or_else(|| PathBuf::from("parquet"));
    write_parquet_snapshot(&doc, &parquet_dir)?;

    let last_price = series.last_close().unwrap_or_default();
    let summary = doc.summary(last_price);
    info!(
        bars = summary.bar_count,
        strokes = summary.stroke_count,
        segments = summary.segment_count,
        pivots = summary.pivot_count,
        output = %output.display(),
        "structures exported"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
