//! Offline prefecture GeoJSON optimizer
//!
//! Usage:
//!   cargo run --release --bin optimize_geojson -- [input] [options]
//!
//! Simplifies every ring, trims properties down to what the map needs and
//! reports how much smaller the result is.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use travel_map::data::{
    compress_features, merge_progress, minify_properties, read_collection, simplify_collection,
    PrefectureProgress, ProgressTable, MINIFIED_PROPERTIES, OPTIMIZE_TOLERANCE,
};

#[derive(Parser, Debug)]
#[clap(
    about,
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=travel_map=debug."
)]
struct Args {
    /// GeoJSON file to optimize
    #[clap(default_value = "public/japan-prefectures.geojson")]
    input: PathBuf,
    /// Where to write the result [DEFAULT: <input>-optimized.geojson]
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Douglas-Peucker tolerance in degrees (0.005 is about 500 m)
    #[clap(short, long, default_value_t = OPTIMIZE_TOLERANCE)]
    tolerance: f64,
    /// Properties to keep, comma separated [DEFAULT: id,nam_ja,nam]
    #[clap(short, long, value_delimiter = ',')]
    keep_properties: Vec<String>,
    /// JSON array of {id, name, visited, total} records to merge into the output
    #[clap(short, long)]
    progress: Option<PathBuf>,
    /// Write the compact exterior-ring encoding instead of GeoJSON
    #[clap(long)]
    compressed: bool,
}

fn default_output(input: &Path, compressed: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let suffix = if compressed { "compressed.json" } else { "optimized.geojson" };
    input.with_file_name(format!("{}-{}", stem, suffix))
}

fn read_progress(path: &Path) -> anyhow::Result<ProgressTable> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<PrefectureProgress> =
        serde_json::from_str(&text).with_context(|| format!("{} is not a progress array", path.display()))?;
    Ok(records.into_iter().collect())
}

fn megabytes(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "travel_map=info,optimize_geojson=info");
    env_logger::Builder::from_env(env).init();

    let args = Args::parse();
    if !(args.tolerance.is_finite() && args.tolerance >= 0.0) {
        anyhow::bail!("tolerance must be a non-negative number, got {}", args.tolerance);
    }
    let start = Instant::now();

    log::info!("Reading {}", args.input.display());
    let original_size = fs::metadata(&args.input)
        .with_context(|| format!("Failed to stat {}", args.input.display()))?
        .len();
    let collection = read_collection(&args.input)?;
    log::info!("Original file size: {}MB", megabytes(original_size));
    log::info!("Original features count: {}", collection.features.len());

    log::info!("Simplifying geometry (tolerance {})...", args.tolerance);
    let simplified = simplify_collection(&collection, args.tolerance);

    log::info!("Minifying properties...");
    let keep: Vec<&str> = if args.keep_properties.is_empty() {
        MINIFIED_PROPERTIES.to_vec()
    } else {
        args.keep_properties.iter().map(String::as_str).collect()
    };
    let mut optimized = minify_properties(&simplified, &keep);

    if let Some(path) = &args.progress {
        let table = read_progress(path)?;
        log::info!("Merging {} progress records", table.len());
        merge_progress(&mut optimized, &table);
    }

    let content = if args.compressed {
        let packed = compress_features(&optimized.features).context("Failed to compress features")?;
        serde_json::to_string(&packed)?
    } else {
        serde_json::to_string(&optimized)?
    };

    let optimized_size = content.len() as u64;
    log::info!("Optimized file size: {}MB", megabytes(optimized_size));
    if original_size > 0 {
        let ratio = (1.0 - optimized_size as f64 / original_size as f64) * 100.0;
        log::info!("Compression ratio: {}%", ratio.round());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.compressed));
    fs::write(&output, content).with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Optimized file saved to: {} ({:.2?})", output.display(), start.elapsed());

    Ok(())
}
