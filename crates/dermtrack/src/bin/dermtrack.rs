//! dermtrack CLI: lesion asymmetry, correspondence resolution, batch analysis
//! and cross-scan tracking.

use clap::{Args, Parser, Subcommand, ValueEnum};
use dermtrack::asymmetry::{AsymmetryParams, MirrorAxis};
use dermtrack::core::UnitPoint;
use dermtrack::correspondence::{ResolverParams, SearchStrategy};
use dermtrack::pipeline::{save_asymmetry_images, BatchConfig, TrackConfig};
use dermtrack::run;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "dermtrack")]
#[command(about = "Score skin-lesion asymmetry and track lesions across photographs")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit structured JSON logs (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the bilateral asymmetry of a binary lesion mask.
    Asymmetry(AsymmetryArgs),

    /// Resolve lesion points in image A to image B from keypoint correspondences.
    Resolve(ResolveArgs),

    /// Crop and analyze every detected lesion of a full image.
    Batch(ConfigArgs),

    /// Re-identify the lesions of image A in image B.
    Track(ConfigArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MirrorAxisArg {
    /// Vertical line through the centroid of the aligned mask.
    Centroid,
    /// Vertical center line of the frame.
    FrameCenter,
}

impl From<MirrorAxisArg> for MirrorAxis {
    fn from(arg: MirrorAxisArg) -> Self {
        match arg {
            MirrorAxisArg::Centroid => MirrorAxis::Centroid,
            MirrorAxisArg::FrameCenter => MirrorAxis::FrameCenter,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    BruteForce,
    KdTree,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => SearchStrategy::Auto,
            StrategyArg::BruteForce => SearchStrategy::BruteForce,
            StrategyArg::KdTree => SearchStrategy::KdTree,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct AsymmetryArgs {
    /// Path to the mask image; every non-zero pixel is lesion.
    #[arg(long)]
    mask: PathBuf,

    /// Write the result JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory for aligned/mirrored/difference PNGs.
    #[arg(long)]
    diagnostics_dir: Option<PathBuf>,

    /// Mirror axis used after alignment.
    #[arg(long, value_enum, default_value_t = MirrorAxisArg::Centroid)]
    mirror_axis: MirrorAxisArg,
}

#[derive(Debug, Clone, Args)]
struct ResolveArgs {
    /// JSON array of keypoint correspondences.
    #[arg(long)]
    correspondences: PathBuf,

    /// Query point `u,v` in A's unit-square coordinates (repeatable).
    #[arg(long = "query", value_parser = parse_unit_point)]
    queries: Vec<UnitPoint>,

    /// JSON array of query points, appended after `--query` points.
    #[arg(long)]
    queries_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    strategy: StrategyArg,

    /// Report matches farther than this (unit-square units) as unmatched.
    #[arg(long)]
    max_distance: Option<f64>,

    /// Write the assignments JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Path to the JSON config.
    #[arg(long)]
    config: PathBuf,

    /// Override the report path from the config.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct AsymmetryReport {
    mask_path: String,
    score: f64,
    orientation: f64,
    area: f64,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Asymmetry(args) => run_asymmetry(&args),
        Commands::Resolve(args) => run_resolve(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::Track(args) => run_track(&args),
    }
}

fn init_logging(verbose: u8, json_logs: bool) {
    let level = dermtrack::core::level_from_verbosity(verbose);
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        dermtrack::core::init_tracing(level, json_logs);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json_logs {
            eprintln!("warning: --json-logs requires the `tracing` feature");
        }
        let _ = dermtrack::core::init_with_level(level);
    }
}

fn parse_unit_point(s: &str) -> Result<UnitPoint, String> {
    let (u, v) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `u,v`, got `{s}`"))?;
    let u: f64 = u.trim().parse().map_err(|e| format!("bad u in `{s}`: {e}"))?;
    let v: f64 = v.trim().parse().map_err(|e| format!("bad v in `{s}`: {e}"))?;
    Ok(UnitPoint::new(u, v))
}

fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_asymmetry(args: &AsymmetryArgs) -> CliResult<()> {
    let params = AsymmetryParams {
        mirror_axis: args.mirror_axis.into(),
        keep_images: args.diagnostics_dir.is_some(),
        ..AsymmetryParams::default()
    };
    let mask = run::open_mask(&args.mask)?;
    let result = run::score_mask(&mask, params)?;

    if let (Some(dir), Some(images)) = (&args.diagnostics_dir, &result.images) {
        let stem = args
            .mask
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mask".to_string());
        let paths = save_asymmetry_images(images, dir, &stem)?;
        log::info!("diagnostics written to {}", paths.aligned.display());
    }

    let report = AsymmetryReport {
        mask_path: args.mask.display().to_string(),
        score: result.score,
        orientation: result.orientation,
        area: result.area,
    };
    emit_json(&report, args.out.as_deref())
}

fn run_resolve(args: &ResolveArgs) -> CliResult<()> {
    let mut queries = args.queries.clone();
    if let Some(path) = &args.queries_file {
        let raw = fs::read_to_string(path)?;
        let more: Vec<UnitPoint> = serde_json::from_str(&raw)?;
        queries.extend(more);
    }
    if queries.is_empty() {
        return Err("no queries given; use --query u,v or --queries-file".into());
    }

    let params = ResolverParams {
        strategy: args.strategy.into(),
        max_distance: args.max_distance,
        ..ResolverParams::default()
    };
    let assignments = run::resolve_file(&queries, &args.correspondences, params)?;
    emit_json(&assignments, args.out.as_deref())
}

fn run_batch(args: &ConfigArgs) -> CliResult<()> {
    let cfg = BatchConfig::load_json(&args.config)?;
    let report = run::run_batch(&cfg)?;
    let out = args.out.clone().unwrap_or_else(|| cfg.output_path());
    report.write_json(&out)?;
    println!(
        "analyzed {} lesions ({} failed), report: {}",
        report.num_lesions,
        report.num_failed,
        out.display()
    );
    Ok(())
}

fn run_track(args: &ConfigArgs) -> CliResult<()> {
    let cfg = TrackConfig::load_json(&args.config)?;
    let report = run::run_track(&cfg)?;
    let out = args.out.clone().unwrap_or_else(|| cfg.output_path());
    report.write_json(&out)?;
    println!(
        "matched {} of {} lesions, report: {}",
        report.matches_count,
        report.num_lesions,
        out.display()
    );
    Ok(())
}
