//! plotrace: trace the dark pixels of an image into a pen-plotter SVG.
//!
//! Loads an image, thresholds it by luminance, walks the foreground
//! into paths, orders them to cut pen-up travel, and writes the result
//! as an SVG document.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin plotrace -- [OPTIONS] <IMAGE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use plotrace_export::{SvgMetadata, to_travel_diagnostic_svg};
use plotrace_io::{ExportController, ExportTrigger, FileSink, ImageFileSource};
use plotrace_pipeline::PipelineConfig;
use tracing::Level;

/// Trace an image into an SVG for pen plotters.
///
/// Pixels darker than the threshold become ink. Ink is walked into
/// paths, the paths are reordered nearest-first, and the result is
/// written as one `<path>` per stroke.
#[derive(Parser)]
#[command(name = "plotrace", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image: PathBuf,

    /// Directory to write the SVG into.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output filename. Defaults to `reef-<seed>.svg` with `--seed`,
    /// otherwise `plotter-optimized.svg`.
    #[arg(long)]
    filename: Option<String>,

    /// Scene seed used to name the output file.
    #[arg(long)]
    seed: Option<String>,

    /// Luminance threshold in [0, 1]; darker pixels are traced.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Stroke color for every path.
    #[arg(long, default_value = PipelineConfig::DEFAULT_LINE_COLOR)]
    line_color: String,

    /// Drop points whose heading changes by no more than this many
    /// degrees. Off unless given.
    #[arg(long, num_args = 0..=1, default_missing_value = "2.0")]
    simplify_angle: Option<f64>,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, `--threshold`, `--line-color`, and
    /// `--simplify-angle` are ignored. Missing fields take their
    /// defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the per-stage diagnostics report.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Also write an SVG showing pen-up moves between paths.
    #[arg(long)]
    travel_svg: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        threshold: cli.threshold,
        line_color: cli.line_color.clone(),
        simplify_angle: cli.simplify_angle,
        ..PipelineConfig::default()
    })
}

/// Install a stderr `fmt` subscriber at the level selected by `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Image: {}", cli.image.display());
    eprintln!("Config: {config:#?}");

    let source = ImageFileSource::new(&cli.image);
    let mut controller = ExportController::new(config, FileSink::new(&cli.output_dir));
    if let Some(ref seed) = cli.seed {
        controller = controller.with_seed(seed.clone());
    }
    if let Some(ref filename) = cli.filename {
        controller = controller.with_filename(filename.clone());
    }

    let outcome = match controller.export(ExportTrigger::Command, &source) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Export failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "SVG written to {} ({} paths, {} bytes)",
        cli.output_dir.join(&outcome.filename).display(),
        outcome.document.paths.len(),
        outcome.svg_bytes,
    );

    if cli.json {
        match serde_json::to_string_pretty(&outcome.diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else if cli.diagnostics {
        println!("{}", outcome.diagnostics.report());
    }

    if let Some(ref travel_path) = cli.travel_svg {
        let title = source.path().file_stem().and_then(|s| s.to_str());
        let svg = to_travel_diagnostic_svg(
            &outcome.document,
            &SvgMetadata {
                title,
                description: Some("pen-up travel"),
                ..SvgMetadata::default()
            },
        );
        match std::fs::write(travel_path, &svg) {
            Ok(()) => {
                eprintln!(
                    "Travel SVG written to {} ({} bytes)",
                    travel_path.display(),
                    svg.len(),
                );
            }
            Err(e) => {
                eprintln!("Error writing travel SVG to {}: {e}", travel_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
