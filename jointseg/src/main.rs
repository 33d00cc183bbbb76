//! Jointseg CLI - segment and differentiate robot joint CSV logs
//!
//! # Commands
//!
//! ```bash
//! jointseg segment robot_data.csv -t timestamp --threshold 0.2 -o motion_segments
//! jointseg derive test.csv output_with_derivatives.csv
//! jointseg rank robot_data.csv -n 3
//! jointseg inspect robot_data.csv
//! ```
//!
//! Options can also be set through `JOINTSEG_*` environment variables or
//! a `.env` file in the working directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jointseg::logs::log_warning;
use jointseg::{
    inspect, run_derivatives, run_ranking, run_segmentation, DerivativeOptions, LoadOptions,
    PipelineError, PipelineResult, RankOptions, SegmentOptions, WriteError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jointseg", version)]
#[command(about = "Segment and differentiate timestamped robot joint telemetry", long_about = None)]
struct Cli {
    /// CSV delimiter (auto-detect with "auto")
    #[arg(short, long, global = true, default_value = ",", env = "JOINTSEG_DELIMITER")]
    delimiter: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a CSV file into motion segments at timestamp gaps
    Segment {
        /// Input CSV file
        input: PathBuf,

        /// Name of the timestamp column
        #[arg(
            short = 't',
            long = "timestamp-col",
            default_value = "timestamp",
            env = "JOINTSEG_TIMESTAMP_COL"
        )]
        timestamp_col: String,

        /// Gap threshold, in timestamp units (seconds for calendar timestamps)
        #[arg(long, visible_alias = "th", default_value_t = 0.1, env = "JOINTSEG_THRESHOLD")]
        threshold: f64,

        /// Output directory for segment files
        #[arg(
            short,
            long = "output-dir",
            default_value = "segments",
            env = "JOINTSEG_OUTPUT_DIR"
        )]
        output_dir: PathBuf,

        /// Dominant columns recorded per segment
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },

    /// Append time derivatives of every numeric column
    Derive {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file
        #[arg(default_value = "output_with_derivatives.csv")]
        output: PathBuf,

        /// Name of the time column
        #[arg(
            short = 't',
            long = "timestamp-col",
            default_value = "timestamp",
            env = "JOINTSEG_TIMESTAMP_COL"
        )]
        timestamp_col: String,

        /// Columns ending with this suffix are not differentiated
        #[arg(long, default_value = "_hat", env = "JOINTSEG_EXCLUDE_SUFFIX")]
        exclude_suffix: String,
    },

    /// Rank the columns of a CSV file by variation
    Rank {
        /// Input CSV file
        input: PathBuf,

        /// Column left out of the ranking
        #[arg(
            short = 't',
            long = "timestamp-col",
            default_value = "timestamp",
            env = "JOINTSEG_TIMESTAMP_COL"
        )]
        timestamp_col: String,

        /// Number of columns to show
        #[arg(short = 'n', long, default_value_t = 3)]
        top: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the inferred column types of a CSV file
    Inspect {
        /// Input CSV file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load = match load_options(&cli.delimiter) {
        Some(load) => load,
        None => {
            eprintln!(
                "❌ Error: delimiter must be a single character or \"auto\", got '{}'",
                cli.delimiter
            );
            return ExitCode::from(3);
        }
    };

    let result = match cli.command {
        Commands::Segment {
            input,
            timestamp_col,
            threshold,
            output_dir,
            top_n,
        } => cmd_segment(
            &input,
            SegmentOptions {
                timestamp_column: timestamp_col,
                threshold,
                output_dir,
                metadata_top_n: top_n,
                load,
            },
        ),

        Commands::Derive {
            input,
            output,
            timestamp_col,
            exclude_suffix,
        } => cmd_derive(
            &input,
            &output,
            DerivativeOptions {
                time_column: timestamp_col,
                exclude_suffix,
                load,
            },
        ),

        Commands::Rank {
            input,
            timestamp_col,
            top,
            json,
        } => cmd_rank(
            &input,
            RankOptions {
                timestamp_column: timestamp_col,
                top_n: top,
                load,
            },
            json,
        ),

        Commands::Inspect { input } => cmd_inspect(&input, &load),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ PipelineError::NoSegmentsFound { .. }) => {
            log_warning(e.to_string());
            e.exit_code()
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            e.exit_code()
        }
    }
}

fn load_options(delimiter: &str) -> Option<LoadOptions> {
    let delimiter = match delimiter {
        "auto" => None,
        "\\t" | "tab" => Some('\t'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => return None,
            }
        }
    };
    Some(LoadOptions {
        delimiter,
        ..LoadOptions::default()
    })
}

fn cmd_segment(input: &Path, options: SegmentOptions) -> PipelineResult<()> {
    run_segmentation(input, &options)?;
    Ok(())
}

fn cmd_derive(input: &Path, output: &Path, options: DerivativeOptions) -> PipelineResult<()> {
    run_derivatives(input, output, &options)?;
    Ok(())
}

fn cmd_rank(input: &Path, options: RankOptions, json: bool) -> PipelineResult<()> {
    let ranked = run_ranking(input, &options)?;

    if json {
        let text = serde_json::to_string_pretty(&ranked).map_err(WriteError::from)?;
        println!("{}", text);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No numeric columns to rank.");
        return Ok(());
    }
    println!("{:<4} {:<24} {:>14} {:>14} {:>14}", "#", "column", "std", "range", "score");
    for (i, r) in ranked.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:>14.6} {:>14.6} {:>14.6}",
            i + 1,
            r.column,
            r.score.std,
            r.score.range,
            r.score.combined_score
        );
    }
    Ok(())
}

fn cmd_inspect(input: &Path, load: &LoadOptions) -> PipelineResult<()> {
    let summary = inspect(input, load)?;
    let text = serde_json::to_string_pretty(&summary).map_err(WriteError::from)?;
    println!("{}", text);
    Ok(())
}
