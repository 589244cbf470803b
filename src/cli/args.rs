use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gdd-timelapse")]
#[command(about = "Weekly growing-degree-day time-lapse generator for pest risk maps")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the frame dataset and render contour frames for every profile
    Generate {
        #[arg(short, long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Observation file; .parquet is read as Parquet, anything else as CSV"
        )]
        source: Option<PathBuf>,

        #[arg(short, long, help = "Pest risk profile JSON file")]
        profiles: Option<PathBuf>,

        #[arg(short, long, help = "Output directory")]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Run date (YYYY-MM-DD) [default: today]")]
        as_of: Option<String>,

        #[arg(long, help = "Threads rendering profiles in parallel")]
        workers: Option<usize>,

        #[arg(long, help = "Subtracted from each daily temperature before summing")]
        base_temperature: Option<f64>,

        #[arg(long, default_value = "false", help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Display a summary of a written frame dataset
    Inspect {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "5", help = "Points to list")]
        sample: usize,
    },
}
