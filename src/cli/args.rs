use crate::analyzers::ReportFormat;
use crate::models::SourceFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toll-etl")]
#[command(about = "Highway toll data pipeline: unpack, extract, consolidate, transform and load")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file [default: toll-etl.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

/// Every step can be run on its own; omitted paths fall back to the configuration
#[derive(Subcommand)]
pub enum Commands {
    /// Unpack the toll data archive
    Unpack {
        #[arg(short, long, help = "Archive file [default: <data_dir>/tolldata.tgz]")]
        archive: Option<PathBuf>,

        #[arg(short, long, help = "Destination directory [default: <data_dir>]")]
        destination: Option<PathBuf>,
    },

    /// Extract the retained fields from one raw source file
    Extract {
        #[arg(short, long, value_enum)]
        format: SourceFormat,

        #[arg(short, long, help = "Raw source file [default: from configuration]")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Intermediate CSV file [default: from configuration]")]
        output: Option<PathBuf>,
    },

    /// Join the intermediate files side by side
    Consolidate {
        #[arg(
            short,
            long,
            num_args = 1..,
            help = "Intermediate files in column order [default: csv, tsv, fixed-width outputs]"
        )]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Uppercase the vehicle type column
    Transform {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the database table with the transformed rows
    Load {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        database: Option<PathBuf>,

        #[arg(short, long)]
        table: Option<String>,
    },

    /// Print a sample of the loaded table
    Query {
        #[arg(short, long)]
        database: Option<PathBuf>,

        #[arg(short, long)]
        table: Option<String>,

        #[arg(short, long, help = "Number of rows [default: 10]")]
        limit: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },

    /// Run every step in order
    Run {
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,

        #[arg(long, help = "Hide the progress spinner")]
        no_progress: bool,
    },
}
