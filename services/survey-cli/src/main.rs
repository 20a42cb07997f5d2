//! Line-survey command-line tool.
//!
//! Summarises, queries and grids survey line data held in NetCDF files.
//! Reports are written to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use survey_common::{BoundingBox, ReferenceSystem};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use survey_cli::commands::{self, GridOptions, LinesOptions};
use survey_cli::config::CliConfig;
use survey_cli::output::print_json;

#[derive(Parser, Debug)]
#[command(name = "survey-cli")]
#[command(about = "Query and grid airborne survey line data")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "SURVEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise a line dataset
    Info {
        /// NetCDF line file
        file: PathBuf,
    },

    /// Report per-line point counts
    Lines {
        /// NetCDF line file
        file: PathBuf,

        /// Line number to include (repeatable; default: all lines)
        #[arg(short, long = "line")]
        lines: Vec<i64>,

        /// Attributes to include, comma separated
        #[arg(long, value_delimiter = ',')]
        variables: Vec<String>,

        /// Bounding box as minx,miny,maxx,maxy
        #[arg(long)]
        bounds: Option<BoundingBox>,

        /// Reference system of --bounds (default: the dataset's)
        #[arg(long)]
        bounds_crs: Option<ReferenceSystem>,

        /// Keep points at least this many metres apart along each line
        #[arg(long)]
        subsample: Option<f64>,

        /// Report the along-line length of each line
        #[arg(long)]
        distance: bool,
    },

    /// Grid attributes onto a regular raster
    Grid {
        /// NetCDF line file
        file: PathBuf,

        /// Cell size in target system units
        #[arg(short, long)]
        resolution: f64,

        /// Attributes to grid, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        variables: Vec<String>,

        /// Bounding box as minx,miny,maxx,maxy
        #[arg(long)]
        bounds: Option<BoundingBox>,

        /// Reference system of --bounds (default: the dataset's)
        #[arg(long)]
        bounds_crs: Option<ReferenceSystem>,

        /// Output reference system (default: the dataset's, or its UTM zone)
        #[arg(long)]
        target_crs: Option<ReferenceSystem>,

        /// Use every Kth point
        #[arg(long)]
        point_step: Option<usize>,

        /// nearest, mean or idw
        #[arg(short, long)]
        method: Option<String>,

        /// Output grid path
        #[arg(short, long, default_value = "grid.asc")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    netcdf_reader::silence_hdf5_errors();

    let config = CliConfig::load(args.config.as_deref())?;
    info!(method = config.processing.method.name(), "Loaded configuration");

    match args.command {
        Command::Info { file } => {
            let dataset = commands::load_dataset(&file)?;
            print_json(&commands::info(&dataset, &config))?;
        }
        Command::Lines {
            file,
            lines,
            variables,
            bounds,
            bounds_crs,
            subsample,
            distance,
        } => {
            let dataset = commands::load_dataset(&file)?;
            let options = LinesOptions {
                lines,
                variables,
                bounds,
                bounds_system: bounds_crs,
                subsample,
                distance,
            };
            print_json(&commands::lines(&dataset, &options)?)?;
        }
        Command::Grid {
            file,
            resolution,
            variables,
            bounds,
            bounds_crs,
            target_crs,
            point_step,
            method,
            output,
        } => {
            let dataset = commands::load_dataset(&file)?;
            let options = GridOptions {
                resolution,
                variables,
                bounds,
                bounds_system: bounds_crs,
                target_system: target_crs,
                point_step,
                method,
                output,
            };
            print_json(&commands::grid(&dataset, &options, &config)?)?;
        }
    }

    Ok(())
}
