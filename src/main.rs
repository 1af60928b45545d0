//! `binwise` command line: chart statistics over a numeric CSV file.
//!
//! ```bash
//! binwise --input data.csv value-counts --column value --bins 20
//! binwise --input data.csv groupby --x id --y value --min 0 --max 1000 --stride 10 --agg mean
//! binwise --input data.csv groupby --chart chart.json
//! RUST_LOG=binwise=debug binwise --input data.csv minmax --column value
//! ```
//!
//! Results are printed as JSON on stdout.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use binwise::{
    aggregated_column_unique, calc_groupby, calc_value_counts_with, get_binwise_reduced_column,
    histogram_with, reduce_min_max_with, AggregateOp, ChartConfig, DataFrame, Device,
    DeviceConfig,
};
use clap::{Args, Parser, Subcommand};
use jemallocator::Jemalloc;
use serde_json::json;
use tracing::info;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "binwise")]
#[command(about = "Binned chart statistics over numeric CSV columns")]
#[command(version)]
struct Cli {
    /// Input CSV file with a header row
    #[arg(short, long)]
    input: PathBuf,

    /// Worker threads (overrides BINWISE_THREADS)
    #[arg(long)]
    threads: Option<usize>,

    /// Launch grid size (overrides BINWISE_GRID)
    #[arg(long)]
    grid: Option<u32>,

    /// Launch block size (overrides BINWISE_BLOCK)
    #[arg(long)]
    block: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Minimum and maximum of a column
    Minmax {
        #[arg(short, long)]
        column: String,
    },
    /// Histogram counts over equal-width bins
    Hist {
        #[arg(short, long)]
        column: String,
        #[arg(short, long, default_value_t = 10)]
        bins: usize,
        /// Lower bound; defaults to the column minimum
        #[arg(long)]
        min: Option<f64>,
        /// Upper bound; defaults to the column maximum
        #[arg(long)]
        max: Option<f64>,
    },
    /// Bin labels and counts for a bar chart
    ValueCounts {
        #[arg(short, long)]
        column: String,
        #[arg(short, long, default_value_t = 10)]
        bins: usize,
    },
    /// Stride-downsampled column for line charts
    Reduce {
        #[arg(short, long)]
        column: String,
        #[arg(short, long)]
        stride: usize,
    },
    /// Binned group-by aggregate
    Groupby(ChartArgs),
    /// Distinct key counts per occupied bin
    Unique(ChartArgs),
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// JSON chart config; replaces the flags below
    #[arg(long, conflicts_with_all = ["x", "y", "min", "max", "stride", "data_points", "agg"])]
    chart: Option<PathBuf>,
    #[arg(long, required_unless_present = "chart")]
    x: Option<String>,
    #[arg(long)]
    y: Option<String>,
    #[arg(long, required_unless_present = "chart")]
    min: Option<f64>,
    #[arg(long, required_unless_present = "chart")]
    max: Option<f64>,
    #[arg(long)]
    stride: Option<f64>,
    #[arg(long)]
    data_points: Option<usize>,
    /// count, mean, sum, min or max
    #[arg(long, default_value = "count")]
    agg: String,
}

impl ChartArgs {
    fn to_chart(&self) -> Result<ChartConfig, Box<dyn Error>> {
        if let Some(path) = &self.chart {
            return load_chart(path);
        }
        let (Some(x), Some(min), Some(max)) = (&self.x, self.min, self.max) else {
            return Err("--x, --min and --max are required without --chart".into());
        };
        let op: AggregateOp = self.agg.parse()?;
        let mut chart = ChartConfig::new(x, min, max).aggregate(op);
        if let Some(y) = &self.y {
            chart = chart.y(y);
        }
        if let Some(stride) = self.stride {
            chart = chart.stride(stride);
        }
        if let Some(n) = self.data_points {
            chart = chart.data_points(n);
        }
        Ok(chart)
    }
}

fn load_chart(path: &Path) -> Result<ChartConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn device_config(cli: &Cli) -> Result<DeviceConfig, Box<dyn Error>> {
    let mut config = DeviceConfig::from_env()?;
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if let Some(grid) = cli.grid {
        config.launch.grid = grid;
    }
    if let Some(block) = cli.block {
        config.launch.block = block;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let device = Device::new(device_config(&cli)?)?;

    let (frame, summary) = device.run(|_| DataFrame::load_csv(&cli.input))?;
    info!(
        rows = summary.rows_processed,
        skipped = summary.errors.len(),
        "loaded {}",
        cli.input.display()
    );

    let output = match &cli.command {
        Command::Minmax { column } => {
            let staged = device.stage(frame.column(column)?);
            let (min, max) = device.run(|launch| reduce_min_max_with(launch, &staged))?;
            json!({ "column": column, "min": min, "max": max })
        }
        Command::Hist {
            column,
            bins,
            min,
            max,
        } => {
            let staged = device.stage(frame.column(column)?);
            let counts = device.run(|launch| {
                let (lo, hi) = match (min, max) {
                    (Some(lo), Some(hi)) => (*lo, *hi),
                    _ => {
                        let (col_min, col_max) = reduce_min_max_with(launch, &staged)?;
                        (min.unwrap_or(col_min), max.unwrap_or(col_max))
                    }
                };
                histogram_with(launch, &staged, lo, hi, *bins)
            })?;
            json!({ "column": column, "counts": counts })
        }
        Command::ValueCounts { column, bins } => {
            let staged = device.stage(frame.column(column)?);
            let counts = device.run(|launch| calc_value_counts_with(launch, &staged, *bins))?;
            serde_json::to_value(counts)?
        }
        Command::Reduce { column, stride } => {
            let staged = device.stage(frame.column(column)?);
            let reduced = device.run(|launch| {
                let range = reduce_min_max_with(launch, &staged)?;
                get_binwise_reduced_column(&staged, *stride, range)
            })?;
            json!({ "column": column, "values": reduced.to_f64_vec() })
        }
        Command::Groupby(args) => {
            let chart = args.to_chart()?;
            let out = device.run(|_| calc_groupby(&chart, &frame))?;
            serde_json::to_value(out)?
        }
        Command::Unique(args) => {
            let chart = args.to_chart()?;
            let out = device.run(|_| aggregated_column_unique(&chart, &frame))?;
            serde_json::to_value(out)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
