use std::path::PathBuf;

use binwise::{calc_groupby, calc_value_counts, AggregateOp, ChartConfig, DataFrame};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _profiler = dhat::Profiler::new_heap();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/chart_data.csv"));
    let (frame, _summary) = DataFrame::load_csv(&path)?;

    let _counts = calc_value_counts(frame.column("value")?, 64)?;
    let chart = ChartConfig::new("key", 0.0, 500.0)
        .y("value")
        .stride(5.0)
        .aggregate(AggregateOp::Mean);
    let _grouped = calc_groupby(&chart, &frame)?;

    println!("Memory benchmark finished. See dhat-heap.json for details");
    Ok(())
}
