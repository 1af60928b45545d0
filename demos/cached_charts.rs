use std::time::Instant;

use crate::utils::sample_frame;
use binwise::{AggregateOp, ChartCache, ChartConfig};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let frame = sample_frame()?;
    let cache = ChartCache::new();

    // A dashboard redrawing the same charts after unrelated interactions
    for round in 0..3 {
        let start = Instant::now();
        for op in AggregateOp::ALL {
            let chart = ChartConfig::new("key", 0.0, 500.0)
                .y("value")
                .data_points(50)
                .aggregate(op);
            cache.calc_groupby(&chart, &frame)?;
        }
        cache.value_counts(&frame, "value", 20)?;
        println!(
            "round {round}: {:?} ({} cached results)",
            start.elapsed(),
            cache.len()
        );
    }

    Ok(())
}
