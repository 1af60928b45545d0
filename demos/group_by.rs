use crate::utils::sample_frame;
use binwise::{aggregated_column_unique, calc_groupby, AggregateOp, ChartConfig};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let frame = sample_frame()?;

    // Mean of 'value' per 25-wide bin of 'key'
    let chart = ChartConfig::new("key", 0.0, 500.0)
        .y("value")
        .stride(25.0)
        .aggregate(AggregateOp::Mean);
    let out = calc_groupby(&chart, &frame)?;
    for (x, y) in out.x.iter().zip(&out.y) {
        println!("key >= {x:>6} => {y:.3}");
    }

    let unique = aggregated_column_unique(&chart, &frame)?;
    println!("distinct keys per bin: {:?}", unique.distinct);

    Ok(())
}
