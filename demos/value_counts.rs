use crate::utils::sample_frame;
use binwise::{bin_edges, calc_value_counts, reduce_min_max};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let frame = sample_frame()?;
    let value = frame.column("value")?;

    let (min, max) = reduce_min_max(value)?;
    println!("value spans [{min}, {max}]");
    println!("edges (top-down): {:?}", bin_edges(min, max, 4)?);

    // Bar chart with 12 bars
    let vc = calc_value_counts(value, 12)?;
    for (label, count) in vc.bin_centers.iter().zip(&vc.counts) {
        println!("{label:>10.2} | {count}");
    }

    Ok(())
}
