use rand::Rng;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

/// Writes a numeric chart dataset: a row id, a repeating key, a noisy
/// measurement and a small integer category.
///
/// Usage: `data_generator [rows] [path]`
fn main() -> std::io::Result<()> {
    let mut args = env::args().skip(1);
    let rows: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000_000);
    let path = args.next().unwrap_or_else(|| "data/chart_data.csv".to_string());

    if let Some(dir) = std::path::Path::new(&path).parent() {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(&path)?);
    writeln!(writer, "id,key,value,category")?;

    let mut rng = rand::rng();
    for i in 0..rows {
        let key = (i % 1000) as f64 * 0.5;
        let value: f64 = key.sin() * 100.0 + rng.random_range(-10.0..10.0);
        let category: u8 = rng.random_range(0..8);
        writeln!(writer, "{},{:.1},{:.4},{}", i, key, value, category)?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {} ({} rows)", path, rows);
    Ok(())
}
