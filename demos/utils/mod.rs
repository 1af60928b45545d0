use std::path::PathBuf;

use binwise::{Column, DataFrame, Result};

/// Path of the CSV written by the `data_generator` binary, relative to the
/// crate root.
pub fn sample_csv_path() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
    // target/<profile>/examples -> crate root
    let crate_root = exe_dir.parent()?.parent()?.parent()?.to_path_buf();
    Some(crate_root.join("data").join("chart_data.csv"))
}

/// The generated sample data when present, otherwise a small in-memory frame
/// with the same columns.
pub fn sample_frame() -> Result<DataFrame> {
    if let Some(path) = sample_csv_path().filter(|p| p.exists()) {
        let (frame, summary) = DataFrame::load_csv(&path)?;
        println!(
            "Loaded {} rows from {} ({} skipped)",
            summary.rows_processed,
            path.display(),
            summary.errors.len()
        );
        return Ok(frame);
    }

    let rows = 100_000;
    let key: Vec<f64> = (0..rows).map(|i| (i % 1000) as f64 * 0.5).collect();
    let value: Vec<f64> = key.iter().map(|k| k.sin() * 100.0).collect();
    let category: Vec<i64> = (0..rows).map(|i| (i % 8) as i64).collect();
    DataFrame::from_columns(vec![
        ("id".to_string(), Column::from((0..rows as i64).collect::<Vec<_>>())),
        ("key".to_string(), Column::from(key)),
        ("value".to_string(), Column::from(value)),
        ("category".to_string(), Column::from(category)),
    ])
}
