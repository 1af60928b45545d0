//! # binwise
//!
//! `binwise` computes the binned statistics behind interactive charts over
//! large numeric columns. It supports:
//!
//! - Per-dtype value ranges for integer and float columns
//! - Parallel min/max reduction into an atomic accumulator
//! - Histograms and bar-chart value counts over equal-width bins
//! - Stride downsampling for line and area charts
//! - Binned group-by with count, mean, sum, min and max
//! - Distinct key counts per occupied bin
//! - Memory-mapped CSV loading into a [`DataFrame`]
//! - Cached chart results for repeated cross-filter queries
//!
//! Kernels run on a rayon pool with a GPU-style launch shape
//! ([`LaunchConfig`]): `grid * block` logical workers each visit a
//! grid-stride slice of the input. Results do not depend on the shape.
//!
//! # Example
//!
//! ```rust
//! use binwise::{calc_groupby, calc_value_counts, AggregateOp, ChartConfig, Column, DataFrame};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let frame = DataFrame::from_columns(vec![
//!         ("key".to_string(), Column::from(vec![0.0f64, 1.0, 1.0, 2.0])),
//!         ("val".to_string(), Column::from(vec![4i64, 2, 6, 1])),
//!     ])?;
//!
//!     // Bar chart of a column
//!     let counts = calc_value_counts(frame.column("key")?, 2)?;
//!     assert_eq!(counts.counts, vec![1, 3]);
//!
//!     // Mean of `val` per unit-wide bin of `key`
//!     let chart = ChartConfig::new("key", 0.0, 2.0)
//!         .y("val")
//!         .stride(1.0)
//!         .aggregate(AggregateOp::Mean);
//!     let out = calc_groupby(&chart, &frame)?;
//!     assert_eq!(out.x, vec![0.0, 1.0, 2.0]);
//!     assert_eq!(out.y, vec![4.0, 4.0, 1.0]);
//!
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod processor;

#[cfg(feature = "python-bindings")]
pub mod python;

pub use helpers::atomic_float::{AccumulatorFloat, AtomicSlot};
pub use processor::bins::{bin_edges, get_bin_edges, LinearBins};
pub use processor::cache::ChartCache;
pub use processor::column::Column;
pub use processor::dtype::{dtype_min_max, range_for, DType, Element};
pub use processor::frame::{DataFrame, ParseError, ParseSummary};
pub use processor::groupby::{
    aggregated_column_unique, calc_groupby, group_by, unique_values, AggregateArray, ChartConfig,
    GroupByResult, UniqueBins,
};
pub use processor::histogram::{
    calc_value_counts, calc_value_counts_with, histogram, histogram_kernel, histogram_with,
    ValueCounts,
};
pub use processor::launch::{Device, DeviceConfig, LaunchConfig, StagedColumn};
pub use processor::minmax::{min_max, reduce_min_max, reduce_min_max_with, MinMaxAccumulator};
pub use processor::stride::{binwise_index_column, get_binwise_reduced_column, reduce_by_stride};
pub use processor::{AggregateOp, BinwiseError, Result, Scalar};
