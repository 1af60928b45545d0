//! Binned group-by: rows are bucketed by a key column and a value column is
//! aggregated per bucket.
//!
//! Every split of the rayon iterator builds its own per-bin partial state;
//! partials are merged pairwise, so the result does not depend on how rows were
//! split. Empty bins are filled with [`AggregateOp::empty_fill`]: `0` for count
//! and sum, `NaN` for mean, min and max. NaN keys and NaN values are ignored.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::processor::bins::LinearBins;
use crate::processor::column::{dispatch, Column};
use crate::processor::dtype::Element;
use crate::processor::frame::DataFrame;
use crate::processor::{AggregateOp, BinwiseError, Result};

const MIN_SPLIT: usize = 4096;

/// Partial aggregate of one bin
#[derive(Debug, Clone, Copy)]
struct BinState {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for BinState {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl BinState {
    #[inline]
    fn push(&mut self, v: f64) {
        if v.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += v;
        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }
    }

    fn merge(&mut self, other: &BinState) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    fn finish(&self, op: AggregateOp) -> f64 {
        if self.count == 0 {
            return op.empty_fill();
        }
        match op {
            AggregateOp::Count => self.count as f64,
            AggregateOp::Sum => self.sum,
            AggregateOp::Mean => self.sum / self.count as f64,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

fn bin_indices<F>(key: &Column, locate: F) -> Vec<Option<usize>>
where
    F: Fn(f64) -> Option<usize> + Sync,
{
    dispatch!(key, values => locate_all(values, &locate))
}

fn locate_all<E: Element, F>(values: &[E], locate: &F) -> Vec<Option<usize>>
where
    F: Fn(f64) -> Option<usize> + Sync,
{
    values.par_iter().map(|v| locate(v.to_f64())).collect()
}

fn fold_bins(indices: &[Option<usize>], value: &Column, count: usize) -> Vec<BinState> {
    dispatch!(value, values => fold_slice(indices, values, count))
}

fn fold_slice<E: Element>(indices: &[Option<usize>], values: &[E], count: usize) -> Vec<BinState> {
    indices
        .par_iter()
        .zip(values.par_iter())
        .with_min_len(MIN_SPLIT)
        .fold(
            || vec![BinState::default(); count],
            |mut states, (idx, v)| {
                if let Some(i) = idx {
                    states[*i].push(v.to_f64());
                }
                states
            },
        )
        .reduce(
            || vec![BinState::default(); count],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(&right) {
                    l.merge(r);
                }
                left
            },
        )
}

fn distinct_per_bin(indices: &[Option<usize>], key: &Column, count: usize) -> Vec<HashSet<u64>> {
    dispatch!(key, values => distinct_slice(indices, values, count))
}

fn distinct_slice<E: Element>(
    indices: &[Option<usize>],
    values: &[E],
    count: usize,
) -> Vec<HashSet<u64>> {
    indices
        .par_iter()
        .zip(values.par_iter())
        .with_min_len(MIN_SPLIT)
        .fold(
            || vec![HashSet::new(); count],
            |mut sets, (idx, v)| {
                if let Some(i) = idx {
                    // +0.0 and -0.0 are the same value
                    let v = v.to_f64() + 0.0;
                    sets[*i].insert(v.to_bits());
                }
                sets
            },
        )
        .reduce(
            || vec![HashSet::new(); count],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    l.extend(r);
                }
                left
            },
        )
}

fn check_shape(key: &Column, value: &Column) -> Result<()> {
    if key.len() != value.len() {
        return Err(BinwiseError::ShapeMismatch {
            left: key.len(),
            right: value.len(),
        });
    }
    Ok(())
}

/// Dense per-bin aggregates with their bin centers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupByResult {
    pub bin_centers: Vec<f64>,
    pub aggregates: Vec<f64>,
}

/// Aggregates `value` over `bin_count` equal bins of `key` spanning
/// `[value_min, value_max]`.
///
/// Rows whose key falls outside the range are dropped; a key equal to
/// `value_max` belongs to the last bin.
pub fn group_by(
    key: &Column,
    value: &Column,
    bin_count: usize,
    value_min: f64,
    value_max: f64,
    op: AggregateOp,
) -> Result<GroupByResult> {
    check_shape(key, value)?;
    let bins = LinearBins::over_range(value_min, value_max, bin_count)?;
    let indices = bin_indices(key, |v| bins.index(v));
    let states = fold_bins(&indices, value, bins.count);
    Ok(GroupByResult {
        bin_centers: bins.centers(),
        aggregates: states.iter().map(|s| s.finish(op)).collect(),
    })
}

/// Number of distinct key values in each of `bins` equal bins over
/// `value_range`.
pub fn unique_values(key: &Column, bins: usize, value_range: (f64, f64)) -> Result<Vec<u64>> {
    let bins = LinearBins::over_range(value_range.0, value_range.1, bins)?;
    let indices = bin_indices(key, |v| bins.index(v));
    Ok(distinct_per_bin(&indices, key, bins.count)
        .iter()
        .map(|set| set.len() as u64)
        .collect())
}

/// Binning and aggregation settings of one chart.
///
/// Bins are `stride` wide starting at `min_value`. Without a stride the width
/// is `(max_value - min_value) / data_points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Key column
    pub x: String,
    /// Value column; the key column is aggregated when absent
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub stride: Option<f64>,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub data_points: Option<usize>,
    #[serde(default = "default_aggregate")]
    pub aggregate_fn: AggregateOp,
}

fn default_aggregate() -> AggregateOp {
    AggregateOp::Count
}

impl ChartConfig {
    pub fn new(x: &str, min_value: f64, max_value: f64) -> Self {
        Self {
            x: x.to_string(),
            y: None,
            stride: None,
            min_value,
            max_value,
            data_points: None,
            aggregate_fn: AggregateOp::Count,
        }
    }

    pub fn y(mut self, column: &str) -> Self {
        self.y = Some(column.to_string());
        self
    }

    pub fn stride(mut self, stride: f64) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn data_points(mut self, n: usize) -> Self {
        self.data_points = Some(n);
        self
    }

    pub fn aggregate(mut self, op: AggregateOp) -> Self {
        self.aggregate_fn = op;
        self
    }

    pub fn value_column(&self) -> &str {
        self.y.as_deref().unwrap_or(&self.x)
    }

    /// Stride-wide bins over `[min_value, max_value]`.
    pub fn binning(&self) -> Result<LinearBins> {
        let width = match (self.stride, self.data_points) {
            (Some(stride), _) => stride,
            (None, Some(0)) => {
                return Err(BinwiseError::InvalidRange("data_points must be non-zero".into()));
            }
            (None, Some(n)) => (self.max_value - self.min_value) / n as f64,
            (None, None) => {
                return Err(BinwiseError::InvalidRange(
                    "chart needs a stride or data_points".into(),
                ));
            }
        };
        LinearBins::with_width(self.min_value, self.max_value, width)
    }
}

/// `[bin labels, aggregates]` for a chart, one entry per bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateArray {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl AggregateArray {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Row-major `2 x len` layout.
    pub fn rows(&self) -> [Vec<f64>; 2] {
        [self.x.clone(), self.y.clone()]
    }
}

/// Stride-binned group-by of `chart.y` (or `chart.x`) by `chart.x`.
///
/// Bin `k` is labelled `min_value + k * stride`. Keys outside
/// `[min_value, max_value]` are dropped.
pub fn calc_groupby(chart: &ChartConfig, frame: &DataFrame) -> Result<AggregateArray> {
    let key = frame.column(&chart.x)?;
    let value = frame.column(chart.value_column())?;
    check_shape(key, value)?;
    let bins = chart.binning()?;
    debug!(
        x = %chart.x,
        y = chart.value_column(),
        bins = bins.count,
        op = %chart.aggregate_fn,
        "calc_groupby"
    );

    let indices = bin_indices(key, |v| bins.index(v));
    let states = fold_bins(&indices, value, bins.count);
    Ok(AggregateArray {
        x: bins.lower_edges(),
        y: states.iter().map(|s| s.finish(chart.aggregate_fn)).collect(),
    })
}

/// Occupied stride bins of `chart.x`, ascending, with the number of distinct
/// key values in each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueBins {
    pub bins: Vec<usize>,
    pub distinct: Vec<u64>,
}

pub fn aggregated_column_unique(chart: &ChartConfig, frame: &DataFrame) -> Result<UniqueBins> {
    let key = frame.column(&chart.x)?;
    let bins = chart.binning()?;
    let indices = bin_indices(key, |v| bins.index(v));
    let sets = distinct_per_bin(&indices, key, bins.count);

    let (bins, distinct) = sets
        .iter()
        .enumerate()
        .filter(|(_, set)| !set.is_empty())
        .map(|(i, set)| (i, set.len() as u64))
        .unzip();
    Ok(UniqueBins { bins, distinct })
}
