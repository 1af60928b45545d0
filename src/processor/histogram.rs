//! Histogram counting and value counts.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::helpers::atomic_float::AccumulatorFloat;
use crate::processor::bins::{get_bin_edges, LinearBins};
use crate::processor::column::{dispatch, Column};
use crate::processor::dtype::Element;
use crate::processor::launch::{self, grid_stride, LaunchConfig};
use crate::processor::minmax::{min_max, MinMaxAccumulator};
use crate::processor::{BinwiseError, Result};

/// Adds the per-bin counts of `column` over the range held in `acc` into `out`.
///
/// `out.len()` is the bin count. Values are placed with
/// `floor((v - min) / step)` clamped into the valid bins, so `max` lands in the
/// last bin. NaNs are not counted. Existing contents of `out` are kept and
/// added to.
pub fn histogram_kernel<T: AccumulatorFloat>(
    launch: &LaunchConfig,
    column: &Column,
    acc: &MinMaxAccumulator<T>,
    out: &mut [f64],
) -> Result<()> {
    let (min, max) = acc.bounds();
    let bins = LinearBins::over_range(min, max, out.len())?;
    let counts: Vec<AtomicU64> = (0..bins.count).map(|_| AtomicU64::new(0)).collect();

    dispatch!(column, values => count_slice(launch, values, &bins, &counts))?;

    for (slot, count) in out.iter_mut().zip(counts) {
        *slot += count.into_inner() as f64;
    }
    Ok(())
}

fn count_slice<E: Element>(
    config: &LaunchConfig,
    values: &[E],
    bins: &LinearBins,
    counts: &[AtomicU64],
) -> Result<()> {
    launch::launch(config, "histogram", |tid, workers| {
        for i in grid_stride(tid, workers, values.len()) {
            if let Some(idx) = bins.index_clamped(values[i].to_f64()) {
                counts[idx].fetch_add(1, Ordering::Relaxed);
            }
        }
    })
}

/// Counts of `column` in `bins` equal-width bins over `[min, max]`.
pub fn histogram(column: &Column, min: f64, max: f64, bins: usize) -> Result<Vec<f64>> {
    histogram_with(&LaunchConfig::default(), column, min, max, bins)
}

pub fn histogram_with(
    launch: &LaunchConfig,
    column: &Column,
    min: f64,
    max: f64,
    bins: usize,
) -> Result<Vec<f64>> {
    let acc = MinMaxAccumulator::<f64>::new(min, max);
    let mut out = vec![0.0; bins];
    histogram_kernel(launch, column, &acc, &mut out)?;
    Ok(out)
}

/// Bin labels and counts for a bar chart of `column`.
///
/// Labels are the lower edge of each bin, except the last which carries the
/// column maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCounts {
    pub bin_centers: Vec<f64>,
    pub counts: Vec<u64>,
}

pub fn calc_value_counts(column: &Column, bins: usize) -> Result<ValueCounts> {
    calc_value_counts_with(&LaunchConfig::default(), column, bins)
}

pub fn calc_value_counts_with(
    launch: &LaunchConfig,
    column: &Column,
    bins: usize,
) -> Result<ValueCounts> {
    let acc = MinMaxAccumulator::<f64>::empty();
    min_max(launch, column, &acc)?;
    if !acc.is_populated() {
        return Err(BinwiseError::EmptyColumn);
    }

    let mut counts = vec![0.0; bins];
    histogram_kernel(launch, column, &acc, &mut counts)?;

    let mut bin_centers = vec![0.0; bins];
    get_bin_edges(&acc, &mut bin_centers)?;

    Ok(ValueCounts {
        bin_centers,
        counts: counts.into_iter().map(|c| c as u64).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::minmax::reduce_min_max;

    fn sample() -> Column {
        let base = [1i64, 5, 10, 15, 25, 27, 30, 23, 22, 35, 39, 99, 109, 109, 104, 11, 23];
        Column::from(base.repeat(50))
    }

    #[test]
    fn counts_reference_column() {
        let x = sample();
        let launch = LaunchConfig::new(64, 64).unwrap();
        let acc = MinMaxAccumulator::<f32>::for_dtype(x.dtype());
        min_max(&launch, &x, &acc).unwrap();

        let mut hist = [0.0; 8];
        histogram_kernel(&launch, &x, &acc, &mut hist).unwrap();
        assert_eq!(hist, [200.0, 300.0, 150.0, 0.0, 0.0, 0.0, 0.0, 200.0]);
    }

    #[test]
    fn kernel_adds_into_output() {
        let x = Column::from(vec![0.0f64, 1.0]);
        let acc = MinMaxAccumulator::<f64>::new(0.0, 1.0);
        let mut hist = [1.0, 1.0];
        histogram_kernel(&LaunchConfig::default(), &x, &acc, &mut hist).unwrap();
        assert_eq!(hist, [2.0, 2.0]);
    }

    #[test]
    fn sums_to_len_for_any_launch() {
        let data: Vec<f64> = (0..10_007).map(|i| ((i * 37) % 997) as f64 * 0.25).collect();
        let x = Column::from(data);
        let (min, max) = reduce_min_max(&x).unwrap();
        let reference = histogram_with(&LaunchConfig::new(1, 1).unwrap(), &x, min, max, 13).unwrap();
        assert_eq!(reference.iter().sum::<f64>(), 10_007.0);
        for (g, b) in [(64, 64), (3, 5), (128, 1)] {
            let got = histogram_with(&LaunchConfig::new(g, b).unwrap(), &x, min, max, 13).unwrap();
            assert_eq!(got, reference);
        }
    }

    #[test]
    fn skips_nan() {
        let x = Column::from(vec![0.0f32, f32::NAN, 1.0]);
        assert_eq!(histogram(&x, 0.0, 1.0, 2).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn invalid_ranges() {
        let x = Column::from(vec![1i32, 2]);
        assert!(matches!(histogram(&x, 0.0, 1.0, 0), Err(BinwiseError::InvalidRange(_))));
        assert!(matches!(histogram(&x, 1.0, 1.0, 4), Err(BinwiseError::InvalidRange(_))));
        assert!(matches!(histogram(&x, 2.0, 1.0, 4), Err(BinwiseError::InvalidRange(_))));
    }

    #[test]
    fn value_counts_reference() {
        let vc = calc_value_counts(&sample(), 8).unwrap();
        assert_eq!(vc.bin_centers, vec![1.0, 14.5, 28.0, 41.5, 55.0, 68.5, 82.0, 109.0]);
        assert_eq!(vc.counts, vec![200, 300, 150, 0, 0, 0, 0, 200]);
    }

    #[test]
    fn kernel_rejects_empty_output() {
        let x = Column::from(vec![0.0f64, 1.0]);
        let acc = MinMaxAccumulator::<f64>::new(0.0, 1.0);
        assert!(matches!(
            histogram_kernel(&LaunchConfig::default(), &x, &acc, &mut []),
            Err(BinwiseError::InvalidRange(_))
        ));
    }

    #[test]
    fn value_counts_with_infinite_values() {
        let x = Column::from(vec![1.0f64, f64::INFINITY, 2.0]);
        assert!(matches!(calc_value_counts(&x, 4), Err(BinwiseError::InvalidRange(_))));
    }

    #[test]
    fn value_counts_constant_column() {
        let x = Column::from(vec![4u16; 10]);
        assert!(matches!(calc_value_counts(&x, 4), Err(BinwiseError::InvalidRange(_))));
    }
}
