//! Bin boundaries and the linear value → bin mapping shared by the histogram
//! and group-by kernels.

use crate::helpers::atomic_float::AccumulatorFloat;
use crate::processor::minmax::MinMaxAccumulator;
use crate::processor::{check_bins, check_range, BinwiseError, Result};

/// `bins` evenly spaced edges walking down from `max`:
/// `edges[k] = max - k * (max - min) / bins`.
///
/// `min == max` is allowed and yields `bins` copies of `max`.
pub fn bin_edges(min: f64, max: f64, bins: usize) -> Result<Vec<f64>> {
    check_bins(bins)?;
    if min.is_nan() || max.is_nan() || max < min {
        return Err(BinwiseError::InvalidRange(format!(
            "expected min <= max, got [{min}, {max}]"
        )));
    }
    let step = (max - min) / bins as f64;
    Ok((0..bins).map(|k| max - k as f64 * step).collect())
}

/// Fills `out` with edges walking from slot 0 of `acc` towards slot 1, the
/// last entry pinned to slot 1.
///
/// On a freshly primed accumulator (`[type max, type min]`) this spans the
/// whole type range top-down; on a reduced one (`[min, max]`) it gives the
/// lower edge of each bin with the final label at `max`.
pub fn get_bin_edges<T: AccumulatorFloat>(acc: &MinMaxAccumulator<T>, out: &mut [f64]) -> Result<()> {
    let bins = out.len();
    check_bins(bins)?;
    let [a, b] = acc.get().map(AccumulatorFloat::to_f64);
    let step = (b - a) / bins as f64;
    for (k, edge) in out.iter_mut().enumerate() {
        *edge = a + k as f64 * step;
    }
    out[bins - 1] = b;
    Ok(())
}

/// Upper bound on the number of bins a fixed width may produce.
pub const MAX_BINS: usize = 1 << 24;

/// Evenly sized bins starting at `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBins {
    pub min: f64,
    pub max: f64,
    pub width: f64,
    pub count: usize,
}

impl LinearBins {
    /// `count` bins exactly covering `[min, max]`.
    pub fn over_range(min: f64, max: f64, count: usize) -> Result<Self> {
        check_bins(count)?;
        check_range(min, max)?;
        Ok(Self {
            min,
            max,
            width: (max - min) / count as f64,
            count,
        })
    }

    /// Bins of fixed `width` from `min`, as many as needed to include `max`.
    pub fn with_width(min: f64, max: f64, width: f64) -> Result<Self> {
        if !(width.is_finite() && width > 0.0) {
            return Err(BinwiseError::InvalidRange(format!(
                "bin width must be positive, got {width}"
            )));
        }
        if min.is_nan() || max.is_nan() || max < min {
            return Err(BinwiseError::InvalidRange(format!(
                "expected min <= max, got [{min}, {max}]"
            )));
        }
        let span = ((max - min) / width).floor();
        let count = (span.is_finite() && span < MAX_BINS as f64)
            .then(|| (span as usize).checked_add(1))
            .flatten()
            .ok_or_else(|| {
                BinwiseError::InvalidRange(format!(
                    "width {width} over [{min}, {max}] needs more than {MAX_BINS} bins"
                ))
            })?;
        Ok(Self {
            min,
            max,
            width,
            count,
        })
    }

    /// `floor((v - min) / width)` clamped into `[0, count - 1]`. Only NaN has
    /// no bin.
    #[inline]
    pub fn index_clamped(&self, v: f64) -> Option<usize> {
        if v.is_nan() {
            return None;
        }
        let idx = ((v - self.min) / self.width).floor();
        if idx <= 0.0 {
            Some(0)
        } else {
            Some((idx as usize).min(self.count - 1))
        }
    }

    /// Bin of `v`, or `None` when `v` lies outside `[min, max]`. `max` itself
    /// lands in the last bin.
    #[inline]
    pub fn index(&self, v: f64) -> Option<usize> {
        if v.is_nan() || v < self.min || v > self.max {
            return None;
        }
        self.index_clamped(v)
    }

    pub fn lower_edge(&self, k: usize) -> f64 {
        self.min + k as f64 * self.width
    }

    pub fn center(&self, k: usize) -> f64 {
        self.min + (k as f64 + 0.5) * self.width
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.count).map(|k| self.center(k)).collect()
    }

    pub fn lower_edges(&self) -> Vec<f64> {
        (0..self.count).map(|k| self.lower_edge(k)).collect()
    }
}
