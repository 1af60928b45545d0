//! Stride downsampling and stride-bin indexing of a column.

use rayon::prelude::*;

use crate::processor::column::{dispatch, Column};
use crate::processor::dtype::Element;
use crate::processor::{BinwiseError, Result};

fn check_value_range((min, max): (f64, f64)) -> Result<()> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(BinwiseError::InvalidRange(format!(
            "value range must satisfy min <= max, got [{min}, {max}]"
        )));
    }
    Ok(())
}

/// Keeps one value per block of `stride` consecutive elements: the block's
/// last element. The final block may be short.
///
/// `value_range` is the `(min, max)` already established for `column`.
/// A stride of 0 or 1 returns the column unchanged.
pub fn reduce_by_stride(column: &Column, stride: usize, value_range: (f64, f64)) -> Result<Column> {
    check_value_range(value_range)?;
    if stride <= 1 {
        return Ok(column.clone());
    }
    let len = column.len();
    let blocks = len.div_ceil(stride);
    Ok(column.take((0..blocks).map(|b| ((b + 1) * stride).min(len) - 1)))
}

/// Downsampled column for line and area charts; see [`reduce_by_stride`].
pub fn get_binwise_reduced_column(
    column: &Column,
    stride: usize,
    value_range: (f64, f64),
) -> Result<Column> {
    reduce_by_stride(column, stride, value_range)
}

/// Replaces every value with its stride-bin index `floor((v - min) / stride)`,
/// as `f64`.
///
/// Only strides above 1 coarsen the index space. A stride of at most 1,
/// fractional strides such as `0.5` included, returns the column unchanged
/// rather than widening it.
pub fn binwise_index_column(column: &Column, stride: f64, value_range: (f64, f64)) -> Result<Column> {
    check_value_range(value_range)?;
    if !(stride.is_finite() && stride > 0.0) {
        return Err(BinwiseError::InvalidRange(format!(
            "stride must be positive, got {stride}"
        )));
    }
    if stride <= 1.0 {
        return Ok(column.clone());
    }
    let min = value_range.0;
    let indices = dispatch!(column, values => stride_indices(values, min, stride));
    Ok(Column::Float64(indices))
}

fn stride_indices<E: Element>(values: &[E], min: f64, stride: f64) -> Vec<f64> {
    values
        .par_iter()
        .map(|v| ((v.to_f64() - min) / stride).floor())
        .collect()
}
