//! Global min/max over a column with a shared two-slot accumulator.

use std::fmt;

use crate::helpers::atomic_float::{AccumulatorFloat, AtomicSlot};
use crate::processor::column::{dispatch, Column};
use crate::processor::dtype::{dtype_min_max, DType, Element};
use crate::processor::launch::{self, grid_stride, LaunchConfig};
use crate::processor::{BinwiseError, Result};

/// `[min, max]` slots updated concurrently by every worker of a launch.
///
/// `T` is the storage width. The default `f64` keeps integer columns exact up
/// to 2^53; `MinMaxAccumulator<f32>` reproduces a 32-bit device buffer.
pub struct MinMaxAccumulator<T: AccumulatorFloat = f64> {
    slots: [T::Atomic; 2],
}

impl<T: AccumulatorFloat> MinMaxAccumulator<T> {
    pub fn new(min: T, max: T) -> Self {
        Self {
            slots: [
                <T::Atomic as AtomicSlot<T>>::new(min),
                <T::Atomic as AtomicSlot<T>>::new(max),
            ],
        }
    }

    /// Accumulator primed with `[+inf, -inf]`. Any value, infinities
    /// included, replaces both slots.
    pub fn empty() -> Self {
        Self::new(T::from_f64(f64::INFINITY), T::from_f64(f64::NEG_INFINITY))
    }

    /// Accumulator primed with `[type max, type min]`, the device buffer
    /// layout. Float infinities cannot displace the finite type bounds, so
    /// use [`MinMaxAccumulator::empty`] when the column may hold them.
    pub fn for_dtype(dtype: DType) -> Self {
        let (lo, hi) = dtype_min_max(dtype);
        Self::new(T::from_f64(hi.as_f64()), T::from_f64(lo.as_f64()))
    }

    pub fn min(&self) -> T {
        self.slots[0].load()
    }

    pub fn max(&self) -> T {
        self.slots[1].load()
    }

    /// Raw slot contents, in device order.
    pub fn get(&self) -> [T; 2] {
        [self.min(), self.max()]
    }

    pub fn set(&self, min: T, max: T) {
        self.slots[0].store(min);
        self.slots[1].store(max);
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min().to_f64(), self.max().to_f64())
    }

    /// Whether at least one value has been folded in since priming.
    pub fn is_populated(&self) -> bool {
        self.min() <= self.max()
    }

    #[inline]
    pub(crate) fn publish(&self, lo: T, hi: T) {
        self.slots[0].fetch_min(lo);
        self.slots[1].fetch_max(hi);
    }
}

impl<T: AccumulatorFloat> fmt::Debug for MinMaxAccumulator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.get()).finish()
    }
}

/// Folds `column` into `acc`. Each worker reduces its grid-stride share
/// locally and publishes once. NaNs are skipped.
pub fn min_max<T: AccumulatorFloat>(
    launch: &LaunchConfig,
    column: &Column,
    acc: &MinMaxAccumulator<T>,
) -> Result<()> {
    dispatch!(column, values => min_max_slice(launch, values, acc))
}

fn min_max_slice<E: Element, T: AccumulatorFloat>(
    config: &LaunchConfig,
    values: &[E],
    acc: &MinMaxAccumulator<T>,
) -> Result<()> {
    launch::launch(config, "min_max", |tid, workers| {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for i in grid_stride(tid, workers, values.len()) {
            let v = values[i].to_f64();
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        if lo <= hi {
            acc.publish(T::from_f64(lo), T::from_f64(hi));
        }
    })
}

/// Min and max of `column`, computed with the default launch shape.
pub fn reduce_min_max(column: &Column) -> Result<(f64, f64)> {
    reduce_min_max_with(&LaunchConfig::default(), column)
}

pub fn reduce_min_max_with(launch: &LaunchConfig, column: &Column) -> Result<(f64, f64)> {
    let acc = MinMaxAccumulator::<f64>::empty();
    min_max(launch, column, &acc)?;
    if !acc.is_populated() {
        return Err(BinwiseError::EmptyColumn);
    }
    Ok(acc.bounds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_accumulator_matches_device_buffer() {
        let x = Column::from(vec![1i64, 5, 10, 15, 25, 27, 30]);
        let acc = MinMaxAccumulator::<f32>::for_dtype(x.dtype());
        assert_eq!(acc.get(), [9.223372e18f32, -9.223372e18f32]);

        min_max(&LaunchConfig::new(64, 64).unwrap(), &x, &acc).unwrap();
        assert_eq!(acc.get(), [1.0f32, 30.0]);
    }

    #[test]
    fn negative_values() {
        let x = Column::from(vec![-1i64, 0, 2, -10]);
        let acc = MinMaxAccumulator::<f32>::for_dtype(x.dtype());
        min_max(&LaunchConfig::new(64, 64).unwrap(), &x, &acc).unwrap();
        assert_eq!(acc.get(), [-10.0f32, 2.0]);
    }

    #[test]
    fn wide_accumulator_keeps_precision() {
        let big = (1i64 << 40) + 1;
        let x = Column::from(vec![big, 3]);
        assert_eq!(reduce_min_max(&x).unwrap(), (3.0, big as f64));

        let narrow = MinMaxAccumulator::<f32>::for_dtype(DType::Int64);
        min_max(&LaunchConfig::default(), &x, &narrow).unwrap();
        assert_ne!(narrow.max() as f64, big as f64);
    }

    #[test]
    fn launch_shape_does_not_change_result() {
        let data: Vec<f32> = (0..5000).map(|i| ((i * 7919) % 1013) as f32 - 400.5).collect();
        let x = Column::from(data);
        let expected = reduce_min_max_with(&LaunchConfig::new(1, 1).unwrap(), &x).unwrap();
        for (g, b) in [(64, 64), (7, 13), (1, 1024), (4096, 1)] {
            let got = reduce_min_max_with(&LaunchConfig::new(g, b).unwrap(), &x).unwrap();
            assert_eq!(got, expected);
        }
        assert_eq!(expected, (-400.5, 611.5));
    }

    #[test]
    fn nan_is_ignored() {
        let x = Column::from(vec![f64::NAN, 2.0, -1.0, f64::NAN]);
        assert_eq!(reduce_min_max(&x).unwrap(), (-1.0, 2.0));
    }

    #[test]
    fn empty_and_all_nan_columns() {
        assert!(matches!(
            reduce_min_max(&Column::from(Vec::<i32>::new())),
            Err(BinwiseError::EmptyColumn)
        ));
        assert!(matches!(
            reduce_min_max(&Column::from(vec![f32::NAN; 3])),
            Err(BinwiseError::EmptyColumn)
        ));
    }

    #[test]
    fn infinities_are_reported() {
        let x = Column::from(vec![f64::INFINITY, f64::INFINITY]);
        assert_eq!(reduce_min_max(&x).unwrap(), (f64::INFINITY, f64::INFINITY));
        let x = Column::from(vec![f64::NEG_INFINITY]);
        assert_eq!(
            reduce_min_max(&x).unwrap(),
            (f64::NEG_INFINITY, f64::NEG_INFINITY)
        );
        let x = Column::from(vec![1.0f32, f32::NEG_INFINITY, f32::NAN, 3.0]);
        assert_eq!(reduce_min_max(&x).unwrap(), (f64::NEG_INFINITY, 3.0));
    }

    #[test]
    fn empty_accumulator_is_unpopulated() {
        let acc = MinMaxAccumulator::<f32>::empty();
        assert!(!acc.is_populated());
        min_max(&LaunchConfig::new(3, 5).unwrap(), &Column::from(vec![f32::INFINITY]), &acc).unwrap();
        assert!(acc.is_populated());
        assert_eq!(acc.get(), [f32::INFINITY, f32::INFINITY]);
    }

    #[test]
    fn type_extremes() {
        let x = Column::from(vec![i8::MIN, i8::MAX, 0]);
        assert_eq!(reduce_min_max(&x).unwrap(), (-128.0, 127.0));
        let x = Column::from(vec![u8::MAX]);
        assert_eq!(reduce_min_max(&x).unwrap(), (255.0, 255.0));
    }
}
