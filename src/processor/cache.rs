use lru::LruCache;
use tracing::trace;

use crate::processor::frame::DataFrame;
use crate::processor::groupby::{
    aggregated_column_unique, calc_groupby, AggregateArray, ChartConfig, UniqueBins,
};
use crate::processor::histogram::{calc_value_counts, ValueCounts};
use crate::processor::{AggregateOp, Result};
use std::cell::RefCell;
use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: usize = 128;

/// Hashable view of a [`ChartConfig`]; floats are keyed by their bits.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct ChartKey {
    x: String,
    y: Option<String>,
    stride: Option<u64>,
    min_value: u64,
    max_value: u64,
    data_points: Option<usize>,
    aggregate_fn: AggregateOp,
}

impl From<&ChartConfig> for ChartKey {
    fn from(chart: &ChartConfig) -> Self {
        Self {
            x: chart.x.clone(),
            y: chart.y.clone(),
            stride: chart.stride.map(f64::to_bits),
            min_value: chart.min_value.to_bits(),
            max_value: chart.max_value.to_bits(),
            data_points: chart.data_points,
            aggregate_fn: chart.aggregate_fn,
        }
    }
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
enum QueryKey {
    GroupBy(ChartKey),
    Unique(ChartKey),
    ValueCounts { column: String, bins: usize },
}

#[derive(Debug, Clone)]
enum CachedResult {
    GroupBy(AggregateArray),
    Unique(UniqueBins),
    ValueCounts(ValueCounts),
}

/// LRU cache of chart results computed from one [`DataFrame`].
///
/// Entries are only valid for the frame they were computed from; call
/// [`ChartCache::clear`] when the frame changes.
#[derive(Debug)]
pub struct ChartCache {
    cache: RefCell<LruCache<QueryKey, CachedResult>>,
}

impl Default for ChartCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartCache {
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    fn get(&self, key: &QueryKey) -> Option<CachedResult> {
        let hit = self.cache.borrow_mut().get(key).cloned();
        if hit.is_some() {
            trace!(?key, "chart cache hit");
        }
        hit
    }

    fn put(&self, key: QueryKey, value: CachedResult) {
        self.cache.borrow_mut().put(key, value);
    }

    /// Cached [`calc_groupby`].
    pub fn calc_groupby(&self, chart: &ChartConfig, frame: &DataFrame) -> Result<AggregateArray> {
        let key = QueryKey::GroupBy(chart.into());
        if let Some(CachedResult::GroupBy(result)) = self.get(&key) {
            return Ok(result);
        }
        let result = calc_groupby(chart, frame)?;
        self.put(key, CachedResult::GroupBy(result.clone()));
        Ok(result)
    }

    /// Cached [`aggregated_column_unique`].
    pub fn aggregated_column_unique(
        &self,
        chart: &ChartConfig,
        frame: &DataFrame,
    ) -> Result<UniqueBins> {
        let key = QueryKey::Unique(chart.into());
        if let Some(CachedResult::Unique(result)) = self.get(&key) {
            return Ok(result);
        }
        let result = aggregated_column_unique(chart, frame)?;
        self.put(key, CachedResult::Unique(result.clone()));
        Ok(result)
    }

    /// Cached [`calc_value_counts`] of a frame column.
    pub fn value_counts(&self, frame: &DataFrame, column: &str, bins: usize) -> Result<ValueCounts> {
        let key = QueryKey::ValueCounts {
            column: column.to_string(),
            bins,
        };
        if let Some(CachedResult::ValueCounts(result)) = self.get(&key) {
            return Ok(result);
        }
        let result = calc_value_counts(frame.column(column)?, bins)?;
        self.put(key, CachedResult::ValueCounts(result.clone()));
        Ok(result)
    }
}
