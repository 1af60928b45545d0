use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::Path;

use crate::processor::cache::ChartCache;
use crate::processor::column::Column;
use crate::processor::frame::DataFrame;
use crate::processor::groupby::ChartConfig;
use crate::processor::minmax::reduce_min_max;
use crate::processor::stride::get_binwise_reduced_column;
use crate::python::py_aggregate_op::PyAggregateOp;

/// A loaded frame plus the chart cache computed from it.
#[pyclass(name = "DataFrame", unsendable)]
pub struct PyDataFrame {
    inner: DataFrame,
    cache: ChartCache,
}

impl PyDataFrame {
    fn wrap(inner: DataFrame) -> Self {
        Self {
            inner,
            cache: ChartCache::new(),
        }
    }
}

#[pymethods]
impl PyDataFrame {
    /// Load a numeric CSV file
    #[staticmethod]
    pub fn read_csv(path: &str) -> PyResult<Self> {
        let (frame, _summary) = DataFrame::load_csv(Path::new(path))?;
        Ok(Self::wrap(frame))
    }

    /// Build a frame from a `{name: list[float]}` dict
    #[staticmethod]
    pub fn from_dict(columns: &Bound<'_, PyDict>) -> PyResult<Self> {
        let mut frame = DataFrame::new();
        for (name, values) in columns.iter() {
            let name: String = name.extract()?;
            let values: Vec<f64> = values.extract()?;
            frame.push_column(&name, Column::Float64(values))?;
        }
        Ok(Self::wrap(frame))
    }

    #[getter]
    pub fn columns(&self) -> Vec<String> {
        self.inner.headers().to_vec()
    }

    pub fn __len__(&self) -> usize {
        self.inner.row_count()
    }

    pub fn min_max(&self, column: &str) -> PyResult<(f64, f64)> {
        Ok(reduce_min_max(self.inner.column(column)?)?)
    }

    /// Returns `{"bin_centers": [...], "counts": [...]}`
    pub fn value_counts<'py>(
        &self,
        py: Python<'py>,
        column: &str,
        bins: usize,
    ) -> PyResult<Bound<'py, PyDict>> {
        let vc = self.cache.value_counts(&self.inner, column, bins)?;
        let dict = PyDict::new(py);
        dict.set_item("bin_centers", vc.bin_centers)?;
        dict.set_item("counts", vc.counts)?;
        Ok(dict)
    }

    pub fn reduce(&self, column: &str, stride: usize) -> PyResult<Vec<f64>> {
        let column = self.inner.column(column)?;
        let range = reduce_min_max(column)?;
        Ok(get_binwise_reduced_column(column, stride, range)?.to_f64_vec())
    }

    /// Returns `(labels, values)`
    #[pyo3(signature = (x, min_value, max_value, y=None, stride=None, data_points=None, op=None))]
    #[allow(clippy::too_many_arguments)]
    pub fn groupby(
        &self,
        x: &str,
        min_value: f64,
        max_value: f64,
        y: Option<&str>,
        stride: Option<f64>,
        data_points: Option<usize>,
        op: Option<PyAggregateOp>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let chart = chart(x, min_value, max_value, y, stride, data_points, op);
        let out = self.cache.calc_groupby(&chart, &self.inner)?;
        Ok((out.x, out.y))
    }

    /// Returns `(occupied_bins, distinct_counts)`
    #[pyo3(signature = (x, min_value, max_value, stride=None, data_points=None))]
    pub fn unique(
        &self,
        x: &str,
        min_value: f64,
        max_value: f64,
        stride: Option<f64>,
        data_points: Option<usize>,
    ) -> PyResult<(Vec<usize>, Vec<u64>)> {
        let chart = chart(x, min_value, max_value, None, stride, data_points, None);
        let out = self.cache.aggregated_column_unique(&chart, &self.inner)?;
        Ok((out.bins, out.distinct))
    }

    /// Drop cached chart results
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[allow(clippy::too_many_arguments)]
fn chart(
    x: &str,
    min_value: f64,
    max_value: f64,
    y: Option<&str>,
    stride: Option<f64>,
    data_points: Option<usize>,
    op: Option<PyAggregateOp>,
) -> ChartConfig {
    let mut chart = ChartConfig::new(x, min_value, max_value);
    if let Some(y) = y {
        chart = chart.y(y);
    }
    if let Some(stride) = stride {
        chart = chart.stride(stride);
    }
    if let Some(n) = data_points {
        chart = chart.data_points(n);
    }
    if let Some(op) = op {
        chart = chart.aggregate(op.inner);
    }
    chart
}
