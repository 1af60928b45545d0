use pyo3::{pyclass, pymethods, PyResult};

use crate::processor::AggregateOp;

#[pyclass(name = "AggregateOp")]
#[derive(Clone, Copy)]
pub struct PyAggregateOp {
    pub inner: AggregateOp,
}

#[pymethods]
impl PyAggregateOp {
    /// Parses `count`, `mean`, `sum`, `min` or `max`.
    #[new]
    pub fn new(name: &str) -> PyResult<Self> {
        Ok(PyAggregateOp {
            inner: name.parse()?,
        })
    }

    #[staticmethod]
    pub fn count() -> Self {
        PyAggregateOp {
            inner: AggregateOp::Count,
        }
    }

    #[staticmethod]
    pub fn mean() -> Self {
        PyAggregateOp {
            inner: AggregateOp::Mean,
        }
    }

    #[staticmethod]
    pub fn sum() -> Self {
        PyAggregateOp {
            inner: AggregateOp::Sum,
        }
    }

    #[staticmethod]
    pub fn min() -> Self {
        PyAggregateOp {
            inner: AggregateOp::Min,
        }
    }

    #[staticmethod]
    pub fn max() -> Self {
        PyAggregateOp {
            inner: AggregateOp::Max,
        }
    }

    #[getter]
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn __repr__(&self) -> String {
        format!("AggregateOp.{}", self.inner.name())
    }
}
