#![cfg(feature = "python-bindings")]

use pyo3::exceptions;
use pyo3::types::PyModuleMethods;
use pyo3::{pymodule, types::PyModule, Bound, PyErr, PyResult, Python};

use crate::processor::BinwiseError;

pub mod py_aggregate_op;

pub mod py_data_frame;

/// Convert Rust errors to Python exceptions
impl From<BinwiseError> for PyErr {
    fn from(err: BinwiseError) -> PyErr {
        match err {
            BinwiseError::Io(e) => exceptions::PyIOError::new_err(e.to_string()),
            BinwiseError::MissingColumn(name) => exceptions::PyKeyError::new_err(name),
            other => exceptions::PyValueError::new_err(other.to_string()),
        }
    }
}

#[pymodule]
fn binwise(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<py_aggregate_op::PyAggregateOp>()?;
    m.add_class::<py_data_frame::PyDataFrame>()?;
    Ok(())
}
