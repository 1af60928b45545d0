use half::f16;

use crate::processor::dtype::{DType, Element};

/// A homogeneous numeric column, owned by the caller and read-only while a
/// kernel runs over it.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Runs `$body` with `$values` bound to the column's typed slice.
macro_rules! dispatch {
    ($column:expr, $values:ident => $body:expr) => {
        match $column {
            $crate::processor::column::Column::Int8($values) => $body,
            $crate::processor::column::Column::Int16($values) => $body,
            $crate::processor::column::Column::Int32($values) => $body,
            $crate::processor::column::Column::Int64($values) => $body,
            $crate::processor::column::Column::UInt8($values) => $body,
            $crate::processor::column::Column::UInt16($values) => $body,
            $crate::processor::column::Column::UInt32($values) => $body,
            $crate::processor::column::Column::UInt64($values) => $body,
            $crate::processor::column::Column::Float16($values) => $body,
            $crate::processor::column::Column::Float32($values) => $body,
            $crate::processor::column::Column::Float64($values) => $body,
        }
    };
}

pub(crate) use dispatch;

impl Column {
    pub fn dtype(&self) -> DType {
        match self {
            Column::Int8(_) => DType::Int8,
            Column::Int16(_) => DType::Int16,
            Column::Int32(_) => DType::Int32,
            Column::Int64(_) => DType::Int64,
            Column::UInt8(_) => DType::UInt8,
            Column::UInt16(_) => DType::UInt16,
            Column::UInt32(_) => DType::UInt32,
            Column::UInt64(_) => DType::UInt64,
            Column::Float16(_) => DType::Float16,
            Column::Float32(_) => DType::Float32,
            Column::Float64(_) => DType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the element buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.len() * self.dtype().width()
    }

    // Random access
    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        dispatch!(self, values => values.get(idx).map(|v| v.to_f64()))
    }

    pub fn iter_f64(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        dispatch!(self, values => {
            Box::new(values.iter().map(|v| v.to_f64())) as Box<dyn Iterator<Item = f64> + '_>
        })
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, values => values.iter().map(|v| v.to_f64()).collect())
    }

    /// Keeps the elements at `indices`, in that order.
    pub fn take(&self, indices: impl Iterator<Item = usize>) -> Column {
        match self {
            Column::Int8(v) => Column::Int8(indices.map(|i| v[i]).collect()),
            Column::Int16(v) => Column::Int16(indices.map(|i| v[i]).collect()),
            Column::Int32(v) => Column::Int32(indices.map(|i| v[i]).collect()),
            Column::Int64(v) => Column::Int64(indices.map(|i| v[i]).collect()),
            Column::UInt8(v) => Column::UInt8(indices.map(|i| v[i]).collect()),
            Column::UInt16(v) => Column::UInt16(indices.map(|i| v[i]).collect()),
            Column::UInt32(v) => Column::UInt32(indices.map(|i| v[i]).collect()),
            Column::UInt64(v) => Column::UInt64(indices.map(|i| v[i]).collect()),
            Column::Float16(v) => Column::Float16(indices.map(|i| v[i]).collect()),
            Column::Float32(v) => Column::Float32(indices.map(|i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(indices.map(|i| v[i]).collect()),
        }
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for Column {
                fn from(values: Vec<$ty>) -> Self {
                    Column::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f16 => Float16,
    f32 => Float32,
    f64 => Float64,
}
