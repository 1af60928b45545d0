use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bins;
pub mod cache;
pub mod column;
pub mod dtype;
pub mod frame;
pub mod groupby;
pub mod histogram;
pub mod launch;
pub mod minmax;
pub mod stride;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum BinwiseError {
    #[error("invalid dtype: {0}")]
    InvalidType(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: usize, right: usize },

    #[error("invalid aggregate function: {0}")]
    InvalidAggregate(String),

    #[error("invalid launch configuration: grid={grid}, block={block}")]
    InvalidLaunch { grid: u32, block: u32 },

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("empty column")]
    EmptyColumn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Int parse error: {0}")]
    IntParse(#[from] std::num::ParseIntError),

    #[error("Float parse error: {0}")]
    FloatParse(#[from] std::num::ParseFloatError),

    #[error("Schema/parse error: {0}")]
    Parse(String),
}

pub type Result<T, E = BinwiseError> = std::result::Result<T, E>;

/// A single exact numeric value.
///
/// Integer bounds never round-trip through `f64`, so `Int(i64::MIN)` stays
/// bit-exact.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Scalar {
    /// Lossy conversion used by the kernels, which all compute in `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::UInt(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::UInt(a), Scalar::UInt(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v:e}"),
        }
    }
}

/// Aggregate operations applied per bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Number of rows in the bin
    Count,
    /// Arithmetic mean of the bin's values
    Mean,
    /// Sum of the bin's values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 5] = [
        AggregateOp::Count,
        AggregateOp::Mean,
        AggregateOp::Sum,
        AggregateOp::Min,
        AggregateOp::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Mean => "mean",
            AggregateOp::Sum => "sum",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }

    /// Value written into bins that received no rows.
    pub fn empty_fill(self) -> f64 {
        match self {
            AggregateOp::Count | AggregateOp::Sum => 0.0,
            AggregateOp::Mean | AggregateOp::Min | AggregateOp::Max => f64::NAN,
        }
    }
}

impl FromStr for AggregateOp {
    type Err = BinwiseError;

    fn from_str(s: &str) -> Result<Self> {
        AggregateOp::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BinwiseError::InvalidAggregate(s.to_string()))
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn check_range(min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || max <= min {
        return Err(BinwiseError::InvalidRange(format!(
            "expected finite min < max, got [{min}, {max}]"
        )));
    }
    Ok(())
}

pub(crate) fn check_bins(bins: usize) -> Result<()> {
    if bins == 0 {
        return Err(BinwiseError::InvalidRange("bin count must be non-zero".into()));
    }
    Ok(())
}
