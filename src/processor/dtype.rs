//! Type tags for column element types and their representable ranges.

use std::fmt;
use std::str::FromStr;

use half::f16;
use serde::{Deserialize, Serialize};

use crate::processor::{BinwiseError, Result, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::Float16 | DType::Float32 | DType::Float64)
    }

    /// Element width in bytes
    pub fn width(self) -> usize {
        match self {
            DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 | DType::Float16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }
}

impl FromStr for DType {
    type Err = BinwiseError;

    fn from_str(s: &str) -> Result<Self> {
        let dtype = match s.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" => DType::Int8,
            "int16" | "i16" => DType::Int16,
            "int32" | "i32" => DType::Int32,
            "int64" | "i64" | "int" => DType::Int64,
            "uint8" | "u8" => DType::UInt8,
            "uint16" | "u16" => DType::UInt16,
            "uint32" | "u32" => DType::UInt32,
            "uint64" | "u64" => DType::UInt64,
            "float16" | "f16" | "half" => DType::Float16,
            "float32" | "f32" => DType::Float32,
            "float64" | "f64" | "float" => DType::Float64,
            _ => return Err(BinwiseError::InvalidType(s.to_string())),
        };
        Ok(dtype)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Representable `(min, max)` of a type.
///
/// Floats report their finite bounds, not the infinities.
pub fn dtype_min_max(dtype: DType) -> (Scalar, Scalar) {
    match dtype {
        DType::Int8 => (Scalar::Int(i8::MIN.into()), Scalar::Int(i8::MAX.into())),
        DType::Int16 => (Scalar::Int(i16::MIN.into()), Scalar::Int(i16::MAX.into())),
        DType::Int32 => (Scalar::Int(i32::MIN.into()), Scalar::Int(i32::MAX.into())),
        DType::Int64 => (Scalar::Int(i64::MIN), Scalar::Int(i64::MAX)),
        DType::UInt8 => (Scalar::UInt(0), Scalar::UInt(u8::MAX.into())),
        DType::UInt16 => (Scalar::UInt(0), Scalar::UInt(u16::MAX.into())),
        DType::UInt32 => (Scalar::UInt(0), Scalar::UInt(u32::MAX.into())),
        DType::UInt64 => (Scalar::UInt(0), Scalar::UInt(u64::MAX)),
        DType::Float16 => (
            Scalar::Float(f16::MIN.to_f64()),
            Scalar::Float(f16::MAX.to_f64()),
        ),
        DType::Float32 => (
            Scalar::Float(f32::MIN.into()),
            Scalar::Float(f32::MAX.into()),
        ),
        DType::Float64 => (Scalar::Float(f64::MIN), Scalar::Float(f64::MAX)),
    }
}

/// Same as [`dtype_min_max`] but resolving a textual tag first.
pub fn range_for(tag: &str) -> Result<(Scalar, Scalar)> {
    Ok(dtype_min_max(tag.parse()?))
}

/// A primitive that can live in a [`crate::processor::column::Column`].
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: DType;

    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_element! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl Element for f16 {
    const DTYPE: DType = DType::Float16;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_integer_bounds() {
        assert_eq!(
            dtype_min_max(DType::Int64),
            (Scalar::Int(-9223372036854775808), Scalar::Int(9223372036854775807))
        );
        assert_eq!(
            dtype_min_max(DType::Int32),
            (Scalar::Int(-2147483648), Scalar::Int(2147483647))
        );
        assert_eq!(dtype_min_max(DType::Int16), (Scalar::Int(-32768), Scalar::Int(32767)));
        assert_eq!(dtype_min_max(DType::Int8), (Scalar::Int(-128), Scalar::Int(127)));
    }

    #[test]
    fn float_bounds() {
        assert_eq!(
            dtype_min_max(DType::Float64),
            (
                Scalar::Float(-1.7976931348623157e308),
                Scalar::Float(1.7976931348623157e308)
            )
        );
        let (lo, hi) = dtype_min_max(DType::Float32);
        assert_eq!(lo.as_f64() as f32, -3.4028235e38f32);
        assert_eq!(hi.as_f64() as f32, 3.4028235e38f32);
        assert_eq!(
            dtype_min_max(DType::Float16),
            (Scalar::Float(-65504.0), Scalar::Float(65504.0))
        );
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(range_for("int").unwrap(), dtype_min_max(DType::Int64));
        assert_eq!(range_for("float").unwrap(), dtype_min_max(DType::Float64));
        assert_eq!(range_for("uint8").unwrap(), (Scalar::UInt(0), Scalar::UInt(255)));
    }

    #[test]
    fn unknown_tag_is_invalid_type() {
        assert!(matches!(range_for("complex128"), Err(BinwiseError::InvalidType(t)) if t == "complex128"));
    }
}
