//! Floats stored in atomic integers, updated through compare-and-swap.
//!
//! `fetch_min`/`fetch_max` only replace the stored value when the candidate
//! compares strictly smaller/larger, so NaN candidates never land in a slot.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Storage width of a shared accumulator slot.
pub trait AccumulatorFloat: Copy + PartialOrd + Debug + Send + Sync + 'static {
    type Atomic: AtomicSlot<Self>;

    fn from_f64(v: f64) -> Self;

    fn to_f64(self) -> f64;
}

pub trait AtomicSlot<T>: Debug + Send + Sync {
    fn new(v: T) -> Self;

    fn load(&self) -> T;

    fn store(&self, v: T);

    /// Stores `min(current, v)`; returns the previous value.
    fn fetch_min(&self, v: T) -> T;

    /// Stores `max(current, v)`; returns the previous value.
    fn fetch_max(&self, v: T) -> T;
}

macro_rules! atomic_float {
    ($name:ident, $float:ty, $bits:ty) => {
        #[derive(Debug)]
        pub struct $name {
            bits: $bits,
        }

        impl AtomicSlot<$float> for $name {
            fn new(v: $float) -> Self {
                Self {
                    bits: <$bits>::new(v.to_bits()),
                }
            }

            #[inline]
            fn load(&self) -> $float {
                <$float>::from_bits(self.bits.load(Ordering::Acquire))
            }

            #[inline]
            fn store(&self, v: $float) {
                self.bits.store(v.to_bits(), Ordering::Release)
            }

            #[inline]
            fn fetch_min(&self, v: $float) -> $float {
                let prev = self
                    .bits
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                        (v < <$float>::from_bits(cur)).then(|| v.to_bits())
                    });
                match prev {
                    Ok(bits) | Err(bits) => <$float>::from_bits(bits),
                }
            }

            #[inline]
            fn fetch_max(&self, v: $float) -> $float {
                let prev = self
                    .bits
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                        (v > <$float>::from_bits(cur)).then(|| v.to_bits())
                    });
                match prev {
                    Ok(bits) | Err(bits) => <$float>::from_bits(bits),
                }
            }
        }
    };
}

atomic_float!(AtomicF32, f32, AtomicU32);
atomic_float!(AtomicF64, f64, AtomicU64);

impl AccumulatorFloat for f32 {
    type Atomic = AtomicF32;

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl AccumulatorFloat for f64 {
    type Atomic = AtomicF64;

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}
