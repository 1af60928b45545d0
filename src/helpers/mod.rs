pub mod atomic_float;
