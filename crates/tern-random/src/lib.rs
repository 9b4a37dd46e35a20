//! Seeded pseudo-random generation for reproducible row sampling.
//!
//! The generator follows Spark's `XORShiftRandom`, so a split computed with a
//! given seed assigns rows the same way a Spark `randomSplit` over a single
//! partition would.

mod murmur;
mod xorshift;

pub use xorshift::XorShiftRandom;
