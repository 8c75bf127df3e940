//! Numeric precision strategy.
//!
//! The engine is written once against [`Element`]; `f32` and `f64` supply the
//! kernel, conversions, and container encoding for their width.

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::simd;

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point element type of a dataset (`f32` or `f64`).
pub trait Element:
    Copy + Default + Debug + Display + PartialOrd + Send + Sync + 'static + private::Sealed
{
    /// Additive identity, also used for row padding.
    const ZERO: Self;

    /// Size in bytes of one encoded element.
    const BYTES: usize;

    /// Short label used in logs ("f32", "f64").
    const NAME: &'static str;

    /// Relative slack applied to pruning bounds.
    ///
    /// Covers rounding in the kernel and the square root, so a computed lower
    /// bound never exceeds the computed exact distance of the same point.
    const BOUND_SLACK: f64;

    fn to_f64(self) -> f64;

    fn from_f64(v: f64) -> Self;

    fn sqrt(self) -> Self;

    fn total_cmp(&self, other: &Self) -> Ordering;

    /// Squared L2 distance using the SIMD kernel for this width.
    fn l2_distance_squared(a: &[Self], b: &[Self]) -> Self;

    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self>;

    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

impl Element for f32 {
    const ZERO: Self = 0.0;
    const BYTES: usize = 4;
    const NAME: &'static str = "f32";
    const BOUND_SLACK: f64 = 1e-3;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }

    #[inline]
    fn l2_distance_squared(a: &[Self], b: &[Self]) -> Self {
        simd::l2_distance_squared_f32(a, b)
    }

    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f32::<LittleEndian>()
    }

    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self)
    }
}

impl Element for f64 {
    const ZERO: Self = 0.0;
    const BYTES: usize = 8;
    const NAME: &'static str = "f64";
    const BOUND_SLACK: f64 = 1e-9;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }

    #[inline]
    fn l2_distance_squared(a: &[Self], b: &[Self]) -> Self {
        simd::l2_distance_squared_f64(a, b)
    }

    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f64::<LittleEndian>()
    }

    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f64::<LittleEndian>(self)
    }
}
