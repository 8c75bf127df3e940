//! Row-major dense matrix with lane-padded rows.
//!
//! Each row occupies `stride = round_up(dim, LANES)` elements; the padding is
//! zero and never changes a squared distance. Kernels therefore always see
//! whole SIMD lanes and no scalar tail.

use crate::element::Element;
use crate::error::{QuantPivotError, Result};
use crate::simd::LANES;

/// Dense row-major matrix (dataset, query set, or pivot set).
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T: Element> {
    data: Vec<T>,
    rows: usize,
    dim: usize,
    stride: usize,
}

/// Padded row width for a given dimension.
#[inline]
pub(crate) fn padded_stride(dim: usize) -> usize {
    dim.div_ceil(LANES) * LANES
}

impl<T: Element> Matrix<T> {
    /// Build from a flat row-major buffer of `rows * dim` elements.
    pub fn from_flat(flat: &[T], rows: usize, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(QuantPivotError::InvalidParameter(
                "dimension must be greater than 0".to_string(),
            ));
        }
        let expected = rows.checked_mul(dim).ok_or_else(|| {
            QuantPivotError::InvalidParameter(format!("shape {rows}x{dim} overflows"))
        })?;
        if flat.len() != expected {
            return Err(QuantPivotError::InvalidParameter(format!(
                "buffer has {} elements, expected {rows}x{dim} = {expected}",
                flat.len()
            )));
        }

        let mut matrix = Self::zeros(rows, dim);
        for (r, src) in flat.chunks_exact(dim).enumerate() {
            matrix.row_mut(r)[..dim].copy_from_slice(src);
        }
        Ok(matrix)
    }

    /// Build from a list of rows, all of the same length.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if dim == 0 {
            return Err(QuantPivotError::InvalidParameter(
                "dimension must be greater than 0".to_string(),
            ));
        }

        let mut matrix = Self::zeros(rows.len(), dim);
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(QuantPivotError::DimensionMismatch {
                    query_dim: row.len(),
                    index_dim: dim,
                });
            }
            matrix.row_mut(r)[..dim].copy_from_slice(row);
        }
        Ok(matrix)
    }

    /// Gather the given rows of `self` into a new matrix.
    pub(crate) fn select(&self, ids: &[usize]) -> Self {
        let mut out = Self::zeros(ids.len(), self.dim);
        for (r, &id) in ids.iter().enumerate() {
            out.row_mut(r).copy_from_slice(self.padded_row(id));
        }
        out
    }

    pub(crate) fn zeros(rows: usize, dim: usize) -> Self {
        let stride = padded_stride(dim);
        Self {
            data: vec![T::ZERO; rows * stride],
            rows,
            dim,
            stride,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Logical number of columns (without padding).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row `i` without padding.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.padded_row(i)[..self.dim]
    }

    /// Row `i` including the zero padding; this is what the kernels consume.
    #[inline]
    pub(crate) fn padded_row(&self, i: usize) -> &[T] {
        let start = i * self.stride;
        &self.data[start..start + self.stride]
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = i * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Iterate over rows without padding.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Copy out as a flat, unpadded row-major buffer.
    pub fn to_flat(&self) -> Vec<T> {
        let mut flat = Vec::with_capacity(self.rows * self.dim);
        for row in self.iter_rows() {
            flat.extend_from_slice(row);
        }
        flat
    }

    /// Copy a logical-width vector into a lane-padded buffer.
    pub(crate) fn pad(&self, v: &[T]) -> Vec<T> {
        debug_assert_eq!(v.len(), self.dim);
        let mut padded = vec![T::ZERO; self.stride];
        padded[..v.len()].copy_from_slice(v);
        padded
    }

    /// Approximate heap size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_lane_multiple() {
        assert_eq!(padded_stride(1), 4);
        assert_eq!(padded_stride(4), 4);
        assert_eq!(padded_stride(5), 8);
    }

    #[test]
    fn from_flat_pads_rows() {
        let m = Matrix::<f32>::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.dim(), 3);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.padded_row(1), &[4.0, 5.0, 6.0, 0.0]);
        assert_eq!(m.to_flat(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn from_flat_rejects_bad_shape() {
        assert!(Matrix::<f64>::from_flat(&[1.0, 2.0, 3.0], 2, 2).is_err());
        assert!(Matrix::<f64>::from_flat(&[], 0, 0).is_err());
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let rows = vec![vec![1.0f64, 2.0], vec![3.0]];
        assert!(matches!(
            Matrix::from_rows(&rows),
            Err(QuantPivotError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn select_gathers_rows() {
        let m = Matrix::<f64>::from_rows(&[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]]).unwrap();
        let s = m.select(&[2, 0]);
        assert_eq!(s.row(0), &[4.0, 5.0]);
        assert_eq!(s.row(1), &[0.0, 1.0]);
    }
}
