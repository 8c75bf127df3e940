//! Binary dataset container.
//!
//! ```text
//! +----------+----------+---------------------------------+
//! | rows i32 | cols i32 | rows * cols elements, row-major |
//! +----------+----------+---------------------------------+
//! ```
//!
//! All values are little-endian. Elements are `f32` or `f64` for datasets,
//! queries, and distances, and `i32` for neighbor ids. There is no padding and
//! no footer.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::element::Element;
use crate::error::{QuantPivotError, Result};
use crate::matrix::Matrix;

/// Header size in bytes.
pub const HEADER_BYTES: usize = 8;

fn read_header<R: Read>(reader: &mut R) -> Result<(usize, usize)> {
    let rows = reader.read_i32::<LittleEndian>().map_err(truncated("header"))?;
    let cols = reader.read_i32::<LittleEndian>().map_err(truncated("header"))?;
    if rows < 0 || cols < 0 {
        return Err(QuantPivotError::Format(format!(
            "negative shape in header: {rows}x{cols}"
        )));
    }
    Ok((rows as usize, cols as usize))
}

fn write_header<W: Write>(writer: &mut W, rows: usize, cols: usize) -> Result<()> {
    let to_i32 = |v: usize, what: &str| {
        i32::try_from(v).map_err(|_| {
            QuantPivotError::Format(format!("{what} = {v} does not fit the 32-bit header"))
        })
    };
    writer.write_i32::<LittleEndian>(to_i32(rows, "rows")?)?;
    writer.write_i32::<LittleEndian>(to_i32(cols, "cols")?)?;
    Ok(())
}

/// Map an unexpected EOF to a format error; keep other I/O errors as-is.
fn truncated(what: &'static str) -> impl Fn(io::Error) -> QuantPivotError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            QuantPivotError::Format(format!("truncated container: incomplete {what}"))
        } else {
            QuantPivotError::Io(e)
        }
    }
}

/// Read a matrix of `T` elements.
pub fn read_matrix<T: Element, R: Read>(reader: &mut R) -> Result<Matrix<T>> {
    let (rows, cols) = read_header(reader)?;
    if cols == 0 {
        return Err(QuantPivotError::Format(
            "container has zero columns".to_string(),
        ));
    }
    let len = rows
        .checked_mul(cols)
        .ok_or_else(|| QuantPivotError::Format(format!("shape {rows}x{cols} overflows")))?;

    let mut flat = Vec::with_capacity(len.min(1 << 24));
    for _ in 0..len {
        flat.push(T::read_le(reader).map_err(truncated("payload"))?);
    }

    Matrix::from_flat(&flat, rows, cols)
}

/// Write a matrix (padding stripped).
pub fn write_matrix<T: Element, W: Write>(writer: &mut W, matrix: &Matrix<T>) -> Result<()> {
    write_header(writer, matrix.rows(), matrix.dim())?;
    for row in matrix.iter_rows() {
        for &v in row {
            v.write_le(writer)?;
        }
    }
    Ok(())
}

/// Write a flat `rows x cols` element buffer, e.g. neighbor distances.
pub fn write_elements<T: Element, W: Write>(
    writer: &mut W,
    values: &[T],
    rows: usize,
    cols: usize,
) -> Result<()> {
    check_len(values.len(), rows, cols)?;
    write_header(writer, rows, cols)?;
    for &v in values {
        v.write_le(writer)?;
    }
    Ok(())
}

/// Write a flat `rows x cols` id buffer as `i32`.
pub fn write_ids<W: Write>(writer: &mut W, ids: &[u32], rows: usize, cols: usize) -> Result<()> {
    check_len(ids.len(), rows, cols)?;
    write_header(writer, rows, cols)?;
    for &id in ids {
        let id = i32::try_from(id)
            .map_err(|_| QuantPivotError::Format(format!("id {id} does not fit i32")))?;
        writer.write_i32::<LittleEndian>(id)?;
    }
    Ok(())
}

/// Read an `i32` id matrix back as `(ids, rows, cols)`.
pub fn read_ids<R: Read>(reader: &mut R) -> Result<(Vec<u32>, usize, usize)> {
    let (rows, cols) = read_header(reader)?;
    let len = rows
        .checked_mul(cols)
        .ok_or_else(|| QuantPivotError::Format(format!("shape {rows}x{cols} overflows")))?;
    let mut ids = Vec::with_capacity(len.min(1 << 24));
    for _ in 0..len {
        let id = reader
            .read_i32::<LittleEndian>()
            .map_err(truncated("payload"))?;
        let id = u32::try_from(id)
            .map_err(|_| QuantPivotError::Format(format!("negative id {id}")))?;
        ids.push(id);
    }
    Ok((ids, rows, cols))
}

fn check_len(len: usize, rows: usize, cols: usize) -> Result<()> {
    if Some(len) != rows.checked_mul(cols) {
        return Err(QuantPivotError::InvalidParameter(format!(
            "buffer has {len} elements, expected {rows}x{cols}"
        )));
    }
    Ok(())
}

pub fn load_matrix<T: Element, P: AsRef<Path>>(path: P) -> Result<Matrix<T>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_matrix(&mut reader)
}

pub fn save_matrix<T: Element, P: AsRef<Path>>(path: P, matrix: &Matrix<T>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_matrix(&mut writer, matrix)?;
    writer.flush()?;
    Ok(())
}

pub fn save_elements<T: Element, P: AsRef<Path>>(
    path: P,
    values: &[T],
    rows: usize,
    cols: usize,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_elements(&mut writer, values, rows, cols)?;
    writer.flush()?;
    Ok(())
}

pub fn save_ids<P: AsRef<Path>>(path: P, ids: &[u32], rows: usize, cols: usize) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ids(&mut writer, ids, rows, cols)?;
    writer.flush()?;
    Ok(())
}
