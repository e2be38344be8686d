//! Binary concentration grid parsing.
//!
//! Each source file is a fixed-length header carrying ASCII row and column
//! counts, followed by one unsigned byte per cell in row-major order.
//! Codes inside the raw valid range are scaled concentration; the rest are
//! flag sentinels and pass through unchanged.

use crate::config::GridSpec;
use crate::constants::{HEADER_COLS_FIELD, HEADER_LENGTH, HEADER_ROWS_FIELD};
use crate::error::{Result, SeaIceError};
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

/// Grid dimensions declared by a file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridHeader {
    pub rows: usize,
    pub cols: usize,
}

impl GridHeader {
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Parse the row and column counts from a raw header
pub fn parse_header(header: &[u8], path: &Path) -> Result<GridHeader> {
    if header.len() < HEADER_LENGTH {
        return Err(SeaIceError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!("expected {HEADER_LENGTH} header bytes, found {}", header.len()),
        });
    }

    let field = |(start, end): (usize, usize), name: &str| -> Result<usize> {
        let text = std::str::from_utf8(&header[start..end]).map_err(|_| SeaIceError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!("{name} field is not ASCII"),
        })?;
        text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .parse()
            .map_err(|_| SeaIceError::InvalidHeader {
                path: path.to_path_buf(),
                reason: format!("{name} field {text:?} is not an integer"),
            })
    };

    Ok(GridHeader {
        cols: field(HEADER_COLS_FIELD, "column count")?,
        rows: field(HEADER_ROWS_FIELD, "row count")?,
    })
}

/// Read the raw byte codes of a grid file
pub fn read_raw_grid(path: &Path) -> Result<Array2<u8>> {
    let bytes = std::fs::read(path)?;
    let header = parse_header(&bytes[..bytes.len().min(HEADER_LENGTH)], path)?;
    let body = &bytes[HEADER_LENGTH..];

    if body.len() < header.cell_count() {
        return Err(SeaIceError::TruncatedGrid {
            path: path.to_path_buf(),
            expected: header.cell_count(),
            found: body.len(),
        });
    }
    if body.len() > header.cell_count() {
        return Err(SeaIceError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!(
                "header declares {} cells but {} bytes follow",
                header.cell_count(),
                body.len()
            ),
        });
    }

    debug!(
        "Read {}x{} grid from {}",
        header.rows,
        header.cols,
        path.display()
    );

    Ok(Array2::from_shape_vec((header.rows, header.cols), body.to_vec())?)
}

/// Convert raw codes to percent concentration, leaving flags as they are
pub fn scale_codes(raw: &Array2<u8>, spec: &GridSpec) -> Array2<f64> {
    raw.mapv(|code| {
        let value = f64::from(code);
        if spec.raw_valid_range.contains(value) {
            value / spec.scale
        } else {
            value
        }
    })
}

/// Read a grid file as concentration, checking it against the configured shape
pub fn read_concentration_grid(path: &Path, spec: &GridSpec) -> Result<Array2<f64>> {
    let raw = read_raw_grid(path)?;
    if raw.dim() != spec.shape {
        return Err(SeaIceError::ShapeMismatch {
            expected: spec.shape,
            found: raw.dim(),
        });
    }
    Ok(scale_codes(&raw, spec))
}

/// Serialize raw codes in the on-disk layout
pub fn encode_grid(raw: &Array2<u8>) -> Vec<u8> {
    let (rows, cols) = raw.dim();
    let mut header = vec![b' '; HEADER_LENGTH];
    let cols_text = format!("{:>width$}", cols, width = HEADER_COLS_FIELD.1 - HEADER_COLS_FIELD.0);
    let rows_text = format!("{:>width$}", rows, width = HEADER_ROWS_FIELD.1 - HEADER_ROWS_FIELD.0);
    header[HEADER_COLS_FIELD.0..HEADER_COLS_FIELD.1].copy_from_slice(cols_text.as_bytes());
    header[HEADER_ROWS_FIELD.0..HEADER_ROWS_FIELD.1].copy_from_slice(rows_text.as_bytes());
    header.extend(raw.iter().copied());
    header
}

pub fn write_grid_file(path: &Path, raw: &Array2<u8>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_grid(raw))?;
    Ok(())
}
