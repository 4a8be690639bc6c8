// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Per-vertex value files: time costs and speeds in, potentials out.
//!
//! Values are stored as one-dimensional arrays indexed by vertex handle. A
//! `.npy` file may hold `[n]`, `[n, 1]` or `[1, n]`; a `.mat` file holds an
//! `n x 1` or `1 x n` double or single matrix.

use std::io::Write;
use std::path::Path;

use ndarray::{Array1, ArrayD};

use crate::error::{EikonalError, Result};

/// Supported file formats for vertex value I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(EikonalError::UnsupportedFileFormat(ext.to_string())),
        None => Err(EikonalError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

fn is_vector_shape(shape: &[usize], n: usize) -> bool {
    match shape {
        [len] => *len == n,
        [rows, cols] => (*rows == n && *cols == 1) || (*rows == 1 && *cols == n),
        _ => false,
    }
}

/// Read `n` per-vertex values from a .npy file (f64, or f32 promoted).
pub fn read_npy_values(path: &Path, n: usize) -> Result<Vec<f64>> {
    let arr: ArrayD<f64> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(_) => {
            let arr32: ArrayD<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| EikonalError::UnsupportedDtype(format!("{}", e)))?;
            arr32.mapv(|v| v as f64)
        }
    };

    if !is_vector_shape(arr.shape(), n) {
        return Err(EikonalError::ShapeMismatch {
            expected: vec![n],
            got: arr.shape().to_vec(),
        });
    }
    Ok(arr.iter().copied().collect())
}

/// Read `n` per-vertex values stored under `variable` in a .mat file.
pub fn read_mat_values(path: &Path, variable: &str, n: usize) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| EikonalError::Other(format!("MAT parse error: {}", e)))?;

    let array = mat
        .find_by_name(variable)
        .ok_or_else(|| EikonalError::MatVariableNotFound {
            expected: variable.to_string(),
            available: mat.arrays().iter().map(|a| a.name().to_string()).collect(),
        })?;

    let values: Vec<f64> = match array.data() {
        matfile::NumericData::Double { real, .. } => real.clone(),
        matfile::NumericData::Single { real, .. } => real.iter().map(|&v| v as f64).collect(),
        _ => {
            return Err(EikonalError::UnsupportedDtype(
                "MAT file array is not f64 or f32".to_string(),
            ))
        }
    };

    // A vector has the same element order in either major order.
    if !is_vector_shape(array.size(), n) || values.len() != n {
        return Err(EikonalError::ShapeMismatch {
            expected: vec![n],
            got: array.size().to_vec(),
        });
    }
    Ok(values)
}

/// Read `n` per-vertex values, inferring the format from the extension.
/// `variable` names the array in a .mat file and is ignored for .npy.
pub fn load_vertex_values(path: &Path, variable: &str, n: usize) -> Result<Vec<f64>> {
    match infer_format(path)? {
        FileFormat::Npy => read_npy_values(path, n),
        FileFormat::Mat => read_mat_values(path, variable, n),
    }
}

/// Load per-vertex time costs (`cost` in .mat files).
pub fn load_costs(path: &Path, n: usize) -> Result<Vec<f64>> {
    load_vertex_values(path, "cost", n)
}

/// Load per-vertex speeds (`speed` in .mat files) and convert them to time
/// costs.
pub fn load_speeds_as_costs(path: &Path, n: usize) -> Result<Vec<f64>> {
    speeds_to_costs(&load_vertex_values(path, "speed", n)?)
}

/// Convert speeds to time costs (element-wise `1 / F`).
pub fn speeds_to_costs(speeds: &[f64]) -> Result<Vec<f64>> {
    let mut costs = Vec::with_capacity(speeds.len());
    for (index, &value) in speeds.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(EikonalError::InvalidSpeed { index, value });
        }
        costs.push(1.0 / value);
    }
    Ok(costs)
}

/// Write per-vertex values to a .npy file as a one-dimensional array.
pub fn write_npy_values(path: &Path, values: &[f64]) -> Result<()> {
    let arr = Array1::from_vec(values.to_vec());
    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| EikonalError::Other(format!("npy write error: {}", e)))
}

/// Write per-vertex values to a .mat file as an `n x 1` double matrix.
///
/// The `matfile` crate only reads, so this writes a minimal uncompressed
/// Level 5 file holding a single real double array. See the MAT-File Format
/// documentation: <https://www.mathworks.com/help/pdf_doc/matlab/matfile_format.pdf>
pub fn write_mat_values(path: &Path, variable: &str, values: &[f64]) -> Result<()> {
    write_mat_level5(path, variable, &[values.len(), 1], values)
}

/// Save potentials, inferring the format from the extension. Unreached
/// vertices are written as-is (`f64::MAX`).
pub fn save_potentials(path: &Path, potentials: &[f64]) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => write_npy_values(path, potentials),
        FileFormat::Mat => write_mat_values(path, "potential", potentials),
    }
}

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

fn padded(len: u32) -> u32 {
    len.div_ceil(8) * 8
}

fn write_tag<W: Write>(w: &mut W, data_type: u32, size: u32) -> std::io::Result<()> {
    w.write_all(&data_type.to_le_bytes())?;
    w.write_all(&size.to_le_bytes())
}

fn write_padding<W: Write>(w: &mut W, written: u32) -> std::io::Result<()> {
    let pad = (padded(written) - written) as usize;
    if pad > 0 {
        w.write_all(&[0u8; 8][..pad])?;
    }
    Ok(())
}

/// Single-array Level 5 writer: 128-byte header, then one miMATRIX element
/// made of array flags, dimensions, name and real part sub-elements, each
/// padded to 8 bytes. `data` is in column-major order.
fn write_mat_level5(path: &Path, name: &str, dimensions: &[usize], data: &[f64]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    // 116 bytes of text, 8 bytes subsystem offset, version 0x0100, "IM" = little-endian
    let desc = b"MATLAB 5.0 MAT-file, created by eikonal-mesh";
    let mut header_text = [b' '; 116];
    let len = desc.len().min(116);
    header_text[..len].copy_from_slice(&desc[..len]);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?;
    w.write_all(&0x0100u16.to_le_bytes())?;
    w.write_all(b"IM")?;

    let dims_size = (dimensions.len() * 4) as u32;
    let name_size = name.len() as u32;
    let real_size = (data.len() * 8) as u32;
    let matrix_size =
        16 + (8 + padded(dims_size)) + (8 + padded(name_size)) + (8 + padded(real_size));
    write_tag(&mut w, MI_MATRIX, matrix_size)?;

    write_tag(&mut w, MI_UINT32, 8)?;
    w.write_all(&MX_DOUBLE_CLASS.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    write_tag(&mut w, MI_INT32, dims_size)?;
    for &d in dimensions {
        w.write_all(&(d as i32).to_le_bytes())?;
    }
    write_padding(&mut w, dims_size)?;

    write_tag(&mut w, MI_INT8, name_size)?;
    w.write_all(name.as_bytes())?;
    write_padding(&mut w, name_size)?;

    write_tag(&mut w, MI_DOUBLE, real_size)?;
    for &value in data {
        w.write_all(&value.to_le_bytes())?;
    }
    write_padding(&mut w, real_size)?;

    w.flush()?;
    Ok(())
}
