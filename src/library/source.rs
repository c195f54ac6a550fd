//! library::source — reading and writing parameter files.
//!
//! Purpose
//! -------
//! Define the on-disk encoding of a parameter source and the primitives that
//! turn files into `ndarray` tensors (and back). Everything above this module
//! works with `ArrayD<f64>` and never touches the filesystem directly.
//!
//! Key behaviors
//! -------------
//! - [`read_array`] parses one `<name>.json` file holding a record
//!   `{"value": ...}` whose content is a scalar or a rectangular nested array
//!   in row-major logical order; `null` entries decode to `NaN`.
//! - [`load_single`] / [`load_group`] resolve fixed names inside a library
//!   directory and fail with [`LibError::MissingParameter`] when absent.
//! - [`squeeze`] drops every length-1 axis, so row vectors stored as `1×n`
//!   arrive as plain vectors.
//! - [`write_array`] produces the same encoding (used by the synthetic
//!   source writer and by tooling that exports parameters).
//!
//! Invariants & assumptions
//! ------------------------
//! - A parameter file contains exactly one array under [`FIELD_KEY`].
//! - Nested arrays are rectangular; ragged input is a parse error rather
//!   than being padded.
//! - Group directories hold one file per named field; the field name is the
//!   file stem.
//!
//! Testing notes
//! -------------
//! - Unit tests cover nested/scalar decoding, `null` → `NaN`, ragged input,
//!   squeezing, and missing files.
use crate::library::errors::{LibError, LibResult};
use ndarray::{Array1, Array2, Array3, ArrayD, ArrayViewD, Ix1, Ix2, Ix3, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Record key under which every parameter file stores its array.
pub const FIELD_KEY: &str = "value";

/// File extension of parameter files.
pub const FILE_EXT: &str = "json";

/// On-disk record wrapping a single array.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArrayRecord {
    value: Value,
}

/// Path of the parameter file for `name` inside `dir`.
pub fn param_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{FILE_EXT}"))
}

/// Read and decode one parameter file (not squeezed).
///
/// # Errors
/// - [`LibError::Io`] if the file cannot be read.
/// - [`LibError::Parse`] if the record is malformed, ragged, or non-numeric.
pub fn read_array(path: &Path) -> LibResult<ArrayD<f64>> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|e| LibError::Io { path: display.clone(), reason: e.to_string() })?;
    let record: ArrayRecord = serde_json::from_str(&text)
        .map_err(|e| LibError::Parse { path: display.clone(), reason: e.to_string() })?;
    decode_value(&record.value)
        .map_err(|reason| LibError::Parse { path: display, reason: reason.to_string() })
}

/// Encode `array` into a parameter file at `path`, creating parent directories.
///
/// `NaN` entries are written as `null`.
///
/// # Errors
/// - [`LibError::Io`] if the directory or file cannot be written.
pub fn write_array(path: &Path, array: ArrayViewD<'_, f64>) -> LibResult<()> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| LibError::Io { path: display.clone(), reason: e.to_string() })?;
    }
    let record = ArrayRecord { value: encode_view(array) };
    let text = serde_json::to_string(&record)
        .map_err(|e| LibError::Parse { path: display.clone(), reason: e.to_string() })?;
    fs::write(path, text).map_err(|e| LibError::Io { path: display, reason: e.to_string() })
}

/// Load the squeezed single-file parameter `name` from `dir`.
///
/// # Errors
/// - [`LibError::MissingParameter`] if `<name>.json` is absent.
/// - Any error from [`read_array`].
pub fn load_single(dir: &Path, name: &str) -> LibResult<ArrayD<f64>> {
    let path = param_path(dir, name);
    if !path.is_file() {
        return Err(LibError::MissingParameter { name: name.to_string() });
    }
    tracing::debug!(path = %path.display(), "reading parameter file");
    Ok(squeeze(read_array(&path)?))
}

/// Load every field file of the group directory `dir/group`, squeezed and
/// keyed by file stem.
///
/// # Errors
/// - [`LibError::MissingParameter`] if the group directory is absent.
/// - [`LibError::Io`] if the directory cannot be listed.
/// - Any error from [`read_array`].
pub fn load_group(dir: &Path, group: &str) -> LibResult<BTreeMap<String, ArrayD<f64>>> {
    let group_dir = dir.join(group);
    if !group_dir.is_dir() {
        return Err(LibError::MissingParameter { name: group.to_string() });
    }
    let mut fields = BTreeMap::new();
    for path in list_entries(&group_dir)? {
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(FILE_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        tracing::debug!(path = %path.display(), "reading group field");
        fields.insert(stem.to_string(), squeeze(read_array(&path)?));
    }
    Ok(fields)
}

/// Sorted sub-directories of `dir`.
///
/// # Errors
/// - [`LibError::Io`] if `dir` cannot be listed.
pub fn list_subdirs(dir: &Path) -> LibResult<Vec<PathBuf>> {
    Ok(list_entries(dir)?.into_iter().filter(|p| p.is_dir()).collect())
}

/// Remove every length-1 axis.
pub fn squeeze(array: ArrayD<f64>) -> ArrayD<f64> {
    if array.shape().iter().all(|&d| d != 1) {
        return array;
    }
    let shape: Vec<usize> = array.shape().iter().copied().filter(|&d| d != 1).collect();
    let data: Vec<f64> = array.iter().copied().collect();
    // Element count is unchanged by dropping unit axes.
    ArrayD::from_shape_vec(IxDyn(&shape), data).unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[0])))
}

// ---- Rank coercion ----

/// Coerce a loaded array into a vector; a 0-d scalar becomes a length-1 vector.
///
/// # Errors
/// - [`LibError::RankMismatch`] if the array has more than one axis.
pub fn into_rank1(field: &str, array: ArrayD<f64>) -> LibResult<Array1<f64>> {
    if array.ndim() == 0 {
        return Ok(Array1::from(array.iter().copied().collect::<Vec<_>>()));
    }
    let ndim = array.ndim();
    array.into_dimensionality::<Ix1>().map_err(|_| LibError::RankMismatch {
        field: field.to_string(),
        expected: 1,
        found: ndim,
    })
}

/// Coerce a loaded array into a matrix.
///
/// # Errors
/// - [`LibError::RankMismatch`] if the array does not have exactly two axes.
pub fn into_rank2(field: &str, array: ArrayD<f64>) -> LibResult<Array2<f64>> {
    let ndim = array.ndim();
    array.into_dimensionality::<Ix2>().map_err(|_| LibError::RankMismatch {
        field: field.to_string(),
        expected: 2,
        found: ndim,
    })
}

/// Coerce a loaded array into a rank-3 tensor.
///
/// # Errors
/// - [`LibError::RankMismatch`] if the array does not have exactly three axes.
pub fn into_rank3(field: &str, array: ArrayD<f64>) -> LibResult<Array3<f64>> {
    let ndim = array.ndim();
    array.into_dimensionality::<Ix3>().map_err(|_| LibError::RankMismatch {
        field: field.to_string(),
        expected: 3,
        found: ndim,
    })
}

// ---- Helper methods ----

fn list_entries(dir: &Path) -> LibResult<Vec<PathBuf>> {
    let display = dir.display().to_string();
    let reader = fs::read_dir(dir)
        .map_err(|e| LibError::Io { path: display.clone(), reason: e.to_string() })?;
    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|e| LibError::Io { path: display.clone(), reason: e.to_string() })?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Decode a JSON scalar / nested array into a row-major `ArrayD`.
fn decode_value(value: &Value) -> Result<ArrayD<f64>, &'static str> {
    let mut shape = Vec::new();
    let mut probe = value;
    while let Value::Array(items) = probe {
        shape.push(items.len());
        match items.first() {
            Some(first) => probe = first,
            None => break,
        }
    }
    let mut data = Vec::with_capacity(shape.iter().product());
    flatten_into(value, &shape, &mut data)?;
    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|_| "element count does not match shape")
}

fn flatten_into(value: &Value, shape: &[usize], data: &mut Vec<f64>) -> Result<(), &'static str> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err("ragged nested array");
            }
            for item in items {
                flatten_into(item, rest, data)?;
            }
            Ok(())
        }
        (Value::Array(_), None) => Err("ragged nested array"),
        (_, Some(_)) => Err("ragged nested array"),
        (Value::Number(n), None) => {
            data.push(n.as_f64().ok_or("number is not representable as f64")?);
            Ok(())
        }
        (Value::Null, None) => {
            data.push(f64::NAN);
            Ok(())
        }
        _ => Err("entries must be numbers or null"),
    }
}

fn encode_view(view: ArrayViewD<'_, f64>) -> Value {
    if view.ndim() == 0 {
        let x = view.iter().next().copied().unwrap_or(f64::NAN);
        return serde_json::Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null);
    }
    Value::Array(view.outer_iter().map(encode_view).collect())
}
