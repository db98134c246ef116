//! Raw spreadsheet cells and the loaders that produce them.
//!
//! The pipeline only ever sees a 2-D array of [`Cell`]s with the header labels in
//! the first row. Decoding workbook formats is left to whoever exports the sheet;
//! here we accept the two interchange shapes it is usually exported as: CSV, and
//! a JSON array of rows whose cells are strings, numbers or `null`.

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{fs, io::Read, path::Path};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(v) => !v.is_finite(),
        }
    }

    /// Trimmed label form of the cell, `None` when blank.
    ///
    /// Whole numbers render without a fractional part so a numeric `2024`
    /// and a textual `"2024"` produce the same key.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(v) if !v.is_finite() => None,
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
            Cell::Number(v) => Some(v.to_string()),
        }
    }

    /// Numeric value of the cell; anything unparseable is 0.
    pub fn number(&self) -> f64 {
        match self {
            Cell::Number(v) if v.is_finite() => *v,
            Cell::Number(_) | Cell::Empty => 0.0,
            Cell::Text(s) => parse_numeric(s),
        }
    }
}

/// Parses spreadsheet-formatted numbers such as `"$1,234.50"` or `"85%"`.
///
/// `%`, `$` and `,` are stripped; a `%` anywhere in the text divides the result
/// by 100. Unparseable or non-finite input yields 0.
pub fn parse_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let is_percent = trimmed.contains('%');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '%' | '$' | ','))
        .collect();
    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if is_percent {
                value / 100.0
            } else {
                value
            }
        }
        _ => 0.0,
    }
}

pub fn read_csv_cells<R: Read>(reader: R) -> Result<Vec<Vec<Cell>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(rows)
}

pub fn parse_json_cells(text: &str) -> Result<Vec<Vec<Cell>>> {
    Ok(serde_json::from_str(text)?)
}

/// Reads a whole input file into memory as raw cells, dispatching on extension.
pub fn load_cells(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let extension = path
        .extension()
        .and_then(|x| x.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let io_err = |source| ForecastError::Io {
        path: path.to_path_buf(),
        source,
    };
    match extension.as_str() {
        "csv" => {
            let bytes = fs::read(path).map_err(io_err)?;
            read_csv_cells(bytes.as_slice())
        }
        "json" => {
            let text = fs::read_to_string(path).map_err(io_err)?;
            parse_json_cells(&text)
        }
        _ => Err(ForecastError::data_format(format!(
            "unsupported input extension for {}; export the sheet as .csv or .json",
            path.display()
        ))),
    }
}
