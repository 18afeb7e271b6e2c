//! Loading of static reference tables (gauge coordinates, band memberships,
//! fuzz offsets, monthly evapotranspiration) and the interleaved day/night
//! ET series generator.
//!
//! Tables are headerless numeric text: one value per record for columns,
//! one whitespace/comma-delimited row per line for matrices. `nan` entries
//! are allowed in the ET matrices and are skipped when sampling.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{Result, StormError};

pub const DAYS_IN_MONTH: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Parse a headerless column of numbers (one or more values per line).
pub fn parse_column(text: &str) -> std::result::Result<Vec<f64>, String> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let v: f64 = token
                .parse()
                .map_err(|_| format!("line {}: unparseable value `{token}`", lineno + 1))?;
            out.push(v);
        }
    }
    Ok(out)
}

/// Parse a headerless numeric matrix, one row per non-empty line.
pub fn parse_matrix(text: &str) -> std::result::Result<Vec<Vec<f64>>, String> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_column(line).map_err(|e| format!("row at line {}: {e}", lineno + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_column(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)
        .map_err(|source| StormError::TableIo { path: path.to_path_buf(), source })?;
    parse_column(&text).map_err(|reason| StormError::BadTable { path: path.to_path_buf(), reason })
}

pub fn load_matrix(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = fs::read_to_string(path)
        .map_err(|source| StormError::TableIo { path: path.to_path_buf(), source })?;
    parse_matrix(&text).map_err(|reason| StormError::BadTable { path: path.to_path_buf(), reason })
}

/// Monthly day/night evapotranspiration observations: rows are observations,
/// the 12 columns are months.
#[derive(Debug, Clone)]
pub struct EtTables {
    day: Vec<Vec<f64>>,
    night: Vec<Vec<f64>>,
}

impl EtTables {
    pub fn new(day: Vec<Vec<f64>>, night: Vec<Vec<f64>>) -> std::result::Result<Self, String> {
        for (name, table) in [("day", &day), ("night", &night)] {
            if table.is_empty() {
                return Err(format!("{name} ET table is empty"));
            }
            for (i, row) in table.iter().enumerate() {
                if row.len() != 12 {
                    return Err(format!(
                        "{name} ET table row {} has {} columns, expected 12",
                        i + 1,
                        row.len()
                    ));
                }
            }
            for month in 0..12 {
                if !table.iter().any(|row| row[month].is_finite()) {
                    return Err(format!(
                        "{name} ET table month {} has no finite observations",
                        month + 1
                    ));
                }
            }
        }
        Ok(Self { day, night })
    }

    pub fn load(day_path: &Path, night_path: &Path) -> Result<Self> {
        let day = load_matrix(day_path)?;
        let night = load_matrix(night_path)?;
        Self::new(day, night).map_err(|reason| StormError::BadTable {
            path: day_path.to_path_buf(),
            reason,
        })
    }

    /// One simulated year of ET: for each month, draw `DAYS_IN_MONTH` day
    /// values then as many night values (uniform with replacement from the
    /// month's finite observations), interleaved day/night. Length 730.
    pub fn annual_series(&self, rng: &mut StdRng) -> Vec<f64> {
        let mut out = Vec::with_capacity(2 * 365);
        for month in 0..12 {
            let days = DAYS_IN_MONTH[month];
            let day_vals = Self::month_draws(&self.day, month, days, rng);
            let night_vals = Self::month_draws(&self.night, month, days, rng);
            for (d, n) in day_vals.into_iter().zip(night_vals) {
                out.push(d);
                out.push(n);
            }
        }
        out
    }

    fn month_draws(table: &[Vec<f64>], month: usize, count: usize, rng: &mut StdRng) -> Vec<f64> {
        // Non-empty by the constructor's finite-observation check.
        let pool: Vec<f64> = table.iter().map(|row| row[month]).filter(|v| v.is_finite()).collect();
        (0..count).map(|_| pool[rng.gen_range(0..pool.len())]).collect()
    }
}
