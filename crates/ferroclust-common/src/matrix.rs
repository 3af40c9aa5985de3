//! Named dense matrices.
//!
//! `DataMatrix` backs both the expression input (genes x conditions) and the
//! score matrices (genes x clusters) exchanged between scoring functions.
//! Values are stored row-major.

use serde::{Deserialize, Serialize};

use crate::error::{FerroclustError, Result};

/// Lowest value kept by [`DataMatrix::fix_extreme_values`].
pub const EXTREME_VALUE_FLOOR: f64 = -20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMatrix {
    row_names: Vec<String>,
    column_names: Vec<String>,
    values: Vec<f64>,
}

/// A genes x clusters score table. Columns are named `"1".."K"`.
pub type ScoreMatrix = DataMatrix;

impl DataMatrix {
    /// Zero-filled matrix with the given names.
    pub fn new(row_names: Vec<String>, column_names: Vec<String>) -> Self {
        let len = row_names.len() * column_names.len();
        Self {
            row_names,
            column_names,
            values: vec![0.0; len],
        }
    }

    /// Zero-filled score matrix with one column per cluster `1..=num_clusters`.
    pub fn for_clusters(row_names: Vec<String>, num_clusters: usize) -> Self {
        let columns = (1..=num_clusters).map(|c| c.to_string()).collect();
        Self::new(row_names, columns)
    }

    /// Build from nested rows. Every row must have one value per column.
    pub fn from_rows(
        row_names: Vec<String>,
        column_names: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let expected = (row_names.len(), column_names.len());
        if rows.len() != expected.0 {
            return Err(FerroclustError::shape(expected, (rows.len(), expected.1)));
        }
        let mut values = Vec::with_capacity(expected.0 * expected.1);
        for row in rows {
            if row.len() != expected.1 {
                return Err(FerroclustError::shape(expected, (expected.0, row.len())));
            }
            values.extend(row);
        }
        Ok(Self { row_names, column_names, values })
    }

    pub fn num_rows(&self) -> usize {
        self.row_names.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_name(&self, row: usize) -> &str {
        &self.row_names[row]
    }

    pub fn column_name(&self, column: usize) -> &str {
        &self.column_names[column]
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.row_names.iter().position(|r| r == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.num_columns() + column]
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        let width = self.num_columns();
        self.values[row * width + column] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.num_columns();
        &self.values[row * width..(row + 1) * width]
    }

    /// Row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy of this matrix with its values replaced. `values` must be row-major
    /// and of the same length.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(FerroclustError::ShapeMismatch {
                expected: format!("{} values", self.values.len()),
                found: format!("{} values", values.len()),
            });
        }
        Ok(Self {
            row_names: self.row_names.clone(),
            column_names: self.column_names.clone(),
            values,
        })
    }

    /// Extract rows and columns by name. `None` keeps every row (or column).
    /// Names keep the order in which they are given.
    pub fn submatrix_by_name(
        &self,
        row_names: Option<&[String]>,
        column_names: Option<&[String]>,
    ) -> Result<Self> {
        let rows = match row_names {
            Some(names) => names
                .iter()
                .map(|n| self.row_index(n).ok_or_else(|| FerroclustError::UnknownName(n.clone())))
                .collect::<Result<Vec<_>>>()?,
            None => (0..self.num_rows()).collect(),
        };
        let columns = match column_names {
            Some(names) => names
                .iter()
                .map(|n| {
                    self.column_index(n)
                        .ok_or_else(|| FerroclustError::UnknownName(n.clone()))
                })
                .collect::<Result<Vec<_>>>()?,
            None => (0..self.num_columns()).collect(),
        };
        self.submatrix_by_index(&rows, &columns)
    }

    pub fn submatrix_by_index(&self, rows: &[usize], columns: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.num_rows()) {
            return Err(FerroclustError::UnknownName(format!("row index {bad}")));
        }
        if let Some(&bad) = columns.iter().find(|&&c| c >= self.num_columns()) {
            return Err(FerroclustError::UnknownName(format!("column index {bad}")));
        }
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for &r in rows {
            for &c in columns {
                values.push(self.get(r, c));
            }
        }
        Ok(Self {
            row_names: rows.iter().map(|&r| self.row_names[r].clone()).collect(),
            column_names: columns.iter().map(|&c| self.column_names[c].clone()).collect(),
            values,
        })
    }

    /// Per-column mean, ignoring NaN entries. A column with no finite value
    /// yields NaN.
    pub fn column_means(&self) -> Vec<f64> {
        (0..self.num_columns())
            .map(|c| {
                let (sum, count) = (0..self.num_rows())
                    .map(|r| self.get(r, c))
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if count == 0 { f64::NAN } else { sum / count as f64 }
            })
            .collect()
    }

    /// Elementwise `self * factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            row_names: self.row_names.clone(),
            column_names: self.column_names.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// In-place `self += other * factor`.
    pub fn add_scaled(&mut self, other: &DataMatrix, factor: f64) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(FerroclustError::shape(self.shape(), other.shape()));
        }
        for (v, o) in self.values.iter_mut().zip(&other.values) {
            *v += o * factor;
        }
        Ok(())
    }

    /// Clamp the value range: entries below [`EXTREME_VALUE_FLOOR`] are raised
    /// to the smallest entry at or above the floor, non-finite entries become
    /// the largest finite entry.
    pub fn fix_extreme_values(&mut self) {
        let finite: Vec<f64> = self.values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return;
        }
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = finite
            .iter()
            .copied()
            .filter(|&v| v >= EXTREME_VALUE_FLOOR)
            .fold(f64::INFINITY, f64::min);
        let min = if min.is_finite() { min } else { EXTREME_VALUE_FLOOR };

        for v in self.values.iter_mut() {
            if !v.is_finite() {
                *v = max;
            } else if *v < EXTREME_VALUE_FLOOR {
                *v = min;
            }
        }
    }
}
