use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{Result, TrainingError};

/// An in-memory, column-named numeric table.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    data: Array2<f64>,
}

impl Frame {
    /// Creates a new `Frame`.
    ///
    /// # Arguments
    /// * `names` - One name per column of `data`.
    /// * `data` - Row-major samples.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the name count does not match the column count.
    pub fn new(names: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if names.len() != data.ncols() {
            return Err(TrainingError::invalid(
                "frame",
                format!(
                    "{} column names given for {} columns",
                    names.len(),
                    data.ncols()
                ),
            ));
        }

        Ok(Self { names, data })
    }

    /// Builds a frame from rows of equal length.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = names.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(TrainingError::invalid(
                "frame",
                format!("row {i} has {} values, expected {ncols}", row.len()),
            ));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let data = Array2::from_shape_vec((rows.len(), ncols), flat)
            .map_err(|e| TrainingError::invalid("frame", e.to_string()))?;

        Self::new(names.iter().map(|n| n.as_ref().to_string()).collect(), data)
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.data.column(idx)
    }

    /// Copies the given columns of the given rows into a new matrix.
    pub fn gather(&self, rows: &[usize], cols: &[usize]) -> Array2<f64> {
        self.data.select(Axis(0), rows).select(Axis(1), cols)
    }

    /// Copies one column of the given rows.
    pub fn gather_column(&self, rows: &[usize], col: usize) -> Array1<f64> {
        rows.iter().map(|&r| self.data[[r, col]]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = Frame::from_rows(&["a", "b"], &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err.field(), Some("frame"));
    }

    #[test]
    fn gather_selects_rows_and_columns() {
        let frame = Frame::from_rows(
            &["a", "b", "c"],
            &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]],
        )
        .unwrap();

        let x = frame.gather(&[2, 0], &[0, 2]);
        assert_eq!(x, ndarray::array![[7.0, 9.0], [1.0, 3.0]]);
        assert_eq!(frame.gather_column(&[1], 1).to_vec(), vec![5.0]);
        assert_eq!(frame.column_index("c"), Some(2));
        assert_eq!(frame.column_index("z"), None);
    }
}
