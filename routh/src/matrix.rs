use std::ops::{Index, IndexMut};

use crate::RouthError;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    cols: usize,
    rows: usize,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, RouthError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(RouthError::InvalidArgument("Empty rows or cols".to_string()));
        }
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(RouthError::InvalidArgument(format!(
                "Ragged rows, expected {} cols",
                n_cols
            )));
        }
        Ok(Matrix {
            data: rows.into_iter().flatten().collect(),
            rows: n_rows,
            cols: n_cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(self.cols * a + c, self.cols * b + c);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows, "Index out of bounds {} {}", row, self.rows);
        assert!(col < self.cols, "Index out of bounds {} {}", col, self.cols);
        &self.data[self.cols * row + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(row < self.rows, "Index out of bounds");
        assert!(col < self.cols, "Index out of bounds");
        &mut self.data[self.cols * row + col]
    }
}

/// Determinant by Gaussian elimination with partial pivoting.
///
/// Each step swaps in the remaining row with the largest magnitude in the
/// pivot column, then eliminates below it. The result is the product of the
/// diagonal of the triangular form, negated once per row swap. Small
/// near-singular minors keep their precision this way where elimination in
/// the given row order or a plain cofactor formula can cancel to garbage.
pub fn determinant(m: &Matrix) -> Result<f64, RouthError> {
    if m.rows != m.cols {
        return Err(RouthError::DimensionMismatch {
            rows: m.rows,
            cols: m.cols,
        });
    }
    let n = m.rows;
    let mut x = m.clone();
    let mut swaps = 0;
    for i in 0..n {
        let mut pivot = i;
        for k in i + 1..n {
            if x[(k, i)].abs() > x[(pivot, i)].abs() {
                pivot = k;
            }
        }
        // Whole column is zero below the diagonal, singular
        if x[(pivot, i)] == 0.0 {
            return Ok(0.0);
        }
        if pivot != i {
            x.swap_rows(i, pivot);
            swaps += 1;
        }
        for k in i + 1..n {
            let c = -x[(k, i)] / x[(i, i)];
            x[(k, i)] = 0.0;
            for j in i + 1..n {
                let upper = x[(i, j)];
                x[(k, j)] += c * upper;
            }
        }
    }
    let sign = if swaps % 2 == 0 { 1.0 } else { -1.0 };
    Ok((0..n).fold(sign, |det, i| det * x[(i, i)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Elimination in the given row order, for comparison
    fn unpivoted_determinant(m: &Matrix) -> f64 {
        let n = m.rows();
        let mut x = m.clone();
        for i in 0..n {
            for k in i + 1..n {
                let c = -x[(k, i)] / x[(i, i)];
                for j in i..n {
                    let upper = x[(i, j)];
                    x[(k, j)] += c * upper;
                }
            }
        }
        (0..n).map(|i| x[(i, i)]).product()
    }

    #[test]
    fn determinant_2x2() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
        assert_relative_eq!(determinant(&m)?, -2.0, epsilon = 1e-12);
        let m = Matrix::from_rows(vec![vec![1.0, 3.0], vec![2.0, 1.0]])?;
        assert_relative_eq!(determinant(&m)?, -5.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn determinant_3x3() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![
            vec![6.0, 1.0, 1.0],
            vec![4.0, -2.0, 5.0],
            vec![2.0, 8.0, 7.0],
        ])?;
        assert_relative_eq!(determinant(&m)?, -306.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn determinant_identity_and_swaps() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])?;
        assert_eq!(determinant(&m)?, -1.0);
        let m = Matrix::from_rows(vec![vec![5.0]])?;
        assert_eq!(determinant(&m)?, 5.0);
        Ok(())
    }

    #[test]
    fn singular() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![vec![0.0, 1.0], vec![0.0, 2.0]])?;
        assert_eq!(determinant(&m)?, 0.0);
        let m = Matrix::from_rows(vec![vec![1.0, 24.0], vec![2.0, 48.0]])?;
        assert_eq!(determinant(&m)?, 0.0);
        Ok(())
    }

    #[test]
    fn near_singular_needs_pivoting() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![
            vec![1e-20, 1.0, 1.0],
            vec![1.0, 1.0, 2.0],
            vec![1.0, 2.0, 1.0],
        ])?;
        // Exact value is 2 - 3e-20
        assert_relative_eq!(determinant(&m)?, 2.0, epsilon = 1e-12);
        assert_eq!(unpivoted_determinant(&m), 0.0);
        Ok(())
    }

    #[test]
    fn non_square() -> Result<(), RouthError> {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;
        assert_eq!(
            determinant(&m),
            Err(RouthError::DimensionMismatch { rows: 2, cols: 3 })
        );
        Ok(())
    }

    #[test]
    fn bad_shapes() {
        assert!(Matrix::from_rows(vec![]).is_err());
        assert!(Matrix::from_rows(vec![vec![]]).is_err());
        assert!(Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
    }
}
