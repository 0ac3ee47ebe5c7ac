use core::fmt;
use std::ops::{Index, IndexMut};

use tracing::{debug, info};

use crate::RouthError;
use crate::expr::{self, Expr};
use crate::matrix::{self, Matrix};

/// A cell of the Routh array.
///
/// Every cell of one array holds the same variant, numeric builds only
/// produce `Numeric` and symbolic builds only produce `Symbolic`.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Numeric(f64),
    Symbolic(Expr),
}

impl Entry {
    fn zero(symbolic: bool) -> Self {
        if symbolic {
            Entry::Symbolic(Expr::zero())
        } else {
            Entry::Numeric(0.0)
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Entry::Numeric(n) => *n == 0.0,
            Entry::Symbolic(e) => e.is_zero(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Entry::Numeric(n) => Some(*n),
            Entry::Symbolic(e) => e.as_number(),
        }
    }

    /// Exact expression of the entry, `0.1` becomes the rational closest to the float.
    pub fn to_expr(&self) -> Result<Expr, RouthError> {
        match self {
            Entry::Numeric(n) => Expr::try_from(*n),
            Entry::Symbolic(e) => Ok(e.clone()),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Entry::Numeric(n) => write!(f, "{}", n),
            Entry::Symbolic(e) => write!(f, "{}", e),
        }
    }
}

/// Routh table of `degree + 1` rows and `ceil((degree + 1) / 2)` columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RouthArray {
    data: Vec<Entry>,
    cols: usize,
    rows: usize,
}

impl RouthArray {
    fn zeros(rows: usize, cols: usize, symbolic: bool) -> Self {
        RouthArray {
            data: vec![Entry::zero(symbolic); rows * cols],
            cols,
            rows,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Entry> {
        if row < self.rows && col < self.cols {
            Some(&self.data[self.cols * row + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[Entry] {
        assert!(row < self.rows, "Row out of bounds {} {}", row, self.rows);
        &self.data[self.cols * row..self.cols * (row + 1)]
    }

    pub fn first_column(&self) -> Vec<Entry> {
        (0..self.rows).map(|r| self[(r, 0)].clone()).collect()
    }
}

impl Index<(usize, usize)> for RouthArray {
    type Output = Entry;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows, "Index out of bounds {} {}", row, self.rows);
        assert!(col < self.cols, "Index out of bounds {} {}", col, self.cols);
        &self.data[self.cols * row + col]
    }
}

impl IndexMut<(usize, usize)> for RouthArray {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(row < self.rows, "Index out of bounds");
        assert!(col < self.cols, "Index out of bounds");
        &mut self.data[self.cols * row + col]
    }
}

impl fmt::Display for RouthArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let cells: Vec<String> = self.data.iter().map(|e| e.to_string()).collect();
        let widths: Vec<usize> = (0..self.cols)
            .map(|c| {
                (0..self.rows)
                    .map(|r| cells[self.cols * r + c].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        for r in 0..self.rows {
            let line = (0..self.cols)
                .map(|c| format!("{:>w$}", cells[self.cols * r + c], w = widths[c]))
                .collect::<Vec<_>>()
                .join("   ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Routh array of `polynomial`, coefficients listed from the highest degree.
///
/// With `symbolic` off every coefficient has to reduce to a number and
/// minors are evaluated with [`matrix::determinant`]; a zero first element is
/// replaced by `epsilon`. With `symbolic` on the entries are exact
/// expressions and a zero first element becomes the symbol `eps`.
///
/// ```
/// use routh::{routh, Entry, Expr};
///
/// let p: Vec<Expr> = [1, 2, 3, 1].into_iter().map(Expr::from).collect();
/// let ra = routh(&p, 0.01, false).unwrap();
/// assert_eq!(ra[(2, 0)], Entry::Numeric(2.5));
/// ```
pub fn routh(polynomial: &[Expr], epsilon: f64, symbolic: bool) -> Result<RouthArray, RouthError> {
    RouthBuilder::new()
        .epsilon(epsilon)
        .symbolic(symbolic)
        .build(polynomial)
}

/// Settings for building Routh arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct RouthBuilder {
    epsilon: f64,
    epsilon_symbol: String,
    variable: String,
    symbolic: bool,
}

impl Default for RouthBuilder {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            epsilon_symbol: "eps".to_string(),
            variable: "s".to_string(),
            symbolic: false,
        }
    }
}

impl RouthBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value replacing a zero first element in numeric builds.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Symbol replacing a zero first element in symbolic builds.
    pub fn epsilon_symbol(mut self, name: &str) -> Self {
        self.epsilon_symbol = name.to_string();
        self
    }

    /// Variable of the auxiliary polynomial used for rows of zeros.
    pub fn variable(mut self, name: &str) -> Self {
        self.variable = name.to_string();
        self
    }

    pub fn symbolic(mut self, symbolic: bool) -> Self {
        self.symbolic = symbolic;
        self
    }

    fn validate(&self) -> Result<(), RouthError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(RouthError::InvalidArgument(format!(
                "epsilon must be a small positive number, got {}",
                self.epsilon
            )));
        }
        if self.variable == self.epsilon_symbol {
            return Err(RouthError::InvalidArgument(format!(
                "variable and epsilon symbol are both '{}'",
                self.variable
            )));
        }
        Ok(())
    }

    fn entry(&self, coefficient: &Expr) -> Result<Entry, RouthError> {
        if !coefficient.is_finite() {
            return Err(RouthError::InvalidArgument(format!(
                "coefficient {} isn't finite",
                coefficient
            )));
        }
        for reserved in [&self.variable, &self.epsilon_symbol] {
            if coefficient.contains_symbol(reserved) {
                return Err(RouthError::InvalidArgument(format!(
                    "coefficient {} uses reserved symbol '{}'",
                    coefficient, reserved
                )));
            }
        }
        if self.symbolic {
            return Ok(Entry::Symbolic(coefficient.clone().simplify()));
        }
        coefficient.as_number().map(Entry::Numeric).ok_or_else(|| {
            RouthError::InvalidArgument(format!(
                "coefficient {} isn't numeric, use a symbolic build",
                coefficient
            ))
        })
    }

    fn placeholder(&self) -> Entry {
        if self.symbolic {
            Entry::Symbolic(Expr::symbol(&self.epsilon_symbol))
        } else {
            Entry::Numeric(self.epsilon)
        }
    }

    pub fn build(&self, polynomial: &[Expr]) -> Result<RouthArray, RouthError> {
        self.validate()?;
        if polynomial.is_empty() {
            return Err(RouthError::InvalidArgument(
                "polynomial needs at least one coefficient".to_string(),
            ));
        }
        let coefficients = polynomial
            .iter()
            .map(|c| self.entry(c))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = coefficients.len();
        let cols = rows.div_ceil(2);
        let mut ra = RouthArray::zeros(rows, cols, self.symbolic);
        // Even powers go to row 0 and odd ones to row 1, a missing trailing
        // odd coefficient is the table's zero.
        for (idx, c) in coefficients.into_iter().enumerate() {
            ra[(idx % 2, idx / 2)] = c;
        }

        for i in 2..rows {
            if ra.row(i - 1).iter().all(Entry::is_zero) {
                self.replace_zero_row(&mut ra, i)?;
            }
            if ra[(i - 1, 0)].is_zero() {
                info!(row = i - 1, "first element is zero, replacing with epsilon");
                ra[(i - 1, 0)] = self.placeholder();
            }
            let live = (rows - i).div_ceil(2);
            debug!(row = i, live, "computing row");
            for j in 0..live {
                ra[(i, j)] = self.minor(&ra, i, j)?;
            }
        }
        Ok(ra)
    }

    // Rebuilds an all zero row i-1 from the derivative of the auxiliary
    // polynomial formed by row i-2.
    fn replace_zero_row(&self, ra: &mut RouthArray, i: usize) -> Result<(), RouthError> {
        info!(
            row = i - 1,
            source = i - 2,
            "row of zeros, differentiating auxiliary polynomial"
        );
        // row i-2 holds the coefficients of s^order, s^(order-2), ...
        let order = ra.rows() + 1 - i;
        let s = Expr::symbol(&self.variable);
        let mut auxiliary = Expr::zero();
        for k in (0..ra.cols()).take_while(|k| 2 * k <= order) {
            let power = i64::try_from(order - 2 * k)
                .map_err(|_| RouthError::InvalidArgument(format!("degree {} too large", order)))?;
            auxiliary = auxiliary + ra[(i - 2, k)].to_expr()? * s.clone().pow(power);
        }
        let derivative = auxiliary.derivative(&self.variable)?;
        let coefficients = derivative.coefficient_list(&self.variable)?;
        debug!(%auxiliary, %derivative, "auxiliary polynomial");

        // Read the derivative at powers order-1, order-3, ... so interior
        // zero coefficients keep their column.
        let top = coefficients.len() - 1;
        for k in 0..ra.cols() {
            let power = (order - 1).checked_sub(2 * k);
            let coefficient = match power {
                Some(p) if p <= top => coefficients[top - p].clone(),
                _ => Expr::zero(),
            };
            ra[(i - 1, k)] = if self.symbolic {
                Entry::Symbolic(coefficient)
            } else {
                Entry::Numeric(coefficient.as_number().ok_or_else(|| {
                    RouthError::InvalidArgument(format!(
                        "auxiliary coefficient {} isn't numeric",
                        coefficient
                    ))
                })?)
            };
        }
        Ok(())
    }

    // -det([[a, b], [c, d]]) / c
    fn minor(&self, ra: &RouthArray, i: usize, j: usize) -> Result<Entry, RouthError> {
        let (a, b) = (&ra[(i - 2, 0)], &ra[(i - 2, j + 1)]);
        let (c, d) = (&ra[(i - 1, 0)], &ra[(i - 1, j + 1)]);
        if c.is_zero() {
            return Err(RouthError::DivisionByZero { row: i, column: j });
        }
        if self.symbolic {
            let det = expr::determinant(&[
                vec![a.to_expr()?, b.to_expr()?],
                vec![c.to_expr()?, d.to_expr()?],
            ])?;
            return Ok(Entry::Symbolic(-det / c.to_expr()?));
        }
        let numeric = |e: &Entry| {
            e.as_f64().ok_or_else(|| {
                RouthError::InvalidArgument(format!("entry {} isn't numeric", e))
            })
        };
        let (a, b, c, d) = (numeric(a)?, numeric(b)?, numeric(c)?, numeric(d)?);
        let det = matrix::determinant(&Matrix::from_rows(vec![vec![a, b], vec![c, d]])?)?;
        let value = -det / c;
        if !value.is_finite() {
            return Err(RouthError::DivisionByZero { row: i, column: j });
        }
        // Avoid -0 showing up in the table
        Ok(Entry::Numeric(if value == 0.0 { 0.0 } else { value }))
    }
}
