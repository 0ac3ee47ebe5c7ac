use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("matrix must be square, got {rows}x{cols}")]
    DimensionMismatch { rows: usize, cols: usize },
    #[error("division by zero or overflow computing entry ({row}, {column})")]
    DivisionByZero { row: usize, column: usize },
    #[error("not a polynomial: {0}")]
    NotPolynomial(String),
    #[error("parse error: {0}")]
    Parse(String),
}
