//! Routh arrays for the Routh-Hurwitz stability criterion.
//!
//! Coefficients of the characteristic polynomial go in from the highest
//! degree down, either as plain numbers or as symbolic expressions:
//!
//! ```
//! use routh::{parse_coefficients, RouthBuilder};
//!
//! let p = parse_coefficients("[1, a, b, c]").unwrap();
//! let ra = RouthBuilder::new().symbolic(true).build(&p).unwrap();
//! assert_eq!(ra[(3, 0)].to_string(), "c");
//! ```

mod error;
pub use error::RouthError;

mod tokenizer;

mod expr;
pub use expr::Expr;
pub use expr::determinant as symbolic_determinant;

mod parser;
pub use parser::parse_coefficients;

pub mod matrix;

mod array;
pub use array::{Entry, RouthArray, RouthBuilder, routh};
