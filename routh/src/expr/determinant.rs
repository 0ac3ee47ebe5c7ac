use super::Expr;
use crate::RouthError;

/// Exact determinant of a square matrix of expressions.
///
/// Cofactor expansion along the first row. Only meant for the small minors
/// the Routh recurrence needs, it's factorial in the matrix size.
pub fn determinant(matrix: &[Vec<Expr>]) -> Result<Expr, RouthError> {
    let rows = matrix.len();
    if let Some(row) = matrix.iter().find(|r| r.len() != rows) {
        return Err(RouthError::DimensionMismatch {
            rows,
            cols: row.len(),
        });
    }
    if rows == 0 {
        return Err(RouthError::InvalidArgument("empty matrix".to_string()));
    }
    Ok(cofactor_expansion(matrix))
}

fn cofactor_expansion(m: &[Vec<Expr>]) -> Expr {
    match m {
        [row] => row[0].clone(),
        [top, bottom] => {
            top[0].clone() * bottom[1].clone() - top[1].clone() * bottom[0].clone()
        }
        _ => (0..m.len()).fold(Expr::zero(), |acc, col| {
            let minor: Vec<Vec<Expr>> = m[1..]
                .iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|(j, _)| *j != col)
                        .map(|(_, e)| e.clone())
                        .collect()
                })
                .collect();
            let term = m[0][col].clone() * cofactor_expansion(&minor);
            if col % 2 == 0 { acc + term } else { acc - term }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::determinant;
    use crate::RouthError;
    use crate::expr::Expr;

    fn sym(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn symbolic_2x2() -> Result<(), RouthError> {
        let m = vec![vec![Expr::one(), sym("b")], vec![sym("a"), sym("c")]];
        assert_eq!(determinant(&m)?, sym("c") - sym("a") * sym("b"));
        Ok(())
    }

    #[test]
    fn numeric_3x3() -> Result<(), RouthError> {
        let m: Vec<Vec<Expr>> = [[2, 0, 1], [1, 3, 2], [1, 1, 1]]
            .iter()
            .map(|row| row.iter().map(|x| Expr::from(*x)).collect())
            .collect();
        // 2*(3 - 2) - 0 + 1*(1 - 3)
        assert_eq!(determinant(&m)?, Expr::zero());
        Ok(())
    }

    #[test]
    fn symbolic_3x3_matches_substitution() -> Result<(), RouthError> {
        let m = vec![
            vec![sym("a"), Expr::from(2), Expr::zero()],
            vec![Expr::one(), sym("b"), Expr::from(3)],
            vec![Expr::zero(), Expr::one(), sym("c")],
        ];
        // a*(b*c - 3) - 2*c
        let det = determinant(&m)?;
        assert_eq!(det.evaluate(&[("a", 2.0), ("b", 5.0), ("c", 7.0)])?, 50.0);
        Ok(())
    }

    #[test]
    fn non_square() {
        let m = vec![
            vec![Expr::one(), Expr::one(), Expr::one()],
            vec![Expr::one(), Expr::one(), Expr::one()],
        ];
        assert_eq!(
            determinant(&m),
            Err(RouthError::DimensionMismatch { rows: 2, cols: 3 })
        );
        assert!(determinant(&[]).is_err());
    }
}
