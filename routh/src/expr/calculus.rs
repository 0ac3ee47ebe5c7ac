use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use super::Expr;
use super::arithmetic::{simplify_plus, simplify_power, simplify_times};
use crate::RouthError;

pub(crate) fn derivative(expr: &Expr, var: &str) -> Result<Expr, RouthError> {
    if !expr.contains_symbol(var) {
        return Ok(Expr::zero());
    }
    match expr {
        Expr::Number(_) => Ok(Expr::zero()),
        Expr::Symbol(_) => Ok(Expr::one()),
        Expr::Expr(head, args) => match (head.as_ref(), args.as_slice()) {
            ("Plus", terms) => Ok(simplify_plus(
                terms
                    .iter()
                    .map(|t| derivative(t, var))
                    .collect::<Result<_, _>>()?,
            )),
            // (f*g*h)' = f'*g*h + f*g'*h + f*g*h'
            ("Times", factors) => {
                let mut terms = Vec::new();
                for (idx, factor) in factors.iter().enumerate() {
                    let df = derivative(factor, var)?;
                    if matches!(&df, Expr::Number(n) if n.is_zero()) {
                        continue;
                    }
                    let mut product = factors.to_vec();
                    product[idx] = df;
                    terms.push(simplify_times(product));
                }
                Ok(simplify_plus(terms))
            }
            // (u^n)' = n * u^(n-1) * u'
            ("Power", [base, exponent]) if !exponent.contains_symbol(var) => Ok(simplify_times(vec![
                exponent.clone(),
                simplify_power(
                    base.clone(),
                    simplify_plus(vec![exponent.clone(), Expr::from(-1)]),
                ),
                derivative(base, var)?,
            ])),
            _ => Err(RouthError::InvalidArgument(format!(
                "can't differentiate {} with respect to {}",
                expr, var
            ))),
        },
    }
}

fn terms_of(e: Expr) -> Vec<Expr> {
    match e {
        Expr::Expr(h, args) if h == "Plus" => args,
        other => vec![other],
    }
}

// (a + b) * (c + d) => a*c + a*d + b*c + b*d
fn multiply_out(lhs: Expr, rhs: Expr) -> Expr {
    let rhs = terms_of(rhs);
    simplify_plus(
        terms_of(lhs)
            .into_iter()
            .flat_map(|l| {
                rhs.iter()
                    .map(move |r| simplify_times(vec![l.clone(), r.clone()]))
            })
            .collect(),
    )
}

pub(crate) fn expand(expr: Expr) -> Expr {
    match expr {
        Expr::Expr(head, args) => match head.as_ref() {
            "Plus" => simplify_plus(args.into_iter().map(expand).collect()),
            "Times" => args.into_iter().map(expand).fold(Expr::one(), multiply_out),
            "Power" => match <[Expr; 2]>::try_from(args) {
                Ok([base, Expr::Number(k)]) => match (positive_integer(&k), expand(base)) {
                    (Some(n), Expr::Expr(h, terms)) if h == "Plus" => {
                        let sum = Expr::Expr(h, terms);
                        (0..n).fold(Expr::one(), |acc, _| multiply_out(acc, sum.clone()))
                    }
                    (_, other) => simplify_power(other, Expr::Number(k)),
                },
                Ok([base, exponent]) => simplify_power(expand(base), expand(exponent)),
                Err(args) => Expr::Expr(head, args),
            },
            _ => Expr::Expr(head, args),
        },
        atom => atom,
    }
}

fn positive_integer(k: &BigRational) -> Option<usize> {
    if k.is_integer() && k.is_positive() {
        k.to_integer().to_usize()
    } else {
        None
    }
}

// s^k => Some(k), s => Some(1)
fn var_power(factor: &Expr, var: &str) -> Option<usize> {
    match factor {
        Expr::Symbol(s) if s == var => Some(1),
        Expr::Expr(h, args) if h == "Power" => match args.as_slice() {
            [Expr::Symbol(s), Expr::Number(k)]
                if s == var && k.is_integer() && !k.is_negative() =>
            {
                k.to_integer().to_usize()
            }
            _ => None,
        },
        _ => None,
    }
}

// 3*a*s^2 => (2, 3*a)
fn split_degree(term: Expr, var: &str) -> Result<(usize, Expr), RouthError> {
    let factors = match term {
        Expr::Expr(h, args) if h == "Times" => args,
        other => vec![other],
    };
    let mut degree = 0;
    let mut rest = Vec::new();
    for factor in factors {
        if !factor.contains_symbol(var) {
            rest.push(factor);
            continue;
        }
        degree += var_power(&factor, var)
            .ok_or_else(|| RouthError::NotPolynomial(format!("{} in {}", factor, var)))?;
    }
    Ok((degree, simplify_times(rest)))
}

/// Coefficients of `expr` as a polynomial in `var`, highest degree first.
pub(crate) fn coefficient_list(expr: &Expr, var: &str) -> Result<Vec<Expr>, RouthError> {
    let monomials = terms_of(expand(expr.clone()))
        .into_iter()
        .map(|t| split_degree(t, var))
        .collect::<Result<Vec<_>, _>>()?;
    let degree = monomials.iter().map(|(d, _)| *d).max().unwrap_or(0);
    let mut coefficients = vec![Expr::zero(); degree + 1];
    for (d, coefficient) in monomials {
        let slot = &mut coefficients[degree - d];
        *slot = simplify_plus(vec![slot.clone(), coefficient]);
    }
    Ok(coefficients)
}
