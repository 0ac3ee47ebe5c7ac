use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use super::Expr;
use super::order::{compare, compare_terms};

pub(crate) fn simplify(expr: Expr) -> Expr {
    match expr {
        Expr::Expr(head, args) => {
            let args: Vec<Expr> = args.into_iter().map(simplify).collect();
            match head.as_ref() {
                "Plus" => simplify_plus(args),
                "Times" => simplify_times(args),
                "Power" => match <[Expr; 2]>::try_from(args) {
                    Ok([base, exponent]) => simplify_power(base, exponent),
                    Err(args) => Expr::Expr(head, args),
                },
                _ => Expr::Expr(head, args),
            }
        }
        atom => atom,
    }
}

// Args are already simplified so nested heads are flat, one level is enough
fn flatten(args: Vec<Expr>, op: &str) -> Vec<Expr> {
    args.into_iter()
        .flat_map(|a| match a {
            Expr::Expr(h, inner) if h == op => inner,
            other => vec![other],
        })
        .collect()
}

// 3 * x * y => (3, x * y)
fn split_coefficient(term: Expr) -> (BigRational, Expr) {
    match term {
        Expr::Expr(head, mut args) if head == "Times" => match args.first() {
            Some(Expr::Number(n)) => {
                let n = n.clone();
                args.remove(0);
                if args.len() == 1 {
                    (n, args.swap_remove(0))
                } else {
                    (n, Expr::Expr(head, args))
                }
            }
            _ => (BigRational::one(), Expr::Expr(head, args)),
        },
        other => (BigRational::one(), other),
    }
}

// x^3 => (x, 3), x => (x, 1)
fn split_power(factor: Expr) -> (Expr, Expr) {
    match factor {
        Expr::Expr(head, args) if head == "Power" => match <[Expr; 2]>::try_from(args) {
            Ok([base, exponent]) => (base, exponent),
            Err(args) => (Expr::Expr(head, args), Expr::one()),
        },
        other => (other, Expr::one()),
    }
}

fn lone_sum(factors: &[Expr]) -> Option<usize> {
    let mut sums = factors
        .iter()
        .enumerate()
        .filter(|(_, f)| matches!(f, Expr::Expr(h, _) if h == "Plus"));
    match (sums.next(), sums.next()) {
        (Some((idx, _)), None) => Some(idx),
        _ => None,
    }
}

fn take_lone_sum(factors: &mut Vec<Expr>) -> Option<Vec<Expr>> {
    let idx = lone_sum(factors)?;
    match factors.swap_remove(idx) {
        Expr::Expr(h, terms) if h == "Plus" => Some(terms),
        other => {
            factors.push(other);
            None
        }
    }
}

// 3 => (3, 1), 2*x => (2, x)
fn scaled_term(term: &Expr) -> (BigRational, Expr) {
    match term {
        Expr::Number(n) => (n.clone(), Expr::one()),
        other => split_coefficient(other.clone()),
    }
}

// Some(r) when sum `a` is r times sum `b`: 6*x - 9 and 2*x - 3 => 3
fn proportional_sums(a: &Expr, b: &Expr) -> Option<BigRational> {
    let (Expr::Expr(ha, ta), Expr::Expr(hb, tb)) = (a, b) else {
        return None;
    };
    if ha != "Plus" || hb != "Plus" || ta.len() != tb.len() {
        return None;
    }
    let tb: Vec<(BigRational, Expr)> = tb.iter().map(scaled_term).collect();
    let ratios = ta
        .iter()
        .map(|t| {
            let (x, rest) = scaled_term(t);
            let (y, _) = tb.iter().find(|(_, r)| *r == rest)?;
            (!y.is_zero()).then(|| x / y)
        })
        .collect::<Option<Vec<_>>>()?;
    let first = ratios.first()?.clone();
    ratios.iter().all(|r| *r == first).then_some(first)
}

/// Exact `base^exponent` for integer exponents, `None` for `0^-k`.
pub(crate) fn rational_pow(base: &BigRational, exponent: &BigRational) -> Option<BigRational> {
    if !exponent.is_integer() {
        return None;
    }
    let k = exponent.to_integer().to_i32()?;
    if base.is_zero() && k < 0 {
        return None;
    }
    let magnitude = num_traits::pow(base.clone(), k.unsigned_abs() as usize);
    Some(if k < 0 { magnitude.recip() } else { magnitude })
}

pub(crate) fn simplify_plus(args: Vec<Expr>) -> Expr {
    // Fold numbers and collect like terms: 2*x + 1 + x + 3 => 3*x + 4
    let mut constant = BigRational::zero();
    let mut terms: Vec<(Expr, BigRational)> = Vec::new();
    for arg in flatten(args, "Plus") {
        match arg {
            Expr::Number(n) => constant += n,
            other => {
                let (coefficient, rest) = split_coefficient(other);
                match terms.iter_mut().find(|(r, _)| *r == rest) {
                    Some((_, acc)) => *acc += coefficient,
                    None => terms.push((rest, coefficient)),
                }
            }
        }
    }
    let mut new_args: Vec<Expr> = terms
        .into_iter()
        .filter(|(_, coefficient)| !coefficient.is_zero())
        .map(|(rest, coefficient)| {
            if coefficient.is_one() {
                rest
            } else {
                simplify_times(vec![Expr::Number(coefficient), rest])
            }
        })
        .collect();
    new_args.sort_by(compare_terms);
    if !constant.is_zero() || new_args.is_empty() {
        new_args.push(Expr::Number(constant));
    }
    if new_args.len() == 1 {
        new_args.swap_remove(0)
    } else {
        Expr::Expr("Plus".to_string(), new_args)
    }
}

pub(crate) fn simplify_times(args: Vec<Expr>) -> Expr {
    let mut numeric = BigRational::one();
    let mut factors = Vec::new();
    for arg in flatten(args, "Times") {
        match arg {
            Expr::Number(n) => numeric *= n,
            other => factors.push(other),
        }
    }
    if numeric.is_zero() {
        return Expr::zero();
    }
    // Distribute a number over a single sum: 3 * (x + y) * z => (3*x + 3*y) * z
    if !numeric.is_one() {
        if let Some(terms) = take_lone_sum(&mut factors) {
            let scaled = terms
                .into_iter()
                .map(|t| simplify_times(vec![Expr::Number(numeric.clone()), t]))
                .collect();
            factors.push(simplify_plus(scaled));
            return simplify_times(factors);
        }
    }
    // Collect like bases adding up exponents: x * x^2 * x^-3 => 1
    let mut powers: Vec<(Expr, Expr)> = Vec::new();
    for factor in factors {
        let (base, exponent) = split_power(factor);
        if let Some((_, acc)) = powers.iter_mut().find(|(b, _)| *b == base) {
            *acc = simplify_plus(vec![acc.clone(), exponent]);
            continue;
        }
        // Sums differing by a constant share a base: (6*x - 9) * (2*x - 3)^-1 => 3
        let merged = match &exponent {
            Expr::Number(e) => powers.iter_mut().find_map(|(b, acc)| {
                let ratio = proportional_sums(&base, b)?;
                let scale = rational_pow(&ratio, e)?;
                matches!(acc, Expr::Number(_)).then_some((scale, acc))
            }),
            _ => None,
        };
        match merged {
            Some((scale, acc)) => {
                numeric *= scale;
                *acc = simplify_plus(vec![acc.clone(), exponent]);
            }
            None => powers.push((base, exponent)),
        }
    }
    let mut new_args = Vec::new();
    for (base, exponent) in powers {
        match simplify_power(base, exponent) {
            Expr::Number(n) => numeric *= n,
            Expr::Expr(h, inner) if h == "Times" => {
                for f in inner {
                    match f {
                        Expr::Number(n) => numeric *= n,
                        other => new_args.push(other),
                    }
                }
            }
            other => new_args.push(other),
        }
    }
    if numeric.is_zero() {
        return Expr::zero();
    }
    if !numeric.is_one() && lone_sum(&new_args).is_some() {
        new_args.push(Expr::Number(numeric));
        return simplify_times(new_args);
    }
    new_args.sort_by(compare);
    if !numeric.is_one() || new_args.is_empty() {
        new_args.insert(0, Expr::Number(numeric));
    }
    if new_args.len() == 1 {
        new_args.swap_remove(0)
    } else {
        Expr::Expr("Times".to_string(), new_args)
    }
}

pub(crate) fn simplify_power(base: Expr, exponent: Expr) -> Expr {
    match (base, exponent) {
        (Expr::Number(b), Expr::Number(e)) => match rational_pow(&b, &e) {
            Some(n) => Expr::Number(n),
            None => Expr::from_head("Power", vec![Expr::Number(b), Expr::Number(e)]),
        },
        (_, Expr::Number(e)) if e.is_zero() => Expr::one(),
        (base, Expr::Number(e)) if e.is_one() => base,
        (Expr::Number(b), _) if b.is_one() => Expr::one(),
        // (x^a)^k => x^(a*k) for integer k
        (Expr::Expr(head, args), Expr::Number(k)) if head == "Power" && k.is_integer() => {
            match <[Expr; 2]>::try_from(args) {
                Ok([b, e]) => simplify_power(b, simplify_times(vec![e, Expr::Number(k)])),
                Err(args) => Expr::from_head("Power", vec![Expr::Expr(head, args), Expr::Number(k)]),
            }
        }
        // (x*y)^k => x^k * y^k for integer k
        (Expr::Expr(head, args), Expr::Number(k)) if head == "Times" && k.is_integer() => {
            simplify_times(
                args.into_iter()
                    .map(|f| simplify_power(f, Expr::Number(k.clone())))
                    .collect(),
            )
        }
        (base, exponent) => Expr::from_head("Power", vec![base, exponent]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr::Symbol;

    fn sym(name: &str) -> Expr {
        Symbol(name.to_string())
    }

    fn num(n: i64) -> Expr {
        Expr::from(n)
    }

    #[test]
    fn numeric_folding() {
        assert_eq!(simplify_plus(vec![num(1), num(2)]), num(3));
        assert_eq!(simplify_times(vec![num(3), num(4)]), num(12));
        assert_eq!(simplify_power(num(2), num(3)), num(8));
        assert_eq!(simplify_power(num(2), num(-2)), Expr::rational(1, 4));
        assert_eq!(simplify_plus(vec![num(1), num(-1)]), num(0));
        assert_eq!(simplify_times(vec![num(0), sym("x")]), num(0));
        // exact where floats drift: 0.1 * 3 - 0.3
        let tenth = Expr::rational(1, 10);
        assert_eq!(
            simplify_plus(vec![
                simplify_times(vec![tenth, num(3)]),
                Expr::rational(-3, 10)
            ]),
            num(0)
        );
    }

    #[test]
    fn integer_powers_only() {
        assert_eq!(
            simplify_power(num(4), Expr::rational(1, 2)),
            Expr::from_head("Power", vec![num(4), Expr::rational(1, 2)])
        );
        assert_eq!(
            simplify_power(num(0), num(-1)),
            Expr::from_head("Power", vec![num(0), num(-1)])
        );
        assert_eq!(simplify_power(num(0), num(0)), num(1));
    }

    #[test]
    fn identities() {
        assert_eq!(simplify_times(vec![num(1), sym("x")]), sym("x"));
        assert_eq!(simplify_times(vec![sym("x"), num(1)]), sym("x"));
        assert_eq!(simplify_plus(vec![sym("x"), num(0)]), sym("x"));
        assert_eq!(simplify_power(sym("x"), num(1)), sym("x"));
        assert_eq!(simplify_power(sym("x"), num(0)), num(1));
        assert_eq!(simplify_power(num(1), sym("x")), num(1));
    }

    #[test]
    fn collect_like_terms() {
        // 2*x + 1 + x + 3
        let e = simplify(Expr::from_head(
            "Plus",
            vec![
                Expr::from_head("Times", vec![num(2), sym("x")]),
                num(1),
                sym("x"),
                num(3),
            ],
        ));
        assert_eq!(
            e,
            Expr::from_head("Plus", vec![Expr::from_head("Times", vec![num(3), sym("x")]), num(4)])
        );
    }

    #[test]
    fn collect_like_bases() {
        // x * y * x^2 * y^-1
        let e = simplify(Expr::from_head(
            "Times",
            vec![
                sym("x"),
                sym("y"),
                Expr::from_head("Power", vec![sym("x"), num(2)]),
                Expr::from_head("Power", vec![sym("y"), num(-1)]),
            ],
        ));
        assert_eq!(e, Expr::from_head("Power", vec![sym("x"), num(3)]));
    }

    #[test]
    fn distribute_number_over_single_sum() {
        // -1 * (c - a) => a - c
        let sum = simplify_plus(vec![sym("c"), simplify_times(vec![num(-1), sym("a")])]);
        let e = simplify_times(vec![num(-1), sum]);
        assert_eq!(
            e,
            Expr::from_head(
                "Plus",
                vec![sym("a"), Expr::from_head("Times", vec![num(-1), sym("c")])]
            )
        );
    }

    #[test]
    fn power_of_product() {
        // (2 * x)^-1 => 1/2 * x^-1
        let e = simplify_power(Expr::from_head("Times", vec![num(2), sym("x")]), num(-1));
        assert_eq!(
            e,
            Expr::from_head(
                "Times",
                vec![
                    Expr::rational(1, 2),
                    Expr::from_head("Power", vec![sym("x"), num(-1)])
                ]
            )
        );
    }

    #[test]
    fn proportional_sums_cancel() {
        let eps = sym("eps");
        let sum = num(2) * eps.clone() - num(3);
        let tripled = num(6) * eps.clone() - num(9);
        assert_eq!(tripled.clone() / sum.clone(), num(3));
        assert_eq!(sum.clone() / tripled, Expr::rational(1, 3));
        // 3 * ((2*eps - 3)/eps) / ((2*eps - 3)/eps)
        let x = sum / eps;
        assert_eq!((num(3) * x.clone()) / x, num(3));
        assert_ne!(
            simplify_times(vec![
                sym("a") + sym("b"),
                simplify_power(sym("a") - sym("b"), num(-1))
            ]),
            num(1)
        );
    }

    #[test]
    fn rational_cancellation() {
        // c * (a*b - c)/a divided by (a*b - c)/a
        let (a, b, c) = (sym("a"), sym("b"), sym("c"));
        let x = (a.clone() * b - c.clone()) / a;
        assert_eq!((c.clone() * x.clone()) / x.clone(), c);
        assert_eq!((-(c.clone() * x.clone())) / (-x), c);
    }
}
