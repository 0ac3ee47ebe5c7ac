use std::cmp::Ordering;

use num_traits::ToPrimitive;

use super::Expr;

fn rank(e: &Expr) -> u8 {
    match e {
        Expr::Number(_) => 0,
        Expr::Symbol(_) => 1,
        Expr::Expr(_, _) => 2,
    }
}

/// Total structural order used to sort the arguments of commutative heads.
pub(crate) fn compare(a: &Expr, b: &Expr) -> Ordering {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => x.cmp(y),
        (Expr::Symbol(x), Expr::Symbol(y)) => x.cmp(y),
        (Expr::Expr(ha, aa), Expr::Expr(hb, ab)) => ha.cmp(hb).then_with(|| compare_args(aa, ab)),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_args(a: &[Expr], b: &[Expr]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn degree(e: &Expr) -> f64 {
    match e {
        Expr::Number(_) => 0.0,
        Expr::Symbol(_) => 1.0,
        Expr::Expr(head, args) => match (head.as_ref(), args.as_slice()) {
            ("Times", factors) => factors.iter().map(degree).sum(),
            ("Power", [base, Expr::Number(k)]) => degree(base) * k.to_f64().unwrap_or(0.0),
            ("Plus", terms) => terms.iter().map(degree).fold(0.0, f64::max),
            _ => 1.0,
        },
    }
}

/// Order for the terms of a sum: highest degree first, constants last.
pub(crate) fn compare_terms(a: &Expr, b: &Expr) -> Ordering {
    degree(b).total_cmp(&degree(a)).then_with(|| compare(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_by_degree() {
        let mut terms = vec![
            Expr::Symbol("s".into()),
            Expr::from_head("Power", vec![Expr::Symbol("s".into()), Expr::from(3)]),
            Expr::Symbol("a".into()),
        ];
        terms.sort_by(compare_terms);
        assert_eq!(
            terms,
            vec![
                Expr::from_head("Power", vec![Expr::Symbol("s".into()), Expr::from(3)]),
                Expr::Symbol("a".into()),
                Expr::Symbol("s".into()),
            ]
        );
    }

    #[test]
    fn atoms_before_compounds() {
        let x = Expr::Symbol("x".into());
        let n = Expr::from(2);
        let p = Expr::from_head("Plus", vec![x.clone(), n.clone()]);
        assert_eq!(compare(&n, &x), Ordering::Less);
        assert_eq!(compare(&x, &p), Ordering::Less);
        assert_eq!(compare(&p, &p), Ordering::Equal);
    }
}
