mod arithmetic;
mod calculus;
mod determinant;
mod order;

pub(crate) use arithmetic::simplify;
pub use determinant::determinant;

use core::fmt;
use std::collections::BTreeSet;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::RouthError;
use arithmetic::{simplify_plus, simplify_power, simplify_times};

/// Symbolic expression in head/arguments form.
///
/// Compound expressions are `Expr::Expr(head, args)` with one of the heads
/// `Plus`, `Times` or `Power`. Subtraction and division don't have heads of
/// their own: `a - b` is `Plus[a, Times[-1, b]]` and `a / b` is
/// `Times[a, Power[b, -1]]`. Numbers are exact rationals. Arithmetic through
/// the operator traits always returns a simplified expression, so
/// structurally equal results can be compared with `==`.
#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Expr(String, Vec<Expr>),
    Symbol(String),
    Number(BigRational),
}

impl Expr {
    pub fn from_head(head: &str, args: Vec<Expr>) -> Self {
        Expr::Expr(head.to_string(), args)
    }

    pub fn symbol(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }

    pub fn number(n: BigRational) -> Self {
        Expr::Number(n)
    }

    /// `numer / denom`, left unevaluated when `denom` is zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::from(numer) / Expr::from(denom)
    }

    pub fn zero() -> Self {
        Expr::Number(BigRational::zero())
    }

    pub fn one() -> Self {
        Expr::Number(BigRational::one())
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        simplify_power(self, exponent.into())
    }

    pub fn simplify(self) -> Self {
        simplify(self)
    }

    /// Exact value when the expression folds to a number.
    pub fn as_rational(&self) -> Option<BigRational> {
        match simplify(self.clone()) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Finite floating point value of an expression free of symbols.
    pub fn as_number(&self) -> Option<f64> {
        simplify(self.clone())
            .evaluate(&[])
            .ok()
            .filter(|x| x.is_finite())
    }

    /// True when the expression cancels to zero, after expanding products.
    pub fn is_zero(&self) -> bool {
        match self {
            Expr::Number(n) => n.is_zero(),
            Expr::Symbol(_) => false,
            other => matches!(calculus::expand(other.clone()), Expr::Number(n) if n.is_zero()),
        }
    }

    /// False when a zero is raised to a negative power somewhere.
    pub fn is_finite(&self) -> bool {
        match self {
            Expr::Expr(head, args) => match (head.as_ref(), args.as_slice()) {
                ("Power", [Expr::Number(b), Expr::Number(e)]) if b.is_zero() && e.is_negative() => {
                    false
                }
                _ => args.iter().all(Expr::is_finite),
            },
            _ => true,
        }
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Symbol(s) => s == name,
            Expr::Number(_) => false,
            Expr::Expr(_, args) => args.iter().any(|a| a.contains_symbol(name)),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, into: &mut BTreeSet<String>) {
        match self {
            Expr::Symbol(s) => {
                into.insert(s.clone());
            }
            Expr::Number(_) => (),
            Expr::Expr(_, args) => args.iter().for_each(|a| a.collect_symbols(into)),
        }
    }

    /// Rewrite every sub-expression matching a rule's lhs and re-simplify.
    // replace_all(x + y, [(x, 3)]) => y + 3
    pub fn replace_all(self, rules: &[(Expr, Expr)]) -> Expr {
        simplify(replace(self, rules))
    }

    /// Numeric value of the expression with symbols bound to `bindings`.
    pub fn evaluate(&self, bindings: &[(&str, f64)]) -> Result<f64, RouthError> {
        match self {
            Expr::Number(n) => n
                .to_f64()
                .ok_or_else(|| RouthError::InvalidArgument(format!("{} has no f64 value", n))),
            Expr::Symbol(s) => bindings
                .iter()
                .find(|(name, _)| name == s)
                .map(|(_, value)| *value)
                .ok_or_else(|| RouthError::InvalidArgument(format!("unbound symbol '{}'", s))),
            Expr::Expr(head, args) => {
                let values = args
                    .iter()
                    .map(|a| a.evaluate(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                match head.as_ref() {
                    "Plus" => Ok(values.into_iter().sum()),
                    "Times" => Ok(values.into_iter().product()),
                    "Power" => match values.as_slice() {
                        [base, exponent] => Ok(base.powf(*exponent)),
                        _ => Err(RouthError::InvalidArgument(format!(
                            "Power must have 2 arguments. {:?}",
                            args
                        ))),
                    },
                    other => Err(RouthError::InvalidArgument(format!(
                        "can't evaluate head '{}'",
                        other
                    ))),
                }
            }
        }
    }

    pub fn derivative(&self, var: &str) -> Result<Expr, RouthError> {
        calculus::derivative(self, var)
    }

    pub fn expand(self) -> Expr {
        calculus::expand(self)
    }

    pub fn coefficient_list(&self, var: &str) -> Result<Vec<Expr>, RouthError> {
        calculus::coefficient_list(self, var)
    }
}

fn replace(expr: Expr, rules: &[(Expr, Expr)]) -> Expr {
    let expr = match expr {
        Expr::Expr(head, args) => {
            Expr::Expr(head, args.into_iter().map(|a| replace(a, rules)).collect())
        }
        atom => atom,
    };
    rules
        .iter()
        .find(|(lhs, _)| *lhs == expr)
        .map(|(_, rhs)| rhs.clone())
        .unwrap_or(expr)
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Number(BigRational::from_integer(n.into()))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Number(BigRational::from_integer(n.into()))
    }
}

impl From<BigRational> for Expr {
    fn from(n: BigRational) -> Self {
        Expr::Number(n)
    }
}

/// Exact value of a finite float: `0.5` is `1/2`.
impl TryFrom<f64> for Expr {
    type Error = RouthError;

    fn try_from(n: f64) -> Result<Self, Self::Error> {
        BigRational::from_float(n)
            .map(Expr::Number)
            .ok_or_else(|| RouthError::InvalidArgument(format!("{} isn't a finite number", n)))
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::symbol(name)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        simplify_plus(vec![self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        simplify_plus(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        simplify_times(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        simplify_times(vec![self, simplify_power(rhs, Expr::from(-1))])
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        simplify_times(vec![Expr::from(-1), self])
    }
}

// Lowest number is highest precedence
fn precedence(e: &Expr) -> usize {
    match e {
        Expr::Number(n) if n.is_negative() || !n.is_integer() => 65,
        Expr::Number(_) | Expr::Symbol(_) => 0,
        Expr::Expr(head, args) => match head.as_ref() {
            "Power" if is_reciprocal(args) => 65,
            "Power" => 50,
            "Times" => 65,
            "Plus" => 70,
            _ => 1000,
        },
    }
}

fn is_reciprocal(power_args: &[Expr]) -> bool {
    matches!(power_args, [_, Expr::Number(e)] if e.is_negative())
}

fn wrap(e: &Expr, parent: usize) -> String {
    if precedence(e) >= parent && precedence(e) > 0 {
        format!("({})", e)
    } else {
        e.to_string()
    }
}

// Splits `Times[n, f1, f2^-1, ...]` into a coefficient, numerator and denominator
fn fraction_parts(e: &Expr) -> (BigRational, Vec<Expr>, Vec<Expr>) {
    let factors = match e {
        Expr::Expr(head, args) if head == "Times" => args.clone(),
        other => vec![other.clone()],
    };
    let mut coefficient = BigRational::one();
    let (mut numerator, mut denominator) = (Vec::new(), Vec::new());
    for factor in factors {
        match factor {
            Expr::Number(n) => coefficient *= n,
            Expr::Expr(head, args) if head == "Power" && is_reciprocal(&args) => {
                if let [base, Expr::Number(exponent)] = args.as_slice() {
                    denominator.push(simplify_power(base.clone(), Expr::Number(-exponent)));
                }
            }
            other => numerator.push(other),
        }
    }
    (coefficient, numerator, denominator)
}

// 28/9*a/(b*c) renders as 28*a/(9*b*c)
fn fmt_product(coefficient: &BigRational, numerator: &[Expr], denominator: &[Expr]) -> String {
    let mut num = numerator.iter().map(|f| wrap(f, 65)).collect::<Vec<_>>();
    let top = coefficient.numer().abs();
    if !top.is_one() || num.is_empty() {
        num.insert(0, top.to_string());
    }
    let sign = if coefficient.is_negative() { "-" } else { "" };
    let num = format!("{}{}", sign, num.join("*"));
    let mut den = denominator.iter().map(|f| wrap(f, 65)).collect::<Vec<_>>();
    if !coefficient.denom().is_one() {
        den.insert(0, coefficient.denom().to_string());
    }
    match den.as_slice() {
        [] => num,
        [single] => format!("{}/{}", num, single),
        many => format!("{}/({})", num, many.join("*")),
    }
}

fn is_negative_term(e: &Expr) -> bool {
    match e {
        Expr::Number(n) => n.is_negative(),
        Expr::Expr(head, args) if head == "Times" => {
            matches!(args.first(), Some(Expr::Number(n)) if n.is_negative())
        }
        _ => false,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Expr(head, args) => match head.as_ref() {
                "Plus" => {
                    for (idx, term) in args.iter().enumerate() {
                        let negated = is_negative_term(term);
                        let shown = if negated { -term.clone() } else { term.clone() };
                        match (idx, negated) {
                            (0, true) => write!(f, "-{}", shown)?,
                            (0, false) => write!(f, "{}", shown)?,
                            (_, true) => write!(f, " - {}", shown)?,
                            (_, false) => write!(f, " + {}", shown)?,
                        }
                    }
                    Ok(())
                }
                "Times" => {
                    let (coefficient, numerator, denominator) = fraction_parts(self);
                    write!(f, "{}", fmt_product(&coefficient, &numerator, &denominator))
                }
                "Power" if is_reciprocal(args) => {
                    let (coefficient, numerator, denominator) = fraction_parts(self);
                    write!(f, "{}", fmt_product(&coefficient, &numerator, &denominator))
                }
                "Power" => match args.as_slice() {
                    [base, exponent] => {
                        let base = if precedence(base) == 0 {
                            base.to_string()
                        } else {
                            format!("({})", base)
                        };
                        write!(f, "{}^{}", base, wrap(exponent, 1))
                    }
                    _ => write!(f, "Power[{:?}]", args),
                },
                _ => write!(
                    f,
                    "{}[{}]",
                    head,
                    args.iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
        }
    }
}
