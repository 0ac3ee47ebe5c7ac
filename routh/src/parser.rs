use crate::RouthError;
use crate::expr::Expr;
use crate::tokenizer::{Token, Tokenizer};

#[derive(PartialEq, Debug)]
enum Assoc {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Operator {
    Binary(char),
    Negate,
    OParen,
}

fn precedence(op: &Operator) -> (usize, Assoc) {
    match *op {
        Operator::OParen => (1, Assoc::Left), // keep at bottom
        Operator::Binary('+') | Operator::Binary('-') => (2, Assoc::Left),
        Operator::Binary('*') | Operator::Binary('/') => (3, Assoc::Left),
        Operator::Negate => (5, Assoc::Right),
        Operator::Binary('^') => (5, Assoc::Right),
        Operator::Binary(_) => (4, Assoc::Left),
    }
}

fn apply(op: Operator, operands: &mut Vec<Expr>) -> Result<(), RouthError> {
    let missing = || RouthError::Parse(format!("Missing operand for {:?}", op));
    let value = match op {
        Operator::Negate => -operands.pop().ok_or_else(missing)?,
        Operator::Binary(o) => {
            let rhs = operands.pop().ok_or_else(missing)?;
            let lhs = operands.pop().ok_or_else(missing)?;
            match o {
                '+' => lhs + rhs,
                '-' => lhs - rhs,
                '*' => lhs * rhs,
                '/' => lhs / rhs,
                '^' => lhs.pow(rhs),
                other => return Err(RouthError::Parse(format!("Bad operator: {}", other))),
            }
        }
        Operator::OParen => return Err(RouthError::Parse("Missing Closing Paren".to_string())),
    };
    operands.push(value);
    Ok(())
}

// Shunting-yard, reducing straight into expressions instead of emitting RPN
fn parse_expr(tokens: &[Token]) -> Result<Expr, RouthError> {
    let mut operands = Vec::new();
    let mut stack: Vec<Operator> = Vec::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        let unary_position = matches!(prev, None | Some(Token::Op(_)) | Some(Token::OParen));
        match token {
            Token::Number(n) => operands.push(Expr::Number(n.clone())),
            Token::Symbol(s) => operands.push(Expr::symbol(s)),
            Token::OParen => stack.push(Operator::OParen),
            Token::CParen => loop {
                match stack.pop() {
                    Some(Operator::OParen) => break,
                    Some(op) => apply(op, &mut operands)?,
                    None => return Err(RouthError::Parse("Missing Opening Paren".to_string())),
                }
            },
            // unary plus is a no-op
            Token::Op('+') if unary_position => (),
            Token::Op(o) => {
                let op = if *o == '-' && unary_position {
                    Operator::Negate
                } else {
                    Operator::Binary(*o)
                };
                let (prec_rhs, assoc_rhs) = precedence(&op);
                while let Some(top) = stack.last() {
                    let (prec_lhs, _) = precedence(top);
                    if prec_lhs < prec_rhs || (prec_lhs == prec_rhs && assoc_rhs == Assoc::Right) {
                        break;
                    }
                    let top = *top;
                    stack.pop();
                    apply(top, &mut operands)?;
                }
                stack.push(op);
            }
            other => return Err(RouthError::Parse(format!("Unexpected token: {:?}", other))),
        }
        prev = Some(token);
    }
    while let Some(top) = stack.pop() {
        apply(top, &mut operands)?;
    }
    match operands.len() {
        1 => Ok(operands.swap_remove(0)),
        0 => Err(RouthError::Parse("Empty expression".to_string())),
        _ => Err(RouthError::Parse("Missing operator".to_string())),
    }
}

/// Parses a comma separated coefficient list, highest degree first.
///
/// Each coefficient is an infix expression over numbers and symbols, the
/// list may be wrapped in `[...]` or `{...}`: `"[1, a, b + 1, 2*c]"`.
pub fn parse_coefficients(input: &str) -> Result<Vec<Expr>, RouthError> {
    let mut tokens = Tokenizer::new(input.chars()).collect::<Result<Vec<_>, _>>()?;
    if tokens.first() == Some(&Token::OBracket) {
        if tokens.len() < 2 || tokens.last() != Some(&Token::CBracket) {
            return Err(RouthError::Parse("Missing closing bracket".to_string()));
        }
        tokens.pop();
        tokens.remove(0);
    }
    if tokens.is_empty() {
        return Err(RouthError::Parse("No coefficients".to_string()));
    }
    tokens.split(|t| *t == Token::Comma).map(parse_expr).collect()
}
