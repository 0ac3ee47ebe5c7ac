use num_bigint::BigInt;
use num_rational::BigRational;

use crate::RouthError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(BigRational),
    Symbol(String),
    Op(char),
    OParen,
    CParen,
    OBracket,
    CBracket,
    Comma,
}

pub struct Tokenizer<I: Iterator<Item = char>> {
    input: std::iter::Peekable<I>,
}

impl<I: Iterator<Item = char>> Tokenizer<I> {
    pub fn new(input: I) -> Self {
        Self {
            input: input.peekable(),
        }
    }

    fn take_digits(&mut self, into: &mut String) {
        while let Some(n) = self.input.next_if(char::is_ascii_digit) {
            into.push(n);
        }
    }

    fn next_result(&mut self) -> Result<Option<Token>, RouthError> {
        match self.input.next() {
            Some(x) if "+-*/^".contains(x) => Ok(Some(Token::Op(x))),
            Some('(') => Ok(Some(Token::OParen)),
            Some(')') => Ok(Some(Token::CParen)),
            Some('[') | Some('{') => Ok(Some(Token::OBracket)),
            Some(']') | Some('}') => Ok(Some(Token::CBracket)),
            Some(',') => Ok(Some(Token::Comma)),
            // Symbol names
            Some(x) if x.is_alphabetic() || x == '_' => {
                let mut id = x.to_string();
                while let Some(ch) = self.input.next_if(|c| c.is_alphanumeric() || *c == '_') {
                    id.push(ch);
                }
                Ok(Some(Token::Symbol(id)))
            }
            // Unsigned numbers, unary minus is left to the parser
            Some(x) if x.is_ascii_digit() || x == '.' => {
                let mut num = x.to_string();
                self.take_digits(&mut num);
                if x != '.' {
                    if let Some(dot) = self.input.next_if_eq(&'.') {
                        num.push(dot);
                    }
                }
                self.take_digits(&mut num);
                // Maybe exponent
                if let Some(exp) = self.input.next_if(|c| *c == 'e' || *c == 'E') {
                    num.push(exp);
                    if let Some(sign) = self.input.next_if(|c| *c == '-' || *c == '+') {
                        num.push(sign);
                    }
                    self.take_digits(&mut num);
                }
                decimal(&num).map(|n| Some(Token::Number(n)))
            }
            // Swallow whitespace.
            Some(x) if x.is_whitespace() => {
                while self.input.next_if(|c| c.is_whitespace()).is_some() {}
                self.next_result()
            }
            Some(ch) => Err(RouthError::Parse(format!("Unexpected char: {}", ch))),
            None => Ok(None),
        }
    }
}

// Exact value of a decimal literal: 1.25e-1 => 1/8
fn decimal(literal: &str) -> Result<BigRational, RouthError> {
    let bad = || RouthError::Parse(format!("Bad number '{}'", literal));
    let (mantissa, exponent) = match literal.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i32>().map_err(|_| bad())?),
        None => (literal, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac_part);
    if digits.is_empty() {
        return Err(bad());
    }
    let value = digits.parse::<BigInt>().map_err(|_| bad())?;
    let scale = i64::from(exponent) - frac_part.len() as i64;
    let power = u32::try_from(scale.unsigned_abs()).map_err(|_| bad())?;
    let ten = BigInt::from(10).pow(power);
    Ok(if scale >= 0 {
        BigRational::from_integer(value * ten)
    } else {
        BigRational::new(value, ten)
    })
}

impl<I: Iterator<Item = char>> Iterator for Tokenizer<I> {
    type Item = Result<Token, RouthError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_result().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, Tokenizer};
    use crate::RouthError;
    use num_rational::BigRational;

    fn ratio(n: i64, d: i64) -> Token {
        Token::Number(BigRational::new(n.into(), d.into()))
    }

    fn tokenize(input: &str) -> Result<Vec<Token>, RouthError> {
        Tokenizer::new(input.chars()).collect()
    }

    #[test]
    fn parse_numbers() -> Result<(), RouthError> {
        let input = "1 123e2 123e-3 123e+4 0.23 0.23e2 .5 2. 0.1";
        let expected = vec![
            ratio(1, 1),
            ratio(12300, 1),
            ratio(123, 1000),
            ratio(1230000, 1),
            ratio(23, 100),
            ratio(23, 1),
            ratio(1, 2),
            ratio(2, 1),
            ratio(1, 10),
        ];
        assert_eq!(tokenize(input)?, expected);
        Ok(())
    }

    #[test]
    fn parse_coefficient_list() -> Result<(), RouthError> {
        use Token::*;
        assert_eq!(
            tokenize("[1, -a_1*(b+2)^2]")?,
            vec![
                OBracket,
                ratio(1, 1),
                Comma,
                Op('-'),
                Symbol("a_1".into()),
                Op('*'),
                OParen,
                Symbol("b".into()),
                Op('+'),
                ratio(2, 1),
                CParen,
                Op('^'),
                ratio(2, 1),
                CBracket,
            ]
        );
        Ok(())
    }

    #[test]
    fn bad_input() {
        assert!(tokenize("1 $ 2").is_err());
        assert!(tokenize("1e").is_err());
        assert!(tokenize(".").is_err());
    }
}
