//! Value-transform expressions attached to modifications.
//!
//! A transform is the right-hand continuation of `running <transform>`, for
//! example `+3000`, `*2`, `*1.5+500` or `+item.wgt*5`. Only `+ - * /`,
//! decimal literals and the `item.wgt` placeholder are accepted; evaluation
//! follows ordinary precedence (`*`/`/` bind tighter than `+`/`-`, left to
//! right within a level). Each precedence level is stored as a flat list and
//! folded in a loop, so evaluation depth does not grow with the source.

use thiserror::Error;

/// Placeholder substituted with the effective item weight.
pub const WEIGHT_PLACEHOLDER: &str = "item.wgt";

/// Longest transform source accepted, in bytes.
pub const MAX_TRANSFORM_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("transform is empty")]
    Empty,

    #[error("transform is {len} bytes long, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("transform must start with an operator, found {0}")]
    MissingOperator(String),

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of transform")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Running,
    Number(f64),
    Weight,
    Plus,
    Minus,
    Star,
    Slash,
}

impl Token {
    fn describe(self) -> String {
        match self {
            Token::Running => "running value".to_string(),
            Token::Number(n) => format!("number {n}"),
            Token::Weight => format!("'{WEIGHT_PLACEHOLDER}'"),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
        }
    }

    fn is_operator(self) -> bool {
        matches!(self, Token::Plus | Token::Minus | Token::Star | Token::Slash)
    }
}

fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                chars.next();
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    _ => Token::Slash,
                });
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ExprError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if word != WEIGHT_PLACEHOLDER {
                    return Err(ExprError::UnknownIdentifier(word));
                }
                tokens.push(Token::Weight);
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, offset }),
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Atom {
    Running,
    Weight,
    Number(f64),
}

/// An atom with any run of leading unary signs folded into one flag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Factor {
    negate: bool,
    atom: Atom,
}

/// `*`/`/` chain, kept flat.
#[derive(Debug, Clone, PartialEq)]
struct Product {
    first: Factor,
    rest: Vec<(BinOp, Factor)>,
}

/// `+`/`-` chain of products, kept flat.
#[derive(Debug, Clone, PartialEq)]
struct Sum {
    first: Product,
    rest: Vec<(BinOp, Product)>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn parse(mut self) -> Result<Sum, ExprError> {
        let first = self.parse_product()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                None => return Ok(Sum { first, rest }),
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                Some(tok) => return Err(ExprError::UnexpectedToken(tok.describe())),
            };
            self.advance();
            rest.push((op, self.parse_product()?));
        }
    }

    fn parse_product(&mut self) -> Result<Product, ExprError> {
        let first = self.parse_factor()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(Product { first, rest }),
            };
            self.advance();
            rest.push((op, self.parse_factor()?));
        }
    }

    fn parse_factor(&mut self) -> Result<Factor, ExprError> {
        let mut negate = false;
        loop {
            match self.peek() {
                Some(Token::Minus) => negate = !negate,
                Some(Token::Plus) => {}
                _ => break,
            }
            self.advance();
        }

        let atom = match self.advance() {
            Some(Token::Running) => Atom::Running,
            Some(Token::Weight) => Atom::Weight,
            Some(Token::Number(n)) => Atom::Number(n),
            Some(tok) => return Err(ExprError::UnexpectedToken(tok.describe())),
            None => return Err(ExprError::UnexpectedEnd),
        };
        Ok(Factor { negate, atom })
    }
}

fn finite(v: f64) -> Result<f64, ExprError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ExprError::NonFinite)
    }
}

impl Factor {
    fn eval(&self, running: f64, weight: f64) -> f64 {
        let v = match self.atom {
            Atom::Running => running,
            Atom::Weight => weight,
            Atom::Number(n) => n,
        };
        if self.negate { -v } else { v }
    }
}

impl Product {
    fn eval(&self, running: f64, weight: f64) -> Result<f64, ExprError> {
        let mut acc = finite(self.first.eval(running, weight))?;
        for (op, factor) in &self.rest {
            let r = factor.eval(running, weight);
            acc = match op {
                BinOp::Div if r == 0.0 => return Err(ExprError::DivisionByZero),
                BinOp::Div => acc / r,
                _ => acc * r,
            };
            acc = finite(acc)?;
        }
        Ok(acc)
    }
}

impl Sum {
    fn eval(&self, running: f64, weight: f64) -> Result<f64, ExprError> {
        let mut acc = self.first.eval(running, weight)?;
        for (op, product) in &self.rest {
            let r = product.eval(running, weight)?;
            acc = match op {
                BinOp::Sub => acc - r,
                _ => acc + r,
            };
            acc = finite(acc)?;
        }
        Ok(acc)
    }
}

/// A parsed value transform, ready to apply against any running value.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    source: String,
    root: Sum,
}

impl Transform {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        if source.len() > MAX_TRANSFORM_LEN {
            return Err(ExprError::TooLong {
                len: source.len(),
                max: MAX_TRANSFORM_LEN,
            });
        }

        let lexed = lex(source)?;
        match lexed.first() {
            None => return Err(ExprError::Empty),
            Some(first) if !first.is_operator() => {
                return Err(ExprError::MissingOperator(first.describe()));
            }
            Some(_) => {}
        }

        let mut tokens = Vec::with_capacity(lexed.len() + 1);
        tokens.push(Token::Running);
        tokens.extend(lexed);

        let root = Parser { tokens, pos: 0 }.parse()?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate `running <transform>` with `item.wgt` bound to `weight`.
    pub fn apply(&self, running: f64, weight: f64) -> Result<f64, ExprError> {
        self.root.eval(running, weight)
    }
}

/// Parse and apply a transform in one step.
pub fn apply_transform(running: f64, weight: f64, transform: &str) -> Result<f64, ExprError> {
    Transform::parse(transform)?.apply(running, weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_terms() {
        assert_eq!(apply_transform(100.0, 1.0, "+3000").unwrap(), 3100.0);
        assert_eq!(apply_transform(100.0, 1.0, "*2").unwrap(), 200.0);
        assert_eq!(apply_transform(100.0, 1.0, "-25.5").unwrap(), 74.5);
        assert_eq!(apply_transform(100.0, 1.0, "/4").unwrap(), 25.0);
    }

    #[test]
    fn chained_terms_follow_precedence() {
        // 100 * 1.5 + 500
        assert_eq!(apply_transform(100.0, 1.0, "*1.5+500").unwrap(), 650.0);
        // 100 + 2 * 3 (not (100 + 2) * 3)
        assert_eq!(apply_transform(100.0, 1.0, "+2*3").unwrap(), 106.0);
        // left to right within a level: 100 - 10 - 5
        assert_eq!(apply_transform(100.0, 1.0, "-10-5").unwrap(), 85.0);
        assert_eq!(apply_transform(100.0, 1.0, "/2/5").unwrap(), 10.0);
    }

    #[test]
    fn weight_placeholder_is_substituted() {
        assert_eq!(apply_transform(100.0, 2.0, "+item.wgt*5").unwrap(), 110.0);
        assert_eq!(apply_transform(100.0, 0.1, " + item.wgt * 10 ").unwrap(), 101.0);
    }

    #[test]
    fn unary_minus_after_operator() {
        assert_eq!(apply_transform(100.0, 1.0, "*-1").unwrap(), -100.0);
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        assert_eq!(
            apply_transform(100.0, 1.0, "+invalid_expression"),
            Err(ExprError::UnknownIdentifier("invalid_expression".to_string()))
        );
        assert!(matches!(
            apply_transform(100.0, 1.0, "+eval(\"1+1\")"),
            Err(ExprError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn malformed_transforms_are_rejected() {
        assert_eq!(apply_transform(100.0, 1.0, ""), Err(ExprError::Empty));
        assert!(matches!(
            apply_transform(100.0, 1.0, "3000"),
            Err(ExprError::MissingOperator(_))
        ));
        assert_eq!(apply_transform(100.0, 1.0, "+"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(
            apply_transform(100.0, 1.0, "+1.2.3"),
            Err(ExprError::InvalidNumber(_))
        ));
        assert!(matches!(
            apply_transform(100.0, 1.0, "+(2)"),
            Err(ExprError::UnexpectedChar { ch: '(', .. })
        ));
        assert!(matches!(
            apply_transform(100.0, 1.0, "+2 3"),
            Err(ExprError::UnexpectedToken(_))
        ));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(apply_transform(100.0, 1.0, "/0"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn long_chains_fold_without_nesting() {
        let chain = "+1".repeat(2000);
        assert_eq!(apply_transform(100.0, 1.0, &chain).unwrap(), 2100.0);

        let product = format!("*1{}", "*1".repeat(1500));
        assert_eq!(apply_transform(7.0, 1.0, &product).unwrap(), 7.0);
    }

    #[test]
    fn unary_sign_runs_collapse() {
        let odd = format!("+{}1", "-".repeat(1001));
        assert_eq!(apply_transform(100.0, 1.0, &odd).unwrap(), 99.0);
        let even = format!("*{}2", "-".repeat(1000));
        assert_eq!(apply_transform(100.0, 1.0, &even).unwrap(), 200.0);
    }

    #[test]
    fn oversized_transform_is_rejected() {
        let huge = "+1".repeat(100_000);
        assert_eq!(
            apply_transform(100.0, 1.0, &huge),
            Err(ExprError::TooLong {
                len: 200_000,
                max: MAX_TRANSFORM_LEN
            })
        );
    }

    #[test]
    fn overflowing_literal_is_invalid() {
        let literal = format!("/{}", "9".repeat(400));
        assert!(matches!(
            apply_transform(100.0, 1.0, &literal),
            Err(ExprError::InvalidNumber(_))
        ));
    }

    #[test]
    fn parsed_transform_is_reusable() {
        let t = Transform::parse("*2+item.wgt").unwrap();
        assert_eq!(t.source(), "*2+item.wgt");
        assert_eq!(t.apply(10.0, 1.0).unwrap(), 21.0);
        assert_eq!(t.apply(50.0, 0.5).unwrap(), 100.5);
    }
}
