/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! Integer arithmetic expression evaluator for macro parameters.
//!
//! Expressions use C-style operators with the following precedence, from the
//! tightest binding down: `**` (right associative), unary `+` `-`, `* / %`,
//! binary `+ -`, `<< >>`, `& | ^`, `== != < > <= >=`, `&&`, `||`.
//! Literals are decimal or `$`-prefixed hexadecimal. Comparison and logical
//! operators yield `0` or `1`; the logical operators always evaluate both
//! sides.
use core::convert::TryFrom;
use core::fmt;

/// An error describing why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A character sequence that is not a valid token, or a token left
    /// unconsumed by the grammar.
    UnexpectedToken(String),
    /// The expression ended where a value or an operator was expected.
    UnexpectedEnd,
    /// Division or modulo by zero, or an out of range intermediate value.
    ArithmeticOverflow,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnexpectedToken(tok) => write!(f, "unexpected token: {}", tok),
            EvalError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            EvalError::ArithmeticOverflow => write!(f, "arithmetic overflow"),
        }
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pow,
    Mul, Div, Rem,
    Add, Sub,
    Shl, Shr,
    BitAnd, BitOr, BitXor,
    Eq, Ne, Lt, Gt, Le, Ge,
    And, Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token { Num(i64), Op(Op), LParen, RParen }

/// Evaluates a complete expression, failing if any input remains unconsumed.
pub fn eval(text: &str) -> Result<i64, EvalError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.logical_or()?;
    match parser.tokens.get(parser.pos) {
        Some((_, src)) => Err(EvalError::UnexpectedToken((*src).to_string())),
        None => Ok(value),
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, &str)>, EvalError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if b.is_ascii_digit() {
            let start = i;
            while matches!(bytes.get(i), Some(c) if c.is_ascii_digit()) {
                i += 1;
            }
            let src = &text[start..i];
            let num = src.parse().map_err(|_| EvalError::ArithmeticOverflow)?;
            tokens.push((Token::Num(num), src));
            continue;
        }
        if b == b'$' {
            let start = i;
            i += 1;
            while matches!(bytes.get(i), Some(c) if c.is_ascii_hexdigit()) {
                i += 1;
            }
            let src = &text[start..i];
            if src.len() == 1 {
                return Err(EvalError::UnexpectedToken(src.to_string()));
            }
            let num = i64::from_str_radix(&src[1..], 16)
                .map_err(|_| EvalError::ArithmeticOverflow)?;
            tokens.push((Token::Num(num), src));
            continue;
        }
        // Two-character operators take priority over their one-character prefixes.
        let two = bytes.get(i + 1).map(|&c| [b, c]);
        let op2 = match two {
            Some([b'*', b'*']) => Some(Op::Pow),
            Some([b'<', b'<']) => Some(Op::Shl),
            Some([b'>', b'>']) => Some(Op::Shr),
            Some([b'<', b'=']) => Some(Op::Le),
            Some([b'>', b'=']) => Some(Op::Ge),
            Some([b'=', b'=']) => Some(Op::Eq),
            Some([b'!', b'=']) => Some(Op::Ne),
            Some([b'&', b'&']) => Some(Op::And),
            Some([b'|', b'|']) => Some(Op::Or),
            _ => None
        };
        if let Some(op) = op2 {
            tokens.push((Token::Op(op), &text[i..i + 2]));
            i += 2;
            continue;
        }
        let tok = match b {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'*' => Token::Op(Op::Mul),
            b'/' => Token::Op(Op::Div),
            b'%' => Token::Op(Op::Rem),
            b'+' => Token::Op(Op::Add),
            b'-' => Token::Op(Op::Sub),
            b'&' => Token::Op(Op::BitAnd),
            b'|' => Token::Op(Op::BitOr),
            b'^' => Token::Op(Op::BitXor),
            b'<' => Token::Op(Op::Lt),
            b'>' => Token::Op(Op::Gt),
            _ => {
                let end = text[i..].chars().next().map(|c| i + c.len_utf8()).unwrap_or(i + 1);
                return Err(EvalError::UnexpectedToken(text[i..end].to_string()));
            }
        };
        tokens.push((tok, &text[i..i + 1]));
        i += 1;
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Token, &'a str)],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn accept(&mut self, ops: &[Op]) -> Option<Op> {
        if let Some((Token::Op(op), _)) = self.tokens.get(self.pos) {
            if ops.contains(op) {
                self.pos += 1;
                return Some(*op);
            }
        }
        None
    }

    fn logical_or(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.logical_and()?;
        while self.accept(&[Op::Or]).is_some() {
            let rhs = self.logical_and()?;
            acc = (acc != 0 || rhs != 0) as i64;
        }
        Ok(acc)
    }

    fn logical_and(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.comparison()?;
        while self.accept(&[Op::And]).is_some() {
            let rhs = self.comparison()?;
            acc = (acc != 0 && rhs != 0) as i64;
        }
        Ok(acc)
    }

    fn comparison(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.bitwise()?;
        while let Some(op) = self.accept(&[Op::Eq, Op::Ne, Op::Lt, Op::Gt, Op::Le, Op::Ge]) {
            let rhs = self.bitwise()?;
            acc = match op {
                Op::Eq => acc == rhs,
                Op::Ne => acc != rhs,
                Op::Lt => acc < rhs,
                Op::Gt => acc > rhs,
                Op::Le => acc <= rhs,
                _     => acc >= rhs,
            } as i64;
        }
        Ok(acc)
    }

    fn bitwise(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.shift()?;
        while let Some(op) = self.accept(&[Op::BitAnd, Op::BitOr, Op::BitXor]) {
            let rhs = self.shift()?;
            acc = match op {
                Op::BitAnd => acc & rhs,
                Op::BitOr  => acc | rhs,
                _          => acc ^ rhs,
            };
        }
        Ok(acc)
    }

    fn shift(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.sum()?;
        while let Some(op) = self.accept(&[Op::Shl, Op::Shr]) {
            let rhs = self.sum()?;
            let amount = u32::try_from(rhs).map_err(|_| EvalError::ArithmeticOverflow)?;
            acc = match op {
                Op::Shl => acc.checked_shl(amount),
                _       => acc.checked_shr(amount),
            }.ok_or(EvalError::ArithmeticOverflow)?;
        }
        Ok(acc)
    }

    fn sum(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.term()?;
        while let Some(op) = self.accept(&[Op::Add, Op::Sub]) {
            let rhs = self.term()?;
            acc = match op {
                Op::Add => acc.checked_add(rhs),
                _       => acc.checked_sub(rhs),
            }.ok_or(EvalError::ArithmeticOverflow)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<i64, EvalError> {
        let mut acc = self.unary()?;
        while let Some(op) = self.accept(&[Op::Mul, Op::Div, Op::Rem]) {
            let rhs = self.unary()?;
            acc = match op {
                Op::Mul => acc.checked_mul(rhs),
                Op::Div => acc.checked_div(rhs),
                _       => acc.checked_rem(rhs),
            }.ok_or(EvalError::ArithmeticOverflow)?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<i64, EvalError> {
        if let Some(op) = self.accept(&[Op::Add, Op::Sub]) {
            let value = self.unary()?;
            return match op {
                Op::Sub => value.checked_neg().ok_or(EvalError::ArithmeticOverflow),
                _ => Ok(value),
            };
        }
        self.power()
    }

    fn power(&mut self) -> Result<i64, EvalError> {
        let base = self.atom()?;
        if self.accept(&[Op::Pow]).is_some() {
            // Right associative, so the exponent may itself be a power.
            let exp = self.unary()?;
            let exp = u32::try_from(exp).map_err(|_| EvalError::ArithmeticOverflow)?;
            return base.checked_pow(exp).ok_or(EvalError::ArithmeticOverflow);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<i64, EvalError> {
        match self.tokens.get(self.pos) {
            Some((Token::Num(num), _)) => {
                self.pos += 1;
                Ok(*num)
            }
            Some((Token::LParen, _)) => {
                self.pos += 1;
                let value = self.logical_or()?;
                match self.tokens.get(self.pos) {
                    Some((Token::RParen, _)) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some((_, src)) => Err(EvalError::UnexpectedToken((*src).to_string())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some((_, src)) => Err(EvalError::UnexpectedToken((*src).to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_and_precedence() {
        assert_eq!(eval("5"), Ok(5));
        assert_eq!(eval("$13"), Ok(19));
        assert_eq!(eval("$8001"), Ok(32769));
        assert_eq!(eval("7+2*5"), Ok(17));
        assert_eq!(eval("12-4/2"), Ok(10));
        assert_eq!(eval("3**3"), Ok(27));
        assert_eq!(eval("6&3|5"), Ok(7));
        assert_eq!(eval("7^5"), Ok(2));
        assert_eq!(eval("4%2"), Ok(0));
        assert_eq!(eval("1<<4"), Ok(16));
        assert_eq!(eval("16>>4"), Ok(1));
        assert_eq!(eval("1 + 1"), Ok(2));
        assert_eq!(eval("(3 + 5) / 2"), Ok(4));
        assert_eq!(eval("4 * (9 - 7)"), Ok(8));
        assert_eq!(eval("5 + 2 * (2 + 1) - ($13 - 1) / 3"), Ok(5));
        assert_eq!(eval("-2**2"), Ok(-4));
    }

    #[test]
    fn comparisons_bind_looser_than_bit_ops() {
        assert_eq!(eval("1+2==6-3"), Ok(1));
        assert_eq!(eval("1+2!=6-3"), Ok(0));
        assert_eq!(eval("3*3<4**5"), Ok(1));
        assert_eq!(eval("3&3>4|5"), Ok(0));
        assert_eq!(eval("12/6<=12^4"), Ok(1));
        assert_eq!(eval("12%6>=12/4"), Ok(0));
        assert_eq!(eval("1<<3>16>>2"), Ok(1));
    }

    #[test]
    fn logical_operators() {
        assert_eq!(eval("5>4&&2!=3"), Ok(1));
        assert_eq!(eval("4 > 5 || 3 < 3"), Ok(0));
        assert_eq!(eval("2==2&&4>5||3<4"), Ok(1));
    }

    #[test]
    fn invalid_expressions() {
        assert_eq!(eval("x"), Err(EvalError::UnexpectedToken("x".to_string())));
        assert_eq!(eval("5$3"), Err(EvalError::UnexpectedToken("$3".to_string())));
        assert_eq!(eval("$"), Err(EvalError::UnexpectedToken("$".to_string())));
        assert_eq!(eval(""), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("(1"), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("1/0"), Err(EvalError::ArithmeticOverflow));
        assert_eq!(eval("2**-1"), Err(EvalError::ArithmeticOverflow));
    }
}
