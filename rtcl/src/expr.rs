//! The expression language: the engine behind the `expr` command and the
//! conditions of `if`, `while`, and `for`.
//!
//! Expressions are integer-valued: literals, `$var` references, `[cmd]`
//! sub-commands, and parenthesized sub-expressions combined with the
//! usual arithmetic, comparison, and logical operators.  Parsing produces
//! an [`Expr`] tree that the value object caches, so a braced loop
//! condition is parsed once and re-evaluated cheaply.
//!
//! Variable and sub-command terms resolve through the interpreter at
//! evaluation time; a sub-command returning any status other than OK
//! turns into an error here, since there is no loop or procedure inside
//! an expression to consume it.

use crate::interp::Interp;
use crate::parser::{Command, Parser, VarRef};
use crate::types::{Exception, Status, TclInt};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Int(TclInt),
    Var(VarRef),
    Cmd(Command),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Parses an expression, requiring the whole input to be consumed.
pub(crate) fn parse_expr(src: &str) -> Result<Expr, Exception> {
    let mut ep = ExprParser {
        p: Parser::new(src.chars()),
    };
    let expr = ep.parse_or()?;
    ep.p.eat_space();
    if ep.p.ch.is_some() {
        return Err(ep.p.expect_failed("operator"));
    }
    Ok(expr)
}

struct ExprParser<I: Iterator<Item = char>> {
    p: Parser<I>,
}

impl<I: Iterator<Item = char>> ExprParser<I> {
    fn parse_or(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_and()?;
        loop {
            self.p.eat_space();
            if self.p.ch != Some('|') {
                return Ok(lhs);
            }
            self.p.advance()?;
            self.p.consume_rune('|')?;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_and(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_equality()?;
        loop {
            self.p.eat_space();
            if self.p.ch != Some('&') {
                return Ok(lhs);
            }
            self.p.advance()?;
            self.p.consume_rune('&')?;
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_equality(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_relational()?;
        loop {
            self.p.eat_space();
            let op = match self.p.ch {
                Some('=') => BinaryOp::Eq,
                Some('!') => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.p.advance()?;
            self.p.consume_rune('=')?;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_additive()?;
        loop {
            self.p.eat_space();
            let less = match self.p.ch {
                Some('<') => true,
                Some('>') => false,
                _ => return Ok(lhs),
            };
            self.p.advance()?;
            let op = if self.p.ch == Some('=') {
                self.p.advance()?;
                if less {
                    BinaryOp::Le
                } else {
                    BinaryOp::Ge
                }
            } else if less {
                BinaryOp::Lt
            } else {
                BinaryOp::Gt
            };
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            self.p.eat_space();
            let op = match self.p.ch {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.p.advance()?;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Exception> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.p.eat_space();
            let op = match self.p.ch {
                Some('*') => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                Some('%') => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.p.advance()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, Exception> {
        self.p.eat_space();
        match self.p.ch {
            Some('-') => {
                self.p.advance()?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            Some('!') => {
                self.p.advance()?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)))
            }
            Some('+') => {
                self.p.advance()?;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Exception> {
        self.p.eat_space();
        match self.p.ch {
            Some('(') => {
                self.p.advance()?;
                let inner = self.parse_or()?;
                self.p.eat_space();
                self.p.consume_rune(')')?;
                Ok(inner)
            }
            Some('$') => {
                self.p.advance()?;
                Ok(Expr::Var(self.p.parse_var_ref()?))
            }
            Some('[') => Ok(Expr::Cmd(self.p.parse_subcommand()?)),
            Some(c) if c.is_ascii_digit() => {
                let digits = self
                    .p
                    .consume_while1(|c| c.is_ascii_digit(), "number")?;
                digits.parse::<TclInt>().map(Expr::Int).map_err(|_| {
                    Exception::new(format!("expected integer but got \"{}\"", digits))
                })
            }
            _ => Err(self.p.expect_failed("expression term")),
        }
    }
}

/// Evaluates an expression tree, resolving variables and sub-commands
/// through the interpreter.
pub(crate) fn eval_expr(interp: &mut Interp, expr: &Expr) -> Result<Value, Exception> {
    match expr {
        Expr::Int(i) => Ok(Value::from(*i)),
        Expr::Var(vr) => interp.get_var(vr),
        Expr::Cmd(cmd) => {
            let status = interp.eval_command(cmd);
            if status != Status::Ok {
                return Err(interp.take_error_or(status));
            }
            Ok(interp.result().clone())
        }
        Expr::Unary(op, operand) => {
            let v = eval_expr(interp, operand)?;
            match op {
                UnaryOp::Neg => Ok(Value::from(v.as_int()?.wrapping_neg())),
                UnaryOp::Not => Ok(Value::from(!v.as_bool())),
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(interp, *op, lhs, rhs),
    }
}

fn eval_binary(
    interp: &mut Interp,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<Value, Exception> {
    use BinaryOp::*;

    match op {
        And => {
            if !eval_expr(interp, lhs)?.as_bool() {
                return Ok(Value::from(false));
            }
            Ok(Value::from(eval_expr(interp, rhs)?.as_bool()))
        }
        Or => {
            if eval_expr(interp, lhs)?.as_bool() {
                return Ok(Value::from(true));
            }
            Ok(Value::from(eval_expr(interp, rhs)?.as_bool()))
        }
        Eq | Ne => {
            let a = eval_expr(interp, lhs)?;
            let b = eval_expr(interp, rhs)?;
            // Integers compare numerically; anything else falls back to
            // string comparison.
            let equal = match (a.as_int(), b.as_int()) {
                (Ok(x), Ok(y)) => x == y,
                _ => a.as_str() == b.as_str(),
            };
            Ok(Value::from(if op == Ne { !equal } else { equal }))
        }
        _ => {
            let a = eval_expr(interp, lhs)?.as_int()?;
            let b = eval_expr(interp, rhs)?.as_int()?;
            if (op == Div || op == Rem) && b == 0 {
                return Err(Exception::new("divide by zero"));
            }
            Ok(match op {
                Mul => Value::from(a.wrapping_mul(b)),
                Div => Value::from(a.wrapping_div(b)),
                Rem => Value::from(a.wrapping_rem(b)),
                Add => Value::from(a.wrapping_add(b)),
                Sub => Value::from(a.wrapping_sub(b)),
                Lt => Value::from(a < b),
                Le => Value::from(a <= b),
                Gt => Value::from(a > b),
                Ge => Value::from(a >= b),
                And | Or | Eq | Ne => unreachable!(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Result<Value, Exception> {
        let mut interp = Interp::new();
        interp.expr(&Value::from(src))
    }

    fn eval_ok(src: &str) -> String {
        eval(src).unwrap().as_str().to_string()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_ok("2 + 2"), "4");
        assert_eq!(eval_ok("2 + 3 * 4"), "14");
        assert_eq!(eval_ok("(2 + 3) * 4"), "20");
        assert_eq!(eval_ok("10 / 3"), "3");
        assert_eq!(eval_ok("10 % 3"), "1");
        assert_eq!(eval_ok("5 - 8"), "-3");
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval_ok("-4"), "-4");
        assert_eq!(eval_ok("--4"), "4");
        assert_eq!(eval_ok("+4"), "4");
        assert_eq!(eval_ok("!0"), "1");
        assert_eq!(eval_ok("!17"), "0");
        assert_eq!(eval_ok("-(2 + 3)"), "-5");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_ok("1 < 2"), "1");
        assert_eq!(eval_ok("2 < 1"), "0");
        assert_eq!(eval_ok("2 <= 2"), "1");
        assert_eq!(eval_ok("3 > 2"), "1");
        assert_eq!(eval_ok("2 >= 3"), "0");
        assert_eq!(eval_ok("4 == 4"), "1");
        assert_eq!(eval_ok("4 != 4"), "0");
    }

    #[test]
    fn test_logical() {
        assert_eq!(eval_ok("1 && 0"), "0");
        assert_eq!(eval_ok("1 && 2"), "1");
        assert_eq!(eval_ok("0 || 0"), "0");
        assert_eq!(eval_ok("0 || 3"), "1");
    }

    #[test]
    fn test_short_circuit() {
        // The right side would fail if evaluated.
        assert_eq!(eval_ok("0 && [no_such_command]"), "0");
        assert_eq!(eval_ok("1 || [no_such_command]"), "1");
        assert!(eval("1 && [no_such_command]").is_err());
    }

    #[test]
    fn test_variables() {
        let mut interp = Interp::new();
        interp.set_var_raw("x", Value::from(5)).unwrap();
        let v = interp.expr(&Value::from("$x + 1")).unwrap();
        assert_eq!(v.as_str(), "6");

        let err = interp.expr(&Value::from("$missing + 1")).unwrap_err();
        assert_eq!(err.message(), "variable not found: $missing");
    }

    #[test]
    fn test_subcommands() {
        let mut interp = Interp::new();
        let v = interp.expr(&Value::from("[llength {a b c}] * 2")).unwrap();
        assert_eq!(v.as_str(), "6");
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(eval("1 / 0").unwrap_err().message(), "divide by zero");
        assert_eq!(eval("1 % 0").unwrap_err().message(), "divide by zero");
    }

    #[test]
    fn test_non_integer_operand() {
        let mut interp = Interp::new();
        interp.set_var_raw("s", Value::from("pear")).unwrap();
        let err = interp.expr(&Value::from("$s + 1")).unwrap_err();
        assert_eq!(err.message(), "expected integer but got \"pear\"");
    }

    #[test]
    fn test_string_equality() {
        let mut interp = Interp::new();
        interp.set_var_raw("a", Value::from("pear")).unwrap();
        interp.set_var_raw("b", Value::from("pear")).unwrap();
        assert_eq!(
            interp.expr(&Value::from("$a == $b")).unwrap().as_str(),
            "1"
        );
        assert_eq!(
            interp.expr(&Value::from("$a != $b")).unwrap().as_str(),
            "0"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("(1").is_err());
        assert!(parse_expr("1 1").is_err());
        assert!(parse_expr("&& 1").is_err());
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse_expr("1 + 2 garbage").unwrap_err();
        assert_eq!(err.message(), "Expected operator, got 'g'");
    }
}
