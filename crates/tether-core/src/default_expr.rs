//! Parsing of default-value text attached to optional parameters.
//!
//! Accepted forms: `null`, `true`, `false`, integers (decimal, `0x` hex),
//! floats, single- or double-quoted strings, `[]` / `array()`, and bare
//! identifiers, which become constant references.

use std::sync::Arc;

use thiserror::Error;

use crate::expr::{ConstantRef, DefaultExpr, Literal};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefaultParseError {
    #[error("empty default")]
    Empty,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unsupported escape '\\{0}'")]
    BadEscape(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unrecognized default '{0}'")]
    Unrecognized(String),
}

/// Parse default text into an expression.
pub fn parse(text: &str) -> Result<DefaultExpr, DefaultParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DefaultParseError::Empty);
    }

    if let Some(value) = parse_literal(text)? {
        return Ok(Arc::new(Literal(value)));
    }

    if is_identifier(text) {
        return Ok(Arc::new(ConstantRef::new(text)));
    }

    Err(DefaultParseError::Unrecognized(text.to_string()))
}

fn parse_literal(text: &str) -> Result<Option<Value>, DefaultParseError> {
    match text.to_ascii_lowercase().as_str() {
        "null" => return Ok(Some(Value::Null)),
        "true" => return Ok(Some(Value::Bool(true))),
        "false" => return Ok(Some(Value::Bool(false))),
        "[]" | "array()" => return Ok(Some(Value::Array(Vec::new()))),
        _ => {}
    }

    let first = text.as_bytes()[0];
    if first == b'"' || first == b'\'' {
        return parse_string(text, first as char).map(|s| Some(Value::Str(s)));
    }

    if first.is_ascii_digit() || matches!(first, b'-' | b'+' | b'.') {
        return parse_number(text).map(Some);
    }

    Ok(None)
}

fn parse_number(text: &str) -> Result<Value, DefaultParseError> {
    let invalid = || DefaultParseError::InvalidNumber(text.to_string());

    let (negative, digits) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let v = i64::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return Ok(Value::Long(if negative { -v } else { v }));
    }

    if digits.bytes().all(|b| b.is_ascii_digit()) && !digits.is_empty() {
        return text.parse::<i64>().map(Value::Long).map_err(|_| invalid());
    }

    text.parse::<f64>().map(Value::Double).map_err(|_| invalid())
}

fn parse_string(text: &str, quote: char) -> Result<String, DefaultParseError> {
    let mut chars = text[1..].chars();
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err(DefaultParseError::UnterminatedString),
            Some(c) if c == quote => break,
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                Some(c) => return Err(DefaultParseError::BadEscape(c)),
                None => return Err(DefaultParseError::UnterminatedString),
            },
            Some(c) => out.push(c),
        }
    }
    if chars.next().is_some() {
        return Err(DefaultParseError::Unrecognized(text.to_string()));
    }
    Ok(out)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn eval(text: &str) -> Value {
        let mut ctx = Context::new();
        parse(text).unwrap().eval(&mut ctx)
    }

    #[test]
    fn keywords() {
        assert_eq!(eval("null"), Value::Null);
        assert_eq!(eval("NULL"), Value::Null);
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("False"), Value::Bool(false));
        assert_eq!(eval("array()"), Value::Array(vec![]));
        assert_eq!(eval("[]"), Value::Array(vec![]));
    }

    #[test]
    fn numbers() {
        assert_eq!(eval("5"), Value::Long(5));
        assert_eq!(eval("-12"), Value::Long(-12));
        assert_eq!(eval("0x1F"), Value::Long(31));
        assert_eq!(eval("1.5"), Value::Double(1.5));
        assert_eq!(eval("-2e3"), Value::Double(-2000.0));
        assert!(matches!(
            parse("12abc"),
            Err(DefaultParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn strings() {
        assert_eq!(eval("'abc'"), Value::from("abc"));
        assert_eq!(eval("\"a\\nb\""), Value::from("a\nb"));
        assert_eq!(eval("''"), Value::from(""));
        assert_eq!(
            parse("'abc").unwrap_err(),
            DefaultParseError::UnterminatedString
        );
        assert_eq!(parse("'a\\q'").unwrap_err(), DefaultParseError::BadEscape('q'));
    }

    #[test]
    fn identifiers_are_constant_references() {
        let expr = parse("LINE_END").unwrap();
        assert_eq!(format!("{expr:?}"), "ConstantRef { name: \"LINE_END\" }");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("   ").unwrap_err(), DefaultParseError::Empty);
        assert!(matches!(
            parse("1 + 2"),
            Err(DefaultParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("{x}"),
            Err(DefaultParseError::Unrecognized(_))
        ));
    }
}
