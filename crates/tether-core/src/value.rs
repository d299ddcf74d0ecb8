//! Guest values and call-site storage.
//!
//! [`Value`] is the dynamically typed value the guest runtime passes around.
//! Its conversions follow the guest language's loose rules: numeric
//! conversions of strings read the leading numeric prefix and never fail,
//! and every value has a truthiness and a string form.
//!
//! [`Var`] is a shared mutable cell; by-reference parameters receive the
//! call site's `Var` so native code can write back into it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::object::ObjectRef;

/// A guest value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    /// An optional argument the caller did not pass.
    Default,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    Array(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    /// Guest-visible type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null | Value::Default => "NULL",
            Value::Bool(_) => "boolean",
            Value::Long(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// `Null` or the omitted-argument marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Default)
    }

    /// The caller omitted this optional argument.
    pub fn is_default(&self) -> bool {
        matches!(self, Value::Default)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Guest truthiness.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null | Value::Default => false,
            Value::Bool(b) => *b,
            Value::Long(v) => *v != 0,
            Value::Double(v) => *v != 0.0,
            Value::Str(s) => !(s.is_empty() || s == "0"),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Integer conversion. Strings use their leading numeric prefix.
    pub fn to_long(&self) -> i64 {
        match self {
            Value::Null | Value::Default => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Long(v) => *v,
            Value::Double(v) => *v as i64,
            Value::Str(s) => parse_long_prefix(s),
            Value::Array(items) => i64::from(!items.is_empty()),
            Value::Object(_) => 1,
        }
    }

    /// Float conversion. Strings use their leading numeric prefix.
    pub fn to_double(&self) -> f64 {
        match self {
            Value::Null | Value::Default => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Long(v) => *v as f64,
            Value::Double(v) => *v,
            Value::Str(s) => parse_double_prefix(s),
            Value::Array(items) => f64::from(u8::from(!items.is_empty())),
            Value::Object(_) => 1.0,
        }
    }

    /// String form.
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Null | Value::Default => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Long(v) => v.to_string(),
            Value::Double(v) => format_double(*v),
            Value::Str(s) => s.clone(),
            Value::Array(_) => "Array".to_string(),
            Value::Object(obj) => obj.class_name().to_string(),
        }
    }

    /// First character of the string form; integers are code points.
    pub fn to_char(&self) -> char {
        match self {
            Value::Long(v) => u32::try_from(*v)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\0'),
            other => other.to_string_value().chars().next().unwrap_or('\0'),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Default, Value::Default) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Default => write!(f, "NULL"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::Bool(b) => write!(f, "{b}"),
            other => write!(f, "{}", other.to_string_value()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Long(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

// ============================================================================
// Numeric prefix parsing
// ============================================================================

/// Length of the leading numeric prefix after whitespace, and whether it
/// contains a fraction or exponent.
fn numeric_prefix(s: &str) -> (&str, bool) {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut is_float = false;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
            is_float = true;
        }
    }

    if digits == 0 {
        return ("", false);
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
            is_float = true;
        }
    }

    (&s[..end], is_float)
}

/// Integer value of the leading numeric prefix, `0` when there is none.
pub fn parse_long_prefix(s: &str) -> i64 {
    let (prefix, is_float) = numeric_prefix(s);
    if prefix.is_empty() {
        return 0;
    }
    if is_float {
        return prefix.parse::<f64>().map(|v| v as i64).unwrap_or(0);
    }
    match prefix.parse::<i64>() {
        Ok(v) => v,
        // out of range: saturate like the float path does
        Err(_) => prefix.parse::<f64>().map(|v| v as i64).unwrap_or(0),
    }
}

/// Float value of the leading numeric prefix, `0.0` when there is none.
pub fn parse_double_prefix(s: &str) -> f64 {
    let (prefix, _) = numeric_prefix(s);
    if prefix.is_empty() {
        return 0.0;
    }
    prefix.parse::<f64>().unwrap_or(0.0)
}

fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NAN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        v.to_string()
    }
}

// ============================================================================
// Var
// ============================================================================

/// Shared mutable storage for a guest variable.
///
/// Clones alias the same cell.
#[derive(Clone, Default)]
pub struct Var(Arc<Mutex<Value>>);

impl Var {
    pub fn new(value: Value) -> Self {
        Var(Arc::new(Mutex::new(value)))
    }

    pub fn get(&self) -> Value {
        self.0.lock().clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.lock() = value.into();
    }

    /// Apply `f` to the stored value in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.lock())
    }

    pub fn ptr_eq(&self, other: &Var) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({:?})", self.get())
    }
}

impl From<Value> for Var {
    fn from(value: Value) -> Self {
        Var::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_prefix() {
        assert_eq!(parse_long_prefix("12abc"), 12);
        assert_eq!(parse_long_prefix("  -7"), -7);
        assert_eq!(parse_long_prefix("x"), 0);
        assert_eq!(parse_long_prefix(""), 0);
        assert_eq!(parse_long_prefix("3.9"), 3);
        assert_eq!(parse_long_prefix("1e3"), 1000);
        assert_eq!(parse_long_prefix("+"), 0);
    }

    #[test]
    fn double_prefix() {
        assert_eq!(parse_double_prefix(" 3.5e2x"), 350.0);
        assert_eq!(parse_double_prefix(".5"), 0.5);
        assert_eq!(parse_double_prefix("2e"), 2.0);
        assert_eq!(parse_double_prefix("abc"), 0.0);
        assert_eq!(parse_double_prefix("."), 0.0);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.to_bool());
        assert!(!Value::Default.to_bool());
        assert!(!Value::Long(0).to_bool());
        assert!(!Value::Double(0.0).to_bool());
        assert!(!Value::from("").to_bool());
        assert!(!Value::from("0").to_bool());
        assert!(Value::from("false").to_bool());
        assert!(!Value::Array(vec![]).to_bool());
        assert!(Value::Array(vec![Value::Null]).to_bool());
    }

    #[test]
    fn string_forms() {
        assert_eq!(Value::Long(42).to_string_value(), "42");
        assert_eq!(Value::Double(1.5).to_string_value(), "1.5");
        assert_eq!(Value::Double(3.0).to_string_value(), "3");
        assert_eq!(Value::Bool(true).to_string_value(), "1");
        assert_eq!(Value::Bool(false).to_string_value(), "");
        assert_eq!(Value::Null.to_string_value(), "");
    }

    #[test]
    fn char_conversion() {
        assert_eq!(Value::from("hello").to_char(), 'h');
        assert_eq!(Value::Long(65).to_char(), 'A');
        assert_eq!(Value::Long(-1).to_char(), '\0');
        assert_eq!(Value::Null.to_char(), '\0');
    }

    #[test]
    fn null_and_default_are_distinct() {
        assert!(Value::Default.is_null());
        assert!(Value::Default.is_default());
        assert!(!Value::Null.is_default());
        assert_ne!(Value::Null, Value::Default);
    }

    #[test]
    fn var_aliases() {
        let a = Var::new(Value::Long(1));
        let b = a.clone();
        b.set(2_i64);
        assert_eq!(a.get(), Value::Long(2));
        assert!(a.ptr_eq(&b));
        a.update(|v| *v = Value::Long(v.to_long() + 1));
        assert_eq!(b.get(), Value::Long(3));
    }
}
