//! Native-side types: what a Rust function declares and what it receives.

use std::fmt;
use std::path::PathBuf;

use crate::context::Context;
use crate::error::BindingError;
use crate::object::{ClassKey, ObjectRef};
use crate::value::{Value, Var};

/// Kind of a native parameter or return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Str,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    Path,
    Callback,
    /// Dynamic guest value, passed through unchanged.
    Value,
    /// Call-site storage (`Var`).
    Var,
    Void,
    /// The execution context; only valid as the first parameter.
    Context,
    /// Variadic tail of values; only valid as the last parameter.
    ValueSeq,
    /// Variadic tail of references; only valid as the last parameter.
    VarSeq,
    Object(ClassKey),
}

impl NativeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NativeKind::Str => "String",
            NativeKind::Bool => "bool",
            NativeKind::I8 => "i8",
            NativeKind::I16 => "i16",
            NativeKind::I32 => "i32",
            NativeKind::I64 => "i64",
            NativeKind::F32 => "f32",
            NativeKind::F64 => "f64",
            NativeKind::Char => "char",
            NativeKind::Path => "PathBuf",
            NativeKind::Callback => "Callback",
            NativeKind::Value => "Value",
            NativeKind::Var => "Var",
            NativeKind::Void => "()",
            NativeKind::Context => "Context",
            NativeKind::ValueSeq => "Vec<Value>",
            NativeKind::VarSeq => "Vec<Var>",
            NativeKind::Object(key) => key.name,
        }
    }
}

/// A native type: its kind, and whether it is the nullable `Option<T>` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeType {
    pub kind: NativeKind,
    pub nullable: bool,
}

impl NativeType {
    pub const VOID: NativeType = NativeType::of(NativeKind::Void);
    pub const CONTEXT: NativeType = NativeType::of(NativeKind::Context);

    pub const fn of(kind: NativeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: NativeKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.kind.name())
        } else {
            write!(f, "{}", self.kind.name())
        }
    }
}

/// A value in native form, as produced by a lane and consumed by an invoker.
#[derive(Debug, Clone)]
pub enum NativeValue {
    /// The null surrogate, read as `None` by `Option<T>` parameters.
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Path(PathBuf),
    Callback(Callback),
    Value(Value),
    Var(Var),
    ValueSeq(Vec<Value>),
    VarSeq(Vec<Var>),
    Object(ObjectRef),
    Void,
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::I8(_) => "i8",
            NativeValue::I16(_) => "i16",
            NativeValue::I32(_) => "i32",
            NativeValue::I64(_) => "i64",
            NativeValue::F32(_) => "f32",
            NativeValue::F64(_) => "f64",
            NativeValue::Char(_) => "char",
            NativeValue::Str(_) => "String",
            NativeValue::Path(_) => "PathBuf",
            NativeValue::Callback(_) => "Callback",
            NativeValue::Value(_) => "Value",
            NativeValue::Var(_) => "Var",
            NativeValue::ValueSeq(_) => "Vec<Value>",
            NativeValue::VarSeq(_) => "Vec<Var>",
            NativeValue::Object(obj) => obj.class_name(),
            NativeValue::Void => "()",
        }
    }
}

/// A guest callable, identified by the name of a registered function.
///
/// Resolved at call time through the context's resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    name: String,
}

impl Callback {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Build a callback from a guest value; `null` and omitted values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(Self::new(value.to_string_value()))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the function this callback names with guest values.
    pub fn call(&self, ctx: &mut Context, args: &[Value]) -> Result<Value, BindingError> {
        let binding = ctx
            .resolve_function(&self.name)
            .ok_or_else(|| BindingError::UnknownFunction {
                name: self.name.clone(),
            })?;
        binding.invoke_values(ctx, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_type_display() {
        assert_eq!(NativeType::of(NativeKind::I32).to_string(), "i32");
        assert_eq!(
            NativeType::nullable(NativeKind::Str).to_string(),
            "Option<String>"
        );
        assert_eq!(NativeType::VOID.to_string(), "()");
    }

    #[test]
    fn callback_from_value() {
        assert!(Callback::from_value(&Value::Null).is_none());
        assert!(Callback::from_value(&Value::Default).is_none());
        let cb = Callback::from_value(&Value::from("strlen")).unwrap();
        assert_eq!(cb.name(), "strlen");
    }

    #[test]
    fn callback_without_resolver_is_unknown() {
        let mut ctx = Context::new();
        let err = Callback::new("missing").call(&mut ctx, &[]).unwrap_err();
        assert!(matches!(err, BindingError::UnknownFunction { .. }));
        assert!(err.is_recoverable());
    }
}
