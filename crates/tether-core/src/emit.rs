//! Source emission for the compiled path.
//!
//! [`emit_native_call`] renders a call through a [`FunctionBinding`] as a
//! Rust block expression of type `Value`. The block expects `ctx: &mut
//! Context` in scope and must sit inside a function returning
//! `Result<_, BindingError>`. It performs the same steps as the interpreted
//! path: arity binding at emission time, per-argument coercion in order,
//! the native call, and the return mapping.

use crate::binding::{FunctionBinding, ParamBinding, coerce_param};
use crate::context::Context;
use crate::convert::FromNative;
use crate::error::{BindingError, CoercionError, Direction};
use crate::expr::Expr;
use crate::lane::Lane;
use crate::native::NativeKind;
use crate::value::Value;

/// Accumulates emitted source with indentation.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
    at_line_start: bool,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self {
            at_line_start: true,
            ..Self::default()
        }
    }

    pub fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.depth {
                self.buf.push_str("    ");
            }
            self.at_line_start = false;
        }
        self.buf.push_str(text);
    }

    pub fn println(&mut self, text: &str) {
        self.print(text);
        self.buf.push('\n');
        self.at_line_start = true;
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

// ============================================================================
// Literals
// ============================================================================

pub fn long_literal(v: i64) -> String {
    if v == i64::MIN {
        "i64::MIN".to_string()
    } else if v < 0 {
        format!("({v}i64)")
    } else {
        format!("{v}i64")
    }
}

pub fn double_literal(v: f64) -> String {
    if v.is_nan() {
        "f64::NAN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "f64::INFINITY" } else { "f64::NEG_INFINITY" }.to_string()
    } else if v.is_sign_negative() {
        format!("({v:?}f64)")
    } else {
        format!("{v:?}f64")
    }
}

/// Source constructing `value`. Objects have no literal form and render as `Null`.
pub fn value_literal(value: &Value) -> String {
    const V: &str = "::tether_core::Value";
    match value {
        Value::Null | Value::Object(_) => format!("{V}::Null"),
        Value::Default => format!("{V}::Default"),
        Value::Bool(b) => format!("{V}::Bool({b})"),
        Value::Long(v) => format!("{V}::Long({})", long_literal(*v)),
        Value::Double(v) => format!("{V}::Double({})", double_literal(*v)),
        Value::Str(s) => format!("{V}::Str(String::from({s:?}))"),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_literal).collect();
            format!("{V}::Array(vec![{}])", items.join(", "))
        }
    }
}

// ============================================================================
// Calls
// ============================================================================

/// Emit the call of `binding` with call-site expressions `args`.
pub fn emit_native_call(binding: &FunctionBinding, args: &[&dyn Expr]) -> Result<String, BindingError> {
    let plan = binding.bind_arity(args.len())?;
    let mut out = SourceWriter::new();
    let mut call_args = Vec::new();

    out.println("{");
    out.indent();

    if binding.receives_context() {
        call_args.push("ctx".to_string());
    }

    for (position, param) in binding.params().iter().enumerate() {
        let expr: &dyn Expr = if position < plan.from_call_site {
            args[position]
        } else {
            match param.default.as_deref() {
                Some(default) => default,
                None => {
                    return Err(crate::error::ArityError::TooFew {
                        function: binding.name().to_string(),
                        required: position + 1,
                        provided: args.len(),
                    }
                    .into());
                }
            }
        };

        let local = format!("__a{position}");
        out.print(&format!("let {local} = "));
        emit_arg(binding, position, param, expr, &mut out);
        out.println(";");
        call_args.push(local);
    }

    if binding.has_variadic_tail() {
        out.print("let __tail = vec![");
        for (i, expr) in args[binding.params().len()..].iter().enumerate() {
            if i > 0 {
                out.print(", ");
            }
            if binding.tail_of_vars() {
                expr.emit_ref(&mut out);
            } else if binding.variadic_tail_by_ref() {
                expr.emit_ref(&mut out);
                out.print(".get()");
            } else {
                expr.emit_value(&mut out);
            }
        }
        out.println("];");
        call_args.push("__tail".to_string());
    }

    let mut call = format!("{}({})", binding.rust_path(), call_args.join(", "));
    if !binding.can_fail() {
        call = format!("Ok({call})");
    }
    let call = format!("::tether_core::emit::rt::call({:?}, || {call})?", binding.name());

    let result = binding
        .return_lane()
        .emit_result(&call, binding.return_nullable(), binding.null_as_false())
        .map_err(|source| BindingError::Return {
            function: binding.name().to_string(),
            source,
        })?;
    out.println(&result);

    out.dedent();
    out.print("}");
    Ok(out.into_string())
}

fn emit_arg(binding: &FunctionBinding, position: usize, param: &ParamBinding, expr: &dyn Expr, out: &mut SourceWriter) {
    if param.lane.is_reference() && param.kind == NativeKind::Value {
        expr.emit_ref(out);
        out.print(".get()");
        return;
    }
    if param.lane.emit_arg(expr, param.nullable, out) {
        return;
    }
    out.print(&format!(
        "::tether_core::emit::rt::coerce::<{}>(ctx, {:?}, {position}, {}, ",
        param.rust_type,
        binding.name(),
        param.not_null
    ));
    expr.emit_value(out);
    out.print(")?");
}

/// Helpers called by emitted source.
pub mod rt {
    use super::*;
    use crate::error::NativeError;

    use std::panic::{self, AssertUnwindSafe};

    /// Apply `f` unless `value` is null.
    pub fn nullable<T>(value: Value, f: impl FnOnce(&Value) -> T) -> Option<T> {
        if value.is_null() { None } else { Some(f(&value)) }
    }

    /// Coerce `value` into `T` through its lane with the interpreted path's
    /// failure policy.
    pub fn coerce<T: FromNative>(
        ctx: &mut Context,
        function: &str,
        position: usize,
        not_null: bool,
        value: Value,
    ) -> Result<T, BindingError> {
        let ty = T::native_type();
        let hard = |source| BindingError::Coercion {
            function: function.to_string(),
            position,
            hard: true,
            source,
        };
        let lane = Lane::for_type(ty).ok_or_else(|| {
            hard(CoercionError::Unsupported {
                lane: ty.kind.name(),
                direction: Direction::ToNative,
            })
        })?;
        let param = ParamBinding {
            name: String::new(),
            lane,
            default: None,
            not_null,
            nullable: ty.nullable,
            kind: ty.kind,
            rust_type: String::new(),
        };
        let native = coerce_param(ctx, function, position, &param, value)?;
        T::from_native(native).map_err(hard)
    }

    /// Run the native call, turning its errors and panics into
    /// `BindingError::Native` the way the interpreted path does.
    pub fn call<T>(function: &str, f: impl FnOnce() -> Result<T, NativeError>) -> Result<T, BindingError> {
        let source = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(payload) => NativeError::from_panic(&*payload),
        };
        log::debug!("native call to '{function}' failed: {source}");
        Err(BindingError::Native {
            function: function.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::convert::{IntoNative, NativeArgs};
    use crate::decl::{FailureMode, NativeFn, NativeMethodDecl, ParamDecl};
    use crate::error::NativeError;
    use crate::expr::{Literal, VarRef};
    use crate::native::NativeValue;
    use crate::object::{NativeObject, ObjectRef};
    use crate::value::Var;

    fn add() -> FunctionBinding {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let a: i32 = args.next()?;
            let b: i32 = args.next()?;
            Ok((a + b).into_native())
        });
        let decl = NativeMethodDecl::new("add", invoker)
            .rust_path("math::add")
            .param(ParamDecl::of::<i32>("a"))
            .param(ParamDecl::of::<i32>("b").default_text("5"))
            .returns::<i32>();
        FunctionBinding::from_decl(decl).unwrap()
    }

    #[test]
    fn writer_indents_lines() {
        let mut out = SourceWriter::new();
        out.println("{");
        out.indent();
        out.print("a");
        out.println("b");
        out.dedent();
        out.print("}");
        assert_eq!(out.as_str(), "{\n    ab\n}");
    }

    #[test]
    fn literals() {
        assert_eq!(long_literal(-3), "(-3i64)");
        assert_eq!(long_literal(i64::MIN), "i64::MIN");
        assert_eq!(double_literal(1.0), "1.0f64");
        assert_eq!(double_literal(f64::NAN), "f64::NAN");
        assert_eq!(
            value_literal(&Value::Array(vec![Value::Long(1), Value::from("a\"b")])),
            "::tether_core::Value::Array(vec![::tether_core::Value::Long(1i64), ::tether_core::Value::Str(String::from(\"a\\\"b\"))])"
        );
    }

    #[test]
    fn emits_defaults_and_coercions() {
        let binding = add();
        let x = VarRef::new("x");
        let src = emit_native_call(&binding, &[&x]).unwrap();
        assert_eq!(
            src,
            "{\n    let __a0 = ((ctx.var(\"x\").get()).to_long()) as i32;\n    let __a1 = (5i64) as i32;\n    ::tether_core::Value::Long(i64::from((::tether_core::emit::rt::call(\"add\", || Ok(math::add(__a0, __a1)))?)))\n}"
        );
    }

    #[test]
    fn emission_checks_arity() {
        let binding = add();
        let one = Literal::new(1_i64);
        let err = emit_native_call(&binding, &[&one, &one, &one]).unwrap_err();
        assert!(err.to_string().contains("too many arguments"));
    }

    #[test]
    fn emits_context_tail_and_fallible_calls() {
        let decl = NativeMethodDecl::new("printf", NativeFn::new(|_, _| Ok(NativeValue::I64(0))))
            .rust_path("io::printf")
            .failure(FailureMode::Runtime)
            .param(ParamDecl::context())
            .param(ParamDecl::of::<String>("format"))
            .param(ParamDecl::of::<Vec<Value>>("args"))
            .returns::<i64>();
        let binding = FunctionBinding::from_decl(decl).unwrap();
        let fmt = Literal::new("%d %d");
        let (a, b) = (Literal::new(1_i64), VarRef::new("y"));
        let src = emit_native_call(&binding, &[&fmt, &a, &b]).unwrap();

        assert!(src.contains("let __a0 = String::from(\"%d %d\");"));
        assert!(src.contains("let __tail = vec![::tether_core::Value::Long(1i64), ctx.var(\"y\").get()];"));
        assert!(src.contains("::tether_core::emit::rt::call(\"printf\", || io::printf(ctx, __a0, __tail))?"));
    }

    #[test]
    fn emits_reference_and_generic_coercion() {
        struct Counter;
        impl NativeObject for Counter {
            fn class_name() -> &'static str {
                "Counter"
            }
        }

        let decl = NativeMethodDecl::new("bump", NativeFn::new(|_, _| Ok(NativeValue::Void)))
            .param(ParamDecl::new("counter", <Arc<Counter> as crate::convert::NativeTyped>::native_type(), "Arc<Counter>"))
            .param(ParamDecl::of::<Var>("total"));
        let binding = FunctionBinding::from_decl(decl).unwrap();
        let (c, t) = (VarRef::new("c"), VarRef::new("t"));
        let src = emit_native_call(&binding, &[&c, &t]).unwrap();

        assert!(src.contains(
            "let __a0 = ::tether_core::emit::rt::coerce::<Arc<Counter>>(ctx, \"bump\", 0, false, ctx.var(\"c\").get())?;"
        ));
        assert!(src.contains("let __a1 = ctx.var(\"t\");"));
        assert!(src.contains("{ ::tether_core::emit::rt::call(\"bump\", || Ok(bump(__a0, __a1)))?; ::tether_core::Value::Null }"));

        let mut ctx = Context::new();
        let obj = Arc::new(Counter);
        let value = Value::Object(ObjectRef::new(Arc::clone(&obj)));
        let back: Arc<Counter> = rt::coerce(&mut ctx, "bump", 0, false, value).unwrap();
        assert!(Arc::ptr_eq(&obj, &back));
        assert!(rt::coerce::<Arc<Counter>>(&mut ctx, "bump", 0, false, Value::Long(1)).is_err());
    }

    #[test]
    fn by_reference_value_reads_the_cell() {
        let decl = NativeMethodDecl::new("peek", NativeFn::new(|_, _| Ok(NativeValue::Void)))
            .rust_path("m::peek")
            .param(ParamDecl::of::<Value>("v").by_ref());
        let binding = FunctionBinding::from_decl(decl).unwrap();
        let x = VarRef::new("x");
        let src = emit_native_call(&binding, &[&x]).unwrap();
        assert!(src.contains("let __a0 = ctx.var(\"x\").get();"), "{src}");
    }

    #[test]
    fn call_helper_captures_failures() {
        assert_eq!(rt::call("ok", || Ok(3)), Ok(3));

        let failed = rt::call::<()>("f", || Err(NativeError::failed("nope"))).unwrap_err();
        assert_eq!(
            failed,
            BindingError::Native {
                function: "f".into(),
                source: NativeError::failed("nope"),
            }
        );

        let panicked = rt::call::<()>("boom", || panic!("kaboom")).unwrap_err();
        assert!(matches!(
            panicked,
            BindingError::Native { source: NativeError::Panic { ref message }, .. } if message == "kaboom"
        ));
    }

    #[test]
    fn nullable_helper() {
        assert_eq!(rt::nullable(Value::Null, Value::to_long), None);
        assert_eq!(rt::nullable(Value::from("7"), Value::to_long), Some(7));
    }
}
