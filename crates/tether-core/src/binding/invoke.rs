//! The invocation engine.
//!
//! Both entry points run the same plan: arity binding, then each ordinary
//! argument is evaluated immediately before its own coercion, left to right,
//! then the tail is collected, the native function is called and its result
//! is mapped back through the return lane.

use std::panic::{self, AssertUnwindSafe};

use crate::context::Context;
use crate::error::{ArityError, BindingError, CoercionError, NativeError};
use crate::expr::Expr;
use crate::native::NativeValue;
use crate::value::{Value, Var};

use super::{FunctionBinding, ParamBinding};

/// Call-site arguments, evaluated on demand.
trait ArgSource {
    fn len(&self) -> usize;

    fn value(&self, index: usize, ctx: &mut Context) -> Value;

    fn var(&self, index: usize, ctx: &mut Context) -> Var;
}

impl ArgSource for [&dyn Expr] {
    fn len(&self) -> usize {
        <[&dyn Expr]>::len(self)
    }

    fn value(&self, index: usize, ctx: &mut Context) -> Value {
        self[index].eval(ctx)
    }

    fn var(&self, index: usize, ctx: &mut Context) -> Var {
        self[index].eval_ref(ctx)
    }
}

impl ArgSource for [Value] {
    fn len(&self) -> usize {
        <[Value]>::len(self)
    }

    fn value(&self, index: usize, _ctx: &mut Context) -> Value {
        self[index].clone()
    }

    fn var(&self, index: usize, _ctx: &mut Context) -> Var {
        Var::new(self[index].clone())
    }
}

/// Coerce one evaluated argument for `param`.
///
/// Failure policy: a not-null parameter fails hard; a nullable parameter
/// warns and receives `None`; any other parameter fails softly, which
/// aborts the call.
pub(crate) fn coerce_param(
    ctx: &mut Context,
    function: &str,
    position: usize,
    param: &ParamBinding,
    value: Value,
) -> Result<NativeValue, BindingError> {
    let fail = |hard: bool, source: CoercionError| BindingError::Coercion {
        function: function.to_string(),
        position,
        hard,
        source,
    };

    let native = match param.lane.to_native(ctx, value, param.nullable) {
        Ok(native) => native,
        Err(source) if param.not_null => return Err(fail(true, source)),
        Err(source) if param.nullable => {
            ctx.warning(function, format!("argument {}: {source}", position + 1));
            NativeValue::Null
        }
        Err(source) => return Err(fail(false, source)),
    };

    if native.is_null() && (param.not_null || !param.nullable) {
        let source = CoercionError::NullArgument {
            expected: param.lane.name().to_string(),
        };
        return Err(fail(param.not_null, source));
    }

    Ok(native)
}

impl FunctionBinding {
    /// Invoke with call-site expressions.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke_exprs(&self, ctx: &mut Context, args: &[&dyn Expr]) -> Result<Value, BindingError> {
        self.invoke_with(ctx, args)
    }

    /// Invoke with already evaluated values.
    ///
    /// Reference parameters receive fresh storage holding the value.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke_values(&self, ctx: &mut Context, args: &[Value]) -> Result<Value, BindingError> {
        self.invoke_with(ctx, args)
    }

    fn invoke_with<A: ArgSource + ?Sized>(&self, ctx: &mut Context, args: &A) -> Result<Value, BindingError> {
        let plan = self.bind_arity(args.len())?;

        let mut natives = Vec::with_capacity(self.params.len() + usize::from(self.has_variadic_tail()));
        for (position, param) in self.params.iter().enumerate() {
            let native = if position < plan.from_call_site {
                if param.lane.is_reference() {
                    NativeValue::Var(args.var(position, ctx))
                } else {
                    let value = args.value(position, ctx);
                    coerce_param(ctx, &self.name, position, param, value)?
                }
            } else {
                let default = param.default.as_ref().ok_or_else(|| ArityError::TooFew {
                    function: self.name.clone(),
                    required: position + 1,
                    provided: args.len(),
                })?;
                if param.lane.is_reference() {
                    NativeValue::Var(default.eval_ref(ctx))
                } else {
                    let value = default.eval(ctx);
                    coerce_param(ctx, &self.name, position, param, value)?
                }
            };
            natives.push(native);
        }

        if self.has_variadic_tail() {
            let excess = self.params.len()..args.len();
            let tail = if self.tail_of_vars() {
                NativeValue::VarSeq(excess.map(|i| args.var(i, ctx)).collect())
            } else if self.variadic_tail_by_ref() {
                NativeValue::ValueSeq(excess.map(|i| args.var(i, ctx).get()).collect())
            } else {
                NativeValue::ValueSeq(excess.map(|i| args.value(i, ctx)).collect())
            };
            natives.push(tail);
        }

        let result = self.call_native(ctx, natives)?;
        self.coerce_return(result)
    }

    /// Call the native function, turning errors and panics into `BindingError::Native`.
    fn call_native(&self, ctx: &mut Context, natives: Vec<NativeValue>) -> Result<NativeValue, BindingError> {
        let native = &self.native;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| native.call(ctx, natives)));
        let source = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(payload) => NativeError::from_panic(&*payload),
        };
        log::debug!("native call to '{}' failed: {source}", self.name);
        Err(BindingError::Native {
            function: self.name.clone(),
            source,
        })
    }

    fn coerce_return(&self, native: NativeValue) -> Result<Value, BindingError> {
        if self.null_as_false() && native.is_null() {
            return Ok(Value::Bool(false));
        }
        self.return_lane
            .to_guest(native)
            .map_err(|source| BindingError::Return {
                function: self.name.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::context::Context;
    use crate::convert::{IntoNative, NativeArgs};
    use crate::decl::{NativeFn, NativeMethodDecl, ParamDecl};
    use crate::expr::{Literal, VarRef};
    use crate::object::{NativeObject, ObjectRef};

    fn add() -> FunctionBinding {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let a: i32 = args.next()?;
            let b: i32 = args.next()?;
            Ok((a + b).into_native())
        });
        let decl = NativeMethodDecl::new("add", invoker)
            .param(ParamDecl::of::<i32>("a"))
            .param(ParamDecl::of::<i32>("b").default_text("5"))
            .returns::<i32>();
        FunctionBinding::from_decl(decl).unwrap()
    }

    /// An expression that records when it was evaluated.
    #[derive(Debug)]
    struct Recorded {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Expr for Recorded {
        fn eval(&self, _ctx: &mut Context) -> Value {
            self.log.lock().push(self.label);
            Value::Long(1)
        }

        fn emit_value(&self, out: &mut crate::emit::SourceWriter) {
            out.print(self.label);
        }
    }

    #[test]
    fn end_to_end_add() {
        let binding = add();
        let mut ctx = Context::new();

        assert_eq!(binding.invoke_values(&mut ctx, &[Value::Long(3)]), Ok(Value::Long(8)));
        assert_eq!(
            binding.invoke_values(&mut ctx, &[Value::Long(3), Value::Long(4)]),
            Ok(Value::Long(7))
        );
        assert!(matches!(
            binding.invoke_values(&mut ctx, &[Value::Long(3), Value::Long(4), Value::Long(5)]),
            Err(BindingError::Arity(ArityError::TooMany { .. }))
        ));
        assert_eq!(binding.invoke_values(&mut ctx, &[Value::from("x")]), Ok(Value::Long(5)));
    }

    #[test]
    fn both_entry_points_agree() {
        let binding = add();
        let mut ctx = Context::new();
        let a = Literal::new("12");
        let b = Literal::new(2.9);
        let via_exprs = binding.invoke_exprs(&mut ctx, &[&a, &b]);
        let via_values = binding.invoke_values(&mut ctx, &[Value::from("12"), Value::Double(2.9)]);
        assert_eq!(via_exprs, via_values);
        assert_eq!(via_exprs, Ok(Value::Long(14)));
    }

    #[test]
    fn evaluation_is_lazy_and_left_to_right() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Recorded {
            label: "first",
            log: Arc::clone(&log),
        };
        let second = Recorded {
            label: "second",
            log: Arc::clone(&log),
        };
        let third = Recorded {
            label: "third",
            log: Arc::clone(&log),
        };

        let mut ctx = Context::new();
        let binding = add();
        let err = binding.invoke_exprs(&mut ctx, &[&first, &second, &third]);
        assert!(err.is_err());
        assert!(log.lock().is_empty(), "arity failure evaluates nothing");

        binding.invoke_exprs(&mut ctx, &[&first, &second]).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn reference_parameter_writes_back() {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let var: Var = args.next()?;
            var.update(|v| *v = Value::Long(v.to_long() + 1));
            Ok(NativeValue::Void)
        });
        let decl = NativeMethodDecl::new("inc", invoker).param(ParamDecl::of::<Var>("v"));
        let binding = FunctionBinding::from_decl(decl).unwrap();

        let mut ctx = Context::new();
        ctx.set_var("n", 41_i64);
        let n = VarRef::new("n");
        assert_eq!(binding.invoke_exprs(&mut ctx, &[&n]), Ok(Value::Null));
        assert_eq!(n.eval(&mut ctx), Value::Long(42));

        // value entry point: fresh storage, caller unaffected
        assert_eq!(binding.invoke_values(&mut ctx, &[Value::Long(1)]), Ok(Value::Null));
    }

    #[test]
    fn variadic_tail_collects_excess() {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let first: i64 = args.next()?;
            let rest: Vec<Value> = args.next()?;
            Ok((first + rest.iter().map(Value::to_long).sum::<i64>()).into_native())
        });
        let decl = NativeMethodDecl::new("sum", invoker)
            .param(ParamDecl::of::<i64>("first"))
            .param(ParamDecl::of::<Vec<Value>>("rest"))
            .returns::<i64>();
        let binding = FunctionBinding::from_decl(decl).unwrap();

        let mut ctx = Context::new();
        let args = [1, 2, 3, 4, 5].map(Value::Long);
        assert_eq!(binding.invoke_values(&mut ctx, &args), Ok(Value::Long(15)));
        assert_eq!(binding.invoke_values(&mut ctx, &args[..1]), Ok(Value::Long(1)));
    }

    #[test]
    fn variadic_var_tail_aliases_call_site() {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let vars: Vec<Var> = args.next()?;
            for var in &vars {
                var.set(0_i64);
            }
            Ok(NativeValue::Void)
        });
        let decl = NativeMethodDecl::new("reset", invoker).param(ParamDecl::of::<Vec<Var>>("vars"));
        let binding = FunctionBinding::from_decl(decl).unwrap();

        let mut ctx = Context::new();
        ctx.set_var("a", 1_i64);
        ctx.set_var("b", 2_i64);
        let (a, b) = (VarRef::new("a"), VarRef::new("b"));
        binding.invoke_exprs(&mut ctx, &[&a, &b]).unwrap();
        assert_eq!(a.eval(&mut ctx), Value::Long(0));
        assert_eq!(b.eval(&mut ctx), Value::Long(0));
    }

    #[test]
    fn native_errors_and_panics_are_wrapped() {
        let failing = NativeMethodDecl::new("fail", NativeFn::new(|_, _| Err(NativeError::failed("boom"))));
        let binding = FunctionBinding::from_decl(failing).unwrap();
        let err = binding.invoke_values(&mut Context::new(), &[]).unwrap_err();
        assert_eq!(
            err,
            BindingError::Native {
                function: "fail".into(),
                source: NativeError::failed("boom")
            }
        );
        assert!(!err.is_recoverable());

        let panicking = NativeMethodDecl::new("explode", NativeFn::new(|_, _| panic!("kaboom")));
        let binding = FunctionBinding::from_decl(panicking).unwrap();
        let err = binding.invoke_values(&mut Context::new(), &[]).unwrap_err();
        assert!(matches!(
            err,
            BindingError::Native { source: NativeError::Panic { ref message }, .. } if message == "kaboom"
        ));
    }

    #[test]
    fn null_as_false_return() {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let found: bool = args.next()?;
            Ok(if found { Some(3_i64) } else { None }.into_native())
        });
        let decl = NativeMethodDecl::new("find", invoker)
            .param(ParamDecl::of::<bool>("found"))
            .returns::<Option<i64>>()
            .null_as_false();
        let binding = FunctionBinding::from_decl(decl).unwrap();
        let mut ctx = Context::new();
        assert_eq!(binding.invoke_values(&mut ctx, &[Value::Bool(true)]), Ok(Value::Long(3)));
        assert_eq!(binding.invoke_values(&mut ctx, &[Value::Bool(false)]), Ok(Value::Bool(false)));
    }

    // ========================================================================
    // Coercion failure policy
    // ========================================================================

    struct Counter;
    impl NativeObject for Counter {
        fn class_name() -> &'static str {
            "Counter"
        }
    }

    fn object_taker(param: ParamDecl) -> FunctionBinding {
        let invoker = NativeFn::new(|_, args| {
            let mut args = NativeArgs::new(args);
            let counter: Option<Arc<Counter>> = args.next()?;
            Ok(counter.is_some().into_native())
        });
        let decl = NativeMethodDecl::new("take", invoker).param(param).returns::<bool>();
        FunctionBinding::from_decl(decl).unwrap()
    }

    #[test]
    fn nullable_mismatch_warns_and_proceeds() {
        let binding = object_taker(ParamDecl::of::<Option<Arc<Counter>>>("c"));
        let mut ctx = Context::new();
        assert_eq!(binding.invoke_values(&mut ctx, &[Value::Long(1)]), Ok(Value::Bool(false)));
        assert_eq!(ctx.diagnostics().warning_count(), 1);

        let counter = Value::Object(ObjectRef::new(Arc::new(Counter)));
        assert_eq!(binding.invoke_values(&mut ctx, &[counter]), Ok(Value::Bool(true)));
    }

    #[test]
    fn non_nullable_mismatch_aborts_softly() {
        let binding = object_taker(ParamDecl::of::<Arc<Counter>>("c"));
        let mut ctx = Context::new();
        let err = binding.invoke_values(&mut ctx, &[Value::Long(1)]).unwrap_err();
        assert!(err.is_recoverable());

        let err = binding.invoke_values(&mut ctx, &[Value::Null]).unwrap_err();
        assert!(matches!(
            err,
            BindingError::Coercion { hard: false, source: CoercionError::NullArgument { .. }, .. }
        ));
    }

    #[test]
    fn not_null_escalates() {
        let binding = object_taker(ParamDecl::of::<Option<Arc<Counter>>>("c").not_null());
        let mut ctx = Context::new();
        let err = binding.invoke_values(&mut ctx, &[Value::Null]).unwrap_err();
        assert!(matches!(err, BindingError::Coercion { hard: true, position: 0, .. }));

        let err = binding.invoke_values(&mut ctx, &[Value::from("nope")]).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn context_policy_turns_soft_failures_into_null() {
        let binding = add();
        let mut ctx = Context::new();
        let result = ctx.call_values(&binding, &[]);
        assert_eq!(result, Ok(Value::Null));
        assert_eq!(ctx.diagnostics().warning_count(), 1);
        let warning = ctx.diagnostics().warnings().next().unwrap();
        assert!(warning.message.contains("too few arguments"));
        assert_eq!(warning.function.as_deref(), Some("add"));
    }
}
