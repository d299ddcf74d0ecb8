//! Native method declarations.
//!
//! A [`NativeMethodDecl`] is the static description of one Rust function:
//! its parameters, return type, failure mode and a type-erased invoker.
//! `#[tether::function]` generates one per annotated function; they can also
//! be written by hand.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::convert::NativeTyped;
use crate::error::NativeError;
use crate::native::{NativeType, NativeValue};

type NativeFnInner = dyn Fn(&mut Context, Vec<NativeValue>) -> Result<NativeValue, NativeError> + Send + Sync;

/// Type-erased native callable.
///
/// Receives the context and one native value per parameter (context
/// excluded, variadic tail as a single sequence value).
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<NativeFnInner>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context, Vec<NativeValue>) -> Result<NativeValue, NativeError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(&self, ctx: &mut Context, args: Vec<NativeValue>) -> Result<NativeValue, NativeError> {
        (self.inner)(ctx, args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Where a method was declared.
///
/// Methods inherited from the universal base or the module-defaults base
/// are never exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredOn {
    #[default]
    Module,
    UniversalBase,
    ModuleDefaults,
}

/// How the native function reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Plain return type.
    #[default]
    Infallible,
    /// `Result<T, NativeError>`.
    Runtime,
    /// `Result<T, E>` with a declared error type; not bindable.
    Checked(&'static str),
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: &'static str,
    pub native_type: NativeType,
    /// Rust spelling of the type, used by source emission.
    pub rust_type: &'static str,
    /// `Some(None)`: optional without default text; `Some(Some(text))`: with.
    pub optional: Option<Option<&'static str>>,
    pub by_ref: bool,
    pub not_null: bool,
}

impl ParamDecl {
    pub fn new(name: &'static str, native_type: NativeType, rust_type: &'static str) -> Self {
        Self {
            name,
            native_type,
            rust_type,
            optional: None,
            by_ref: false,
            not_null: false,
        }
    }

    /// A parameter of Rust type `T`.
    pub fn of<T: NativeTyped>(name: &'static str) -> Self {
        Self::new(name, T::native_type(), std::any::type_name::<T>())
    }

    /// The leading `&mut Context` parameter.
    pub fn context() -> Self {
        Self::new("ctx", NativeType::CONTEXT, "&mut Context")
    }

    pub fn optional(mut self) -> Self {
        self.optional = Some(None);
        self
    }

    pub fn default_text(mut self, text: &'static str) -> Self {
        self.optional = Some(Some(text));
        self
    }

    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// Static description of a native method.
#[derive(Debug, Clone)]
pub struct NativeMethodDecl {
    /// Rust function name.
    pub name: &'static str,
    /// Name override for the guest.
    pub exposed_name: Option<&'static str>,
    /// Full Rust path, used by source emission.
    pub rust_path: &'static str,
    pub declared_on: DeclaredOn,
    pub params: Vec<ParamDecl>,
    pub returns: NativeType,
    pub null_as_false: bool,
    pub failure: FailureMode,
    pub invoker: NativeFn,
}

impl NativeMethodDecl {
    pub fn new(name: &'static str, invoker: NativeFn) -> Self {
        Self {
            name,
            exposed_name: None,
            rust_path: name,
            declared_on: DeclaredOn::Module,
            params: Vec::new(),
            returns: NativeType::VOID,
            null_as_false: false,
            failure: FailureMode::Infallible,
            invoker,
        }
    }

    /// Name the guest sees before any registry prefix stripping.
    pub fn guest_name(&self) -> &'static str {
        self.exposed_name.unwrap_or(self.name)
    }

    pub fn exposed_as(mut self, name: &'static str) -> Self {
        self.exposed_name = Some(name);
        self
    }

    pub fn rust_path(mut self, path: &'static str) -> Self {
        self.rust_path = path;
        self
    }

    pub fn declared_on(mut self, origin: DeclaredOn) -> Self {
        self.declared_on = origin;
        self
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns<T: NativeTyped>(mut self) -> Self {
        self.returns = T::native_type();
        self
    }

    pub fn null_as_false(mut self) -> Self {
        self.null_as_false = true;
        self
    }

    pub fn failure(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeKind;

    #[test]
    fn builder_defaults() {
        let decl = NativeMethodDecl::new("tether_add", NativeFn::new(|_, _| Ok(NativeValue::Void)))
            .param(ParamDecl::of::<i32>("a"))
            .param(ParamDecl::of::<i32>("b").default_text("5"))
            .returns::<i32>();

        assert_eq!(decl.guest_name(), "tether_add");
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.params[1].optional, Some(Some("5")));
        assert_eq!(decl.returns.kind, NativeKind::I32);
        assert_eq!(decl.failure, FailureMode::Infallible);
        assert_eq!(decl.declared_on, DeclaredOn::Module);
    }

    #[test]
    fn exposed_name_overrides() {
        let decl = NativeMethodDecl::new("counter_increment", NativeFn::new(|_, _| Ok(NativeValue::Void)))
            .exposed_as("increment");
        assert_eq!(decl.guest_name(), "increment");
    }

    #[test]
    fn invoker_is_callable() {
        let f = NativeFn::new(|_, args| Ok(NativeValue::I64(args.len() as i64)));
        let mut ctx = Context::new();
        let result = f.call(&mut ctx, vec![NativeValue::Null, NativeValue::Null]).unwrap();
        assert!(matches!(result, NativeValue::I64(2)));
    }
}
