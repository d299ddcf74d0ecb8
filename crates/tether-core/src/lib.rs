//! Core of the tether binding layer.
//!
//! Exposes native Rust functions to a dynamically typed guest runtime:
//! guest [`Value`]s are coerced through a [`Lane`] per parameter into
//! native form, the function is called through its type-erased
//! [`NativeFn`], and the result is mapped back.
//!
//! The flow for one function:
//!
//! ```text
//! NativeMethodDecl ──introspect──▶ FunctionBinding ──invoke_exprs / invoke_values──▶ Value
//!                                        │
//!                                        └──emit::emit_native_call──▶ Rust source
//! ```
//!
//! Declarations are normally generated by `#[tether::function]`; [`decl!`]
//! names the generated declaration function.

pub mod binding;
pub mod context;
pub mod convert;
pub mod decl;
pub mod default_expr;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod expr;
pub mod lane;
pub mod native;
pub mod object;
pub mod value;

pub use binding::{ArityPlan, BindingFlags, FunctionBinding, ParamBinding};
pub use context::{Context, FunctionResolver};
pub use convert::{FromNative, IntoNative, NativeArgs, NativeTyped, Nullable};
pub use decl::{DeclaredOn, FailureMode, NativeFn, NativeMethodDecl, ParamDecl};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use emit::SourceWriter;
pub use error::{ArityError, BindingError, CoercionError, Direction, NativeError, RegistrationError, TetherError};
pub use expr::{ConstantRef, DefaultExpr, Expr, Literal, Omitted, VarRef};
pub use lane::{Lane, LaneClass};
pub use native::{Callback, NativeKind, NativeType, NativeValue};
pub use object::{ClassKey, NativeObject, ObjectRef};
pub use value::{Value, Var};

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}

/// The [`NativeMethodDecl`] generated by `#[tether::function]` for a function.
///
/// Takes a bare name or a path to the function.
///
/// ```ignore
/// let add = tether::decl!(tether_add);
/// let add = tether::decl!(tether_modules::math::tether_add);
/// ```
#[macro_export]
macro_rules! decl {
    (@acc [$($acc:tt)*] $name:ident) => {
        $crate::__private::paste! { $($acc)* [<__tether_ $name _decl>]() }
    };
    (@acc [$($acc:tt)*] $seg:ident :: $($rest:tt)+) => {
        $crate::decl!(@acc [$($acc)* $seg ::] $($rest)+)
    };
    (:: $($rest:tt)+) => {
        $crate::decl!(@acc [::] $($rest)+)
    };
    ($first:ident $($rest:tt)*) => {
        $crate::decl!(@acc [] $first $($rest)*)
    };
}
