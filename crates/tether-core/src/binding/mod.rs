//! Function bindings: the per-function call plan.
//!
//! A [`FunctionBinding`] is built once from a [`NativeMethodDecl`] and holds
//! everything a call needs: one [`ParamBinding`] (lane + default) per
//! ordinary parameter, whether the function receives the context, whether it
//! has a variadic tail, and the return lane.
//!
//! The context parameter and the variadic tail are never among `params`, so
//! coercions and defaults always line up one-to-one with ordinary positions.

mod arity;
mod invoke;

pub use arity::ArityPlan;
pub(crate) use invoke::coerce_param;

use bitflags::bitflags;

use crate::decl::{FailureMode, NativeFn, NativeMethodDecl};
use crate::default_expr;
use crate::error::RegistrationError;
use crate::expr::{DefaultExpr, Omitted};
use crate::lane::Lane;
use crate::native::{NativeKind, NativeType};

use std::sync::Arc;

bitflags! {
    /// Shape flags of a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindingFlags: u8 {
        const RECEIVES_CONTEXT = 1 << 0;
        const VARIADIC_TAIL = 1 << 1;
        const VARIADIC_BY_REF = 1 << 2;
        const NULL_AS_FALSE = 1 << 3;
        /// The tail is declared as `Vec<Var>`.
        const TAIL_OF_VARS = 1 << 4;
        /// The native function returns `Result<T, NativeError>`.
        const RUNTIME_FAILURE = 1 << 5;
    }
}

/// One ordinary parameter of a binding.
#[derive(Debug, Clone)]
pub struct ParamBinding {
    pub name: String,
    pub lane: Lane,
    /// Present when the parameter is optional.
    pub default: Option<DefaultExpr>,
    /// Coercion failures on this parameter are hard errors.
    pub not_null: bool,
    /// The `Option<T>` form.
    pub nullable: bool,
    /// Declared native kind; a by-reference `Value` reads the cell.
    pub kind: NativeKind,
    /// Rust spelling of the parameter type.
    pub rust_type: String,
}

impl ParamBinding {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// The bound form of a native function.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    name: String,
    native: NativeFn,
    params: Vec<ParamBinding>,
    flags: BindingFlags,
    return_lane: Lane,
    return_nullable: bool,
    rust_path: String,
}

impl FunctionBinding {
    /// Build a binding from a declaration, exposed as `name`.
    ///
    /// Rejected declarations are logged at `warn` and returned as errors.
    pub fn introspect(name: impl Into<String>, decl: NativeMethodDecl) -> Result<Self, RegistrationError> {
        let name = name.into();
        Self::build(name, decl).inspect_err(|err| {
            log::warn!("not binding native method: {err}");
        })
    }

    /// Build a binding exposed under the declaration's own guest name.
    pub fn from_decl(decl: NativeMethodDecl) -> Result<Self, RegistrationError> {
        Self::introspect(decl.guest_name(), decl)
    }

    fn build(name: String, decl: NativeMethodDecl) -> Result<Self, RegistrationError> {
        if let FailureMode::Checked(type_name) = decl.failure {
            return Err(RegistrationError::CheckedFailure {
                function: name,
                type_name: type_name.to_string(),
            });
        }

        let mut flags = BindingFlags::empty();
        if decl.failure == FailureMode::Runtime {
            flags |= BindingFlags::RUNTIME_FAILURE;
        }
        let mut decls = decl.params.as_slice();

        if let Some(first) = decls.first() {
            if first.native_type.kind == NativeKind::Context {
                flags |= BindingFlags::RECEIVES_CONTEXT;
                decls = &decls[1..];
            }
        }

        if let Some(last) = decls.last() {
            match last.native_type.kind {
                NativeKind::ValueSeq => {
                    flags |= BindingFlags::VARIADIC_TAIL;
                    if last.by_ref {
                        flags |= BindingFlags::VARIADIC_BY_REF;
                    }
                    decls = &decls[..decls.len() - 1];
                }
                NativeKind::VarSeq => {
                    flags |= BindingFlags::VARIADIC_TAIL | BindingFlags::VARIADIC_BY_REF | BindingFlags::TAIL_OF_VARS;
                    decls = &decls[..decls.len() - 1];
                }
                _ => {}
            }
        }

        let mut params = Vec::with_capacity(decls.len());
        for param in decls {
            let unsupported = || RegistrationError::UnsupportedParameter {
                function: name.clone(),
                param: param.name.to_string(),
                type_name: param.native_type.to_string(),
            };

            let lane = if param.by_ref {
                if !matches!(param.native_type.kind, NativeKind::Var | NativeKind::Value) {
                    return Err(unsupported());
                }
                Lane::Reference
            } else {
                Lane::for_type(param.native_type).ok_or_else(unsupported)?
            };
            if lane == Lane::Void {
                return Err(unsupported());
            }

            let default = match param.optional {
                None => None,
                Some(None) => Some(Arc::new(Omitted) as DefaultExpr),
                Some(Some(text)) => Some(default_expr::parse(text).map_err(|err| RegistrationError::BadDefault {
                    function: name.clone(),
                    param: param.name.to_string(),
                    detail: err.to_string(),
                })?),
            };

            params.push(ParamBinding {
                name: param.name.to_string(),
                lane,
                default,
                not_null: param.not_null,
                nullable: param.native_type.nullable,
                kind: param.native_type.kind,
                rust_type: param.rust_type.to_string(),
            });
        }

        let return_lane = Self::select_return_lane(&name, decl.returns)?;
        if decl.null_as_false {
            if return_lane == Lane::Value {
                return Err(RegistrationError::NullAsFalseOnValue { function: name });
            }
            flags |= BindingFlags::NULL_AS_FALSE;
        }

        Ok(Self {
            name,
            native: decl.invoker,
            params,
            flags,
            return_lane,
            return_nullable: decl.returns.nullable,
            rust_path: decl.rust_path.to_string(),
        })
    }

    fn select_return_lane(name: &str, returns: NativeType) -> Result<Lane, RegistrationError> {
        let unsupported = || RegistrationError::UnsupportedReturn {
            function: name.to_string(),
            type_name: returns.to_string(),
        };
        match Lane::for_type(returns) {
            Some(Lane::Callback | Lane::Reference) | None => Err(unsupported()),
            Some(lane) => Ok(lane),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    pub fn flags(&self) -> BindingFlags {
        self.flags
    }

    pub fn receives_context(&self) -> bool {
        self.flags.contains(BindingFlags::RECEIVES_CONTEXT)
    }

    pub fn has_variadic_tail(&self) -> bool {
        self.flags.contains(BindingFlags::VARIADIC_TAIL)
    }

    pub fn variadic_tail_by_ref(&self) -> bool {
        self.flags.contains(BindingFlags::VARIADIC_BY_REF)
    }

    pub(crate) fn tail_of_vars(&self) -> bool {
        self.flags.contains(BindingFlags::TAIL_OF_VARS)
    }

    pub fn can_fail(&self) -> bool {
        self.flags.contains(BindingFlags::RUNTIME_FAILURE)
    }

    pub fn null_as_false(&self) -> bool {
        self.flags.contains(BindingFlags::NULL_AS_FALSE)
    }

    pub fn return_lane(&self) -> Lane {
        self.return_lane
    }

    pub fn return_nullable(&self) -> bool {
        self.return_nullable
    }

    pub fn rust_path(&self) -> &str {
        &self.rust_path
    }

    pub fn native(&self) -> &NativeFn {
        &self.native
    }

    /// A copy of this binding exposed under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
