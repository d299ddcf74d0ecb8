//! Error types for the binding layer.
//!
//! Each phase of a native call has its own error type so callers can handle
//! them at the granularity they need, or convert everything into
//! [`TetherError`]:
//!
//! ```text
//! TetherError (top-level wrapper)
//! ├── RegistrationError - a declaration cannot be bound (logged and skipped)
//! ├── ArityError        - wrong number of call-site arguments
//! ├── CoercionError     - a value does not fit a lane
//! ├── NativeError       - raised by (or panicked inside) native code
//! └── BindingError      - a call through a FunctionBinding failed
//! ```
//!
//! `BindingError::is_recoverable` drives the call-site policy: recoverable
//! failures become a warning and a `null` result, everything else propagates.

use thiserror::Error;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while turning a native declaration into a binding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A parameter type has no lane in an ordinary parameter position.
    #[error("'{function}': parameter '{param}' has unsupported type {type_name}")]
    UnsupportedParameter {
        function: String,
        param: String,
        type_name: String,
    },

    /// The return type cannot be mapped back to a guest value.
    #[error("'{function}': unsupported return type {type_name}")]
    UnsupportedReturn { function: String, type_name: String },

    /// The native method declares a checked failure type.
    #[error("'{function}': native method declares checked failure {type_name}")]
    CheckedFailure { function: String, type_name: String },

    /// An optional parameter's default text did not parse.
    #[error("'{function}': bad default for parameter '{param}': {detail}")]
    BadDefault {
        function: String,
        param: String,
        detail: String,
    },

    /// `null_as_false` was requested on a dynamic `Value` return.
    #[error("'{function}': null_as_false is not allowed on a Value return")]
    NullAsFalseOnValue { function: String },
}

impl RegistrationError {
    /// Name of the native method that was rejected.
    pub fn function(&self) -> &str {
        match self {
            RegistrationError::UnsupportedParameter { function, .. }
            | RegistrationError::UnsupportedReturn { function, .. }
            | RegistrationError::CheckedFailure { function, .. }
            | RegistrationError::BadDefault { function, .. }
            | RegistrationError::NullAsFalseOnValue { function } => function,
        }
    }
}

// ============================================================================
// Arity Errors
// ============================================================================

/// The call site passed a number of arguments the binding cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArityError {
    #[error("too few arguments to '{function}': expected at least {required}, got {provided}")]
    TooFew {
        function: String,
        required: usize,
        provided: usize,
    },

    #[error("too many arguments to '{function}': expected at most {max}, got {provided}")]
    TooMany {
        function: String,
        max: usize,
        provided: usize,
    },
}

// ============================================================================
// Coercion Errors
// ============================================================================

/// Which way a lane was converting when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToNative,
    ToGuest,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::ToNative => write!(f, "to native"),
            Direction::ToGuest => write!(f, "to guest"),
        }
    }
}

/// A value could not be coerced through a lane.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The guest value is of a type the lane does not accept.
    #[error("unexpected argument {value} of type {actual}, expected {expected}")]
    UnexpectedArgument {
        value: String,
        actual: &'static str,
        expected: String,
    },

    /// A null surrogate would be passed where the native side requires a value.
    #[error("null passed where {expected} is required")]
    NullArgument { expected: String },

    /// The lane does not support this direction.
    #[error("{lane} lane does not convert {direction}")]
    Unsupported {
        lane: &'static str,
        direction: Direction,
    },

    /// A native value of the wrong shape reached a conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The native invoker ran out of arguments.
    #[error("missing native argument at position {position}")]
    MissingArgument { position: usize },
}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors produced by native code, or by converting its arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// Native code reported a failure.
    #[error("{message}")]
    Failed { message: String },

    /// Native code panicked.
    #[error("native function panicked: {message}")]
    Panic { message: String },

    /// An argument or return value failed to convert.
    #[error("conversion error: {0}")]
    Conversion(#[from] CoercionError),

    /// A checked failure type surfaced through a hand-written invoker.
    #[error("{type_name}: {message}")]
    Checked { type_name: String, message: String },
}

impl NativeError {
    /// Create a failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        NativeError::Failed {
            message: message.into(),
        }
    }

    /// Create a checked failure carrying the declared error type's name.
    pub fn checked(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        NativeError::Checked {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Build a panic error from a `catch_unwind` payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        NativeError::Panic { message }
    }
}

// ============================================================================
// Binding Errors
// ============================================================================

/// A call through a [`FunctionBinding`](crate::FunctionBinding) failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error(transparent)]
    Arity(#[from] ArityError),

    /// Argument `position` (zero-based) could not be coerced.
    #[error("'{function}': argument {position}: {source}")]
    Coercion {
        function: String,
        position: usize,
        hard: bool,
        source: CoercionError,
    },

    /// The native return value could not be mapped back.
    #[error("'{function}': return value: {source}")]
    Return {
        function: String,
        source: CoercionError,
    },

    /// Native code failed; the cause is preserved.
    #[error("'{function}' failed: {source}")]
    Native {
        function: String,
        source: NativeError,
    },

    /// A callback named a function that is not registered.
    #[error("call to undefined function '{name}'")]
    UnknownFunction { name: String },
}

impl BindingError {
    /// Whether the call site should degrade to a warning and a `null` result.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BindingError::Arity(_) | BindingError::UnknownFunction { .. } => true,
            BindingError::Coercion { hard, .. } => !hard,
            BindingError::Return { .. } | BindingError::Native { .. } => false,
        }
    }

    /// Name of the function whose call failed.
    pub fn function(&self) -> &str {
        match self {
            BindingError::Arity(ArityError::TooFew { function, .. })
            | BindingError::Arity(ArityError::TooMany { function, .. })
            | BindingError::Coercion { function, .. }
            | BindingError::Return { function, .. }
            | BindingError::Native { function, .. } => function,
            BindingError::UnknownFunction { name } => name,
        }
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Top-level error for anything the binding layer can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TetherError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Native(#[from] NativeError),
}

impl From<ArityError> for TetherError {
    fn from(err: ArityError) -> Self {
        TetherError::Binding(BindingError::Arity(err))
    }
}

impl TetherError {
    pub fn is_registration(&self) -> bool {
        matches!(self, TetherError::Registration(_))
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, TetherError::Binding(_))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TetherError::Native(_))
    }
}
