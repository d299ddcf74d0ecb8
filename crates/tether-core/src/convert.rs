//! Conversion traits between Rust types and [`NativeValue`].
//!
//! - [`NativeTyped`]: the [`NativeType`] a Rust type declares
//! - [`FromNative`]: extract a Rust value from a [`NativeValue`]
//! - [`IntoNative`]: convert a Rust value into a [`NativeValue`]
//!
//! Lanes have already coerced guest values into the exact native shape, so
//! extraction here is strict: a shape mismatch is an error, not a conversion.
//!
//! ## Supported Types
//!
//! - Integers: `i8`, `i16`, `i32`, `i64`
//! - Floats: `f32`, `f64`
//! - `bool`, `char`, `String`, `PathBuf`, `Callback`
//! - `Value` (pass-through), `Var` (by reference)
//! - `Vec<Value>` / `Vec<Var>` (variadic tails)
//! - `Arc<T>` for any [`NativeObject`]
//! - `Option<T>` of the above scalar types (the nullable form)
//! - `()` (void)
//!
//! ## Example
//!
//! ```ignore
//! let mut args = NativeArgs::new(vec![NativeValue::I32(3), NativeValue::Null]);
//! let a: i32 = args.next()?;
//! let b: Option<i32> = args.next()?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{CoercionError, NativeError};
use crate::native::{Callback, NativeKind, NativeType, NativeValue};
use crate::object::{ClassKey, NativeObject, ObjectRef};
use crate::value::{Value, Var};

/// The native type a Rust type is declared as.
pub trait NativeTyped {
    fn native_type() -> NativeType;
}

/// Extract a Rust value from a native value.
pub trait FromNative: Sized + NativeTyped {
    /// Returns a `CoercionError` if the value has the wrong shape.
    fn from_native(value: NativeValue) -> Result<Self, CoercionError>;
}

/// Convert a Rust value into a native value.
pub trait IntoNative: NativeTyped {
    fn into_native(self) -> NativeValue;
}

/// Types whose `Option<T>` form is supported as a nullable parameter or return.
pub trait Nullable: FromNative + IntoNative {}

fn mismatch<T: NativeTyped>(actual: &NativeValue) -> CoercionError {
    CoercionError::TypeMismatch {
        expected: T::native_type().kind.name(),
        actual: actual.kind_name(),
    }
}

// ============================================================================
// Scalar implementations
// ============================================================================

macro_rules! impl_native_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeTyped for $ty {
                fn native_type() -> NativeType {
                    NativeType::of(NativeKind::$variant)
                }
            }

            impl FromNative for $ty {
                fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
                    match value {
                        NativeValue::$variant(v) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }

            impl IntoNative for $ty {
                fn into_native(self) -> NativeValue {
                    NativeValue::$variant(self)
                }
            }

            impl Nullable for $ty {}
        )*
    };
}

impl_native_scalar!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    char => Char,
    String => Str,
    PathBuf => Path,
    Callback => Callback,
);

// ============================================================================
// Dynamic implementations
// ============================================================================

impl NativeTyped for Value {
    fn native_type() -> NativeType {
        NativeType::of(NativeKind::Value)
    }
}

impl FromNative for Value {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match value {
            NativeValue::Value(v) => Ok(v),
            NativeValue::Null => Ok(Value::Null),
            // a by-reference parameter declared as Value reads the current contents
            NativeValue::Var(var) => Ok(var.get()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoNative for Value {
    fn into_native(self) -> NativeValue {
        NativeValue::Value(self)
    }
}

impl NativeTyped for Var {
    fn native_type() -> NativeType {
        NativeType::of(NativeKind::Var)
    }
}

impl FromNative for Var {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match value {
            NativeValue::Var(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoNative for Var {
    fn into_native(self) -> NativeValue {
        NativeValue::Var(self)
    }
}

impl NativeTyped for Vec<Value> {
    fn native_type() -> NativeType {
        NativeType::of(NativeKind::ValueSeq)
    }
}

impl FromNative for Vec<Value> {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match value {
            NativeValue::ValueSeq(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoNative for Vec<Value> {
    fn into_native(self) -> NativeValue {
        NativeValue::ValueSeq(self)
    }
}

impl NativeTyped for Vec<Var> {
    fn native_type() -> NativeType {
        NativeType::of(NativeKind::VarSeq)
    }
}

impl FromNative for Vec<Var> {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match value {
            NativeValue::VarSeq(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl IntoNative for Vec<Var> {
    fn into_native(self) -> NativeValue {
        NativeValue::VarSeq(self)
    }
}

// ============================================================================
// Object implementations
// ============================================================================

impl<T: NativeObject> NativeTyped for Arc<T> {
    fn native_type() -> NativeType {
        NativeType::of(NativeKind::Object(ClassKey::of::<T>()))
    }
}

impl<T: NativeObject> FromNative for Arc<T> {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match &value {
            NativeValue::Object(obj) => obj.downcast::<T>().ok_or_else(|| mismatch::<Self>(&value)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl<T: NativeObject> IntoNative for Arc<T> {
    fn into_native(self) -> NativeValue {
        NativeValue::Object(ObjectRef::new(self))
    }
}

impl<T: NativeObject> Nullable for Arc<T> {}

// ============================================================================
// Nullable form
// ============================================================================

impl<T: Nullable> NativeTyped for Option<T> {
    fn native_type() -> NativeType {
        NativeType {
            nullable: true,
            ..T::native_type()
        }
    }
}

impl<T: Nullable> FromNative for Option<T> {
    fn from_native(value: NativeValue) -> Result<Self, CoercionError> {
        match value {
            NativeValue::Null => Ok(None),
            other => T::from_native(other).map(Some),
        }
    }
}

impl<T: Nullable> IntoNative for Option<T> {
    fn into_native(self) -> NativeValue {
        match self {
            Some(v) => v.into_native(),
            None => NativeValue::Null,
        }
    }
}

// ============================================================================
// Unit implementation
// ============================================================================

impl NativeTyped for () {
    fn native_type() -> NativeType {
        NativeType::VOID
    }
}

impl IntoNative for () {
    fn into_native(self) -> NativeValue {
        NativeValue::Void
    }
}

// ============================================================================
// Argument cursor
// ============================================================================

/// Positional reader over the native arguments an invoker receives.
#[derive(Debug)]
pub struct NativeArgs {
    values: std::vec::IntoIter<NativeValue>,
    position: usize,
}

impl NativeArgs {
    pub fn new(values: Vec<NativeValue>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Take the next argument as `T`.
    pub fn next<T: FromNative>(&mut self) -> Result<T, NativeError> {
        let position = self.position;
        self.position += 1;
        let value = self
            .values
            .next()
            .ok_or(CoercionError::MissingArgument { position })?;
        Ok(T::from_native(value)?)
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
