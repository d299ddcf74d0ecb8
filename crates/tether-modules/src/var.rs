//! Variable handling: type inspection, by-reference helpers and callbacks.

use tether_core::{Callback, Context, NativeError, Value, Var};
use tether_macros::function;
use tether_registry::NativeModule;

// =============================================================================
// INSPECTION
// =============================================================================

#[function]
pub fn tether_gettype(value: Value) -> String {
    value.type_name().to_string()
}

#[function]
pub fn tether_is_null(value: Value) -> bool {
    value.is_null()
}

/// Whether `value` names a registered function.
#[function]
pub fn tether_is_callable(ctx: &mut Context, value: Value) -> bool {
    match value {
        Value::Str(name) => ctx.resolve_function(&name).is_some(),
        _ => false,
    }
}

// =============================================================================
// BY REFERENCE
// =============================================================================

/// Add `by` to the variable in place and return the new value.
#[function]
pub fn tether_increment(#[reference] var: Var, #[optional("1")] by: i64) -> i64 {
    var.update(|value| {
        let next = value.to_long().wrapping_add(by);
        *value = Value::Long(next);
        next
    })
}

#[function]
pub fn tether_swap(#[reference] a: Var, #[reference] b: Var) {
    let first = a.get();
    a.set(b.get());
    b.set(first);
}

/// Append values to the array held by `array` and return its new length.
///
/// A variable not holding an array is replaced by one.
#[function]
pub fn tether_array_push(#[reference] array: Var, values: Vec<Value>) -> i64 {
    array.update(|current| {
        if !matches!(current, Value::Array(_)) {
            *current = Value::Array(Vec::new());
        }
        match current {
            Value::Array(items) => {
                items.extend(values);
                items.len() as i64
            }
            _ => 0,
        }
    })
}

/// Set every variable in the tail to null.
#[function]
pub fn tether_unset(#[reference] vars: Vec<Var>) {
    for var in vars {
        var.set(Value::Null);
    }
}

// =============================================================================
// CALLBACKS
// =============================================================================

/// Call a function by name with the remaining arguments.
///
/// An unknown function or a rejected call warns and returns null; a failure
/// inside the callee is returned as an error.
#[function]
pub fn tether_call_user_func(ctx: &mut Context, callback: Callback, args: Vec<Value>) -> Result<Value, NativeError> {
    match callback.call(ctx, &args) {
        Ok(value) => Ok(value),
        Err(err) if err.is_recoverable() => {
            ctx.warning("call_user_func", err.to_string());
            Ok(Value::Null)
        }
        Err(err) => Err(NativeError::failed(err.to_string())),
    }
}

/// Creates the var module.
pub fn module() -> NativeModule {
    NativeModule::new("var")
        .function(tether_core::decl!(tether_gettype))
        .function(tether_core::decl!(tether_is_null))
        .function(tether_core::decl!(tether_is_callable))
        .function(tether_core::decl!(tether_increment))
        .function(tether_core::decl!(tether_swap))
        .function(tether_core::decl!(tether_array_push))
        .function(tether_core::decl!(tether_unset))
        .function(tether_core::decl!(tether_call_user_func))
}
