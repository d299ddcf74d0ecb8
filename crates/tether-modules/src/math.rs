//! Math module providing arithmetic helpers and numeric constants.

use tether_core::{NativeError, Value};
use tether_macros::function;
use tether_registry::NativeModule;

// =============================================================================
// ARITHMETIC
// =============================================================================

/// Sum of two integers; `b` defaults to 5.
#[function]
pub fn tether_add(a: i32, #[optional("5")] b: i32) -> i32 {
    a.wrapping_add(b)
}

/// Absolute value, keeping integers integral.
#[function]
pub fn tether_abs(number: Value) -> Value {
    match number {
        Value::Long(n) => Value::Long(n.wrapping_abs()),
        Value::Double(d) => Value::Double(d.abs()),
        other => {
            let d = other.to_double();
            if d.fract() == 0.0 && d.abs() < i64::MAX as f64 {
                Value::Long((d as i64).wrapping_abs())
            } else {
                Value::Double(d.abs())
            }
        }
    }
}

/// Largest of the arguments, compared numerically.
#[function]
pub fn tether_max(first: Value, rest: Vec<Value>) -> Value {
    let mut best = first;
    for value in rest {
        if value.to_double() > best.to_double() {
            best = value;
        }
    }
    best
}

/// Integer division.
#[function]
pub fn tether_intdiv(dividend: i64, divisor: i64) -> Result<i64, NativeError> {
    if divisor == 0 {
        return Err(NativeError::failed("Division by zero"));
    }
    dividend
        .checked_div(divisor)
        .ok_or_else(|| NativeError::failed("Division of the minimum integer by -1"))
}

/// Round to `precision` decimal digits (negative rounds left of the point).
#[function]
pub fn tether_round(value: f64, #[optional("0")] precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    if !factor.is_finite() || factor == 0.0 {
        return value;
    }
    (value * factor).round() / factor
}

#[function]
pub fn tether_is_nan(value: f64) -> bool {
    value.is_nan()
}

// =============================================================================
// MODULE
// =============================================================================

/// Creates the math module.
pub fn module() -> NativeModule {
    NativeModule::new("math")
        .function(tether_core::decl!(tether_add))
        .function(tether_core::decl!(tether_abs))
        .function(tether_core::decl!(tether_max))
        .function(tether_core::decl!(tether_intdiv))
        .function(tether_core::decl!(tether_round))
        .function(tether_core::decl!(tether_is_nan))
        .constant("M_PI", std::f64::consts::PI)
        .constant("M_E", std::f64::consts::E)
        .constant("INT_MAX", i64::MAX)
        .constant("INT_SIZE", 8_i32)
        .config("precision", 14_i64)
        .extension("math")
}
