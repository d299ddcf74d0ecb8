//! The lane table: how each native type crosses the guest boundary.
//!
//! A [`Lane`] is chosen once per parameter and return type when a binding
//! is built. It converts guest values into native form for the call, maps
//! native results back, and renders the same conversions as source for the
//! emitted path.
//!
//! Numeric lanes never fail: strings read their leading numeric prefix,
//! narrowing truncates to the lane width, and a native `None` maps to the
//! lane's zero.

use crate::context::Context;
use crate::emit::{SourceWriter, double_literal};
use crate::error::{CoercionError, Direction};
use crate::expr::Expr;
use crate::native::{Callback, NativeKind, NativeType, NativeValue};
use crate::object::ClassKey;
use crate::value::{Value, Var};

/// Coercion lane for one native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
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
    /// Dynamic `Value`, passed through unchanged.
    Value,
    /// By-reference `Var`.
    Reference,
    Void,
    Object(ClassKey),
}

/// Coarse classification used to pick a cheaper evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneClass {
    Boolean,
    String,
    Long,
    Double,
    Other,
}

/// Boolean coercion of a guest value.
///
/// A string is false exactly when its trimmed text is `false` or `off`
/// (case-insensitive); everything else follows guest truthiness.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Str(s) => {
            let s = s.trim();
            !(s.eq_ignore_ascii_case("false") || s.eq_ignore_ascii_case("off"))
        }
        other => other.to_bool(),
    }
}

impl Lane {
    /// Select the lane for a native type.
    ///
    /// Returns `None` for kinds that have no lane in an ordinary position
    /// (context and variadic sequences).
    pub fn for_type(ty: NativeType) -> Option<Lane> {
        let lane = match ty.kind {
            NativeKind::Str => Lane::Str,
            NativeKind::Bool => Lane::Bool,
            NativeKind::I8 => Lane::I8,
            NativeKind::I16 => Lane::I16,
            NativeKind::I32 => Lane::I32,
            NativeKind::I64 => Lane::I64,
            NativeKind::F32 => Lane::F32,
            NativeKind::F64 => Lane::F64,
            NativeKind::Char => Lane::Char,
            NativeKind::Path => Lane::Path,
            NativeKind::Callback => Lane::Callback,
            NativeKind::Value => Lane::Value,
            NativeKind::Var => Lane::Reference,
            NativeKind::Void => Lane::Void,
            NativeKind::Object(key) => Lane::Object(key),
            NativeKind::Context | NativeKind::ValueSeq | NativeKind::VarSeq => return None,
        };
        Some(lane)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Lane::Str => "string",
            Lane::Bool => "boolean",
            Lane::I8 => "i8",
            Lane::I16 => "i16",
            Lane::I32 => "i32",
            Lane::I64 => "i64",
            Lane::F32 => "f32",
            Lane::F64 => "f64",
            Lane::Char => "char",
            Lane::Path => "path",
            Lane::Callback => "callback",
            Lane::Value => "value",
            Lane::Reference => "reference",
            Lane::Void => "void",
            Lane::Object(key) => key.name,
        }
    }

    pub fn classify(&self) -> LaneClass {
        match self {
            Lane::Bool => LaneClass::Boolean,
            Lane::Str => LaneClass::String,
            Lane::I8 | Lane::I16 | Lane::I32 | Lane::I64 => LaneClass::Long,
            Lane::F32 | Lane::F64 => LaneClass::Double,
            _ => LaneClass::Other,
        }
    }

    /// Whether the callee cannot observe or mutate the caller's storage.
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Lane::Value | Lane::Reference)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Lane::Reference)
    }

    // ========================================================================
    // Guest -> native
    // ========================================================================

    /// Convert a guest value for a parameter of this lane.
    ///
    /// `nullable` is the `Option<T>` form: guest `null` becomes the null
    /// surrogate instead of the lane's zero. Callback and object lanes
    /// always yield the null surrogate for `null`; the caller decides
    /// whether that is acceptable.
    pub fn to_native(&self, ctx: &Context, value: Value, nullable: bool) -> Result<NativeValue, CoercionError> {
        if nullable && value.is_null() {
            return Ok(NativeValue::Null);
        }

        let native = match self {
            Lane::Str => NativeValue::Str(value.to_string_value()),
            Lane::Bool => NativeValue::Bool(coerce_bool(&value)),
            Lane::I8 => NativeValue::I8(value.to_long() as i8),
            Lane::I16 => NativeValue::I16(value.to_long() as i16),
            Lane::I32 => NativeValue::I32(value.to_long() as i32),
            Lane::I64 => NativeValue::I64(value.to_long()),
            Lane::F32 => NativeValue::F32(value.to_double() as f32),
            Lane::F64 => NativeValue::F64(value.to_double()),
            Lane::Char => NativeValue::Char(value.to_char()),
            Lane::Path => NativeValue::Path(ctx.lookup_path(&value)),
            Lane::Callback => match Callback::from_value(&value) {
                Some(cb) => NativeValue::Callback(cb),
                None => NativeValue::Null,
            },
            Lane::Value => NativeValue::Value(value),
            Lane::Reference => NativeValue::Var(Var::new(value)),
            Lane::Void => {
                return Err(CoercionError::Unsupported {
                    lane: self.name(),
                    direction: Direction::ToNative,
                });
            }
            Lane::Object(key) => match value {
                Value::Object(obj) if obj.class() == *key => NativeValue::Object(obj),
                Value::Null | Value::Default => NativeValue::Null,
                other => {
                    return Err(CoercionError::UnexpectedArgument {
                        value: other.to_string(),
                        actual: other.type_name(),
                        expected: key.name.to_string(),
                    });
                }
            },
        };
        Ok(native)
    }

    // ========================================================================
    // Native -> guest
    // ========================================================================

    /// Map a native return value back to a guest value.
    pub fn to_guest(&self, native: NativeValue) -> Result<Value, CoercionError> {
        let value = match (self, native) {
            (Lane::Void, _) => Value::Null,

            (Lane::Str, NativeValue::Str(s)) => Value::Str(s),
            (Lane::Str, NativeValue::Null) => Value::Null,

            (Lane::Bool, NativeValue::Bool(b)) => Value::Bool(b),
            (Lane::Bool, NativeValue::Null) => Value::Bool(false),

            (Lane::I8, NativeValue::I8(v)) => Value::Long(i64::from(v)),
            (Lane::I16, NativeValue::I16(v)) => Value::Long(i64::from(v)),
            (Lane::I32, NativeValue::I32(v)) => Value::Long(i64::from(v)),
            (Lane::I64, NativeValue::I64(v)) => Value::Long(v),
            (Lane::I8 | Lane::I16 | Lane::I32 | Lane::I64, NativeValue::Null) => Value::Long(0),

            (Lane::F32, NativeValue::F32(v)) => Value::Double(f64::from(v)),
            (Lane::F64, NativeValue::F64(v)) => Value::Double(v),
            (Lane::F32 | Lane::F64, NativeValue::Null) => Value::Double(0.0),

            (Lane::Char, NativeValue::Char(c)) => Value::Str(c.to_string()),
            (Lane::Char, NativeValue::Null) => Value::Null,

            (Lane::Path, NativeValue::Path(p)) => Value::Str(p.display().to_string()),
            (Lane::Path, NativeValue::Null) => Value::Null,

            (Lane::Value, NativeValue::Value(v)) => v,
            (Lane::Value, NativeValue::Null) => Value::Null,

            (Lane::Object(key), NativeValue::Object(obj)) if obj.class() == *key => Value::Object(obj),
            (Lane::Object(_), NativeValue::Null) => Value::Null,

            (Lane::Callback | Lane::Reference, _) => {
                return Err(CoercionError::Unsupported {
                    lane: self.name(),
                    direction: Direction::ToGuest,
                });
            }

            (lane, other) => {
                return Err(CoercionError::TypeMismatch {
                    expected: lane.name(),
                    actual: other.kind_name(),
                });
            }
        };
        Ok(value)
    }

    // ========================================================================
    // Source emission
    // ========================================================================

    /// Emit source converting `expr` into this lane's native argument.
    ///
    /// Returns `false` for lanes that need the generic coercion routine
    /// (callbacks and objects); nothing is written in that case.
    pub fn emit_arg(&self, expr: &dyn Expr, nullable: bool, out: &mut SourceWriter) -> bool {
        if self.is_reference() {
            expr.emit_ref(out);
            return true;
        }
        if matches!(self, Lane::Callback | Lane::Object(_) | Lane::Void) {
            return false;
        }

        if nullable {
            out.print("::tether_core::emit::rt::nullable(");
            expr.emit_value(out);
            out.print(", |v| ");
            self.emit_conversion(&crate::expr::VarRef::new("v"), "v", out);
            out.print(")");
            return true;
        }

        self.emit_conversion(expr, "", out);
        true
    }

    // `bound` names a closure parameter already holding the value; when set
    // the expression is read from it rather than re-emitted.
    fn emit_conversion(&self, expr: &dyn Expr, bound: &str, out: &mut SourceWriter) {
        let value = |out: &mut SourceWriter| {
            if bound.is_empty() {
                expr.emit_value(out);
            } else {
                out.print(bound);
            }
        };

        match self.classify() {
            LaneClass::Long if bound.is_empty() => {
                if *self == Lane::I64 {
                    expr.emit_long(out);
                } else {
                    out.print("(");
                    expr.emit_long(out);
                    out.print(&format!(") as {}", self.name()));
                }
                return;
            }
            LaneClass::Double if bound.is_empty() => {
                if *self == Lane::F64 {
                    expr.emit_double(out);
                } else {
                    out.print("(");
                    expr.emit_double(out);
                    out.print(") as f32");
                }
                return;
            }
            LaneClass::Boolean if bound.is_empty() => {
                expr.emit_bool(out);
                return;
            }
            LaneClass::String if bound.is_empty() => {
                expr.emit_string(out);
                return;
            }
            _ => {}
        }

        match self {
            Lane::I8 | Lane::I16 | Lane::I32 => {
                value(out);
                out.print(&format!(".to_long() as {}", self.name()));
            }
            Lane::I64 => {
                value(out);
                out.print(".to_long()");
            }
            Lane::F32 => {
                value(out);
                out.print(".to_double() as f32");
            }
            Lane::F64 => {
                value(out);
                out.print(".to_double()");
            }
            Lane::Bool => {
                out.print("::tether_core::lane::coerce_bool(&");
                value(out);
                out.print(")");
            }
            Lane::Str => {
                value(out);
                out.print(".to_string_value()");
            }
            Lane::Char => {
                value(out);
                out.print(".to_char()");
            }
            Lane::Path => {
                out.print("{ let __p = ");
                value(out);
                out.print("; ctx.lookup_path(&__p) }");
            }
            Lane::Value => value(out),
            Lane::Reference | Lane::Callback | Lane::Void | Lane::Object(_) => {}
        }
    }

    /// Source mapping the native expression `call` back to a guest value.
    pub fn emit_result(&self, call: &str, nullable: bool, null_as_false: bool) -> Result<String, CoercionError> {
        const V: &str = "::tether_core::Value";

        let null = if null_as_false {
            format!("{V}::Bool(false)")
        } else {
            match self.classify() {
                LaneClass::Boolean => format!("{V}::Bool(false)"),
                LaneClass::Long => format!("{V}::Long(0)"),
                LaneClass::Double => format!("{V}::Double({})", double_literal(0.0)),
                _ => format!("{V}::Null"),
            }
        };

        let wrap = |arg: &str| -> Option<String> {
            Some(match self {
                Lane::Str => format!("{V}::Str({arg})"),
                Lane::Bool => format!("{V}::Bool({arg})"),
                Lane::I8 | Lane::I16 | Lane::I32 => format!("{V}::Long(i64::from({arg}))"),
                Lane::I64 => format!("{V}::Long({arg})"),
                Lane::F32 => format!("{V}::Double(f64::from({arg}))"),
                Lane::F64 => format!("{V}::Double({arg})"),
                Lane::Char => format!("{V}::Str({arg}.to_string())"),
                Lane::Path => format!("{V}::Str({arg}.display().to_string())"),
                Lane::Object(_) => format!("{V}::Object(::tether_core::ObjectRef::new({arg}))"),
                Lane::Value => arg.to_string(),
                Lane::Void | Lane::Callback | Lane::Reference => return None,
            })
        };

        match self {
            Lane::Void => Ok(format!("{{ {call}; {V}::Null }}")),
            Lane::Callback | Lane::Reference => Err(CoercionError::Unsupported {
                lane: self.name(),
                direction: Direction::ToGuest,
            }),
            Lane::Value if nullable => Ok(format!("({call}).unwrap_or_default()")),
            _ if nullable => {
                let mapped = wrap("__r").unwrap_or_default();
                Ok(format!("({call}).map_or({null}, |__r| {mapped})"))
            }
            _ => Ok(wrap(&format!("({call})")).unwrap_or_default()),
        }
    }
}
