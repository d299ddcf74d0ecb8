//! Call-site expressions.
//!
//! The guest interpreter owns the real expression tree; the binding layer
//! only needs to evaluate an argument (by value or by reference) and to emit
//! it as source. The implementations here cover what the layer itself
//! produces: literals, constant and variable references, and the marker for
//! an omitted optional argument.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::emit::{self, SourceWriter};
use crate::lane::coerce_bool;
use crate::value::{Value, Var};

/// An argument expression at a call site.
///
/// Emission methods write Rust source that evaluates the expression with a
/// `ctx: &mut Context` in scope.
pub trait Expr: fmt::Debug {
    fn eval(&self, ctx: &mut Context) -> Value;

    /// Evaluate to storage that the callee may write back into.
    fn eval_ref(&self, ctx: &mut Context) -> Var {
        Var::new(self.eval(ctx))
    }

    /// Whether this is the marker for an omitted optional argument.
    fn is_omitted(&self) -> bool {
        false
    }

    fn emit_value(&self, out: &mut SourceWriter);

    fn emit_ref(&self, out: &mut SourceWriter) {
        out.print("::tether_core::Var::new(");
        self.emit_value(out);
        out.print(")");
    }

    fn emit_long(&self, out: &mut SourceWriter) {
        out.print("(");
        self.emit_value(out);
        out.print(").to_long()");
    }

    fn emit_double(&self, out: &mut SourceWriter) {
        out.print("(");
        self.emit_value(out);
        out.print(").to_double()");
    }

    fn emit_bool(&self, out: &mut SourceWriter) {
        out.print("::tether_core::lane::coerce_bool(&");
        self.emit_value(out);
        out.print(")");
    }

    fn emit_string(&self, out: &mut SourceWriter) {
        out.print("(");
        self.emit_value(out);
        out.print(").to_string_value()");
    }
}

/// A default-value expression stored in a binding.
pub type DefaultExpr = Arc<dyn Expr + Send + Sync>;

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal(pub Value);

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Literal(value.into())
    }
}

impl Expr for Literal {
    fn eval(&self, _ctx: &mut Context) -> Value {
        self.0.clone()
    }

    fn emit_value(&self, out: &mut SourceWriter) {
        out.print(&emit::value_literal(&self.0));
    }

    // Literals fold their conversions at emission time.

    fn emit_long(&self, out: &mut SourceWriter) {
        out.print(&emit::long_literal(self.0.to_long()));
    }

    fn emit_double(&self, out: &mut SourceWriter) {
        out.print(&emit::double_literal(self.0.to_double()));
    }

    fn emit_bool(&self, out: &mut SourceWriter) {
        out.print(if coerce_bool(&self.0) { "true" } else { "false" });
    }

    fn emit_string(&self, out: &mut SourceWriter) {
        out.print(&format!("String::from({:?})", self.0.to_string_value()));
    }
}

/// A reference to a named constant, resolved through the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantRef {
    pub name: String,
}

impl ConstantRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Expr for ConstantRef {
    fn eval(&self, ctx: &mut Context) -> Value {
        ctx.constant(&self.name)
    }

    fn emit_value(&self, out: &mut SourceWriter) {
        out.print(&format!("ctx.constant({:?})", self.name));
    }
}

/// A local variable of the calling scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: String,
}

impl VarRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Expr for VarRef {
    fn eval(&self, ctx: &mut Context) -> Value {
        ctx.lookup_var(&self.name).map(Var::get).unwrap_or_default()
    }

    fn eval_ref(&self, ctx: &mut Context) -> Var {
        ctx.var(&self.name)
    }

    fn emit_value(&self, out: &mut SourceWriter) {
        out.print(&format!("ctx.var({:?}).get()", self.name));
    }

    fn emit_ref(&self, out: &mut SourceWriter) {
        out.print(&format!("ctx.var({:?})", self.name));
    }
}

/// Marker for an optional argument the caller did not pass.
///
/// Evaluates to [`Value::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Omitted;

impl Expr for Omitted {
    fn eval(&self, _ctx: &mut Context) -> Value {
        Value::Default
    }

    fn is_omitted(&self) -> bool {
        true
    }

    fn emit_value(&self, out: &mut SourceWriter) {
        out.print("::tether_core::Value::Default");
    }
}
