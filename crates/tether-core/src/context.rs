//! Execution context handed to every native call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::binding::FunctionBinding;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::BindingError;
use crate::expr::Expr;
use crate::value::{Value, Var};

/// Resolves function and constant names for callbacks and constant references.
///
/// Implemented by the frozen registry snapshot.
pub trait FunctionResolver: Send + Sync {
    fn resolve_function(&self, name: &str) -> Option<Arc<FunctionBinding>>;

    fn resolve_constant(&self, name: &str) -> Option<Value>;
}

/// Per-execution state: diagnostics, local variables, working directory and
/// name resolution.
pub struct Context {
    diagnostics: Diagnostics,
    locals: FxHashMap<String, Var>,
    cwd: PathBuf,
    resolver: Option<Arc<dyn FunctionResolver>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context rooted at the process working directory.
    pub fn new() -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            locals: FxHashMap::default(),
            cwd: std::env::current_dir().unwrap_or_default(),
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add_diagnostic(diagnostic);
    }

    /// Record a warning attributed to `function`.
    pub fn warning(&mut self, function: &str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{function}: {message}");
        self.report(Diagnostic::warning(message).in_function(function));
    }

    // ========================================================================
    // Locals
    // ========================================================================

    /// The storage for local `name`, created as `null` if absent.
    pub fn var(&mut self, name: &str) -> Var {
        self.locals.entry(name.to_string()).or_default().clone()
    }

    pub fn lookup_var(&self, name: &str) -> Option<&Var> {
        self.locals.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) {
        self.var(name).set(value);
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve a guest value naming a path against the working directory.
    pub fn lookup_path(&self, value: &Value) -> PathBuf {
        self.cwd.join(value.to_string_value())
    }

    pub fn resolve_function(&self, name: &str) -> Option<Arc<FunctionBinding>> {
        self.resolver.as_ref()?.resolve_function(name)
    }

    pub fn resolve_constant(&self, name: &str) -> Option<Value> {
        self.resolver.as_ref()?.resolve_constant(name)
    }

    /// Value of constant `name`; an undefined constant warns and reads as its own name.
    pub fn constant(&mut self, name: &str) -> Value {
        match self.resolve_constant(name) {
            Some(value) => value,
            None => {
                self.warning(name, format!("use of undefined constant {name}"));
                Value::Str(name.to_string())
            }
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Call `binding` with call-site expressions, applying the call-site policy:
    /// recoverable failures become a warning and a `null` result, anything
    /// else is returned as an error.
    pub fn call(&mut self, binding: &FunctionBinding, args: &[&dyn Expr]) -> Result<Value, BindingError> {
        let result = binding.invoke_exprs(self, args);
        self.recover(result)
    }

    /// [`Context::call`] with already evaluated values.
    pub fn call_values(&mut self, binding: &FunctionBinding, args: &[Value]) -> Result<Value, BindingError> {
        let result = binding.invoke_values(self, args);
        self.recover(result)
    }

    fn recover(&mut self, result: Result<Value, BindingError>) -> Result<Value, BindingError> {
        match result {
            Err(err) if err.is_recoverable() => {
                let function = err.function().to_string();
                self.warning(&function, err.to_string());
                Ok(Value::Null)
            }
            other => other,
        }
    }
}
