//! Tether: expose native Rust functions to a dynamically typed guest runtime.
//!
//! Native functions are declared with [`function`], collected into a
//! [`NativeModule`], registered in a [`ModuleRegistry`] and frozen into a
//! [`RegistrySnapshot`]. The guest runtime looks bindings up by name and
//! invokes them with call-site expressions or already evaluated values.
//!
//! ```ignore
//! use tether::prelude::*;
//!
//! #[function]
//! fn tether_greet(name: String, #[optional("\"world\"")] greeting: String) -> String {
//!     format!("{greeting}, {name}")
//! }
//!
//! let registry = ModuleRegistry::new();
//! registry.register_module("greet", NativeModule::new("greet").function(decl!(tether_greet)));
//! let snapshot = registry.freeze();
//!
//! let mut ctx = Context::new().with_resolver(snapshot.clone());
//! let greet = snapshot.find_function("greet").unwrap();
//! let value = ctx.call_values(&greet, &[Value::from("tether")])?;
//! ```

pub use tether_core::*;
pub use tether_macros::{NativeObject, function};
pub use tether_modules as modules;
pub use tether_registry::{
    ClassDescription, ConfigEntry, ConstantValue, ModuleInfo, ModuleRegistry, NativeClass, NativeModule,
    RegistryError, RegistryOptions, RegistrySnapshot,
};

/// Registry with every bundled module installed.
pub fn default_registry() -> Result<ModuleRegistry, RegistryError> {
    let registry = ModuleRegistry::new();
    tether_modules::install(&registry)?;
    log::debug!("installed bundled modules");
    Ok(registry)
}

pub mod prelude {
    pub use crate::{
        Callback, Context, Expr, FunctionBinding, ModuleRegistry, NativeClass, NativeError, NativeModule, NativeObject,
        ObjectRef, RegistrySnapshot, Value, Var, decl, function,
    };
}
