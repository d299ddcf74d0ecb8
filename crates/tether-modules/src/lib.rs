//! Bundled native modules for tether.
//!
//! - **math** - arithmetic helpers and numeric constants
//! - **string** - string functions (strlen, strpos, implode, ...)
//! - **var** - variable handling, by-reference helpers and callbacks
//! - **counter** - the `Counter` native class
//!
//! # Usage
//!
//! Each module provides a function that returns a `NativeModule` which can be
//! registered into a `ModuleRegistry`:
//!
//! ```ignore
//! use tether_modules::{math, string};
//!
//! let registry = ModuleRegistry::new();
//! registry.register_module("math", math::module());
//! registry.register_module("string", string::module());
//! ```

use tether_registry::{ModuleRegistry, RegistryError};

pub mod counter;
pub mod math;
pub mod string;
pub mod var;

pub use counter::Counter;

/// Register every bundled module and class.
pub fn install(registry: &ModuleRegistry) -> Result<(), RegistryError> {
    registry.register_module("math", math::module());
    registry.register_module("string", string::module());
    registry.register_module("var", var::module());
    registry.register_module("counter", counter::module());
    registry.register_class("Counter", counter::class())?;
    Ok(())
}
