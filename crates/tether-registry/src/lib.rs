//! Registry of native modules and classes for tether.
//!
//! Modules and classes are registered once at startup into a
//! [`ModuleRegistry`], then frozen into a [`RegistrySnapshot`] that the guest
//! runtime reads at call time.

mod class;
mod module;
mod options;
mod registry;
mod snapshot;

pub use class::{ClassDescription, NativeClass};
pub use module::{ConfigEntry, ConstantValue, NativeModule};
pub use options::RegistryOptions;
pub use registry::{ModuleInfo, ModuleRegistry, RegistryError};
pub use snapshot::RegistrySnapshot;
