//! ModuleRegistry - startup-time registry of native modules and classes.
//!
//! This module provides [`ModuleRegistry`], where native modules and classes
//! are introspected into bindings, and [`RegistrySnapshot`](crate::RegistrySnapshot),
//! the frozen form the guest runtime reads at call time.
//!
//! # Storage Model
//!
//! - **Functions**: bindings stored by exposed name, plus a lower-cased index
//!   consulted when the exact lookup misses.
//! - **Classes**: descriptions stored by class name, with the same lower-cased index.
//! - **Constants / configuration**: flat maps by name; case-sensitive.
//! - **Modules**: one [`ModuleInfo`] per registered module name, which makes
//!   registration idempotent.
//!
//! # Thread Safety
//!
//! State sits behind a `parking_lot::RwLock`: registration takes the write
//! lock, the `find_*` lookups share the read lock. Lookups on the registry
//! still wait while a registration is in progress, so the call path reads a
//! [`RegistrySnapshot`](crate::RegistrySnapshot) from
//! [`ModuleRegistry::freeze`], which needs no lock at all.
//!
//! # Example
//!
//! ```ignore
//! let registry = ModuleRegistry::new();
//! registry.register_module("math", tether_modules::math::module());
//!
//! let snapshot = registry.freeze();
//! let abs = snapshot.find_function("abs").unwrap();
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tether_core::{DeclaredOn, FunctionBinding, RegistrationError, Value};
use thiserror::Error;

use crate::class::{ClassDescription, NativeClass};
use crate::module::{ConfigEntry, NativeModule};
use crate::options::RegistryOptions;
use crate::snapshot::RegistrySnapshot;

/// Errors raised by the registry itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A class name is already taken by a different Rust type.
    #[error("class '{name}' is already registered for {registered}, cannot register {requested}")]
    ClassConflict {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },
}

/// What a module contributed once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    pub name: String,
    /// Exposed names of the functions this module bound.
    pub functions: Vec<String>,
    pub constants: Vec<String>,
    pub extensions: Vec<String>,
    /// Declarations that could not be bound.
    pub rejected: Vec<RegistrationError>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct RegistryState {
    // === Modules ===
    pub(crate) modules: FxHashMap<String, Arc<ModuleInfo>>,

    // === Functions ===
    pub(crate) functions: FxHashMap<String, Arc<FunctionBinding>>,
    /// Lower-cased name -> first binding registered under it.
    pub(crate) functions_lower: FxHashMap<String, Arc<FunctionBinding>>,

    // === Classes ===
    pub(crate) classes: FxHashMap<String, Arc<ClassDescription>>,
    pub(crate) classes_lower: FxHashMap<String, Arc<ClassDescription>>,

    // === Constants and configuration ===
    pub(crate) constants: FxHashMap<String, Value>,
    pub(crate) config: FxHashMap<String, ConfigEntry>,
    pub(crate) extensions: FxHashSet<String>,
}

/// Registry of native modules and classes.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    options: RegistryOptions,
    state: RwLock<RegistryState>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            state: RwLock::default(),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a module under `name`.
    ///
    /// Registering the same name again returns the first registration
    /// unchanged. Declarations inherited from a base are skipped; rejected
    /// declarations are logged and listed in [`ModuleInfo::rejected`].
    pub fn register_module(&self, name: &str, module: NativeModule) -> Arc<ModuleInfo> {
        let mut state = self.state.write();
        if let Some(existing) = state.modules.get(name) {
            log::debug!("module '{name}' already registered");
            return Arc::clone(existing);
        }

        let mut info = ModuleInfo {
            name: name.to_string(),
            functions: Vec::new(),
            constants: Vec::new(),
            extensions: Vec::new(),
            rejected: Vec::new(),
        };

        for decl in module.functions {
            if decl.declared_on != DeclaredOn::Module {
                continue;
            }
            let exposed = self.options.exposed_name(decl.guest_name()).to_string();
            if state.functions.contains_key(&exposed) {
                log::debug!("function '{exposed}' already registered, skipping duplicate from '{name}'");
                continue;
            }

            match FunctionBinding::introspect(exposed.clone(), decl) {
                Ok(binding) => {
                    let binding = Arc::new(binding);
                    state
                        .functions_lower
                        .entry(exposed.to_lowercase())
                        .or_insert_with(|| Arc::clone(&binding));
                    state.functions.insert(exposed.clone(), binding);
                    info.functions.push(exposed);
                }
                Err(err) => info.rejected.push(err),
            }
        }

        for (constant, value) in module.constants {
            let Some(value) = value.to_value() else {
                log::debug!("skipping constant '{constant}' of unsupported type in '{name}'");
                continue;
            };
            if state.constants.contains_key(&constant) {
                log::debug!("constant '{constant}' already defined, skipping duplicate from '{name}'");
                continue;
            }
            state.constants.insert(constant.clone(), value);
            info.constants.push(constant);
        }

        for (setting, default) in module.config {
            state.config.entry(setting.clone()).or_insert_with(|| ConfigEntry {
                name: setting,
                default,
                module: name.to_string(),
            });
        }

        for extension in module.extensions {
            state.extensions.insert(extension.clone());
            info.extensions.push(extension);
        }

        log::debug!(
            "registered module '{name}': {} functions, {} constants, {} rejected",
            info.functions.len(),
            info.constants.len(),
            info.rejected.len()
        );

        let info = Arc::new(info);
        state.modules.insert(name.to_string(), Arc::clone(&info));
        info
    }

    /// Register a class under `name`.
    ///
    /// Idempotent for the same Rust type; a different type under a taken
    /// name is an error.
    pub fn register_class(&self, name: &str, class: NativeClass) -> Result<Arc<ClassDescription>, RegistryError> {
        let mut state = self.state.write();
        if let Some(existing) = state.classes.get(name) {
            if existing.class_key() != class.key {
                return Err(RegistryError::ClassConflict {
                    name: name.to_string(),
                    registered: existing.class_key().name,
                    requested: class.key.name,
                });
            }
            log::debug!("class '{name}' already registered");
            return Ok(Arc::clone(existing));
        }

        let description = Arc::new(ClassDescription::build(name, class, &self.options));
        state
            .classes_lower
            .entry(name.to_lowercase())
            .or_insert_with(|| Arc::clone(&description));
        state.classes.insert(name.to_string(), Arc::clone(&description));

        log::debug!(
            "registered class '{name}': {} methods",
            description.method_names().len()
        );
        Ok(description)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn find_function(&self, name: &str) -> Option<Arc<FunctionBinding>> {
        let state = self.state.read();
        lookup(&state.functions, &state.functions_lower, name, self.options.case_insensitive)
    }

    pub fn find_class(&self, name: &str) -> Option<Arc<ClassDescription>> {
        let state = self.state.read();
        lookup(&state.classes, &state.classes_lower, name, self.options.case_insensitive)
    }

    pub fn find_constant(&self, name: &str) -> Option<Value> {
        self.state.read().constants.get(name).cloned()
    }

    pub fn find_module(&self, name: &str) -> Option<Arc<ModuleInfo>> {
        self.state.read().modules.get(name).cloned()
    }

    /// Default value of configuration setting `name`.
    pub fn default_config(&self, name: &str) -> Option<Value> {
        self.state.read().config.get(name).map(|entry| entry.default.clone())
    }

    /// All configuration entries, sorted by name.
    pub fn config_entries(&self) -> Vec<ConfigEntry> {
        let state = self.state.read();
        let mut entries: Vec<_> = state.config.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Freeze the current contents into an immutable snapshot.
    pub fn freeze(&self) -> Arc<RegistrySnapshot> {
        let state = self.state.read().clone();
        Arc::new(RegistrySnapshot::from_state(state, self.options.case_insensitive))
    }
}

/// Exact lookup, then the lower-cased index.
pub(crate) fn lookup<T>(
    exact: &FxHashMap<String, Arc<T>>,
    lower: &FxHashMap<String, Arc<T>>,
    name: &str,
    case_insensitive: bool,
) -> Option<Arc<T>> {
    if let Some(found) = exact.get(name) {
        return Some(Arc::clone(found));
    }
    if !case_insensitive {
        return None;
    }
    lower.get(&name.to_lowercase()).cloned()
}
