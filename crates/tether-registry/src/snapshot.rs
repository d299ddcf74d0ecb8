//! Frozen registry contents.

use std::any::TypeId;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tether_core::{FunctionBinding, FunctionResolver, ObjectRef, Value};

use crate::class::ClassDescription;
use crate::module::ConfigEntry;
use crate::registry::{ModuleInfo, RegistryState, lookup};

/// Immutable view of a [`ModuleRegistry`](crate::ModuleRegistry), read without locks.
#[derive(Debug)]
pub struct RegistrySnapshot {
    modules: FxHashMap<String, Arc<ModuleInfo>>,
    functions: FxHashMap<String, Arc<FunctionBinding>>,
    functions_lower: FxHashMap<String, Arc<FunctionBinding>>,
    classes: FxHashMap<String, Arc<ClassDescription>>,
    classes_lower: FxHashMap<String, Arc<ClassDescription>>,
    /// Class lookup for objects carried in guest values.
    classes_by_type: FxHashMap<TypeId, Arc<ClassDescription>>,
    constants: FxHashMap<String, Value>,
    config: FxHashMap<String, ConfigEntry>,
    extensions: FxHashSet<String>,
    case_insensitive: bool,
}

impl RegistrySnapshot {
    pub(crate) fn from_state(state: RegistryState, case_insensitive: bool) -> Self {
        let mut classes_by_type = FxHashMap::default();
        for class in state.classes.values() {
            classes_by_type
                .entry(class.class_key().type_id)
                .or_insert_with(|| Arc::clone(class));
        }

        Self {
            modules: state.modules,
            functions: state.functions,
            functions_lower: state.functions_lower,
            classes: state.classes,
            classes_lower: state.classes_lower,
            classes_by_type,
            constants: state.constants,
            config: state.config,
            extensions: state.extensions,
            case_insensitive,
        }
    }

    pub fn find_function(&self, name: &str) -> Option<Arc<FunctionBinding>> {
        lookup(&self.functions, &self.functions_lower, name, self.case_insensitive)
    }

    pub fn find_class(&self, name: &str) -> Option<Arc<ClassDescription>> {
        lookup(&self.classes, &self.classes_lower, name, self.case_insensitive)
    }

    /// The registered class of `object`, if any.
    pub fn class_of(&self, object: &ObjectRef) -> Option<Arc<ClassDescription>> {
        self.classes_by_type.get(&object.class().type_id).cloned()
    }

    pub fn find_constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    pub fn find_module(&self, name: &str) -> Option<Arc<ModuleInfo>> {
        self.modules.get(name).cloned()
    }

    pub fn default_config(&self, name: &str) -> Option<Value> {
        self.config.get(name).map(|entry| entry.default.clone())
    }

    pub fn is_extension_loaded(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Exposed function names, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Constants sorted by name.
    pub fn constants(&self) -> Vec<(&str, &Value)> {
        let mut constants: Vec<_> = self.constants.iter().map(|(k, v)| (k.as_str(), v)).collect();
        constants.sort_unstable_by(|a, b| a.0.cmp(b.0));
        constants
    }
}

impl FunctionResolver for RegistrySnapshot {
    fn resolve_function(&self, name: &str) -> Option<Arc<FunctionBinding>> {
        self.find_function(name)
    }

    fn resolve_constant(&self, name: &str) -> Option<Value> {
        self.find_constant(name)
    }
}

#[cfg(test)]
mod tests {
    use tether_core::{
        Callback, ConstantRef, Context, Expr, NativeArgs, NativeFn, NativeMethodDecl, NativeObject, NativeValue,
        ParamDecl,
    };

    use super::*;
    use crate::{ModuleRegistry, NativeClass, NativeModule};

    fn double() -> NativeMethodDecl {
        NativeMethodDecl::new(
            "tether_double",
            NativeFn::new(|_, args| {
                let mut args = NativeArgs::new(args);
                let n: i64 = args.next()?;
                Ok(NativeValue::I64(n * 2))
            }),
        )
        .param(ParamDecl::of::<i64>("n"))
        .returns::<i64>()
    }

    fn apply() -> NativeMethodDecl {
        NativeMethodDecl::new(
            "apply",
            NativeFn::new(|ctx, args| {
                let mut args = NativeArgs::new(args);
                let callback: Callback = args.next()?;
                let arg: Value = args.next()?;
                callback
                    .call(ctx, &[arg])
                    .map(NativeValue::Value)
                    .map_err(|err| tether_core::NativeError::failed(err.to_string()))
            }),
        )
        .param(ParamDecl::context())
        .param(ParamDecl::of::<Callback>("callback"))
        .param(ParamDecl::of::<Value>("arg"))
        .returns::<Value>()
    }

    fn registry() -> ModuleRegistry {
        let registry = ModuleRegistry::new();
        registry.register_module(
            "demo",
            NativeModule::new("demo")
                .function(double())
                .function(apply())
                .constant("DEMO_LIMIT", 3_i64)
                .config("demo.mode", "fast")
                .extension("demo"),
        );
        registry
    }

    #[test]
    fn snapshot_matches_registry() {
        let registry = registry();
        let snapshot = registry.freeze();

        assert_eq!(snapshot.function_names(), vec!["apply", "double"]);
        assert_eq!(snapshot.constants(), vec![("DEMO_LIMIT", &Value::Long(3))]);
        assert_eq!(snapshot.default_config("demo.mode"), Some(Value::from("fast")));
        assert!(snapshot.is_extension_loaded("demo"));
        assert!(!snapshot.is_extension_loaded("gd"));
        assert!(snapshot.find_function("DOUBLE").is_some());
        assert_eq!(snapshot.find_module("demo").unwrap().functions.len(), 2);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_registration() {
        let registry = registry();
        let snapshot = registry.freeze();
        registry.register_module("late", NativeModule::new("late").constant("LATE", 1_i64));

        assert!(snapshot.find_constant("LATE").is_none());
        assert!(registry.freeze().find_constant("LATE").is_some());
    }

    #[test]
    fn resolves_callbacks_and_constants() {
        let snapshot = registry().freeze();
        let mut ctx = Context::new().with_resolver(snapshot.clone());

        let apply = snapshot.find_function("apply").unwrap();
        let result = apply.invoke_values(&mut ctx, &[Value::from("double"), Value::Long(21)]);
        assert_eq!(result, Ok(Value::Long(42)));

        let limit = ConstantRef::new("DEMO_LIMIT");
        assert_eq!(limit.eval(&mut ctx), Value::Long(3));
        assert!(ctx.diagnostics().is_empty());
    }

    struct Token;

    impl NativeObject for Token {
        fn class_name() -> &'static str {
            "Token"
        }
    }

    #[test]
    fn class_of_object() {
        let registry = ModuleRegistry::new();
        registry.register_class("Token", NativeClass::new::<Token>()).unwrap();
        let snapshot = registry.freeze();

        let object = ObjectRef::new(Arc::new(Token));
        assert_eq!(snapshot.class_of(&object).unwrap().name(), "Token");
        assert!(snapshot.find_class("token").is_some());
    }
}
