//! Native classes.
//!
//! A [`NativeClass`] is the declaration side (a Rust type plus its method
//! declarations); registering it produces a [`ClassDescription`] holding the
//! bound methods. Methods take the receiver as their first parameter, typed
//! `Arc<T>`.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tether_core::{
    BindingError, ClassKey, Context, DeclaredOn, FunctionBinding, NativeMethodDecl, NativeObject, ObjectRef,
    RegistrationError, Value,
};

use crate::module::ConstantValue;
use crate::options::RegistryOptions;

/// Declaration of a native class.
#[derive(Debug, Clone)]
pub struct NativeClass {
    pub key: ClassKey,
    pub methods: Vec<NativeMethodDecl>,
    pub constants: Vec<(String, ConstantValue)>,
}

impl NativeClass {
    pub fn new<T: NativeObject>() -> Self {
        Self {
            key: ClassKey::of::<T>(),
            methods: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn method(mut self, decl: NativeMethodDecl) -> Self {
        self.methods.push(decl);
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<ConstantValue>) -> Self {
        self.constants.push((name.into(), value.into()));
        self
    }
}

/// A registered class and its bound methods.
#[derive(Debug)]
pub struct ClassDescription {
    name: String,
    key: ClassKey,
    methods: FxHashMap<String, Arc<FunctionBinding>>,
    methods_lower: FxHashMap<String, Arc<FunctionBinding>>,
    constants: FxHashMap<String, Value>,
    case_insensitive: bool,
    rejected: Vec<RegistrationError>,
}

impl ClassDescription {
    pub(crate) fn build(name: &str, class: NativeClass, options: &RegistryOptions) -> Self {
        let mut methods = FxHashMap::default();
        let mut methods_lower = FxHashMap::default();
        let mut rejected = Vec::new();

        for decl in class.methods {
            if decl.declared_on != DeclaredOn::Module {
                continue;
            }
            let exposed = options.exposed_name(decl.guest_name()).to_string();
            if methods.contains_key(&exposed) {
                log::debug!("{name}::{exposed} already bound, keeping the first declaration");
                continue;
            }
            match FunctionBinding::introspect(format!("{name}::{exposed}"), decl) {
                Ok(binding) => {
                    let binding = Arc::new(binding);
                    methods_lower
                        .entry(exposed.to_lowercase())
                        .or_insert_with(|| Arc::clone(&binding));
                    methods.insert(exposed, binding);
                }
                Err(err) => rejected.push(err),
            }
        }

        let mut constants = FxHashMap::default();
        for (constant, value) in class.constants {
            match value.to_value() {
                Some(value) => {
                    constants.entry(constant).or_insert(value);
                }
                None => log::debug!("skipping constant {name}::{constant} of unsupported type"),
            }
        }

        Self {
            name: name.to_string(),
            key: class.key,
            methods,
            methods_lower,
            constants,
            case_insensitive: options.case_insensitive,
            rejected,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_key(&self) -> ClassKey {
        self.key
    }

    /// Look a method up by exact name, then lower-cased.
    pub fn find_method(&self, name: &str) -> Option<Arc<FunctionBinding>> {
        if let Some(binding) = self.methods.get(name) {
            return Some(Arc::clone(binding));
        }
        if !self.case_insensitive {
            return None;
        }
        self.methods_lower.get(&name.to_lowercase()).cloned()
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call method `name` on `this` with already evaluated arguments.
    ///
    /// The receiver is passed as the first argument. Errors are returned
    /// unchanged; apply the call-site policy with [`Context::call_values`]
    /// on the binding from [`find_method`](Self::find_method) instead.
    pub fn call_method(
        &self,
        ctx: &mut Context,
        name: &str,
        this: &ObjectRef,
        args: &[Value],
    ) -> Result<Value, BindingError> {
        let binding = self.find_method(name).ok_or_else(|| BindingError::UnknownFunction {
            name: format!("{}::{name}", self.name),
        })?;

        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Value::Object(this.clone()));
        full.extend_from_slice(args);
        binding.invoke_values(ctx, &full)
    }

    pub fn is_instance(&self, object: &ObjectRef) -> bool {
        object.class() == self.key
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Method declarations that could not be bound.
    pub fn rejected(&self) -> &[RegistrationError] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use tether_core::{FailureMode, NativeArgs, NativeFn, NativeValue, ParamDecl};

    use super::*;

    #[derive(Default)]
    struct Counter {
        count: AtomicI64,
    }

    impl NativeObject for Counter {
        fn class_name() -> &'static str {
            "Counter"
        }
    }

    fn increment() -> NativeMethodDecl {
        NativeMethodDecl::new(
            "increment",
            NativeFn::new(|_, args| {
                let mut args = NativeArgs::new(args);
                let this: Arc<Counter> = args.next()?;
                let by: i64 = args.next()?;
                Ok(NativeValue::I64(this.count.fetch_add(by, Ordering::SeqCst) + by))
            }),
        )
        .param(ParamDecl::of::<Arc<Counter>>("this"))
        .param(ParamDecl::of::<i64>("by").default_text("1"))
        .returns::<i64>()
    }

    fn counter_class() -> NativeClass {
        NativeClass::new::<Counter>()
            .method(increment().exposed_as("incrementBy"))
            .method(
                NativeMethodDecl::new("hidden", NativeFn::new(|_, _| Ok(NativeValue::Void)))
                    .declared_on(DeclaredOn::UniversalBase),
            )
            .method(
                NativeMethodDecl::new("risky", NativeFn::new(|_, _| Ok(NativeValue::Void)))
                    .failure(FailureMode::Checked("std::io::Error")),
            )
            .constant("START", 0_i64)
            .constant("RAW", ConstantValue::unsupported::<Vec<u8>>())
    }

    #[test]
    fn build_binds_exposed_methods() {
        let class = ClassDescription::build("Counter", counter_class(), &RegistryOptions::default());
        assert_eq!(class.name(), "Counter");
        assert_eq!(class.method_names(), vec!["incrementBy"]);
        assert_eq!(class.rejected().len(), 1);
        assert_eq!(class.constant("START"), Some(&Value::Long(0)));
        assert!(class.constant("RAW").is_none());
    }

    #[test]
    fn find_method_falls_back_to_lowercase() {
        let class = ClassDescription::build("Counter", counter_class(), &RegistryOptions::default());
        assert!(class.find_method("incrementBy").is_some());
        assert!(class.find_method("incrementby").is_some());
        assert!(class.find_method("INCREMENTBY").is_some());
        assert!(class.find_method("hidden").is_none());

        let strict = RegistryOptions::default().case_insensitive(false);
        let class = ClassDescription::build("Counter", counter_class(), &strict);
        assert!(class.find_method("incrementby").is_none());
    }

    #[test]
    fn call_method_passes_receiver() {
        let class = ClassDescription::build("Counter", counter_class(), &RegistryOptions::default());
        let counter = Arc::new(Counter::default());
        let this = ObjectRef::new(Arc::clone(&counter));
        let mut ctx = Context::new();

        assert!(class.is_instance(&this));
        assert_eq!(
            class.call_method(&mut ctx, "incrementBy", &this, &[Value::Long(4)]),
            Ok(Value::Long(4))
        );
        assert_eq!(class.call_method(&mut ctx, "incrementBy", &this, &[]), Ok(Value::Long(5)));
        assert_eq!(counter.count.load(Ordering::SeqCst), 5);

        let err = class.call_method(&mut ctx, "missing", &this, &[]).unwrap_err();
        assert!(err.is_recoverable());
    }
}
