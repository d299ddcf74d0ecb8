//! Native module builder.
//!
//! A [`NativeModule`] bundles the declarations, constants, default
//! configuration and extension names one module contributes. It is built
//! once and handed to [`ModuleRegistry::register_module`](crate::ModuleRegistry::register_module).
//!
//! # Example
//!
//! ```ignore
//! use tether_core::decl;
//!
//! pub fn module() -> NativeModule {
//!     NativeModule::new("math")
//!         .function(decl!(tether_abs))
//!         .function(decl!(tether_max))
//!         .constant("M_PI", std::f64::consts::PI)
//!         .config("precision", 14_i64)
//! }
//! ```

use tether_core::{NativeMethodDecl, Value};

/// A constant declared by a module.
///
/// Only integer, float and string constants reach the guest; anything else
/// is carried as `Unsupported` and skipped at registration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Unsupported(&'static str),
}

impl ConstantValue {
    /// Marker for a constant of a type the guest cannot represent.
    pub fn unsupported<T>() -> Self {
        ConstantValue::Unsupported(std::any::type_name::<T>())
    }

    pub fn to_value(&self) -> Option<Value> {
        Some(match self {
            ConstantValue::I8(v) => Value::Long(i64::from(*v)),
            ConstantValue::I16(v) => Value::Long(i64::from(*v)),
            ConstantValue::I32(v) => Value::Long(i64::from(*v)),
            ConstantValue::I64(v) => Value::Long(*v),
            ConstantValue::F32(v) => Value::Double(f64::from(*v)),
            ConstantValue::F64(v) => Value::Double(*v),
            ConstantValue::Str(s) => Value::Str(s.clone()),
            ConstantValue::Unsupported(_) => return None,
        })
    }
}

macro_rules! impl_constant_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for ConstantValue {
                fn from(v: $ty) -> Self {
                    ConstantValue::$variant(v)
                }
            }
        )*
    };
}

impl_constant_from!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, f32 => F32, f64 => F64, String => Str);

impl From<&str> for ConstantValue {
    fn from(v: &str) -> Self {
        ConstantValue::Str(v.to_string())
    }
}

/// A default configuration entry (an ini-style setting) contributed by a module.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub name: String,
    pub default: Value,
    pub module: String,
}

/// The declarations of one native module.
#[derive(Debug, Clone)]
pub struct NativeModule {
    pub name: String,
    pub functions: Vec<NativeMethodDecl>,
    pub constants: Vec<(String, ConstantValue)>,
    pub config: Vec<(String, Value)>,
    pub extensions: Vec<String>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            constants: Vec::new(),
            config: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn function(mut self, decl: NativeMethodDecl) -> Self {
        self.functions.push(decl);
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<ConstantValue>) -> Self {
        self.constants.push((name.into(), value.into()));
        self
    }

    /// Declare a configuration setting with its default.
    pub fn config(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.config.push((name.into(), default.into()));
        self
    }

    /// Declare an extension name this module provides.
    pub fn extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.push(name.into());
        self
    }
}
