//! Native objects carried inside guest values.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A Rust type that can be handed to the guest as an object.
///
/// Usually implemented with `#[derive(NativeObject)]`.
pub trait NativeObject: Any + Send + Sync {
    /// Name the guest sees for this class.
    fn class_name() -> &'static str;
}

/// Identity of a native class: its `TypeId` plus guest-visible name.
///
/// Assignability is exact `TypeId` equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassKey {
    pub type_id: TypeId,
    pub name: &'static str,
}

impl ClassKey {
    pub fn of<T: NativeObject>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::class_name(),
        }
    }
}

/// Shared handle to a native object.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<dyn Any + Send + Sync>,
    class: ClassKey,
}

impl ObjectRef {
    pub fn new<T: NativeObject>(object: Arc<T>) -> Self {
        Self {
            inner: object,
            class: ClassKey::of::<T>(),
        }
    }

    pub fn class(&self) -> ClassKey {
        self.class
    }

    pub fn class_name(&self) -> &'static str {
        self.class.name
    }

    /// Returns the object if it is exactly a `T`.
    pub fn downcast<T: NativeObject>(&self) -> Option<Arc<T>> {
        if self.class.type_id != TypeId::of::<T>() {
            return None;
        }
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.class.name)
    }
}
