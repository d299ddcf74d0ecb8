//! The `Counter` native class.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tether_macros::{NativeObject, function};
use tether_registry::{NativeClass, NativeModule};

/// A shared integer counter.
#[derive(Debug, Default, NativeObject)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    pub fn new(start: i64) -> Self {
        Self {
            count: AtomicI64::new(start),
        }
    }

    pub fn value(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Create a counter starting at `start`.
#[function]
pub fn tether_counter_new(#[optional("0")] start: i64) -> Arc<Counter> {
    Arc::new(Counter::new(start))
}

#[function(name = "increment")]
pub fn counter_increment(this: Arc<Counter>, #[optional("1")] by: i64) -> i64 {
    this.count.fetch_add(by, Ordering::SeqCst).wrapping_add(by)
}

#[function(name = "get")]
pub fn counter_get(this: Arc<Counter>) -> i64 {
    this.value()
}

#[function(name = "reset")]
pub fn counter_reset(this: Arc<Counter>) {
    this.count.store(0, Ordering::SeqCst);
}

/// Module holding the constructor function.
pub fn module() -> NativeModule {
    NativeModule::new("counter").function(tether_core::decl!(tether_counter_new))
}

/// The `Counter` class and its methods.
pub fn class() -> NativeClass {
    NativeClass::new::<Counter>()
        .method(tether_core::decl!(counter_increment))
        .method(tether_core::decl!(counter_get))
        .method(tether_core::decl!(counter_reset))
        .constant("START", 0_i64)
}
