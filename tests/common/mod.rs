//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use tether::{Context, ModuleRegistry, RegistrySnapshot};

static INIT: Once = Once::new();

/// Install `env_logger` once; honours `RUST_LOG`.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Snapshot of a registry with every bundled module installed.
pub fn bundled_snapshot() -> Arc<RegistrySnapshot> {
    init_logging();
    let registry = ModuleRegistry::new();
    tether::modules::install(&registry).expect("bundled modules install");
    registry.freeze()
}

/// A context resolving through `snapshot`.
pub fn context_for(snapshot: &Arc<RegistrySnapshot>) -> Context {
    Context::new().with_resolver(snapshot.clone())
}
