//! Callback factories keyed by type name.
//!
//! Declarative references name their completion callback by fully-qualified
//! type name. Host containers register a factory per name during wiring; the
//! binding resolver instantiates through this table and fails fast — with
//! the offending name — when no factory is registered.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::contracts::ServiceCallback;
use crate::errors::BindingError;

type CallbackFactory = Arc<dyn Fn() -> Arc<dyn ServiceCallback> + Send + Sync>;

/// Registry of callback constructors, one per callback type name.
#[derive(Default)]
pub struct CallbackRegistry {
    map: RwLock<HashMap<String, CallbackFactory>>,
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn ServiceCallback> + Send + Sync + 'static,
    {
        let mut w = self.map.write();
        w.insert(type_name.into(), Arc::new(factory));
    }

    /// Instantiate the callback registered under `type_name`.
    ///
    /// # Errors
    /// `BindingError::UnknownCallback` when no factory is registered.
    pub fn instantiate(&self, type_name: &str) -> Result<Arc<dyn ServiceCallback>, BindingError> {
        let factory = {
            let r = self.map.read();
            r.get(type_name).cloned()
        };
        match factory {
            Some(factory) => Ok(factory()),
            None => Err(BindingError::UnknownCallback {
                type_name: type_name.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallback(Arc<AtomicUsize>);

    impl ServiceCallback for CountingCallback {
        fn on_success(&self, _payload: &[u8]) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn on_failure(&self, _error: &anyhow::Error) {}
    }

    #[test]
    fn registered_factory_produces_fresh_instances() {
        let registry = CallbackRegistry::new();
        let successes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&successes);
        registry.register("com.acme.EchoCallback", move || {
            Arc::new(CountingCallback(Arc::clone(&counter)))
        });

        let first = registry.instantiate("com.acme.EchoCallback").unwrap();
        let second = registry.instantiate("com.acme.EchoCallback").unwrap();
        first.on_success(b"ok");
        second.on_success(b"ok");
        assert_eq!(successes.load(Ordering::SeqCst), 2);
        assert!(
            !Arc::ptr_eq(&first, &second),
            "each instantiation must produce a fresh callback"
        );
    }

    #[test]
    fn unknown_type_name_is_fatal_and_named() {
        let registry = CallbackRegistry::new();
        let err = match registry.instantiate("com.acme.Missing") {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        match err {
            BindingError::UnknownCallback { type_name } => {
                assert_eq!(type_name, "com.acme.Missing");
            }
            other => panic!("expected UnknownCallback, got {other:?}"),
        }
    }
}
