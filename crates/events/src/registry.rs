//! Ordered hook registry fired by a persistence layer.

use std::sync::{Arc, RwLock};

use tracing::warn;

use carlot_core::Entity;

use crate::hooks::{HookError, LifecycleHooks, SaveKind};

/// Registered hooks for one entity type.
///
/// Hooks fire in registration order. The first failing hook stops dispatch
/// for that stage and its error is returned to the persistence layer.
pub struct HookRegistry<E> {
    hooks: RwLock<Vec<Arc<dyn LifecycleHooks<E>>>>,
}

impl<E> HookRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Intended to be called during startup wiring.
    pub fn register(&self, hook: Arc<dyn LifecycleHooks<E>>) {
        // A poisoned lock only means a previous registration panicked; the
        // vector itself is still consistent.
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        hooks.push(hook);
    }

    /// Names of registered hooks, in dispatch order.
    pub fn names(&self) -> Vec<&'static str> {
        self.snapshot().iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Clone the list so hooks run without holding the lock (a hook may
    // trigger further persistence calls).
    fn snapshot(&self) -> Vec<Arc<dyn LifecycleHooks<E>>> {
        self.hooks
            .read()
            .map(|h| h.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl<E: Entity> HookRegistry<E> {
    pub fn before_save(&self, entity: &mut E, kind: SaveKind) -> Result<(), HookError> {
        for hook in self.snapshot() {
            hook.on_before_save(entity, kind).inspect_err(|e| {
                warn!(
                    hook = hook.name(),
                    entity = E::entity_name(),
                    id = ?entity.id(),
                    kind = %kind,
                    error = %e,
                    "pre-save hook failed"
                );
            })?;
        }
        Ok(())
    }

    pub fn created(&self, entity: &E) -> Result<(), HookError> {
        for hook in self.snapshot() {
            hook.on_created(entity).inspect_err(|e| {
                warn!(
                    hook = hook.name(),
                    entity = E::entity_name(),
                    id = ?entity.id(),
                    error = %e,
                    "post-create hook failed"
                );
            })?;
        }
        Ok(())
    }

    pub fn deleted(&self, entity: &E) -> Result<(), HookError> {
        for hook in self.snapshot() {
            hook.on_deleted(entity).inspect_err(|e| {
                warn!(
                    hook = hook.name(),
                    entity = E::entity_name(),
                    id = ?entity.id(),
                    error = %e,
                    "post-delete hook failed"
                );
            })?;
        }
        Ok(())
    }
}

impl<E> Default for HookRegistry<E> {
    fn default() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }
}

impl<E> core::fmt::Debug for HookRegistry<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        title: String,
    }

    impl Entity for Doc {
        type Id = String;

        fn id(&self) -> &Self::Id {
            &self.title
        }

        fn entity_name() -> &'static str {
            "doc"
        }
    }

    #[derive(Default)]
    struct Recorder {
        name: &'static str,
        calls: Mutex<Vec<String>>,
        fail_before_save: bool,
    }

    impl Recorder {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    impl LifecycleHooks<Doc> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_before_save(&self, entity: &mut Doc, kind: SaveKind) -> Result<(), HookError> {
            self.calls.lock().unwrap().push(format!("before_save:{kind}"));
            if self.fail_before_save {
                return Err(HookError::new(self.name, "pre-save", Boom));
            }
            entity.title.push('!');
            Ok(())
        }

        fn on_created(&self, entity: &Doc) -> Result<(), HookError> {
            self.calls.lock().unwrap().push(format!("created:{}", entity.title));
            Ok(())
        }
    }

    #[test]
    fn hooks_fire_in_registration_order() {
        let registry = HookRegistry::new();
        let a = Arc::new(Recorder::named("a"));
        let b = Arc::new(Recorder::named("b"));
        registry.register(a.clone());
        registry.register(b.clone());

        let mut doc = Doc { title: "x".into() };
        registry.before_save(&mut doc, SaveKind::Create).unwrap();

        assert_eq!(doc.title, "x!!");
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(a.calls(), vec!["before_save:create"]);
        assert_eq!(b.calls(), vec!["before_save:create"]);
    }

    #[test]
    fn first_failure_stops_dispatch() {
        let registry = HookRegistry::new();
        let failing = Arc::new(Recorder {
            name: "failing",
            fail_before_save: true,
            ..Recorder::default()
        });
        let after = Arc::new(Recorder::named("after"));
        registry.register(failing.clone());
        registry.register(after.clone());

        let mut doc = Doc { title: "x".into() };
        let err = registry.before_save(&mut doc, SaveKind::Update).unwrap_err();

        assert_eq!(err.hook, "failing");
        assert!(err.downcast_ref::<Boom>().is_some());
        assert!(after.calls().is_empty());
        assert_eq!(doc.title, "x");
    }

    #[test]
    fn default_methods_are_no_ops() {
        let registry = HookRegistry::new();
        let rec = Arc::new(Recorder::named("rec"));
        registry.register(rec.clone());

        let doc = Doc { title: "gone".into() };
        registry.deleted(&doc).unwrap();
        registry.created(&doc).unwrap();

        assert_eq!(rec.calls(), vec!["created:gone"]);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let registry: HookRegistry<Doc> = HookRegistry::new();
        let mut doc = Doc { title: "x".into() };
        assert!(registry.is_empty());
        registry.before_save(&mut doc, SaveKind::Create).unwrap();
        registry.created(&doc).unwrap();
        assert_eq!(doc.title, "x");
    }
}
