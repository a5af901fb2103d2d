use thiserror::Error;

/// Boxed source error carried by [`HookError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which persistence path triggered a pre-save hook.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SaveKind {
    /// The entity is about to be inserted.
    Create,
    /// An existing entity is about to be overwritten.
    Update,
}

impl SaveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveKind::Create => "create",
            SaveKind::Update => "update",
        }
    }
}

impl core::fmt::Display for SaveKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by a lifecycle hook.
///
/// Hooks never swallow errors: the persistence layer surfaces this to the
/// caller of the mutation that fired the hook.
#[derive(Debug, Error)]
#[error("{stage} hook `{hook}` failed: {source}")]
pub struct HookError {
    /// Registered name of the failing hook.
    pub hook: &'static str,
    /// Lifecycle stage the hook was running in.
    pub stage: &'static str,
    #[source]
    pub source: BoxError,
}

impl HookError {
    pub fn new(
        hook: &'static str,
        stage: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            hook,
            stage,
            source: source.into(),
        }
    }

    /// Attempt to view the underlying error as a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

/// Callbacks fired by a persistence layer around entity mutations.
///
/// Every method has a no-op default so handlers only implement the stages
/// they care about. All callbacks run synchronously, in-line with the
/// mutation, on the caller's thread.
///
/// Ordering contract for implementors of a persistence layer:
/// - `on_before_save` runs before the write; it may mutate the entity and an
///   error aborts the write.
/// - `on_created` / `on_deleted` run after the write is visible to reads on
///   the same store.
pub trait LifecycleHooks<E>: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    fn on_before_save(&self, _entity: &mut E, _kind: SaveKind) -> Result<(), HookError> {
        Ok(())
    }

    fn on_created(&self, _entity: &E) -> Result<(), HookError> {
        Ok(())
    }

    fn on_deleted(&self, _entity: &E) -> Result<(), HookError> {
        Ok(())
    }
}

impl<E, H> LifecycleHooks<E> for std::sync::Arc<H>
where
    H: LifecycleHooks<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_before_save(&self, entity: &mut E, kind: SaveKind) -> Result<(), HookError> {
        (**self).on_before_save(entity, kind)
    }

    fn on_created(&self, entity: &E) -> Result<(), HookError> {
        (**self).on_created(entity)
    }

    fn on_deleted(&self, entity: &E) -> Result<(), HookError> {
        (**self).on_deleted(entity)
    }
}
