//! Entity lifecycle hooks (mechanics only).
//!
//! A persistence layer owns a [`HookRegistry`] per entity type and fires it
//! around its mutations. Handlers implement [`LifecycleHooks`] and are
//! registered explicitly at startup; there is no global dispatch.

pub mod hooks;
pub mod registry;

pub use hooks::{HookError, LifecycleHooks, SaveKind};
pub use registry::HookRegistry;
