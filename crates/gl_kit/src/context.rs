//! Graphics context shared by every resource wrapper
//!
//! The context is a cheaply clonable handle over the boxed
//! [`GraphicsBackend`] plus the per-kind generated-name counters. Every
//! wrapper keeps a clone so its drop path can reach the backend; passing the
//! context explicitly replaces the process-wide mutable state the design is
//! modeled on.
//!
//! `Rc` + `RefCell` is deliberate: the whole crate is single-threaded (the
//! window system requires the main thread anyway), so the context is `!Send`
//! and interior mutability stands in for locking.

use crate::backend::GraphicsBackend;
use crate::resources::ResourceKind;
use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

/// Monotonic per-kind counters feeding generated resource names.
///
/// Counters only ever increase; freed names are never recycled, so a
/// generated name is fresh for the lifetime of the context.
#[derive(Default)]
pub(crate) struct NameCounters {
    counts: [Cell<u64>; ResourceKind::COUNT],
}

impl NameCounters {
    fn next(&self, kind: ResourceKind) -> u64 {
        let counter = &self.counts[kind.index()];
        let value = counter.get();
        counter.set(value + 1);
        value
    }
}

struct ContextShared {
    backend: RefCell<Box<dyn GraphicsBackend>>,
    counters: NameCounters,
}

/// Shared handle over a graphics backend.
///
/// Cloning is cheap and clones refer to the same backend. The backend is
/// torn down when the last clone is dropped, after every resource holding
/// one has released its backend objects.
#[derive(Clone)]
pub struct Context {
    shared: Rc<ContextShared>,
}

impl Context {
    /// Wrap a backend in a context.
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        Self {
            shared: Rc::new(ContextShared {
                backend: RefCell::new(backend),
                counters: NameCounters::default(),
            }),
        }
    }

    /// Borrow the backend mutably.
    ///
    /// The borrow is dynamic; holding it across a call that re-enters the
    /// context (a resource drop, a window callback) will panic, so keep the
    /// returned guard short-lived.
    pub fn backend_mut(&self) -> RefMut<'_, Box<dyn GraphicsBackend>> {
        self.shared.backend.borrow_mut()
    }

    /// Draw the next generated-name counter value for `kind`.
    pub(crate) fn next_generated_id(&self, kind: ResourceKind) -> u64 {
        self.shared.counters.next(kind)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn test_counters_are_per_kind_and_monotonic() {
        let ctx = Context::new(Box::new(HeadlessBackend::new()));
        assert_eq!(ctx.next_generated_id(ResourceKind::Buffer), 0);
        assert_eq!(ctx.next_generated_id(ResourceKind::Buffer), 1);
        assert_eq!(ctx.next_generated_id(ResourceKind::Mesh), 0);
        assert_eq!(ctx.next_generated_id(ResourceKind::Buffer), 2);
    }

    #[test]
    fn test_clones_share_the_backend() {
        let ctx = Context::new(Box::new(HeadlessBackend::new()));
        let clone = ctx.clone();
        let id = ctx.backend_mut().create_buffer();
        clone.backend_mut().delete_buffer(id);
        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert!(!headless.buffer_alive(id));
    }
}
