//! Named resource registry
//!
//! A registry maps unique, human-readable names to resources of one kind
//! and remembers the most recently touched entry. Name collisions are
//! resolved by appending a per-kind generated suffix fed from the context's
//! monotonic counters, so a generated name is never handed out twice even
//! after the original entry is gone. Freed names are not recycled; a name
//! is only reused when a later hint matches one that happens to be free.

use crate::backend::BackendId;
use crate::context::Context;
use crate::resources::Resource;
use std::collections::HashMap;
use thiserror::Error;

/// Registry lookup errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No entry under the given name.
    #[error("no such resource: {0}")]
    NotFound(String),

    /// Index past the end of the registry.
    #[error("resource index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of entries at the time of the lookup.
        len: usize,
    },

    /// The registry has no entries at all.
    #[error("registry is empty")]
    Empty,
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Name-to-resource mapping for a single resource kind.
///
/// Backed by a `HashMap`, so index-based access follows the map's iteration
/// order, not insertion order.
pub struct Registry<T: Resource> {
    ctx: Context,
    entries: HashMap<String, T>,
    recently_used: Option<String>,
}

impl<T: Resource> Registry<T> {
    /// Create an empty registry drawing generated names from `ctx`.
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            entries: HashMap::new(),
            recently_used: None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate over `(name, resource)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter()
    }

    /// Iterate mutably over `(name, resource)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut T)> {
        self.entries.iter_mut()
    }

    /// Construct-and-insert convenience: insert `resource` under a name
    /// derived from `hint` and return the name actually used.
    pub fn emplace(&mut self, hint: &str, resource: T) -> String {
        self.record(resource, hint)
    }

    /// Adopt an already-built resource, returning the name actually used.
    ///
    /// The registry takes the resource by move, so it becomes the single
    /// owner of whatever backend objects the resource holds.
    pub fn record(&mut self, resource: T, hint: &str) -> String {
        let name = self.next_unique_name(hint);
        log::debug!("recording {:?} resource as {name:?}", T::KIND);
        self.entries.insert(name.clone(), resource);
        self.recently_used = Some(name.clone());
        name
    }

    /// Immutable lookup by name. Does not touch the recently-used mark.
    pub fn get(&self, name: &str) -> RegistryResult<&T> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Mutable lookup by name; marks the entry as recently used.
    pub fn get_mut(&mut self, name: &str) -> RegistryResult<&mut T> {
        match self.entries.get_mut(name) {
            Some(resource) => {
                self.recently_used = Some(name.to_string());
                Ok(resource)
            }
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    /// Mutable lookup by position in iteration order; marks the entry as
    /// recently used. Order is not insertion order.
    pub fn get_by_index(&mut self, index: usize) -> RegistryResult<&mut T> {
        let len = self.entries.len();
        match self.entries.iter_mut().nth(index) {
            Some((name, resource)) => {
                self.recently_used = Some(name.clone());
                Ok(resource)
            }
            None => Err(RegistryError::IndexOutOfRange { index, len }),
        }
    }

    /// Find the name of the entry wrapping the given backend id, if any.
    /// Linear scan; first match in iteration order wins.
    pub fn find_by_backend_id(&self, id: BackendId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, resource)| resource.backend_id() == Some(id))
            .map(|(name, _)| name.as_str())
    }

    /// Move the entry at `old` to the key `new`.
    ///
    /// Returns `false` (leaving the registry unchanged) when `old` is
    /// absent. An existing entry at `new` is overwritten and dropped, which
    /// releases its resources. The recently-used mark follows the rename.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(resource) = self.entries.remove(old) else {
            return false;
        };
        log::debug!("renaming {:?} resource {old:?} -> {new:?}", T::KIND);
        self.entries.insert(new.to_string(), resource);
        if self.recently_used.as_deref() == Some(old) {
            self.recently_used = Some(new.to_string());
        }
        true
    }

    /// Drop the entry under `name`, releasing its resources. No-op when
    /// absent.
    pub fn remove(&mut self, name: &str) {
        if self.entries.remove(name).is_some() {
            log::debug!("removed {:?} resource {name:?}", T::KIND);
        }
        if self.recently_used.as_deref() == Some(name) {
            self.recently_used = None;
        }
    }

    /// Remove the entry under `name` and hand the resource (still holding
    /// its backend objects) to the caller.
    pub fn retrieve(&mut self, name: &str) -> RegistryResult<T> {
        let resource = self
            .entries
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if self.recently_used.as_deref() == Some(name) {
            self.recently_used = None;
        }
        Ok(resource)
    }

    /// The most recently touched entry, or an arbitrary one (the first in
    /// iteration order) when nothing has been touched yet.
    pub fn most_recent(&mut self) -> RegistryResult<&mut T> {
        let name = match &self.recently_used {
            Some(name) if self.entries.contains_key(name) => name.clone(),
            _ => {
                let Some(first) = self.entries.keys().next() else {
                    return Err(RegistryError::Empty);
                };
                let first = first.clone();
                self.recently_used = Some(first.clone());
                first
            }
        };
        self.entries
            .get_mut(&name)
            .ok_or(RegistryError::NotFound(name))
    }

    /// Derive a name not currently present in the registry.
    ///
    /// A non-empty, non-colliding hint is returned unchanged. Otherwise
    /// candidates of the form `{hint}{kind prefix}{counter}` are tried with
    /// a strictly increasing counter until one is free. The counter is
    /// shared by every registry of this kind on the same context and never
    /// reset, so termination is guaranteed and generated names stay fresh.
    pub fn next_unique_name(&self, hint: &str) -> String {
        if !hint.is_empty() && !self.entries.contains_key(hint) {
            return hint.to_string();
        }
        let prefix = T::KIND.generated_prefix();
        loop {
            let counter = self.ctx.next_generated_id(T::KIND);
            let candidate = format!("{hint}{prefix}{counter}");
            if !self.entries.contains_key(&candidate) {
                log::debug!("next available {:?} name: {candidate:?}", T::KIND);
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferTarget, HeadlessBackend};
    use crate::resources::{Buffer, ResourceKind};

    fn headless_ctx() -> Context {
        Context::new(Box::new(HeadlessBackend::new()))
    }

    fn buffer(ctx: &Context) -> Buffer {
        Buffer::new(ctx, BufferTarget::Vertex)
    }

    fn buffer_alive(ctx: &Context, id: BackendId) -> bool {
        ctx.backend_mut()
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend")
            .buffer_alive(id)
    }

    #[test]
    fn test_emplace_names_are_unique_among_live_entries() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let mut names = std::collections::HashSet::new();
        for hint in ["cube", "cube", "", "cube", "", "sphere"] {
            let name = registry.emplace(hint, buffer(&ctx));
            assert!(names.insert(name.clone()), "duplicate name {name:?}");
            assert!(registry.contains(&name));
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_duplicate_hint_gets_generated_suffix() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let first = registry.emplace("cube", buffer(&ctx));
        assert_eq!(first, "cube");
        let second = registry.emplace("cube", buffer(&ctx));
        assert_ne!(second, "cube");
        let prefix = format!("cube{}", ResourceKind::Buffer.generated_prefix());
        let suffix = second.strip_prefix(&prefix).expect("generated pattern");
        suffix.parse::<u64>().expect("counter suffix");
    }

    #[test]
    fn test_retrieve_removes_entry_but_keeps_resource_alive() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let name = registry.emplace("quad", buffer(&ctx));
        let id = registry.get(&name).expect("present").id();

        let taken = registry.retrieve(&name).expect("retrieve");
        assert!(!registry.contains(&name));
        assert_eq!(taken.id(), id);
        assert!(buffer_alive(&ctx, id));

        drop(taken);
        assert!(!buffer_alive(&ctx, id));
    }

    #[test]
    fn test_retrieve_absent_is_not_found() {
        let ctx = headless_ctx();
        let mut registry = Registry::<Buffer>::new(&ctx);
        assert!(matches!(
            registry.retrieve("ghost"),
            Err(RegistryError::NotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_record_then_retrieve_round_trips_backend_id() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let original = buffer(&ctx);
        let id = original.id();
        let name = registry.record(original, "adopted");
        let returned = registry.retrieve(&name).expect("retrieve");
        assert_eq!(returned.id(), id);
    }

    #[test]
    fn test_rename_absent_returns_false_and_changes_nothing() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        registry.emplace("keep", buffer(&ctx));
        assert!(!registry.rename("missing", "other"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("keep"));
    }

    #[test]
    fn test_rename_overwrites_and_releases_target() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        registry.emplace("source", buffer(&ctx));
        registry.emplace("target", buffer(&ctx));
        let source_id = registry.get("source").expect("present").id();
        let target_id = registry.get("target").expect("present").id();
        let len_before = registry.len();

        assert!(registry.rename("source", "target"));
        assert_eq!(registry.len(), len_before - 1);
        assert!(!registry.contains("source"));
        assert_eq!(registry.get("target").expect("present").id(), source_id);
        assert!(!buffer_alive(&ctx, target_id));
        assert!(buffer_alive(&ctx, source_id));
    }

    #[test]
    fn test_rename_follows_recently_used() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let name = registry.emplace("old", buffer(&ctx));
        let id = registry.get_mut(&name).expect("present").id();
        assert!(registry.rename("old", "new"));
        assert_eq!(registry.most_recent().expect("recent").id(), id);
        assert!(registry.contains("new"));
    }

    #[test]
    fn test_remove_clears_recently_used() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let a = registry.emplace("a", buffer(&ctx));
        let b = registry.emplace("b", buffer(&ctx));
        let recent_id = registry.get_mut(&b).expect("present").id();
        assert_eq!(registry.most_recent().expect("recent").id(), recent_id);

        registry.remove(&b);
        // Falls back to the remaining entry.
        let fallback_id = registry.get(&a).expect("present").id();
        assert_eq!(registry.most_recent().expect("recent").id(), fallback_id);
    }

    #[test]
    fn test_most_recent_on_empty_registry_is_empty_error() {
        let ctx = headless_ctx();
        let mut registry = Registry::<Buffer>::new(&ctx);
        assert!(matches!(registry.most_recent(), Err(RegistryError::Empty)));
    }

    #[test]
    fn test_get_by_index_out_of_range() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        registry.emplace("only", buffer(&ctx));
        assert!(registry.get_by_index(0).is_ok());
        assert!(matches!(
            registry.get_by_index(1),
            Err(RegistryError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_find_by_backend_id() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        let name = registry.emplace("findme", buffer(&ctx));
        let id = registry.get(&name).expect("present").id();
        assert_eq!(registry.find_by_backend_id(id), Some(name.as_str()));
        assert_eq!(registry.find_by_backend_id(id + 1000), None);
    }

    #[test]
    fn test_generated_names_are_not_recycled() {
        let ctx = headless_ctx();
        let mut registry = Registry::new(&ctx);
        registry.emplace("", buffer(&ctx));
        let first_generated = registry.emplace("", buffer(&ctx));
        registry.remove(&first_generated);
        let next_generated = registry.emplace("", buffer(&ctx));
        // The freed generated name is not handed out again.
        assert_ne!(next_generated, first_generated);
        // An explicit hint matching the freed name does reuse it.
        let hinted = registry.emplace(&first_generated, buffer(&ctx));
        assert_eq!(hinted, first_generated);
    }

    #[test]
    fn test_counter_is_shared_across_registries_of_one_kind() {
        let ctx = headless_ctx();
        let mut first = Registry::new(&ctx);
        let mut second = Registry::new(&ctx);
        let a = first.emplace("", buffer(&ctx));
        let b = second.emplace("", buffer(&ctx));
        assert_ne!(a, b);
    }
}
