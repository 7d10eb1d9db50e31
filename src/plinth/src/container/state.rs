use std::collections::HashMap;

use crate::container::binding::{Binding, Blueprint, Extension, Producer};
use crate::container::Value;

/// The container's mutable state: binding registry, alias table, the two
/// caches, extension lists, and the blueprint registry. Mutation rules live
/// here; locking and the resolution algorithm live in the handle.
///
/// The caches are split on purpose. `instances` holds values stored through
/// `instance()` and short-circuits resolution entirely. `resolved` holds the
/// lazily built bases of shared bindings, which are re-decorated on every
/// resolution.
#[derive(Default)]
pub(crate) struct ContainerState {
    bindings: HashMap<String, Binding>,
    aliases: HashMap<String, String>,
    instances: HashMap<String, Value>,
    resolved: HashMap<String, Value>,
    extensions: HashMap<String, Vec<Extension>>,
    blueprints: HashMap<String, Blueprint>,
}

impl ContainerState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a binding, dropping any stale cached value and the key's
    /// extension list. A missing producer defaults to a self-referential
    /// `Reference(key)`.
    pub(crate) fn bind(&mut self, key: String, producer: Option<Producer>, shared: bool) {
        self.instances.remove(&key);
        self.resolved.remove(&key);

        let producer = producer.unwrap_or_else(|| Producer::Reference(key.clone()));
        self.bindings
            .insert(key.clone(), Binding::new(producer, shared));
        self.extensions.insert(key, Vec::new());
    }

    pub(crate) fn bound(&self, key: &str) -> bool {
        self.bindings.contains_key(key) || self.instances.contains_key(key)
    }

    pub(crate) fn remove(&mut self, key: &str) {
        if self.bound(key) {
            self.bindings.remove(key);
            self.instances.remove(key);
            self.resolved.remove(key);
        }
    }

    pub(crate) fn binding(&self, key: &str) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub(crate) fn put_instance(&mut self, key: String, object: Value) {
        self.instances.insert(key, object);
    }

    pub(crate) fn instance(&self, key: &str) -> Option<Value> {
        self.instances.get(key).cloned()
    }

    /// One level of alias indirection, never chained.
    pub(crate) fn canonical(&self, key: &str) -> String {
        self.aliases
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_owned())
    }

    pub(crate) fn alias(&mut self, key: String, alias: String) {
        self.aliases.insert(alias, key);
    }

    pub(crate) fn extend(&mut self, key: String, extension: Extension) {
        self.extensions.entry(key).or_default().push(extension);
    }

    pub(crate) fn extensions(&self, key: &str) -> Vec<Extension> {
        self.extensions.get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn define(&mut self, name: String, blueprint: Blueprint) {
        self.blueprints.insert(name, blueprint);
    }

    pub(crate) fn blueprint(&self, name: &str) -> Option<Blueprint> {
        self.blueprints.get(name).cloned()
    }

    pub(crate) fn cached(&self, key: &str) -> Option<Value> {
        self.resolved.get(key).cloned()
    }

    /// Caches the base of a shared binding. The first write wins: a value
    /// that appeared concurrently is kept and returned instead.
    pub(crate) fn cache_shared(&mut self, key: &str, object: Value) -> Value {
        self.resolved
            .entry(key.to_owned())
            .or_insert(object)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::container::value;

    use super::*;

    #[test]
    fn bind_drops_caches_and_extensions() {
        let mut state = ContainerState::new();
        state.put_instance("config".to_owned(), value(1u32));
        state.cache_shared("config", value(2u32));
        state.extend("config".to_owned(), Arc::new(|object, _| object));

        state.bind("config".to_owned(), Some(Producer::value(3u32)), false);

        assert!(state.instance("config").is_none());
        assert!(state.cached("config").is_none());
        assert!(state.extensions("config").is_empty());
    }

    #[test]
    fn bind_defaults_to_self_reference() {
        let mut state = ContainerState::new();
        state.bind("widget".to_owned(), None, false);

        let binding = state.binding("widget").unwrap();
        assert!(matches!(binding.producer(), Producer::Reference(name) if name == "widget"));
    }

    #[test]
    fn remove_is_a_no_op_for_unknown_keys() {
        let mut state = ContainerState::new();
        state.remove("missing");
        assert!(!state.bound("missing"));
    }

    #[test]
    fn canonical_resolves_a_single_alias_level() {
        let mut state = ContainerState::new();
        state.alias("target".to_owned(), "middle".to_owned());
        state.alias("middle".to_owned(), "outer".to_owned());

        assert_eq!(state.canonical("outer"), "middle");
        assert_eq!(state.canonical("middle"), "target");
        assert_eq!(state.canonical("target"), "target");
    }

    #[test]
    fn cache_shared_keeps_the_first_write() {
        let mut state = ContainerState::new();
        let first = state.cache_shared("app", value(1u32));
        let second = state.cache_shared("app", value(2u32));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second.downcast::<u32>().unwrap(), 1);
    }
}
