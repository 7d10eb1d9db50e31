use std::collections::HashMap;
use std::sync::Arc;

use crate::container::{value, Value};

/// Caller-supplied arguments for a single resolution, keyed by parameter
/// name. Blueprint parameters consult this map before falling back to
/// container resolution; factories receive it verbatim.
#[derive(Clone, Default)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<String>, object: T) -> Self {
        self.insert(name, object);
        self
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, object: T) {
        self.values.insert(name.into(), value(object));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Typed lookup; `None` when the name is absent or holds another type.
    pub fn get_as<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(|object| object.downcast::<T>().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookup_checks_name_and_type() {
        let parameters = Parameters::new()
            .with("label", String::from("portfolio"))
            .with("count", 3u32);

        assert_eq!(*parameters.get_as::<String>("label").unwrap(), "portfolio");
        assert_eq!(*parameters.get_as::<u32>("count").unwrap(), 3);
        assert!(parameters.get_as::<u32>("label").is_none());
        assert!(parameters.get("missing").is_none());
    }

    #[test]
    fn empty_parameters_report_empty() {
        assert!(Parameters::new().is_empty());
        assert!(!Parameters::new().with("flag", true).is_empty());
    }
}
