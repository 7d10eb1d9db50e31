use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::{value, Container, Parameters, Value};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// A factory closure building a fresh value per request. Receives the
/// container for dependency lookups and the caller-supplied parameters.
pub type Factory =
    Arc<dyn Fn(&Container, &Parameters) -> Result<Value, BoxError> + Send + Sync>;

/// A decorator applied to a resolved object before it is returned. Receives
/// the previously built object and the container, and produces the
/// replacement object.
pub type Extension = Arc<dyn Fn(Value, &Container) -> Value + Send + Sync>;

type Assemble = Arc<dyn Fn(&Container, Vec<Value>) -> Result<Value, BoxError> + Send + Sync>;

/// A declared recipe for producing a value for a key.
#[derive(Clone)]
pub enum Producer {
    /// A literal value, returned verbatim on resolution.
    Value(Value),
    /// A factory closure, invoked on every resolution.
    Factory(Factory),
    /// The name of a constructor blueprint registered on the container. A
    /// reference with no matching blueprint is not buildable and resolves to
    /// its name as a plain `String` value.
    Reference(String),
}

impl Producer {
    pub fn value<T: Send + Sync + 'static>(object: T) -> Self {
        Self::Value(value(object))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Parameters) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }
}

impl Debug for Producer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Value(_) => f.write_str("Producer::Value"),
            Self::Factory(_) => f.write_str("Producer::Factory"),
            Self::Reference(name) => write!(f, "Producer::Reference({name})"),
        }
    }
}

/// A producer paired with its sharing mode.
#[derive(Debug, Clone)]
pub struct Binding {
    producer: Producer,
    shared: bool,
}

impl Binding {
    pub(crate) fn new(producer: Producer, shared: bool) -> Self {
        Self { producer, shared }
    }

    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    pub fn shared(&self) -> bool {
        self.shared
    }
}

/// An explicit constructor declaration: an ordered parameter list plus an
/// assemble closure receiving the satisfied arguments in declaration order.
///
/// Blueprints stand in for runtime constructor inspection. Registering one on
/// a container makes its name buildable, both through `Producer::Reference`
/// bindings and for unbound keys that happen to match the name.
#[derive(Clone)]
pub struct Blueprint {
    params: Vec<ParamSpec>,
    assemble: Assemble,
}

impl Blueprint {
    pub fn new<F>(assemble: F) -> Self
    where
        F: Fn(&Container, Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            assemble: Arc::new(assemble),
        }
    }

    /// Appends a declared parameter. Arguments are assembled in the order
    /// parameters were declared.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub(crate) fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn assemble(
        &self,
        container: &Container,
        args: Vec<Value>,
    ) -> Result<Value, BoxError> {
        (self.assemble)(container, args)
    }
}

impl Debug for Blueprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Blueprint")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// One declared constructor parameter and the ways to satisfy it, tried in
/// order: a same-named caller parameter, the container key it resolves from,
/// then the declared fallback.
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    resolves: Option<String>,
    fallback: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolves: None,
            fallback: None,
        }
    }

    /// Declares the container key this parameter resolves from when the
    /// caller does not supply it.
    pub fn resolves(mut self, key: impl Into<String>) -> Self {
        self.resolves = Some(key.into());
        self
    }

    /// Declares a default used when neither the caller nor the container can
    /// supply the parameter.
    pub fn fallback<T: Send + Sync + 'static>(mut self, object: T) -> Self {
        self.fallback = Some(value(object));
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn dependency(&self) -> Option<&str> {
        self.resolves.as_deref()
    }

    pub(crate) fn default(&self) -> Option<Value> {
        self.fallback.clone()
    }
}

impl Debug for ParamSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("resolves", &self.resolves)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_reference_defaults_from_key_name() {
        let producer = Producer::reference("portfolio.types");
        assert!(matches!(producer, Producer::Reference(name) if name == "portfolio.types"));
    }

    #[test]
    fn blueprint_collects_params_in_declaration_order() {
        let blueprint = Blueprint::new(|_, _| Ok(value(())))
            .param(ParamSpec::new("first"))
            .param(ParamSpec::new("second").resolves("second.key"))
            .param(ParamSpec::new("third").fallback(3u32));

        let names: Vec<&str> = blueprint.params().iter().map(ParamSpec::name).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(blueprint.params()[1].dependency(), Some("second.key"));
        assert!(blueprint.params()[2].default().is_some());
        assert!(blueprint.params()[0].default().is_none());
    }
}
