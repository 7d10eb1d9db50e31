use std::any::type_name;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::container::binding::{Blueprint, Extension, Factory, ParamSpec, Producer};
use crate::container::state::ContainerState;
use crate::container::{value, Parameters, ResolveError, Value};

/// A shared handle to a container. Clones address the same underlying state,
/// so a container can be handed to factories, extensions, and providers
/// freely.
///
/// All state sits behind a single lock which is never held across
/// user-supplied code, so factories and extensions may resolve further
/// dependencies recursively.
#[derive(Clone)]
pub struct Container {
    state: Arc<RwLock<ContainerState>>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ContainerState::new())),
        }
    }

    /// Builds a container seeded through `add`, so earlier definitions win
    /// over later duplicates.
    pub fn with_definitions<I, K>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, Producer)>,
        K: Into<String>,
    {
        let container = Self::new();
        for (key, producer) in definitions {
            container.add(key, Some(producer), false);
        }
        container
    }

    /// Stores a binding for `key`, replacing any previous one. Drops the
    /// key's cached value and extension list. A missing producer defaults to
    /// a self-referential `Reference(key)`, useful when the key names a
    /// registered blueprint.
    pub fn bind(&self, key: impl Into<String>, producer: Option<Producer>, shared: bool) {
        let key = key.into();
        debug!(key = %key, shared, "binding stored");
        self.state.write().bind(key, producer, shared);
    }

    /// Like [`bind`](Self::bind), but a no-op when `key` is already bound.
    /// The first registration wins, which makes provider registration
    /// idempotent.
    pub fn add(&self, key: impl Into<String>, producer: Option<Producer>, shared: bool) {
        let key = key.into();
        let mut state = self.state.write();
        if !state.bound(&key) {
            state.bind(key, producer, shared);
        }
    }

    /// A shared [`bind`](Self::bind).
    pub fn singleton(&self, key: impl Into<String>, producer: Option<Producer>) {
        self.bind(key, producer, true);
    }

    /// Stores `object` directly in the instance cache, bypassing the binding
    /// mechanism entirely. An instance wins every future lookup for its key
    /// regardless of bindings or extensions, until the key is re-bound or
    /// removed. Returns the stored value.
    pub fn instance<T: Send + Sync + 'static>(&self, key: impl Into<String>, object: T) -> Value {
        let stored = value(object);
        self.state
            .write()
            .put_instance(key.into(), stored.clone());
        stored
    }

    /// True iff a binding or a stored instance exists for `key`.
    pub fn bound(&self, key: &str) -> bool {
        self.state.read().bound(key)
    }

    /// Deletes the binding and any cached value for `key`; a no-op when
    /// absent.
    pub fn remove(&self, key: &str) {
        self.state.write().remove(key);
    }

    /// Appends a decorator to `key`'s extension list. The key is
    /// canonicalized through the alias table first. Extensions run in
    /// registration order on every resolution of a bound key.
    pub fn extend<F>(&self, key: &str, extension: F)
    where
        F: Fn(Value, &Container) -> Value + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        let canonical = state.canonical(key);
        state.extend(canonical, Arc::new(extension));
    }

    /// Records `alias → key`. Resolution chases a single alias level and
    /// never chains, so cyclic aliases cannot loop it.
    pub fn alias(&self, key: impl Into<String>, alias: impl Into<String>) {
        self.state.write().alias(key.into(), alias.into());
    }

    /// Registers a constructor blueprint under `name`, making the name
    /// buildable for `Reference` producers and for unbound keys.
    pub fn define(&self, name: impl Into<String>, blueprint: Blueprint) {
        self.state.write().define(name.into(), blueprint);
    }

    /// Narrow lookup-only entry point: [`resolve`](Self::resolve) with no
    /// parameters.
    pub fn get(&self, key: &str) -> Result<Option<Value>, ResolveError> {
        self.resolve(key, &Parameters::new())
    }

    pub fn get_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        self.resolve_as(key, &Parameters::new())
    }

    /// Typed [`resolve`](Self::resolve). A present value of the wrong type is
    /// an error, not a sentinel.
    pub fn resolve_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
        parameters: &Parameters,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        match self.resolve(key, parameters)? {
            None => Ok(None),
            Some(object) => match object.downcast::<T>() {
                Ok(object) => Ok(Some(object)),
                Err(_) => Err(ResolveError::MismatchedType {
                    key: key.to_owned(),
                    expected: type_name::<T>(),
                }),
            },
        }
    }

    /// Resolves `key` to a value.
    ///
    /// `Ok(None)` is the not-found sentinel: the key was never bound and
    /// names no blueprint. Errors are reserved for constructions that were
    /// attempted and failed.
    pub fn resolve(
        &self,
        key: &str,
        parameters: &Parameters,
    ) -> Result<Option<Value>, ResolveError> {
        let plan = {
            let state = self.state.read();
            let canonical = state.canonical(key);

            // Stored instances win unconditionally: no building, no
            // extensions.
            if let Some(object) = state.instance(&canonical) {
                trace!(key = %canonical, "resolved from instance cache");
                return Ok(Some(object));
            }

            if let Some(base) = state.cached(&canonical) {
                Plan::Cached {
                    extensions: state.extensions(&canonical),
                    canonical,
                    base,
                }
            } else if let Some(binding) = state.binding(&canonical) {
                let blueprint = match binding.producer() {
                    Producer::Reference(name) => state.blueprint(name),
                    _ => None,
                };
                Plan::Bound {
                    producer: binding.producer().clone(),
                    shared: binding.shared(),
                    blueprint,
                    canonical,
                }
            } else {
                Plan::Unbound {
                    blueprint: state.blueprint(&canonical),
                    canonical,
                }
            }
        };

        match plan {
            Plan::Cached {
                canonical,
                base,
                extensions,
            } => {
                trace!(key = %canonical, "resolved from shared cache");
                Ok(Some(self.apply_extensions(base, &extensions)))
            }
            // An unbound key naming a registered blueprint still builds: a
            // fresh object every call, uncached and undecorated.
            Plan::Unbound {
                canonical,
                blueprint,
            } => match blueprint {
                Some(blueprint) => self.construct(&canonical, &blueprint, parameters).map(Some),
                None => Ok(None),
            },
            Plan::Bound {
                canonical,
                producer,
                shared,
                blueprint,
            } => {
                let built = match producer {
                    // Bound literals are returned verbatim: no caching, no
                    // extensions.
                    Producer::Value(object) => return Ok(Some(object)),
                    Producer::Factory(factory) => self.invoke(&canonical, &factory, parameters)?,
                    Producer::Reference(name) => match blueprint {
                        Some(blueprint) => self.construct(&canonical, &blueprint, parameters)?,
                        // A reference with no blueprint is the binding's
                        // literal value: its name.
                        None => return Ok(Some(value(name))),
                    },
                };

                let base = if shared {
                    self.state.write().cache_shared(&canonical, built)
                } else {
                    built
                };

                let extensions = self.state.read().extensions(&canonical);
                debug!(key = %canonical, shared, "object constructed");
                Ok(Some(self.apply_extensions(base, &extensions)))
            }
        }
    }

    fn invoke(
        &self,
        key: &str,
        factory: &Factory,
        parameters: &Parameters,
    ) -> Result<Value, ResolveError> {
        factory(self, parameters).map_err(|source| ResolveError::Construction {
            key: key.to_owned(),
            source: source.into(),
        })
    }

    fn construct(
        &self,
        key: &str,
        blueprint: &Blueprint,
        parameters: &Parameters,
    ) -> Result<Value, ResolveError> {
        let mut args = Vec::with_capacity(blueprint.params().len());
        for param in blueprint.params() {
            args.push(self.satisfy(key, param, parameters)?);
        }

        blueprint
            .assemble(self, args)
            .map_err(|source| ResolveError::Construction {
                key: key.to_owned(),
                source: source.into(),
            })
    }

    /// Satisfies one declared parameter: a same-named caller parameter, then
    /// the container key it resolves from, then the declared fallback. A
    /// parameter satisfying none of these is an explicit error.
    fn satisfy(
        &self,
        key: &str,
        param: &ParamSpec,
        parameters: &Parameters,
    ) -> Result<Value, ResolveError> {
        if let Some(object) = parameters.get(param.name()) {
            return Ok(object);
        }

        if let Some(dependency) = param.dependency() {
            if let Some(object) = self.resolve(dependency, &Parameters::new())? {
                return Ok(object);
            }
        }

        if let Some(object) = param.default() {
            return Ok(object);
        }

        Err(ResolveError::MissingDependency {
            key: key.to_owned(),
            parameter: param.name().to_owned(),
        })
    }

    fn apply_extensions(&self, mut object: Value, extensions: &[Extension]) -> Value {
        for extension in extensions {
            object = extension(object, self);
        }
        object
    }
}

enum Plan {
    Cached {
        canonical: String,
        base: Value,
        extensions: Vec<Extension>,
    },
    Bound {
        canonical: String,
        producer: Producer,
        shared: bool,
        blueprint: Option<Blueprint>,
    },
    Unbound {
        canonical: String,
        blueprint: Option<Blueprint>,
    },
}
