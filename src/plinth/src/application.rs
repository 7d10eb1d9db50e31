use std::any::TypeId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use snafu::prelude::*;
use tracing::debug;

use crate::container::{
    Blueprint, Container, Parameters, Producer, ResolveError, Value,
};
use crate::provider::ServiceProvider;
use crate::proxy::{self, Proxy};

/// The framework version exposed through the `version` binding.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static BOOTED: AtomicBool = AtomicBool::new(false);

/// True once any [`Application`] in this process has finished booting. Set
/// exactly once and never cleared. Late-arriving bootstrap code uses this to
/// decide between reusing the running application (through
/// [`app`](crate::app)) and creating a new one.
pub fn booted() -> bool {
    BOOTED.load(Ordering::SeqCst)
}

/// An application: a container, an ordered service-provider list, and a
/// static-proxy table, driven through a two-phase startup protocol.
///
/// Clones share the same application. Construction registers the default
/// bindings (`app`, `version`) and declares the default [`proxy::App`]
/// proxy; adding a provider runs its `register` hook immediately;
/// [`boot`](Self::boot) runs each provider's `boot` hook exactly once per
/// concrete type and materializes the proxies.
#[derive(Clone)]
pub struct Application {
    inner: Arc<ApplicationInner>,
}

struct ApplicationInner {
    container: Container,
    providers: RwLock<Vec<Arc<dyn ServiceProvider>>>,
    booted_providers: RwLock<HashSet<TypeId>>,
    proxies: RwLock<Vec<ProxyEntry>>,
    booted: AtomicBool,
}

struct ProxyEntry {
    proxy: TypeId,
    alias: &'static str,
    materialized: bool,
}

impl Application {
    pub fn new() -> Self {
        let app = Self {
            inner: Arc::new(ApplicationInner {
                container: Container::new(),
                providers: RwLock::new(Vec::new()),
                booted_providers: RwLock::new(HashSet::new()),
                proxies: RwLock::new(Vec::new()),
                booted: AtomicBool::new(false),
            }),
        };
        app.register_default_bindings();
        app.register_default_proxies();
        app
    }

    fn register_default_bindings(&self) {
        self.inner.container.instance("app", self.clone());
        self.inner.container.instance("version", VERSION.to_owned());
    }

    fn register_default_proxies(&self) {
        self.proxy::<proxy::App>("App");
    }

    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// Adds a service provider. Its `register` hook runs immediately, so
    /// registration happens at add-time, not at boot-time.
    pub fn provider<P: ServiceProvider>(&self, provider: P) {
        self.add_provider(Arc::new(provider));
    }

    /// Adds the service provider stored in the container under `key` as an
    /// `Arc<dyn ServiceProvider>`.
    pub fn provider_key(&self, key: &str) -> Result<(), ApplicationError> {
        let object = self
            .inner
            .container
            .get(key)
            .context(ProviderResolutionSnafu { key })?;
        let Some(object) = object else {
            return UnknownProviderSnafu { key }.fail();
        };
        match object.downcast::<Arc<dyn ServiceProvider>>() {
            Ok(provider) => {
                self.add_provider(Arc::clone(&*provider));
                Ok(())
            }
            Err(_) => InvalidProviderSnafu { key }.fail(),
        }
    }

    fn add_provider(&self, provider: Arc<dyn ServiceProvider>) {
        provider.register(&self.inner.container);
        self.inner.providers.write().push(provider);
    }

    /// Declares a static proxy under `alias`, materialized during boot at
    /// most once per application. Re-declaring an already-known proxy type
    /// or alias is a no-op. The [`proxy::App`] proxy is declared by default.
    pub fn proxy<P: Proxy + 'static>(&self, alias: &'static str) {
        let proxy = TypeId::of::<P>();
        let mut proxies = self.inner.proxies.write();
        if proxies
            .iter()
            .all(|entry| entry.proxy != proxy && entry.alias != alias)
        {
            proxies.push(ProxyEntry {
                proxy,
                alias,
                materialized: false,
            });
        }
    }

    pub fn proxy_materialized(&self, alias: &str) -> bool {
        self.inner
            .proxies
            .read()
            .iter()
            .any(|entry| entry.alias == alias && entry.materialized)
    }

    /// One-shot startup transition: boots each pending provider exactly once
    /// per concrete type, in insertion order, then materializes the static
    /// proxies against the container and sets the boot flags. Calling it
    /// again re-runs only the idempotent proxy step.
    pub fn boot(&self) {
        self.boot_providers();
        self.register_proxies();
        self.inner.booted.store(true, Ordering::SeqCst);
        BOOTED.store(true, Ordering::SeqCst);
        debug!("application booted");
    }

    pub fn is_booted(&self) -> bool {
        self.inner.booted.load(Ordering::SeqCst)
    }

    fn boot_providers(&self) {
        let providers = self.inner.providers.read().clone();
        for provider in providers {
            self.boot_provider(&provider);
        }
    }

    fn boot_provider(&self, provider: &Arc<dyn ServiceProvider>) {
        // Deref past the Arc so the dedup key is the concrete provider type,
        // not the smart pointer.
        let type_id = (**provider).as_any().type_id();
        if self.inner.booted_providers.read().contains(&type_id) {
            return;
        }

        provider.boot(&self.inner.container);
        self.inner.booted_providers.write().insert(type_id);
        debug!(provider = ?type_id, "provider booted");
    }

    fn register_proxies(&self) {
        let mut proxies = self.inner.proxies.write();

        // Install the shared container on the first materialization only.
        if proxies.iter().all(|entry| !entry.materialized) {
            proxy::set_container(self.inner.container.clone());
        }

        for entry in proxies.iter_mut() {
            if !entry.materialized {
                entry.materialized = true;
                debug!(alias = entry.alias, "proxy materialized");
            }
        }
    }

    // Container surface, delegated so application handles can be used as
    // containers directly.

    pub fn bind(&self, key: impl Into<String>, producer: Option<Producer>, shared: bool) {
        self.inner.container.bind(key, producer, shared);
    }

    pub fn add(&self, key: impl Into<String>, producer: Option<Producer>, shared: bool) {
        self.inner.container.add(key, producer, shared);
    }

    pub fn singleton(&self, key: impl Into<String>, producer: Option<Producer>) {
        self.inner.container.singleton(key, producer);
    }

    pub fn instance<T: Send + Sync + 'static>(&self, key: impl Into<String>, object: T) -> Value {
        self.inner.container.instance(key, object)
    }

    pub fn resolve(
        &self,
        key: &str,
        parameters: &Parameters,
    ) -> Result<Option<Value>, ResolveError> {
        self.inner.container.resolve(key, parameters)
    }

    pub fn resolve_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
        parameters: &Parameters,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        self.inner.container.resolve_as(key, parameters)
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, ResolveError> {
        self.inner.container.get(key)
    }

    pub fn get_as<T: Send + Sync + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        self.inner.container.get_as(key)
    }

    pub fn bound(&self, key: &str) -> bool {
        self.inner.container.bound(key)
    }

    pub fn remove(&self, key: &str) {
        self.inner.container.remove(key);
    }

    pub fn extend<F>(&self, key: &str, extension: F)
    where
        F: Fn(Value, &Container) -> Value + Send + Sync + 'static,
    {
        self.inner.container.extend(key, extension);
    }

    pub fn alias(&self, key: impl Into<String>, alias: impl Into<String>) {
        self.inner.container.alias(key, alias);
    }

    pub fn define(&self, name: impl Into<String>, blueprint: Blueprint) {
        self.inner.container.define(name, blueprint);
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ApplicationError {
    #[snafu(display("no provider is stored in the container under `{key}`"))]
    #[non_exhaustive]
    UnknownProvider { key: String },
    #[snafu(display("the value stored under `{key}` is not a service provider"))]
    #[non_exhaustive]
    InvalidProvider { key: String },
    #[snafu(display("could not resolve the provider stored under `{key}`"))]
    #[non_exhaustive]
    ProviderResolution { key: String, source: ResolveError },
}
