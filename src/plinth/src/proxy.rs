use std::sync::Arc;

use parking_lot::RwLock;
use snafu::prelude::*;
use tracing::debug;

use crate::application::Application;
use crate::container::{Container, Parameters, ResolveError, Value};

static SHARED_CONTAINER: RwLock<Option<Container>> = RwLock::new(None);

/// Installs the process-wide container that proxies resolve against.
/// [`Application::boot`] calls this when it materializes its first proxy;
/// installing a container by hand is only needed in harnesses that bypass
/// the application lifecycle.
pub fn set_container(container: Container) {
    debug!("shared proxy container installed");
    *SHARED_CONTAINER.write() = Some(container);
}

fn shared_container() -> Result<Container, ProxyError> {
    SHARED_CONTAINER
        .read()
        .clone()
        .ok_or(ProxyError::NullContainer)
}

/// A static gateway to one container binding.
///
/// Implementors name the binding through [`ACCESSOR`](Self::ACCESSOR) and its
/// concrete type through [`Target`](Self::Target); [`instance`](Self::instance)
/// then resolves the binding from the shared container on every call, so a
/// rebind between calls is observed by the next call.
pub trait Proxy {
    /// The container key this proxy resolves.
    const ACCESSOR: &'static str;

    /// The concrete type stored under [`ACCESSOR`](Self::ACCESSOR).
    type Target: Send + Sync + 'static;

    fn instance() -> Result<Arc<Self::Target>, ProxyError> {
        let container = shared_container()?;
        let object = container
            .get(Self::ACCESSOR)
            .context(ResolutionSnafu { accessor: Self::ACCESSOR })?;
        let Some(object) = object else {
            return UnboundAccessorSnafu { accessor: Self::ACCESSOR }.fail();
        };
        object.downcast::<Self::Target>().map_err(|_| {
            MismatchedAccessorSnafu {
                accessor: Self::ACCESSOR,
                expected: std::any::type_name::<Self::Target>(),
            }
            .build()
        })
    }
}

/// The default proxy over the `app` binding, declared by every new
/// [`Application`] under the alias `App`.
pub struct App;

impl Proxy for App {
    const ACCESSOR: &'static str = "app";
    type Target = Application;
}

impl App {
    /// The running application behind the shared container.
    pub fn current() -> Result<Application, ProxyError> {
        Ok((*<Self as Proxy>::instance()?).clone())
    }

    pub fn resolve(key: &str, parameters: &Parameters) -> Result<Option<Value>, ProxyError> {
        Self::current()?
            .resolve(key, parameters)
            .context(ResolutionSnafu { accessor: key })
    }

    pub fn get(key: &str) -> Result<Option<Value>, ProxyError> {
        Self::current()?
            .get(key)
            .context(ResolutionSnafu { accessor: key })
    }

    pub fn bound(key: &str) -> Result<bool, ProxyError> {
        Ok(Self::current()?.bound(key))
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ProxyError {
    #[snafu(display("no shared container has been installed"))]
    NullContainer,
    #[snafu(display("the proxy accessor `{accessor}` is not bound"))]
    #[non_exhaustive]
    UnboundAccessor { accessor: String },
    #[snafu(display("the proxy accessor `{accessor}` does not hold a `{expected}`"))]
    #[non_exhaustive]
    MismatchedAccessor {
        accessor: String,
        expected: &'static str,
    },
    #[snafu(display("could not resolve the proxy accessor `{accessor}`"))]
    #[non_exhaustive]
    Resolution {
        accessor: String,
        source: ResolveError,
    },
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    struct Greeting;

    impl Proxy for Greeting {
        const ACCESSOR: &'static str = "greeting";
        type Target = String;
    }

    #[test]
    #[serial]
    fn proxy_resolves_through_the_shared_container() {
        let container = Container::new();
        container.instance("greeting", String::from("hello"));
        set_container(container);

        assert_eq!(*Greeting::instance().unwrap(), "hello");
    }

    #[test]
    #[serial]
    fn proxy_observes_rebinds_between_calls() {
        let container = Container::new();
        container.instance("greeting", String::from("hello"));
        set_container(container.clone());

        assert_eq!(*Greeting::instance().unwrap(), "hello");

        container.instance("greeting", String::from("goodbye"));
        assert_eq!(*Greeting::instance().unwrap(), "goodbye");
    }

    #[test]
    #[serial]
    fn missing_container_is_reported() {
        *SHARED_CONTAINER.write() = None;

        let err = Greeting::instance().unwrap_err();
        assert!(matches!(err, ProxyError::NullContainer));
    }

    #[test]
    #[serial]
    fn unbound_accessor_is_reported() {
        set_container(Container::new());

        let err = Greeting::instance().unwrap_err();
        assert!(matches!(err, ProxyError::UnboundAccessor { .. }));
    }

    #[test]
    #[serial]
    fn mismatched_accessor_is_reported() {
        let container = Container::new();
        container.instance("greeting", 13u32);
        set_container(container);

        let err = Greeting::instance().unwrap_err();
        assert!(matches!(err, ProxyError::MismatchedAccessor { .. }));
    }

    #[test]
    #[serial]
    fn app_proxy_reaches_the_booted_application() {
        let app = Application::new();
        app.instance("site.name", String::from("plinth"));
        app.boot();

        let current = App::current().unwrap();
        assert!(current.is_booted());

        let name = App::get("site.name").unwrap().unwrap();
        assert_eq!(*name.downcast::<String>().unwrap(), "plinth");
        assert!(App::bound("site.name").unwrap());
        assert!(!App::bound("site.tagline").unwrap());

        let resolved = App::resolve("site.name", &Parameters::new())
            .unwrap()
            .unwrap();
        assert_eq!(*resolved.downcast::<String>().unwrap(), "plinth");
    }
}
