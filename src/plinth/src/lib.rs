#![allow(clippy::new_without_default)]

pub mod application;
pub mod container;
pub mod provider;
pub mod proxy;
mod util;

pub use application::{booted, Application, VERSION};

/// The running application, reached through the shared proxy container.
/// Fails with [`proxy::ProxyError::NullContainer`] before the first boot.
pub fn app() -> Result<Application, proxy::ProxyError> {
    proxy::App::current()
}

pub mod prelude {
    pub use crate::application::{booted, Application, ApplicationError, VERSION};
    pub use crate::container::{
        value, Blueprint, Container, Parameters, ParamSpec, Producer, ResolveError, Value,
    };
    pub use crate::provider::ServiceProvider;
    pub use crate::proxy::{App, Proxy, ProxyError};
}
