use crate::container::Container;
use crate::util::any::AsAny;

/// A two-phase unit of wiring logic.
///
/// `register` runs the moment the provider is added to an
/// [`Application`](crate::application::Application) and must only add
/// bindings; it must not resolve objects that depend on bindings registered
/// by providers added later. `boot` runs during
/// [`Application::boot`](crate::application::Application::boot), after every
/// provider has registered, and at most once per concrete provider type.
///
/// Providers are processed in insertion order. No dependency ordering beyond
/// list order is provided; register/boot discipline is the author's
/// responsibility.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceProvider: AsAny + Send + Sync {
    /// Populates the container with bindings. Defaults to a no-op.
    fn register(&self, app: &Container) {
        let _ = app;
    }

    /// Performs post-registration wiring. Defaults to a no-op.
    fn boot(&self, app: &Container) {
        let _ = app;
    }
}
