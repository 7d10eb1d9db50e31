pub mod binding;
pub mod parameters;

mod handle;
mod state;

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

pub use binding::{Binding, Blueprint, ParamSpec, Producer};
pub use handle::Container;
pub use parameters::Parameters;

/// A type-erased, shareable value managed by a [`Container`].
///
/// Resolved objects are handed out as cloned `Arc`s. Values cached as shared
/// singletons are seen by every caller that resolves the same key, so callers
/// must not assume exclusive ownership.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wraps an owned object into a [`Value`].
pub fn value<T: Send + Sync + 'static>(object: T) -> Value {
    Arc::new(object)
}

/// Errors surfaced while building an object.
///
/// A key that is neither bound nor buildable is not an error: resolution
/// returns `Ok(None)` and callers check for the sentinel. Errors are reserved
/// for constructions that were attempted and failed.
#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum ResolveError {
    /// A declared constructor parameter could not be satisfied by the caller,
    /// the container, or a declared fallback.
    #[snafu(display("could not satisfy parameter `{parameter}` while building `{key}`"))]
    #[non_exhaustive]
    MissingDependency { key: String, parameter: String },
    #[snafu(display("could not construct the object bound to `{key}`"))]
    #[non_exhaustive]
    Construction {
        key: String,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("the value resolved for `{key}` is not a `{expected}`"))]
    #[non_exhaustive]
    MismatchedType { key: String, expected: &'static str },
}
