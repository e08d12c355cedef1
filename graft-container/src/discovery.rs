//! Component discovery — the boundary between namespaces and descriptors.
//!
//! A [`Discovery`] turns a [`Namespace`] into the descriptors of every
//! component declared under it. Three environments are provided:
//! - [`InventoryDiscovery`] (default): components registered at link time by
//!   `#[derive(Component)]`, matched against their module path
//! - [`Catalog`]: an explicit list assembled by the application
//! - any `Fn(&Namespace) -> Result<Vec<ComponentDescriptor>, BoxError>`

use std::fmt;

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::descriptor::{Component, ComponentDescriptor};
use crate::error::BoxError;

/// A validated module path such as `my_app::services`.
///
/// # Examples
/// ```
/// use graft_container::discovery::Namespace;
///
/// let namespace = Namespace::parse("my_app::services").unwrap();
/// assert!(namespace.contains("my_app::services"));
/// assert!(namespace.contains("my_app::services::users"));
/// assert!(!namespace.contains("my_app::services_old"));
///
/// assert!(Namespace::parse("my_app::").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Parses `ident(::ident)*`.
    pub fn parse(path: &str) -> Result<Self, InvalidNamespace> {
        let valid = !path.is_empty() && path.split("::").all(is_identifier);
        if valid {
            Ok(Self(path.to_string()))
        } else {
            Err(InvalidNamespace {
                path: path.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `module` is this namespace or nested below it.
    pub fn contains(&self, module: &str) -> bool {
        match module.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|ch| ch == '_' || ch.is_alphanumeric())
        }
        _ => false,
    }
}

/// The requested namespace is not a module path.
#[derive(Debug, thiserror::Error)]
#[error("`{path}` does not appear to be a valid namespace")]
pub struct InvalidNamespace {
    pub path: String,
}

/// Source of component descriptors for a namespace.
pub trait Discovery {
    /// Returns every descriptor reachable under `namespace`, in a
    /// deterministic order.
    fn discover(&self, namespace: &Namespace) -> Result<Vec<ComponentDescriptor>, BoxError>;
}

impl<F> Discovery for F
where
    F: Fn(&Namespace) -> Result<Vec<ComponentDescriptor>, BoxError>,
{
    fn discover(&self, namespace: &Namespace) -> Result<Vec<ComponentDescriptor>, BoxError> {
        self(namespace)
    }
}

/// Link-time registration emitted by `#[derive(Component)]`.
pub struct ComponentRegistration {
    describe: fn() -> ComponentDescriptor,
}

impl ComponentRegistration {
    pub const fn new(describe: fn() -> ComponentDescriptor) -> Self {
        Self { describe }
    }

    pub fn describe(&self) -> ComponentDescriptor {
        (self.describe)()
    }
}

inventory::collect!(ComponentRegistration);

/// Every registered descriptor, described once per process, ordered by type name.
static REGISTERED: Lazy<Vec<ComponentDescriptor>> = Lazy::new(|| {
    let mut descriptors: Vec<ComponentDescriptor> = inventory::iter::<ComponentRegistration>
        .into_iter()
        .map(ComponentRegistration::describe)
        .collect();
    descriptors.sort_by(|a, b| a.key().type_name().cmp(b.key().type_name()));
    debug!(registered = descriptors.len(), "Collected component registrations");
    descriptors
});

/// Discovers components registered with `#[derive(Component)]`.
///
/// Results are ordered by fully qualified type name, which keeps the
/// driver's iteration order stable from run to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryDiscovery;

impl Discovery for InventoryDiscovery {
    fn discover(&self, namespace: &Namespace) -> Result<Vec<ComponentDescriptor>, BoxError> {
        let found: Vec<ComponentDescriptor> = REGISTERED
            .iter()
            .filter(|descriptor| namespace.contains(descriptor.namespace()))
            .cloned()
            .collect();
        trace!(namespace = %namespace, found = found.len(), "Scanned registrations");
        Ok(found)
    }
}

/// An explicit, insertion-ordered list of descriptors.
///
/// ```
/// use graft_container::descriptor::ComponentDescriptor;
/// use graft_container::discovery::{Catalog, Discovery, Namespace};
///
/// struct Clock;
///
/// let catalog = Catalog::new().with_descriptor(
///     ComponentDescriptor::builder::<Clock>()
///         .namespace("app::time")
///         .constructor(vec![], |_| Ok(Clock))
///         .build(),
/// );
///
/// let app = Namespace::parse("app").unwrap();
/// assert_eq!(catalog.discover(&app).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descriptors: Vec<ComponentDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the descriptor of a [`Component`] type.
    pub fn with<T: Component>(self) -> Self {
        self.with_descriptor(T::descriptor())
    }

    pub fn with_descriptor(mut self, descriptor: ComponentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Discovery for Catalog {
    fn discover(&self, namespace: &Namespace) -> Result<Vec<ComponentDescriptor>, BoxError> {
        Ok(self
            .descriptors
            .iter()
            .filter(|descriptor| namespace.contains(descriptor.namespace()))
            .cloned()
            .collect())
    }
}
