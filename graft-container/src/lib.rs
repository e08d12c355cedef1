//! Core resolution engine for Graft.
//!
//! Components are described by [`ComponentDescriptor`]s, discovered per
//! namespace, and built exactly once by [`Container::inject`].

pub mod cache;
pub mod container;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod key;
pub mod properties;
pub mod provider;
pub mod registry;

pub use cache::{CacheEntry, Origin};
pub use container::{Container, ContainerBuilder, prelude};
pub use descriptor::{Arguments, Component, ComponentBuilder, ComponentDescriptor, HookOutcome, Parameter};
pub use discovery::{Catalog, ComponentRegistration, Discovery, InventoryDiscovery, Namespace};
pub use error::{BoxError, GraftError, Result};
pub use key::DependencyKey;
pub use properties::{FromProperty, Properties};
pub use provider::{Capability, Dependency, Instance};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
