//! # The Container — graph driver of Graft
//!
//! Runs one resolution pass over every component discovered under a
//! namespace and keeps the resulting singletons.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──inject(ns)──> Discovery ──> DescriptorTable
//!                                                     │
//!                                      Resolver (recursive, per descriptor)
//!                                                     │
//!                                                     ▼
//!                                   Container { SingletonCache }
//! ```
//!
//! # Examples
//! ```rust
//! use graft_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Database { config: Arc<Config> }
//!
//! let catalog = Catalog::new()
//!     .with_descriptor(
//!         ComponentDescriptor::builder::<Config>()
//!             .namespace("app")
//!             .constructor(vec![Parameter::property("db.url")], |args| {
//!                 Ok(Config { url: args.property()?.unwrap_or_default() })
//!             })
//!             .build(),
//!     )
//!     .with_descriptor(
//!         ComponentDescriptor::builder::<Database>()
//!             .namespace("app")
//!             .constructor(vec![Parameter::dependency::<Arc<Config>>()], |args| {
//!                 Ok(Database { config: args.dependency()? })
//!             })
//!             .build(),
//!     );
//!
//! let container = Container::builder()
//!     .property("db.url", "postgres://localhost")
//!     .environment(catalog)
//!     .inject("app")
//!     .expect("Failed to inject");
//!
//! let database: Arc<Database> = container.get_injected().unwrap();
//! assert_eq!(database.config.url, "postgres://localhost");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cache::{CacheEntry, SingletonCache};
use crate::discovery::{Discovery, InventoryDiscovery, Namespace};
use crate::error::{GraftError, Result};
use crate::graph::{AncestorChain, Resolver};
use crate::key::DependencyKey;
use crate::properties::Properties;
use crate::provider::Instance;
use crate::registry::DescriptorTable;

// ============================================================
// ContainerBuilder
// ============================================================

/// Configures and runs one resolution pass.
///
/// Set the property source and, optionally, the discovery environment,
/// then call [`inject()`](ContainerBuilder::inject).
pub struct ContainerBuilder {
    properties: Properties,
    environment: Box<dyn Discovery>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            properties: Properties::new(),
            environment: Box::new(InventoryDiscovery),
        }
    }

    /// Replaces the property source.
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets a single property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties = self.properties.with(key, value);
        self
    }

    /// Replaces the discovery environment (defaults to [`InventoryDiscovery`]).
    pub fn environment(mut self, environment: impl Discovery + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    /// Discovers the namespace and builds every component in it.
    ///
    /// Fails fast: the first error aborts the pass and no container is
    /// returned.
    ///
    /// # Errors
    /// - [`GraftError::NamespaceLoad`] — invalid namespace or discovery failure
    /// - any error of [`DescriptorTable::new`] or the resolver
    #[instrument(skip(self), name = "container_inject")]
    pub fn inject(self, namespace: &str) -> Result<Container> {
        info!("Initializing injection");

        let namespace = Namespace::parse(namespace).map_err(|source| GraftError::NamespaceLoad {
            namespace: namespace.to_string(),
            source: Box::new(source),
        })?;

        let descriptors = self
            .environment
            .discover(&namespace)
            .map_err(|source| GraftError::NamespaceLoad {
                namespace: namespace.to_string(),
                source,
            })?;

        let table = DescriptorTable::new(descriptors)?;
        let mut cache = SingletonCache::new();

        {
            let mut resolver = Resolver::new(&table, &self.properties, &mut cache);
            for descriptor in &table {
                if resolver.is_constructed(descriptor.key()) {
                    continue;
                }
                resolver.construct(descriptor, &AncestorChain::new())?;
            }
        }

        for descriptor in &table {
            debug!(component = %descriptor.key(), "Found component");
        }
        info!(
            components = table.len(),
            instances = cache.len(),
            "Injection finished ✓"
        );

        Ok(Container {
            namespace,
            table,
            cache,
            properties: self.properties,
        })
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// The singletons produced by one successful resolution pass.
///
/// Created by [`ContainerBuilder::inject()`] or [`Container::inject()`].
pub struct Container {
    namespace: Namespace,
    table: DescriptorTable,
    cache: SingletonCache,
    properties: Properties,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Injects `namespace` using components registered with `#[derive(Component)]`.
    pub fn inject(properties: Properties, namespace: &str) -> Result<Container> {
        Self::builder().properties(properties).inject(namespace)
    }

    /// Exact-type lookup of a built instance.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.get_injected().unwrap();
    /// ```
    pub fn get_injected<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_injected_key(&DependencyKey::of::<T>())?
            .downcast::<T>()
            .ok()
    }

    /// Exact-type lookup by key, type-erased.
    pub fn get_injected_key(&self, key: &DependencyKey) -> Option<Instance> {
        self.cache.find(key)
    }

    /// Every cached instance, in the order it was built.
    pub fn candidates(&self) -> &[CacheEntry] {
        self.cache.entries()
    }

    /// The components discovered for this pass.
    pub fn descriptors(&self) -> &DescriptorTable {
        &self.table
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("namespace", &self.namespace.as_str())
            .field("components", &self.table.len())
            .field("instances", &self.cache.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::descriptor::{Arguments, Component, ComponentDescriptor, Parameter};
    pub use crate::discovery::{Catalog, Discovery, InventoryDiscovery, Namespace};
    pub use crate::error::{GraftError, Result};
    pub use crate::key::DependencyKey;
    pub use crate::properties::{FromProperty, Properties};
    pub use crate::provider::{Capability, Dependency};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Origin;
    use crate::descriptor::{ComponentDescriptor, Parameter};
    use crate::discovery::Catalog;
    use crate::error::BoxError;
    use crate::provider::Capability;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const NS: &str = "tree";

    fn component<T: Send + Sync + 'static>(
        parameters: Vec<Parameter>,
        make: fn() -> T,
    ) -> ComponentDescriptor {
        ComponentDescriptor::builder::<T>()
            .namespace(NS)
            .constructor(parameters, move |_| Ok(make()))
            .build()
    }

    fn dep<T: Send + Sync + 'static>() -> Parameter {
        Parameter::dependency::<Arc<T>>()
    }

    fn inject(catalog: Catalog) -> Result<Container> {
        Container::builder().environment(catalog).inject(NS)
    }

    #[test]
    fn shared_child_built_once() {
        struct ParentA;
        struct ParentB;
        struct ChildA;
        struct ChildB;
        struct ChildC;
        struct SharedChild;

        let catalog = Catalog::new()
            .with_descriptor(component(vec![dep::<ChildA>(), dep::<ChildB>()], || ParentA))
            .with_descriptor(component(vec![dep::<ChildC>()], || ParentB))
            .with_descriptor(component(vec![dep::<SharedChild>()], || ChildA))
            .with_descriptor(component(vec![dep::<SharedChild>()], || ChildB))
            .with_descriptor(component(vec![dep::<SharedChild>()], || ChildC))
            .with_descriptor(component(vec![], || SharedChild));

        let container = inject(catalog).unwrap();

        let mut occurrences: HashMap<DependencyKey, usize> = HashMap::new();
        for candidate in container.candidates() {
            *occurrences.entry(candidate.key().clone()).or_default() += 1;
        }
        assert_eq!(occurrences.len(), 6);
        assert!(occurrences.values().all(|&count| count == 1));
    }

    #[test]
    fn dependent_receives_cached_instance() {
        struct Child;
        struct Parent {
            child: Arc<Child>,
        }

        let catalog = Catalog::new()
            .with_descriptor(
                ComponentDescriptor::builder::<Parent>()
                    .namespace(NS)
                    .constructor(vec![dep::<Child>()], |args| {
                        Ok(Parent {
                            child: args.dependency()?,
                        })
                    })
                    .build(),
            )
            .with_descriptor(component(vec![], || Child));

        let container = inject(catalog).unwrap();
        let parent: Arc<Parent> = container.get_injected().unwrap();
        let child: Arc<Child> = container.get_injected().unwrap();
        assert!(Arc::ptr_eq(&parent.child, &child));
    }

    #[test]
    fn two_node_cycle() {
        struct CircularHalf;
        struct CircularOtherHalf;

        let catalog = Catalog::new()
            .with_descriptor(component(vec![dep::<CircularOtherHalf>()], || CircularHalf))
            .with_descriptor(component(vec![dep::<CircularHalf>()], || CircularOtherHalf));

        match inject(catalog) {
            Err(GraftError::CircularDependency(err)) => {
                assert_eq!(err.path(), "CircularHalf -> CircularOtherHalf -> CircularHalf");
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn provider_value_shared_between_consumers() {
        struct Factory;
        struct Product;
        struct First {
            product: Arc<Product>,
        }
        struct Second {
            product: Arc<Product>,
        }

        let catalog = Catalog::new()
            .with_descriptor(
                ComponentDescriptor::builder::<First>()
                    .namespace(NS)
                    .constructor(vec![dep::<Product>()], |args| {
                        Ok(First {
                            product: args.dependency()?,
                        })
                    })
                    .build(),
            )
            .with_descriptor(
                ComponentDescriptor::builder::<Second>()
                    .namespace(NS)
                    .constructor(vec![dep::<Product>()], |args| {
                        Ok(Second {
                            product: args.dependency()?,
                        })
                    })
                    .build(),
            )
            .with_descriptor(
                ComponentDescriptor::builder::<Factory>()
                    .namespace(NS)
                    .constructor(vec![], |_| Ok(Factory))
                    .provides("product", |_: &Factory| Product)
                    .build(),
            );

        let container = inject(catalog).unwrap();
        let first: Arc<First> = container.get_injected().unwrap();
        let second: Arc<Second> = container.get_injected().unwrap();
        assert!(Arc::ptr_eq(&first.product, &second.product));

        let provided: Vec<&CacheEntry> = container
            .candidates()
            .iter()
            .filter(|entry| matches!(entry.origin(), Origin::Provided { .. }))
            .collect();
        assert_eq!(provided.len(), 1);
        assert_eq!(provided[0].key(), &DependencyKey::of::<Product>());
    }

    #[test]
    fn capability_satisfied_by_built_component() {
        trait Clock: Send + Sync {
            fn now(&self) -> u64;
        }
        struct FixedClock;
        impl Clock for FixedClock {
            fn now(&self) -> u64 {
                7
            }
        }
        struct Scheduler {
            clock: Capability<dyn Clock>,
        }

        let catalog = Catalog::new()
            .with_descriptor(
                ComponentDescriptor::builder::<FixedClock>()
                    .namespace(NS)
                    .constructor(vec![], |_| Ok(FixedClock))
                    .capability::<dyn Clock>(|clock| -> Arc<dyn Clock> { clock })
                    .build(),
            )
            .with_descriptor(
                ComponentDescriptor::builder::<Scheduler>()
                    .namespace(NS)
                    .constructor(vec![Parameter::dependency::<Capability<dyn Clock>>()], |args| {
                        Ok(Scheduler {
                            clock: args.dependency()?,
                        })
                    })
                    .build(),
            );

        let container = inject(catalog).unwrap();
        let scheduler: Arc<Scheduler> = container.get_injected().unwrap();
        assert_eq!(scheduler.clock.now(), 7);
    }

    #[test]
    fn shared_trait_object_from_provider() {
        trait Greeter: Send + Sync {
            fn greet(&self) -> String;
        }
        struct Loud;
        impl Greeter for Loud {
            fn greet(&self) -> String {
                "HELLO".into()
            }
        }
        struct Greetings;
        struct Door {
            greeter: Capability<dyn Greeter>,
        }

        let catalog = Catalog::new()
            .with_descriptor(
                ComponentDescriptor::builder::<Door>()
                    .namespace(NS)
                    .constructor(vec![Parameter::dependency::<Capability<dyn Greeter>>()], |args| {
                        Ok(Door {
                            greeter: args.dependency()?,
                        })
                    })
                    .build(),
            )
            .with_descriptor(
                ComponentDescriptor::builder::<Greetings>()
                    .namespace(NS)
                    .constructor(vec![], |_| Ok(Greetings))
                    .provides_shared::<dyn Greeter>("greeter", |_: &Greetings| -> Arc<dyn Greeter> {
                        Arc::new(Loud)
                    })
                    .build(),
            );

        let container = inject(catalog).unwrap();
        let door: Arc<Door> = container.get_injected().unwrap();
        assert_eq!(door.greeter.greet(), "HELLO");
    }

    #[test]
    fn hooks_run_in_declaration_order() {
        struct Service {
            log: Mutex<Vec<&'static str>>,
        }

        let catalog = Catalog::new().with_descriptor(
            ComponentDescriptor::builder::<Service>()
                .namespace(NS)
                .constructor(vec![], |_| {
                    Ok(Service {
                        log: Mutex::new(Vec::new()),
                    })
                })
                .after_create("first", |s: &Service| s.log.lock().unwrap().push("first"))
                .after_create("broken", |_: &Service| Err::<(), _>("no network"))
                .after_create("second", |s: &Service| s.log.lock().unwrap().push("second"))
                .build(),
        );

        let container = inject(catalog).unwrap();
        let service: Arc<Service> = container.get_injected().unwrap();
        assert_eq!(*service.log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn invalid_namespace_is_load_failure() {
        match Container::builder().environment(Catalog::new()).inject("not a namespace") {
            Err(GraftError::NamespaceLoad { namespace, .. }) => assert_eq!(namespace, "not a namespace"),
            other => panic!("Expected NamespaceLoad, got: {other:?}"),
        }
    }

    #[test]
    fn discovery_failure_is_load_failure() {
        let broken = |_: &Namespace| -> std::result::Result<Vec<ComponentDescriptor>, BoxError> {
            Err("permission denied".into())
        };

        match Container::builder().environment(broken).inject("app") {
            Err(GraftError::NamespaceLoad { source, .. }) => {
                assert_eq!(source.to_string(), "permission denied");
            }
            other => panic!("Expected NamespaceLoad, got: {other:?}"),
        }
    }

    #[test]
    fn empty_namespace_yields_empty_container() {
        let container = inject(Catalog::new()).unwrap();
        assert!(container.candidates().is_empty());
        assert!(container.get_injected::<String>().is_none());
    }

    #[test]
    fn stalemate_aborts_pass() {
        struct Ambiguous;

        let catalog = Catalog::new().with_descriptor(
            ComponentDescriptor::builder::<Ambiguous>()
                .namespace(NS)
                .constructor(vec![], |_| Ok(Ambiguous))
                .constructor(vec![Parameter::property("mode")], |_| Ok(Ambiguous))
                .build(),
        );

        assert!(matches!(inject(catalog), Err(GraftError::ConstructorStalemate(_))));
    }

    #[test]
    fn debug_display() {
        struct Lonely;

        let container = inject(Catalog::new().with_descriptor(component(vec![], || Lonely))).unwrap();
        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("\"tree\""));
        assert!(debug.contains("instances: 1"));
    }
}
