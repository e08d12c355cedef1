//! Recursive resolution of the component graph.
//!
//! [`Resolver::construct`] builds one component, descending into its
//! constructor parameters first:
//! 1. reuse a cached instance of the exact type, if any
//! 2. fail if the type is already on the current construction path
//! 3. require exactly one constructor
//! 4. resolve each parameter: property, component, provider product, or a
//!    component declaring the requested capability
//! 5. instantiate, cache, run lifecycle hooks
//!
//! Cycle detection uses an [`AncestorChain`] that is copied and extended
//! on every traversed edge, so sibling branches of a DAG never see each
//! other's ancestors.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, instrument, trace, warn};

use graft_support::rendering::suggest_similar;

use crate::cache::{CacheEntry, SingletonCache};
use crate::descriptor::{Argument, Arguments, ComponentDescriptor, Parameter};
use crate::error::{
    CircularDependencyError, GraftError, MethodKind, Result, SignatureError, UnknownDependencyError,
};
use crate::key::DependencyKey;
use crate::properties::Properties;
use crate::provider::Instance;
use crate::registry::{DescriptorTable, check_factory_signature};

/// Maximum number of "did you mean?" suggestions in an unknown-dependency error.
const MAX_SUGGESTIONS: usize = 3;

/// Types currently under construction on one resolution path, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain {
    path: Vec<DependencyKey>,
}

impl AncestorChain {
    /// An empty chain for a top-level resolution request.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.path.contains(key)
    }

    /// A copy of this chain with `key` pushed on top.
    pub fn extended(&self, key: &DependencyKey) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(key.clone());
        Self { path }
    }

    /// The full path followed by `key`, showing the loop close.
    pub fn closed_by(&self, key: &DependencyKey) -> Vec<DependencyKey> {
        self.extended(key).path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn as_slice(&self) -> &[DependencyKey] {
        &self.path
    }
}

/// Builds components for one run against a table, a property source and a cache.
pub(crate) struct Resolver<'a> {
    table: &'a DescriptorTable,
    properties: &'a Properties,
    cache: &'a mut SingletonCache,
}

impl<'a> Resolver<'a> {
    pub fn new(
        table: &'a DescriptorTable,
        properties: &'a Properties,
        cache: &'a mut SingletonCache,
    ) -> Self {
        Self {
            table,
            properties,
            cache,
        }
    }

    /// Whether an instance of exactly this type is already cached.
    pub fn is_constructed(&self, key: &DependencyKey) -> bool {
        self.cache.contains(key)
    }

    /// Returns the instance for `descriptor`, building it if necessary.
    ///
    /// # Errors
    /// - [`GraftError::CircularDependency`] — type re-entered on its own path
    /// - [`GraftError::ConstructorStalemate`] — not exactly one constructor
    /// - [`GraftError::UnknownDependency`] — parameter has no component or provider
    /// - [`GraftError::InstantiationFailed`] — constructor or factory failed
    /// - [`GraftError::InvalidSignature`] — factory or hook declares parameters
    #[instrument(skip_all, level = "trace", fields(component = %descriptor.key()))]
    pub fn construct(
        &mut self,
        descriptor: &'a ComponentDescriptor,
        chain: &AncestorChain,
    ) -> Result<Instance> {
        let key = descriptor.key();

        if let Some(existing) = self.cache.find(key) {
            trace!(component = %key, "Reusing cached instance");
            return Ok(existing);
        }

        if chain.contains(key) {
            let cycle = chain.closed_by(key);
            let error = CircularDependencyError { chain: cycle };
            warn!(cycle = %error.path(), "Circular dependency detected!");
            return Err(GraftError::CircularDependency(error));
        }

        let constructor = descriptor.sole_constructor()?;

        let mut arguments = Vec::with_capacity(constructor.parameters().len());
        for parameter in constructor.parameters() {
            let argument = match parameter {
                Parameter::Property(name) => Argument::Property(self.resolve_property(name)),
                Parameter::Dependency(dependency) => {
                    let instance = self.resolve_dependency(dependency, descriptor, chain)?;
                    Argument::Instance(dependency.clone(), instance)
                }
            };
            arguments.push(argument);
        }

        let instance = constructor
            .instantiate(Arguments::new(key.clone(), arguments))
            .map_err(|source| GraftError::InstantiationFailed {
                key: key.clone(),
                source,
            })?;

        self.cache
            .insert(CacheEntry::component(descriptor, instance.clone()));
        debug!(component = %key, depth = chain.len(), "Constructed component");

        self.run_hooks(descriptor, &instance)?;
        Ok(instance)
    }

    /// Resolves one graph parameter of `consumer`.
    fn resolve_dependency(
        &mut self,
        dependency: &DependencyKey,
        consumer: &'a ComponentDescriptor,
        chain: &AncestorChain,
    ) -> Result<Instance> {
        let table = self.table;

        if let Some(target) = table.get(dependency) {
            return self.construct(target, &chain.extended(consumer.key()));
        }

        if let Some(instance) = self.resolve_provider(dependency, chain, consumer.key())? {
            return Ok(instance);
        }

        if let Some(implementor) = table.implementor_of(dependency) {
            self.construct(implementor, &chain.extended(consumer.key()))?;
            if let Some(view) = self.cache.find_assignable(dependency) {
                return Ok(view);
            }
        }

        let suggestions = suggest_similar(dependency.type_name(), &table.type_names(), MAX_SUGGESTIONS);
        Err(GraftError::UnknownDependency(UnknownDependencyError {
            requested: dependency.clone(),
            required_by: consumer.key().clone(),
            suggestions,
        }))
    }

    /// Finds or manufactures a value of `requested` through a provider.
    ///
    /// Returns `Ok(None)` when neither the cache nor any provider can
    /// satisfy the request.
    pub fn resolve_provider(
        &mut self,
        requested: &DependencyKey,
        chain: &AncestorChain,
        consumer: &DependencyKey,
    ) -> Result<Option<Instance>> {
        if let Some(existing) = self.cache.find_assignable(requested) {
            trace!(requested = %requested, "Reusing assignable instance");
            return Ok(Some(existing));
        }

        let table = self.table;
        let Some((provider, factory)) = table.provider_of(requested) else {
            return Ok(None);
        };
        check_factory_signature(provider.key(), factory)?;

        let provider_instance = self.construct(provider, &chain.extended(consumer))?;

        // Building the provider may already have produced the value.
        if let Some(existing) = self.cache.find_assignable(requested) {
            return Ok(Some(existing));
        }

        let product = factory
            .invoke(&provider_instance)
            .map_err(|source| GraftError::InstantiationFailed {
                key: requested.clone(),
                source,
            })?;

        debug!(
            provided = %requested,
            provider = %provider.key(),
            factory = factory.name(),
            "Manufactured provided value"
        );
        self.cache.insert(CacheEntry::provided(
            requested.clone(),
            provider.key().clone(),
            product.clone(),
        ));
        Ok(Some(product))
    }

    /// Looks a property up; a missing key resolves to `None`.
    fn resolve_property(&self, name: &str) -> Option<String> {
        let value = self.properties.get(name).map(str::to_string);
        if value.is_none() {
            debug!(property = name, "Property not set");
        }
        value
    }

    /// Runs lifecycle hooks in declaration order.
    ///
    /// Failures raised by a hook, returned errors and panics alike, are
    /// logged and swallowed; a hook that declares parameters aborts the run.
    fn run_hooks(&self, descriptor: &ComponentDescriptor, instance: &Instance) -> Result<()> {
        for hook in descriptor.hooks() {
            if !hook.parameters().is_empty() {
                return Err(GraftError::InvalidSignature(SignatureError {
                    kind: MethodKind::LifecycleHook,
                    owner: descriptor.key().clone(),
                    method: hook.name().to_string(),
                    parameters: hook.parameters().len(),
                }));
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook.run(instance)))
                .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()));

            match outcome {
                Ok(()) => trace!(component = %descriptor.key(), hook = hook.name(), "Ran lifecycle hook"),
                Err(failure) => error!(
                    component = %descriptor.key(),
                    hook = hook.name(),
                    error = %failure,
                    "Could not run lifecycle hook"
                ),
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("hook panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("hook panicked: {message}")
    } else {
        "hook panicked".to_string()
    }
}
