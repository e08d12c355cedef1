//! Providers, capabilities and typed dependency extraction.
//!
//! A *provider* is a component whose instance manufactures values of other
//! types through zero-argument factory methods. A *capability* is an
//! interface (usually a trait object) that an instance declares it
//! satisfies. Both feed the capability lookup of the singleton cache.
//!
//! # Value representation
//! Instances are stored type-erased as [`Instance`]. A sized type `T` is
//! stored as `Arc<T>`; a trait object `dyn C` is stored as `Arc<Arc<dyn C>>`.
//! [`Dependency`] knows how to get each shape back out.

use std::any::{Any, type_name};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::BoxError;
use crate::key::DependencyKey;

/// A type-erased, shared component instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erased factory method body: receives the provider instance.
pub type FactoryFn = Arc<dyn Fn(&Instance) -> Result<Instance, BoxError> + Send + Sync>;

/// Erased capability view: re-exposes an instance as another type.
pub type ViewFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// A constructor parameter type that can be pulled out of the graph.
pub trait Dependency: Sized {
    /// The key looked up in the descriptor table and cache.
    fn key() -> DependencyKey;

    /// Recovers the typed value from an erased instance.
    fn from_instance(instance: Instance) -> Option<Self>;
}

impl<T: Any + Send + Sync> Dependency for Arc<T> {
    fn key() -> DependencyKey {
        DependencyKey::of::<T>()
    }

    fn from_instance(instance: Instance) -> Option<Self> {
        instance.downcast::<T>().ok()
    }
}

/// A dependency on a capability, typically a trait object.
///
/// ```
/// use graft_container::provider::Capability;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// fn welcome(greeter: Capability<dyn Greeter>) -> String {
///     greeter.greet()
/// }
/// ```
pub struct Capability<C: ?Sized>(Arc<C>);

impl<C: ?Sized> Capability<C> {
    pub fn into_inner(self) -> Arc<C> {
        self.0
    }
}

impl<C: ?Sized> Clone for Capability<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C: ?Sized> Deref for Capability<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: ?Sized> fmt::Debug for Capability<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability<{}>", type_name::<C>())
    }
}

impl<C: ?Sized + Send + Sync + 'static> Dependency for Capability<C> {
    fn key() -> DependencyKey {
        DependencyKey::of::<C>()
    }

    fn from_instance(instance: Instance) -> Option<Self> {
        instance
            .downcast::<Arc<C>>()
            .ok()
            .map(|shared| Self(Arc::clone(&shared)))
    }
}

/// Erases an `Arc<C>` into the stored shape for capability `C`.
pub(crate) fn share<C: ?Sized + Send + Sync + 'static>(value: Arc<C>) -> Instance {
    Arc::new(value)
}

/// A factory method declared on a provider component.
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    returns: DependencyKey,
    parameters: Vec<DependencyKey>,
    invoke: FactoryFn,
}

impl FactoryMethod {
    /// Declares a factory method as reported by a discovery collaborator.
    ///
    /// Factories must not take parameters; one that does is rejected when
    /// the descriptor table is built.
    pub fn new(
        name: impl Into<String>,
        returns: DependencyKey,
        parameters: Vec<DependencyKey>,
        invoke: FactoryFn,
    ) -> Self {
        Self {
            name: name.into(),
            returns,
            parameters,
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared return type.
    pub fn returns(&self) -> &DependencyKey {
        &self.returns
    }

    pub fn parameters(&self) -> &[DependencyKey] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, provider: &Instance) -> Result<Instance, BoxError> {
        (self.invoke)(provider)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("returns", &self.returns)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// A declared capability of a component.
#[derive(Clone)]
pub struct CapabilityView {
    key: DependencyKey,
    view: ViewFn,
}

impl CapabilityView {
    pub fn new(key: DependencyKey, view: ViewFn) -> Self {
        Self { key, view }
    }

    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    pub(crate) fn apply(&self, instance: &Instance) -> Option<Instance> {
        (self.view)(instance)
    }
}

impl fmt::Debug for CapabilityView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityView").field(&self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn arc_dependency_round_trip() {
        let instance: Instance = Arc::new(41u32);
        let value = <Arc<u32> as Dependency>::from_instance(instance).unwrap();
        assert_eq!(*value, 41);
        assert_eq!(<Arc<u32> as Dependency>::key(), DependencyKey::of::<u32>());
    }

    #[test]
    fn arc_dependency_rejects_wrong_type() {
        let instance: Instance = Arc::new(String::from("nope"));
        assert!(<Arc<u32> as Dependency>::from_instance(instance).is_none());
    }

    #[test]
    fn capability_extracts_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = share(greeter);

        let capability = <Capability<dyn Greeter> as Dependency>::from_instance(instance).unwrap();
        assert_eq!(capability.greet(), "hello");
        assert_eq!(
            <Capability<dyn Greeter> as Dependency>::key(),
            DependencyKey::of::<dyn Greeter>()
        );
    }

    #[test]
    fn factory_method_invokes_erased_body() {
        let factory = FactoryMethod::new(
            "double",
            DependencyKey::of::<u64>(),
            vec![],
            Arc::new(|provider: &Instance| -> Result<Instance, BoxError> {
                let base = provider.downcast_ref::<u64>().ok_or("not a u64")?;
                Ok(Arc::new(base * 2) as Instance)
            }),
        );

        let provider: Instance = Arc::new(21u64);
        let product = factory.invoke(&provider).unwrap();
        assert_eq!(product.downcast_ref::<u64>(), Some(&42));
        assert_eq!(factory.name(), "double");
        assert!(factory.parameters().is_empty());
    }
}
