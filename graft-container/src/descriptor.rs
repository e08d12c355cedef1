//! Component descriptors — the static metadata the resolver works from.
//!
//! A [`ComponentDescriptor`] records how to build one component type:
//! its constructor parameters (graph dependencies or named properties),
//! the values it can manufacture as a provider, the capabilities it
//! satisfies and the hooks to run once it is built.
//!
//! Descriptors are produced ahead of resolution, either by
//! `#[derive(Component)]` or by hand with [`ComponentDescriptor::builder`].
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use graft_container::descriptor::{ComponentDescriptor, Parameter};
//!
//! struct Database { url: String }
//! struct UserRepo { db: Arc<Database> }
//!
//! let database = ComponentDescriptor::builder::<Database>()
//!     .constructor(vec![Parameter::property("database.url")], |args| {
//!         Ok(Database { url: args.property()?.unwrap_or_default() })
//!     })
//!     .build();
//!
//! let repo = ComponentDescriptor::builder::<UserRepo>()
//!     .constructor(vec![Parameter::dependency::<Arc<Database>>()], |args| {
//!         Ok(UserRepo { db: args.dependency()? })
//!     })
//!     .build();
//!
//! assert_eq!(repo.dependency_types(), vec![database.key().clone()]);
//! assert_eq!(database.property_params(), vec![(0, "database.url")]);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{BoxError, ConstructorStalemateError, GraftError, Result};
use crate::key::DependencyKey;
use crate::provider::{CapabilityView, Dependency, FactoryMethod, Instance, share};

/// Erased constructor body.
pub type ConstructFn = Arc<dyn Fn(&mut Arguments) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Erased lifecycle hook body.
pub type HookFn = Arc<dyn Fn(&Instance) -> std::result::Result<(), BoxError> + Send + Sync>;

/// A type that can describe itself to the resolver.
///
/// Usually implemented with `#[derive(Component)]`.
pub trait Component: Sized + Send + Sync + 'static {
    fn descriptor() -> ComponentDescriptor;
}

/// One constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// Resolved from the graph (component or provider).
    Dependency(DependencyKey),
    /// Resolved from the property source by key.
    Property(String),
}

impl Parameter {
    /// A graph dependency on whatever `D` extracts.
    pub fn dependency<D: Dependency>() -> Self {
        Parameter::Dependency(D::key())
    }

    pub fn property(key: impl Into<String>) -> Self {
        Parameter::Property(key.into())
    }
}

/// A resolved constructor argument.
#[derive(Clone)]
pub enum Argument {
    Instance(DependencyKey, Instance),
    Property(Option<String>),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Instance(key, _) => f.debug_tuple("Instance").field(key).finish(),
            Argument::Property(value) => f.debug_tuple("Property").field(value).finish(),
        }
    }
}

/// Resolved arguments handed to a constructor, consumed in declared order.
#[derive(Debug)]
pub struct Arguments {
    component: DependencyKey,
    values: std::vec::IntoIter<Argument>,
}

impl Arguments {
    pub fn new(component: DependencyKey, values: Vec<Argument>) -> Self {
        Self {
            component,
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as a graph dependency.
    pub fn dependency<D: Dependency>(&mut self) -> std::result::Result<D, BoxError> {
        match self.values.next() {
            Some(Argument::Instance(key, instance)) => D::from_instance(instance).ok_or_else(|| {
                format!(
                    "argument of type {key} cannot be taken as {} by {}",
                    type_name::<D>(),
                    self.component
                )
                .into()
            }),
            Some(Argument::Property(_)) => Err(format!(
                "{} expected a dependency but the next parameter is a property",
                self.component
            )
            .into()),
            None => Err(self.exhausted()),
        }
    }

    /// Takes the next argument as a property value.
    pub fn property(&mut self) -> std::result::Result<Option<String>, BoxError> {
        match self.values.next() {
            Some(Argument::Property(value)) => Ok(value),
            Some(Argument::Instance(key, _)) => Err(format!(
                "{} expected a property but the next parameter is the dependency {key}",
                self.component
            )
            .into()),
            None => Err(self.exhausted()),
        }
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn exhausted(&self) -> BoxError {
        format!("{} took more arguments than it declared", self.component).into()
    }
}

/// A constructor: its declared parameters plus the erased body.
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    build: ConstructFn,
}

impl Constructor {
    pub fn new(parameters: Vec<Parameter>, build: ConstructFn) -> Self {
        Self { parameters, build }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn instantiate(&self, mut arguments: Arguments) -> std::result::Result<Instance, BoxError> {
        (self.build)(&mut arguments)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Converts a hook's return value into success or failure.
pub trait HookOutcome {
    fn into_outcome(self) -> std::result::Result<(), BoxError>;
}

impl HookOutcome for () {
    fn into_outcome(self) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> HookOutcome for std::result::Result<(), E> {
    fn into_outcome(self) -> std::result::Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A post-construction hook.
#[derive(Clone)]
pub struct LifecycleHook {
    name: String,
    parameters: Vec<DependencyKey>,
    run: HookFn,
}

impl LifecycleHook {
    /// Declares a hook as reported by a discovery collaborator.
    ///
    /// Hooks must not take parameters; one that does aborts the run when
    /// its owner is constructed.
    pub fn new(name: impl Into<String>, parameters: Vec<DependencyKey>, run: HookFn) -> Self {
        Self {
            name: name.into(),
            parameters,
            run,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[DependencyKey] {
        &self.parameters
    }

    pub(crate) fn run(&self, instance: &Instance) -> std::result::Result<(), BoxError> {
        (self.run)(instance)
    }
}

impl fmt::Debug for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHook")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Static metadata for one component.
#[derive(Clone)]
pub struct ComponentDescriptor {
    key: DependencyKey,
    namespace: String,
    constructors: Vec<Constructor>,
    factories: Vec<FactoryMethod>,
    hooks: Vec<LifecycleHook>,
    capabilities: Vec<CapabilityView>,
}

impl ComponentDescriptor {
    /// Starts describing component type `T`.
    ///
    /// The namespace defaults to the module that declares `T`.
    pub fn builder<T: Any + Send + Sync>() -> ComponentBuilder<T> {
        ComponentBuilder::new()
    }

    /// Starts an empty descriptor for an erased type.
    pub fn erased(key: DependencyKey) -> Self {
        Self {
            namespace: key.module_path().to_string(),
            key,
            constructors: Vec::new(),
            factories: Vec::new(),
            hooks: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// The produced type.
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// Module path used for namespace discovery.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn factories(&self) -> &[FactoryMethod] {
        &self.factories
    }

    pub fn hooks(&self) -> &[LifecycleHook] {
        &self.hooks
    }

    pub fn capabilities(&self) -> &[CapabilityView] {
        &self.capabilities
    }

    /// Graph dependencies of the sole constructor, in parameter order.
    ///
    /// Empty when the component is not eligible for construction.
    pub fn dependency_types(&self) -> Vec<DependencyKey> {
        self.eligible_parameters()
            .filter_map(|parameter| match parameter {
                Parameter::Dependency(key) => Some(key.clone()),
                Parameter::Property(_) => None,
            })
            .collect()
    }

    /// `(position, key)` of every property-sourced parameter.
    pub fn property_params(&self) -> Vec<(usize, &str)> {
        self.eligible_parameters()
            .enumerate()
            .filter_map(|(position, parameter)| match parameter {
                Parameter::Property(key) => Some((position, key.as_str())),
                Parameter::Dependency(_) => None,
            })
            .collect()
    }

    /// Types this component manufactures once constructed.
    pub fn provided_types(&self) -> impl Iterator<Item = &DependencyKey> {
        self.factories.iter().map(FactoryMethod::returns)
    }

    /// The factory whose declared return type is exactly `key`.
    pub fn factory_for(&self, key: &DependencyKey) -> Option<&FactoryMethod> {
        self.factories.iter().find(|factory| factory.returns() == key)
    }

    /// Returns the single constructor, or a stalemate error.
    pub fn sole_constructor(&self) -> Result<&Constructor> {
        match self.constructors.as_slice() {
            [only] => Ok(only),
            all => Err(GraftError::ConstructorStalemate(ConstructorStalemateError {
                key: self.key.clone(),
                constructors: all.len(),
            })),
        }
    }

    pub fn push_constructor(&mut self, constructor: Constructor) {
        self.constructors.push(constructor);
    }

    pub fn push_factory(&mut self, factory: FactoryMethod) {
        self.factories.push(factory);
    }

    pub fn push_hook(&mut self, hook: LifecycleHook) {
        self.hooks.push(hook);
    }

    pub fn push_capability(&mut self, capability: CapabilityView) {
        self.capabilities.push(capability);
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    fn eligible_parameters(&self) -> impl Iterator<Item = &Parameter> {
        let parameters: &[Parameter] = match self.constructors.as_slice() {
            [only] => only.parameters(),
            _ => &[],
        };
        parameters.iter()
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("namespace", &self.namespace)
            .field("constructors", &self.constructors)
            .field("factories", &self.factories)
            .field("hooks", &self.hooks)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Typed builder for a [`ComponentDescriptor`].
pub struct ComponentBuilder<T> {
    descriptor: ComponentDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ComponentBuilder<T> {
    fn new() -> Self {
        Self {
            descriptor: ComponentDescriptor::erased(DependencyKey::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// Overrides the namespace used for discovery.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.descriptor.set_namespace(namespace);
        self
    }

    /// Adds a constructor. Declaring more than one leaves the component
    /// in a stalemate, reported when it is first constructed.
    pub fn constructor<F>(mut self, parameters: Vec<Parameter>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let build: ConstructFn = Arc::new(move |arguments: &mut Arguments| {
            build(arguments).map(|component| Arc::new(component) as Instance)
        });
        self.descriptor.push_constructor(Constructor::new(parameters, build));
        self
    }

    /// Declares a factory manufacturing `P` from the built component.
    ///
    /// The value is matched only as `P`. To have a provided value satisfy
    /// a `Capability<dyn Trait>` request, declare it with
    /// [`provides_shared`](Self::provides_shared) instead.
    pub fn provides<P: Any + Send + Sync>(
        self,
        name: impl Into<String>,
        factory: impl Fn(&T) -> P + Send + Sync + 'static,
    ) -> Self {
        self.try_provides::<P, BoxError>(name, move |component| Ok(factory(component)))
    }

    /// Declares a fallible factory manufacturing `P`.
    pub fn try_provides<P: Any + Send + Sync, E: Into<BoxError>>(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&T) -> std::result::Result<P, E> + Send + Sync + 'static,
    ) -> Self {
        let invoke = Arc::new(move |provider: &Instance| -> std::result::Result<Instance, BoxError> {
            let component = downcast_component::<T>(provider)?;
            factory(component)
                .map(|product| Arc::new(product) as Instance)
                .map_err(Into::into)
        });
        self.descriptor.push_factory(FactoryMethod::new(
            name,
            DependencyKey::of::<P>(),
            Vec::new(),
            invoke,
        ));
        self
    }

    /// Declares a factory manufacturing a shared trait object `C`.
    pub fn provides_shared<C: ?Sized + Send + Sync + 'static>(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&T) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        let invoke = Arc::new(move |provider: &Instance| -> std::result::Result<Instance, BoxError> {
            let component = downcast_component::<T>(provider)?;
            Ok(share(factory(component)))
        });
        self.descriptor.push_factory(FactoryMethod::new(
            name,
            DependencyKey::of::<C>(),
            Vec::new(),
            invoke,
        ));
        self
    }

    /// Declares that the component satisfies capability `C`.
    pub fn capability<C: ?Sized + Send + Sync + 'static>(
        mut self,
        upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        let view = Arc::new(move |instance: &Instance| -> Option<Instance> {
            Arc::clone(instance)
                .downcast::<T>()
                .ok()
                .map(|component| share(upcast(component)))
        });
        self.descriptor
            .push_capability(CapabilityView::new(DependencyKey::of::<C>(), view));
        self
    }

    /// Adds a post-construction hook. Hooks run in declaration order.
    pub fn after_create<R: HookOutcome>(
        mut self,
        name: impl Into<String>,
        hook: impl Fn(&T) -> R + Send + Sync + 'static,
    ) -> Self {
        let run = Arc::new(move |instance: &Instance| -> std::result::Result<(), BoxError> {
            let component = downcast_component::<T>(instance)?;
            hook(component).into_outcome()
        });
        self.descriptor
            .push_hook(LifecycleHook::new(name, Vec::new(), run));
        self
    }

    /// Adds a factory method declared by other means.
    pub fn factory_method(mut self, factory: FactoryMethod) -> Self {
        self.descriptor.push_factory(factory);
        self
    }

    /// Adds a lifecycle hook declared by other means.
    pub fn lifecycle_hook(mut self, hook: LifecycleHook) -> Self {
        self.descriptor.push_hook(hook);
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }
}

fn downcast_component<T: Any>(instance: &Instance) -> std::result::Result<&T, BoxError> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| format!("instance is not a {}", type_name::<T>()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine;

    struct Car {
        engine: Arc<Engine>,
        plate: Option<String>,
    }

    fn car() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Car>()
            .constructor(
                vec![Parameter::dependency::<Arc<Engine>>(), Parameter::property("car.plate")],
                |args| {
                    Ok(Car {
                        engine: args.dependency()?,
                        plate: args.property()?,
                    })
                },
            )
            .provides("wheel_count", |_: &Car| 4u8)
            .build()
    }

    #[test]
    fn builder_records_parameters() {
        let descriptor = car();
        assert_eq!(descriptor.key(), &DependencyKey::of::<Car>());
        assert_eq!(descriptor.dependency_types(), vec![DependencyKey::of::<Engine>()]);
        assert_eq!(descriptor.property_params(), vec![(1, "car.plate")]);
        assert_eq!(
            descriptor.provided_types().cloned().collect::<Vec<_>>(),
            vec![DependencyKey::of::<u8>()]
        );
    }

    #[test]
    fn default_namespace_is_declaring_module() {
        assert_eq!(car().namespace(), "graft_container::descriptor::tests");
        let overridden = ComponentDescriptor::builder::<Engine>().namespace("garage").build();
        assert_eq!(overridden.namespace(), "garage");
    }

    #[test]
    fn constructor_consumes_arguments_in_order() {
        let descriptor = car();
        let constructor = descriptor.sole_constructor().unwrap();
        let arguments = Arguments::new(
            DependencyKey::of::<Car>(),
            vec![
                Argument::Instance(DependencyKey::of::<Engine>(), Arc::new(Engine)),
                Argument::Property(Some("GR-4FT".into())),
            ],
        );

        let instance = constructor.instantiate(arguments).unwrap();
        let built = instance.downcast_ref::<Car>().unwrap();
        assert_eq!(built.plate.as_deref(), Some("GR-4FT"));
        let _engine: &Engine = &built.engine;
    }

    #[test]
    fn mismatched_argument_is_an_error() {
        let descriptor = car();
        let constructor = descriptor.sole_constructor().unwrap();
        let arguments = Arguments::new(
            DependencyKey::of::<Car>(),
            vec![Argument::Property(None), Argument::Property(None)],
        );

        let err = constructor.instantiate(arguments).err().unwrap();
        assert!(err.to_string().contains("expected a dependency"));
    }

    #[test]
    fn missing_constructor_is_stalemate() {
        let descriptor = ComponentDescriptor::builder::<Engine>().build();
        match descriptor.sole_constructor() {
            Err(GraftError::ConstructorStalemate(err)) => assert_eq!(err.constructors, 0),
            other => panic!("Expected ConstructorStalemate, got: {other:?}"),
        }
        assert!(descriptor.dependency_types().is_empty());
    }

    #[test]
    fn two_constructors_are_stalemate() {
        let descriptor = ComponentDescriptor::builder::<Engine>()
            .constructor(vec![], |_| Ok(Engine))
            .constructor(vec![Parameter::property("x")], |_| Ok(Engine))
            .build();

        match descriptor.sole_constructor() {
            Err(GraftError::ConstructorStalemate(err)) => assert_eq!(err.constructors, 2),
            other => panic!("Expected ConstructorStalemate, got: {other:?}"),
        }
    }

    #[test]
    fn hook_outcomes() {
        assert!(().into_outcome().is_ok());
        assert!(Ok::<(), String>(()).into_outcome().is_ok());
        assert_eq!(
            Err::<(), &str>("cold").into_outcome().unwrap_err().to_string(),
            "cold"
        );
    }

    #[test]
    fn hook_runs_against_instance() {
        use std::sync::atomic::{AtomicBool, Ordering};

        struct Sensor {
            armed: AtomicBool,
        }

        let descriptor = ComponentDescriptor::builder::<Sensor>()
            .constructor(vec![], |_| Ok(Sensor { armed: AtomicBool::new(false) }))
            .after_create("arm", |sensor: &Sensor| sensor.armed.store(true, Ordering::SeqCst))
            .build();

        let instance: Instance = Arc::new(Sensor { armed: AtomicBool::new(false) });
        descriptor.hooks()[0].run(&instance).unwrap();
        assert!(instance.downcast_ref::<Sensor>().unwrap().armed.load(Ordering::SeqCst));
    }
}
