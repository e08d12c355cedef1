//! Error types for Graft resolution runs.
//!
//! Every error here is terminal for the `inject` call that raised it.
//! Messages name the types involved and end with a hint.

use std::fmt;

use graft_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Boxed error produced by user code (constructors, factories, hooks, discovery).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Graft operations.
#[derive(Debug, thiserror::Error)]
pub enum GraftError {
    /// The discovery collaborator could not enumerate the namespace.
    #[error("Could not load namespace `{namespace}`: {source}")]
    NamespaceLoad {
        namespace: String,
        #[source]
        source: BoxError,
    },

    /// A component declares zero or several constructors.
    #[error("{}", .0)]
    ConstructorStalemate(ConstructorStalemateError),

    /// A type was re-entered while already on its own construction path.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A constructor parameter matches neither a component nor a provider.
    #[error("{}", .0)]
    UnknownDependency(UnknownDependencyError),

    /// The constructor or factory itself failed.
    #[error("Could not create instance for {key}: {source}")]
    InstantiationFailed {
        key: DependencyKey,
        #[source]
        source: BoxError,
    },

    /// A factory method or lifecycle hook declares parameters.
    #[error("{}", .0)]
    InvalidSignature(SignatureError),

    /// Two descriptors in one run share the same type.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),
}

/// Error when a component does not expose exactly one constructor.
#[derive(Debug)]
pub struct ConstructorStalemateError {
    /// The component that cannot be built
    pub key: DependencyKey,
    /// How many constructors it declares
    pub constructors: usize,
}

impl fmt::Display for ConstructorStalemateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Constructor stalemate for {}: expected exactly one constructor, found {}",
            self.key, self.constructors
        )?;
        write!(f, "\n  Hint: Declare a single constructor for this component")
    }
}

/// Error when a circular dependency is detected.
///
/// Shows the full construction path so you can see WHERE the loop closes.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Every type on the construction path, followed by the re-entered type.
    /// Example: ["A", "B", "C", "A"]
    pub chain: Vec<DependencyKey>,
}

impl CircularDependencyError {
    /// Renders the loop with short type names, e.g. `A -> B -> A`.
    pub fn path(&self) -> String {
        let names: Vec<String> = self.chain.iter().map(DependencyKey::short_name).collect();
        render_chain(&names)
    }

    /// Renders the loop with fully qualified type names.
    pub fn full_path(&self) -> String {
        let names: Vec<&str> = self.chain.iter().map(DependencyKey::type_name).collect();
        render_chain(&names)
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Circular dependency detected while injecting components: ({})",
            self.path()
        )?;
        write!(f, "\n  Types: {}", self.full_path())?;
        write!(
            f,
            "\n  Hint: Break the loop with a provider or by restructuring the constructors"
        )
    }
}

/// Error when a constructor parameter cannot be satisfied.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct UnknownDependencyError {
    /// The type that was requested
    pub requested: DependencyKey,
    /// The component whose constructor requested it
    pub required_by: DependencyKey,
    /// Known component types with similar names
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No injection candidates of type {} found to inject in {}",
            self.requested, self.required_by
        )?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Register a component of type {} or a provider with a factory returning it",
            self.requested.short_name()
        )
    }
}

/// Which kind of method carried an invalid signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Factory,
    LifecycleHook,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Factory => write!(f, "Factory method"),
            MethodKind::LifecycleHook => write!(f, "Lifecycle hook"),
        }
    }
}

/// Error when a factory method or lifecycle hook declares parameters.
#[derive(Debug)]
pub struct SignatureError {
    pub kind: MethodKind,
    /// The component declaring the method
    pub owner: DependencyKey,
    pub method: String,
    /// Number of declared parameters (always non-zero)
    pub parameters: usize,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} `{}` on {} declares {} parameter(s)",
            self.kind, self.method, self.owner, self.parameters
        )?;
        write!(f, "\n  Hint: {}s can only be declared without parameters", self.kind)
    }
}

/// Error when two descriptors of one run share a type.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub key: DependencyKey,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component already registered: {}", self.key)?;
        write!(
            f,
            "\n  Hint: Each component type may only be discovered once per namespace"
        )
    }
}

/// Convenient Result type for Graft operations.
pub type Result<T> = std::result::Result<T, GraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn unknown_dependency_error_display() {
        let err = GraftError::UnknownDependency(UnknownDependencyError {
            requested: DependencyKey::of::<Alpha>(),
            required_by: DependencyKey::of::<Beta>(),
            suggestions: vec!["my_app::Alphabet".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("No injection candidates of type graft_container::error::tests::Alpha"));
        assert!(msg.contains("found to inject in graft_container::error::tests::Beta"));
        assert!(msg.contains("- my_app::Alphabet"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = CircularDependencyError {
            chain: vec![
                DependencyKey::of::<Alpha>(),
                DependencyKey::of::<Beta>(),
                DependencyKey::of::<Alpha>(),
            ],
        };

        assert_eq!(err.path(), "Alpha -> Beta -> Alpha");
        let msg = GraftError::CircularDependency(err).to_string();
        assert!(msg.starts_with("Circular dependency detected"));
        assert!(msg.contains("(Alpha -> Beta -> Alpha)"));
    }

    #[test]
    fn same_short_names_stay_distinct_in_message() {
        mod orders {
            pub struct Repo;
        }
        mod users {
            pub struct Repo;
        }

        let err = CircularDependencyError {
            chain: vec![
                DependencyKey::of::<orders::Repo>(),
                DependencyKey::of::<users::Repo>(),
                DependencyKey::of::<orders::Repo>(),
            ],
        };

        assert_eq!(err.path(), "Repo -> Repo -> Repo");
        let msg = err.to_string();
        assert!(msg.contains("(Repo -> Repo -> Repo)"));
        assert!(msg.contains("orders::Repo -> "));
        assert!(msg.contains("users::Repo -> "));
    }

    #[test]
    fn stalemate_error_display() {
        let err = GraftError::ConstructorStalemate(ConstructorStalemateError {
            key: DependencyKey::of::<Alpha>(),
            constructors: 2,
        });

        let msg = err.to_string();
        assert!(msg.contains("Constructor stalemate"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn signature_error_display() {
        let err = SignatureError {
            kind: MethodKind::LifecycleHook,
            owner: DependencyKey::of::<Alpha>(),
            method: "warm_up".into(),
            parameters: 1,
        };

        let msg = err.to_string();
        assert!(msg.starts_with("Lifecycle hook `warm_up`"));
        assert!(msg.contains("1 parameter(s)"));
    }

    #[test]
    fn instantiation_error_keeps_source() {
        use std::error::Error as _;

        let err = GraftError::InstantiationFailed {
            key: DependencyKey::of::<Alpha>(),
            source: "boom".into(),
        };

        assert!(err.to_string().ends_with("boom"));
        assert_eq!(err.source().map(ToString::to_string), Some("boom".into()));
    }
}
