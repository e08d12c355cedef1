//! Component identification keys.
//!
//! [`DependencyKey`] identifies a component type, a provided type or a
//! declared capability. It wraps a [`TypeId`] together with the type's
//! readable name so that diagnostics never print raw ids.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use graft_support::rendering::{module_of, shorten_type_name};

/// Identifies a type taking part in a resolution run.
///
/// Equality and hashing only look at the [`TypeId`]; the name is carried
/// for error messages and logging.
///
/// # Examples
/// ```
/// use graft_container::key::DependencyKey;
///
/// let key = DependencyKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.short_name(), "String");
/// ```
#[derive(Clone)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates a key for type `T`.
    ///
    /// Unsized types are accepted so that trait objects can be used as
    /// capability keys:
    ///
    /// ```
    /// use graft_container::key::DependencyKey;
    ///
    /// trait Greeter {}
    /// let key = DependencyKey::of::<dyn Greeter>();
    /// assert!(key.type_name().contains("Greeter"));
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`DependencyKey::of`] when possible; this exists for discovery
    /// collaborators that only carry erased type information.
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    /// Returns the [`TypeId`] of this key.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name with module paths stripped.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }

    /// Returns the module path that declares this type.
    pub fn module_path(&self) -> &'static str {
        module_of(self.type_name)
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
