//! Singleton cache — the append-only store of built instances.
//!
//! Two lookups are offered and deliberately kept apart:
//! - [`SingletonCache::find`] matches the concrete type an entry was stored as.
//! - [`SingletonCache::find_assignable`] also matches declared capabilities,
//!   so provider-manufactured values and trait views are reused whoever
//!   produced them. The first matching entry in insertion order wins.
//!
//! Nothing is evicted or replaced during a run; callers check before they
//! insert.

use std::fmt;

use tracing::trace;

use crate::descriptor::ComponentDescriptor;
use crate::key::DependencyKey;
use crate::provider::Instance;

/// Where a cached instance came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Built from its own descriptor's constructor.
    Component,
    /// Manufactured by a factory method of the given provider.
    Provided { by: DependencyKey },
}

/// An instance plus the type information it is matched by.
#[derive(Clone)]
pub struct CacheEntry {
    key: DependencyKey,
    instance: Instance,
    origin: Origin,
    views: Vec<(DependencyKey, Instance)>,
}

impl CacheEntry {
    /// Entry for a component built from `descriptor`, with its capability views.
    pub(crate) fn component(descriptor: &ComponentDescriptor, instance: Instance) -> Self {
        let views = descriptor
            .capabilities()
            .iter()
            .filter_map(|capability| {
                capability
                    .apply(&instance)
                    .map(|view| (capability.key().clone(), view))
            })
            .collect();

        Self {
            key: descriptor.key().clone(),
            instance,
            origin: Origin::Component,
            views,
        }
    }

    /// Entry for a value manufactured by `provider`.
    pub(crate) fn provided(key: DependencyKey, provider: DependencyKey, instance: Instance) -> Self {
        Self {
            key,
            instance,
            origin: Origin::Provided { by: provider },
            views: Vec::new(),
        }
    }

    /// The concrete type this entry was stored as.
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Capability keys this entry can also be viewed as.
    pub fn capabilities(&self) -> impl Iterator<Item = &DependencyKey> {
        self.views.iter().map(|(key, _)| key)
    }

    fn satisfies(&self, key: &DependencyKey) -> Option<&Instance> {
        if &self.key == key {
            return Some(&self.instance);
        }
        self.views
            .iter()
            .find(|(capability, _)| capability == key)
            .map(|(_, view)| view)
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .field("capabilities", &self.capabilities().collect::<Vec<_>>())
            .finish()
    }
}

/// Append-only store of the instances built during one run.
#[derive(Debug, Default)]
pub struct SingletonCache {
    entries: Vec<CacheEntry>,
}

impl SingletonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-type lookup.
    pub fn find(&self, key: &DependencyKey) -> Option<Instance> {
        self.entries
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| entry.instance.clone())
    }

    /// Capability lookup: first entry that is, or can be viewed as, `key`.
    pub fn find_assignable(&self, key: &DependencyKey) -> Option<Instance> {
        self.entries.iter().find_map(|entry| entry.satisfies(key).cloned())
    }

    /// Appends an entry. No de-duplication happens here.
    pub fn insert(&mut self, entry: CacheEntry) {
        trace!(key = %entry.key, origin = ?entry.origin, "Caching instance");
        self.entries.push(entry);
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.entries.iter().any(|entry| &entry.key == key)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
