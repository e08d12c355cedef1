//! Descriptor table — every component discovered for one run.
//!
//! The table keeps discovery order (the driver iterates it as-is), indexes
//! descriptors by type and answers "who provides this type?" queries.
//! It is built once and never modified afterwards.

use std::collections::HashMap;

use tracing::debug;

use crate::descriptor::ComponentDescriptor;
use crate::error::{AlreadyRegisteredError, GraftError, MethodKind, Result, SignatureError};
use crate::key::DependencyKey;
use crate::provider::FactoryMethod;

/// Ordered, type-indexed set of component descriptors.
#[derive(Debug, Default)]
pub struct DescriptorTable {
    descriptors: Vec<ComponentDescriptor>,
    index: HashMap<DependencyKey, usize>,
}

impl DescriptorTable {
    /// Builds a table, preserving the given order.
    ///
    /// # Errors
    /// - [`GraftError::AlreadyRegistered`] if two descriptors share a type
    /// - [`GraftError::InvalidSignature`] if a factory method declares parameters
    pub fn new(descriptors: Vec<ComponentDescriptor>) -> Result<Self> {
        let mut table = Self {
            descriptors: Vec::with_capacity(descriptors.len()),
            index: HashMap::with_capacity(descriptors.len()),
        };

        for descriptor in descriptors {
            table.register(descriptor)?;
        }

        Ok(table)
    }

    fn register(&mut self, descriptor: ComponentDescriptor) -> Result<()> {
        let key = descriptor.key().clone();

        if self.index.contains_key(&key) {
            return Err(GraftError::AlreadyRegistered(AlreadyRegisteredError { key }));
        }

        for factory in descriptor.factories() {
            check_factory_signature(&key, factory)?;
        }

        debug!(
            component = %key,
            provides = descriptor.factories().len(),
            "Registered component"
        );
        self.index.insert(key, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Looks up the descriptor producing exactly `key`.
    pub fn get(&self, key: &DependencyKey) -> Option<&ComponentDescriptor> {
        self.index.get(key).map(|&position| &self.descriptors[position])
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.index.contains_key(key)
    }

    /// First descriptor (in table order) declaring a factory for `key`.
    pub fn provider_of(&self, key: &DependencyKey) -> Option<(&ComponentDescriptor, &FactoryMethod)> {
        self.descriptors
            .iter()
            .find_map(|descriptor| descriptor.factory_for(key).map(|factory| (descriptor, factory)))
    }

    /// First descriptor (in table order) declaring capability `key`.
    pub fn implementor_of(&self, key: &DependencyKey) -> Option<&ComponentDescriptor> {
        self.descriptors.iter().find(|descriptor| {
            descriptor
                .capabilities()
                .iter()
                .any(|capability| capability.key() == key)
        })
    }

    /// Descriptors in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Type names of every component (for "did you mean?" suggestions).
    pub fn type_names(&self) -> Vec<&'static str> {
        self.descriptors
            .iter()
            .map(|descriptor| descriptor.key().type_name())
            .collect()
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a ComponentDescriptor;
    type IntoIter = std::slice::Iter<'a, ComponentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Rejects factory methods that declare parameters.
pub(crate) fn check_factory_signature(owner: &DependencyKey, factory: &FactoryMethod) -> Result<()> {
    if factory.parameters().is_empty() {
        return Ok(());
    }

    Err(GraftError::InvalidSignature(SignatureError {
        kind: MethodKind::Factory,
        owner: owner.clone(),
        method: factory.name().to_string(),
        parameters: factory.parameters().len(),
    }))
}
