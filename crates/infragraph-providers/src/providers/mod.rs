//! Per-cloud providers and the namespace registry that dispatches to them

pub mod aws;
pub mod azurerm;
pub mod flexibleengine;
pub mod google;
pub mod openstack;
pub mod scaleway;

use std::collections::BTreeMap;
use std::sync::Arc;

use infragraph_core::Role;
use thiserror::Error;
use tracing::trace;

use crate::extractor::{Provider, RoleClassifier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a provider is already registered for namespace {0:?}")]
    Duplicate(String),
    #[error("provider namespace must not be empty")]
    EmptyNamespace,
}

/// Immutable mapping from type prefix to provider.
///
/// Built once (usually with [`ProviderRegistry::builtin`]) and passed to the
/// generation entry points; lookups never mutate it, so one registry can be
/// shared across threads.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<&'static str, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// An empty registry. Every type classifies as [`Role::Unknown`].
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// The registry with every bundled provider.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let bundled: [Arc<dyn Provider>; 6] = [
            Arc::new(aws::Aws),
            Arc::new(azurerm::Azurerm),
            Arc::new(flexibleengine::FlexibleEngine),
            Arc::new(google::Google),
            Arc::new(openstack::OpenStack),
            Arc::new(scaleway::Scaleway),
        ];
        for provider in bundled {
            // Bundled namespaces are distinct.
            let _ = registry.register(provider);
        }
        registry
    }

    /// Register a provider. Fails if its namespace is already taken.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let namespace = provider.namespace();
        if namespace.is_empty() {
            return Err(RegistryError::EmptyNamespace);
        }
        if self.providers.contains_key(namespace) {
            return Err(RegistryError::Duplicate(namespace.to_string()));
        }
        self.providers.insert(namespace, provider);
        Ok(())
    }

    /// The provider owning `resource_type`, matched by namespace prefix.
    /// When namespaces nest, the longest one wins.
    pub fn provider_for(&self, resource_type: &str) -> Option<&Arc<dyn Provider>> {
        self.providers
            .iter()
            .filter(|(namespace, _)| resource_type.starts_with(*namespace))
            .max_by_key(|(namespace, _)| namespace.len())
            .map(|(_, provider)| provider)
    }

    /// Role of a type; [`Role::Unknown`] when no provider owns it.
    pub fn classify(&self, resource_type: &str) -> Role {
        match self.provider_for(resource_type) {
            Some(provider) => provider.role(resource_type),
            None => {
                trace!(resource_type, "no provider owns this type");
                Role::Unknown
            }
        }
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    /// Registered providers, sorted by namespace.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("namespaces", &self.namespaces())
            .finish()
    }
}

/// Look a type up in a provider's node, no-security-group and edge tables.
pub(crate) fn role_from_tables(
    resource_type: &str,
    nodes: &[&str],
    no_security_group: &[&str],
    edges: &[&str],
) -> Role {
    if no_security_group.contains(&resource_type) {
        Role::NoSecurityGroup
    } else if nodes.contains(&resource_type) {
        Role::Node
    } else if edges.contains(&resource_type) {
        Role::Edge
    } else {
        Role::Unknown
    }
}
