//! Resource classification and reference extraction, one provider per cloud

pub mod attrs;
pub mod extractor;
pub mod providers;

#[cfg(test)]
pub mod tests;

pub use extractor::{
    normalize_protocol, Exposure, Provider, Reference, ReferenceKind, ReferenceResolver,
    RoleClassifier,
};
pub use providers::{ProviderRegistry, RegistryError};
