//! Provider capability traits

use infragraph_core::{EXTERNAL_PREFIX, Resource, Role};
use serde::{Deserialize, Serialize};

/// How a referenced resource relates to the referrer, read as traffic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// The referrer sits inside the referenced group.
    MemberOf,
    /// The referenced resource sits inside the referrer.
    Holds,
    /// Traffic enters the referrer from the referenced resource.
    From,
    /// Traffic leaves the referrer towards the referenced resource.
    To,
}

/// A raw reference found in a resource's attributes.
///
/// `key` is whatever the attribute held: a provider ID from state, an HCL
/// interpolation like `${aws_security_group.front.id}`, or an alias such as
/// `tag:web`. Resolution happens in the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub key: String,
}

impl Reference {
    pub fn member_of(key: impl Into<String>) -> Self {
        Reference { kind: ReferenceKind::MemberOf, key: key.into() }
    }

    pub fn holds(key: impl Into<String>) -> Self {
        Reference { kind: ReferenceKind::Holds, key: key.into() }
    }

    pub fn from(key: impl Into<String>) -> Self {
        Reference { kind: ReferenceKind::From, key: key.into() }
    }

    pub fn to(key: impl Into<String>) -> Self {
        Reference { kind: ReferenceKind::To, key: key.into() }
    }
}

/// Ingress from an unrestricted source range onto some group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exposure {
    /// Reference key of the group the rule applies to; `None` means the
    /// resource carrying the rule.
    pub group: Option<String>,
    pub protocol: String,
    pub from_port: u32,
    pub to_port: u32,
}

impl Exposure {
    pub fn on_self(protocol: &str, from_port: u32, to_port: u32) -> Self {
        Exposure {
            group: None,
            protocol: normalize_protocol(protocol),
            from_port,
            to_port,
        }
    }

    pub fn on(group: impl Into<String>, protocol: &str, from_port: u32, to_port: u32) -> Self {
        Exposure {
            group: Some(group.into()),
            ..Exposure::on_self(protocol, from_port, to_port)
        }
    }

    /// Canonical of the external node standing for this exposure:
    /// `im_out.<protocol>/<from>-><to>`.
    pub fn canonical(&self) -> String {
        format!(
            "{}{}/{}->{}",
            EXTERNAL_PREFIX, self.protocol, self.from_port, self.to_port
        )
    }
}

/// Lowercase the protocol and map the "any protocol" spellings and IANA
/// numbers providers use to names.
pub fn normalize_protocol(protocol: &str) -> String {
    match protocol.trim().to_ascii_lowercase().as_str() {
        "" | "-1" | "all" | "any" | "*" => "all".to_string(),
        "6" => "tcp".to_string(),
        "17" => "udp".to_string(),
        "1" => "icmp".to_string(),
        other => other.to_string(),
    }
}

/// Classifies resource types into roles. Must be a pure table lookup.
pub trait RoleClassifier: Send + Sync {
    fn role(&self, resource_type: &str) -> Role;
}

/// Extracts references and exposures from a resource's attributes.
pub trait ReferenceResolver: Send + Sync {
    /// References to other resources, in attribute order.
    fn references(&self, resource: &Resource) -> Vec<Reference>;

    /// Extra lookup keys under which other resources may reference this one.
    fn aliases(&self, _resource: &Resource) -> Vec<String> {
        Vec::new()
    }

    /// Unrestricted ingress rules carried by this resource.
    fn exposures(&self, _resource: &Resource) -> Vec<Exposure> {
        Vec::new()
    }
}

/// A cloud provider: a type namespace plus both capabilities.
pub trait Provider: RoleClassifier + ReferenceResolver {
    /// Short name, e.g. `aws`.
    fn name(&self) -> &'static str;

    /// Type prefix owned by this provider, e.g. `aws_`.
    fn namespace(&self) -> &'static str;
}
