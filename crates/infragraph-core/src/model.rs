//! Core data structures for the infrastructure graph

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable index of a node inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub u64);

/// Stable index of an edge inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct EdgeId(pub u64);

/// Prefix every synthesized external node canonical starts with.
pub const EXTERNAL_PREFIX: &str = "im_out.";

/// Instance key of a resource expanded by `count` or `for_each`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstanceKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Int(i) => write!(f, "[{}]", i),
            InstanceKey::Str(s) => write!(f, "[{:?}]", s),
        }
    }
}

/// A typed, address-qualified record produced by a resource source.
///
/// Read-only once built. `attributes` keeps the native representation of
/// the source (maps, lists, scalars) and is only consulted to find
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Fully qualified address, e.g. `module.lemp.aws_lb.front[0]`.
    pub address: String,
    /// Provider type, e.g. `aws_lb`.
    pub resource_type: String,
    /// Logical name inside its module.
    pub name: String,
    /// Module path in address form: `["module.lemp", "module.db[1]"]`.
    pub module_path: Vec<String>,
    pub index: Option<InstanceKey>,
    pub attributes: serde_json::Value,
}

impl Resource {
    /// Build a resource and derive its address from module path, type,
    /// name and instance key.
    pub fn new(
        module_path: Vec<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        index: Option<InstanceKey>,
        attributes: serde_json::Value,
    ) -> Self {
        let resource_type = resource_type.into();
        let name = name.into();
        let address = qualify(&module_path, &resource_type, &name, index.as_ref());
        Resource {
            address,
            resource_type,
            name,
            module_path,
            index,
            attributes,
        }
    }

    /// Module prefix of the address (`module.a.module.b`), empty for root.
    pub fn module_prefix(&self) -> String {
        self.module_path.join(".")
    }

    /// Top-level string attribute, if present.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Provider ID recorded in state (`id` attribute).
    pub fn id(&self) -> Option<&str> {
        self.attr_str("id").filter(|s| !s.is_empty())
    }
}

/// Join module path, type, name and key into a resource address.
pub fn qualify(
    module_path: &[String],
    resource_type: &str,
    name: &str,
    index: Option<&InstanceKey>,
) -> String {
    let mut address = String::new();
    for segment in module_path {
        address.push_str(segment);
        address.push('.');
    }
    address.push_str(resource_type);
    address.push('.');
    address.push_str(name);
    if let Some(key) = index {
        address.push_str(&key.to_string());
    }
    address
}

/// Semantic role a provider assigns to a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// First-class infrastructure, always materialized as a node.
    Node,
    /// Mediating resource: only ever appears in an edge's canonicals.
    Edge,
    /// A node that never takes part in security-group chains.
    NoSecurityGroup,
    /// Ignored entirely.
    Unknown,
}

impl Role {
    /// True for the roles that become graph nodes.
    pub fn is_node(self) -> bool {
        matches!(self, Role::Node | Role::NoSecurityGroup)
    }

    pub fn is_edge(self) -> bool {
        self == Role::Edge
    }
}

/// A node in the output graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub canonical: String,
    /// Back-reference to the originating resource. `None` for external nodes.
    #[serde(skip)]
    pub resource: Option<ResourceRef>,
}

impl Node {
    pub fn new(canonical: impl Into<String>) -> Self {
        Node {
            canonical: canonical.into(),
            resource: None,
        }
    }

    pub fn from_resource(resource: &Resource, position: usize) -> Self {
        Node {
            canonical: resource.address.clone(),
            resource: Some(ResourceRef {
                position,
                resource_type: resource.resource_type.clone(),
            }),
        }
    }

    pub fn is_external(&self) -> bool {
        self.canonical.starts_with(EXTERNAL_PREFIX)
    }
}

/// Opaque pointer back to the resource a node came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Position of the resource in the source's ordered list.
    pub position: usize,
    pub resource_type: String,
}

/// Edge payload: the mediating resources that caused it, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub canonicals: Vec<String>,
}

impl Edge {
    pub fn direct() -> Self {
        Edge::default()
    }

    pub fn via(canonicals: Vec<String>) -> Self {
        let mut edge = Edge::default();
        edge.absorb(canonicals);
        edge
    }

    /// Append canonicals not already present, keeping first-seen order.
    pub fn absorb<I, S>(&mut self, canonicals: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for canonical in canonicals {
            let canonical = canonical.into();
            if !self.canonicals.contains(&canonical) {
                self.canonicals.push(canonical);
            }
        }
    }
}

/// Detached view of an edge with both endpoint canonicals resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub canonicals: Vec<String>,
}

impl EdgeView {
    pub fn new(source: impl Into<String>, target: impl Into<String>, canonicals: &[&str]) -> Self {
        EdgeView {
            source: source.into(),
            target: target.into(),
            canonicals: canonicals.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Attribute snapshot of every classified resource of a state file, keyed
/// by canonical address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedConfig(pub BTreeMap<String, serde_json::Value>);

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, canonical: impl Into<String>, attributes: serde_json::Value) {
        self.0.insert(canonical.into(), attributes);
    }

    pub fn get(&self, canonical: &str) -> Option<&serde_json::Value> {
        self.0.get(canonical)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
