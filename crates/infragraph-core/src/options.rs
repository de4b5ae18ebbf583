//! Generation toggles

use serde::{Deserialize, Serialize};

/// The only knobs that affect graph generation. Every toggle defaults to
/// `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Contract chains of mediating resources and merge parallel edges.
    pub clean: bool,
    /// Traverse mediating resources at all.
    pub connections: bool,
    /// Synthesize `im_out.*` nodes for unrestricted ingress.
    pub external_nodes: bool,
}

impl Options {
    /// Everything on, the preset used by tooling.
    pub fn full() -> Self {
        Options {
            clean: true,
            connections: true,
            external_nodes: true,
        }
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_connections(mut self, connections: bool) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_external_nodes(mut self, external_nodes: bool) -> Self {
        self.external_nodes = external_nodes;
        self
    }
}
