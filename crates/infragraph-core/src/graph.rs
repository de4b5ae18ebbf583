//! Graph wrapper using petgraph::StableDiGraph with a canonical-address index

use crate::model::*;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;

/// The infrastructure graph: nodes keyed by canonical address, directed
/// edges carrying the canonicals of the resources that mediate them.
///
/// Canonical strings are interned into petgraph indices; the string map is
/// only consulted at the boundary (insertion and lookup by address).
#[derive(Clone)]
pub struct Graph {
    inner: StableDiGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Add a node. A node with the same canonical is never duplicated: the
    /// existing id is returned instead.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        if let Some(idx) = self.index.get(&node.canonical) {
            return NodeId(idx.index() as u64);
        }
        let canonical = node.canonical.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(canonical, idx);
        NodeId(idx.index() as u64)
    }

    /// Add a parallel edge without looking for an existing one.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: Edge) -> EdgeId {
        let idx = self
            .inner
            .add_edge(node_index(source), node_index(target), edge);
        EdgeId(idx.index() as u64)
    }

    /// Add an edge, folding it into an existing edge between the same
    /// ordered pair when there is one.
    pub fn connect(&mut self, source: NodeId, target: NodeId, edge: Edge) -> EdgeId {
        match self.find_edge(source, target) {
            Some(existing) => {
                if let Some(weight) = self.edge_mut(existing) {
                    weight.absorb(edge.canonicals);
                }
                existing
            }
            None => self.add_edge(source, target, edge),
        }
    }

    /// Look a node up by canonical address.
    pub fn node_id(&self, canonical: &str) -> Option<NodeId> {
        self.index.get(canonical).map(|idx| NodeId(idx.index() as u64))
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.index.contains_key(canonical)
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.inner.node_weight(node_index(id))
    }

    /// Canonical of a node, or `""` if it is not in the graph.
    pub fn canonical(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| n.canonical.as_str())
    }

    /// Get an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.inner.edge_weight(edge_index(id))
    }

    /// Get a mutable edge by ID.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.inner.edge_weight_mut(edge_index(id))
    }

    /// Source and target of an edge.
    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.inner
            .edge_endpoints(edge_index(id))
            .map(|(s, t)| (NodeId(s.index() as u64), NodeId(t.index() as u64)))
    }

    /// First edge from `source` to `target`, if any.
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.inner
            .find_edge(node_index(source), node_index(target))
            .map(|idx| EdgeId(idx.index() as u64))
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Iterate over all node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inner
            .node_indices()
            .map(|idx| NodeId(idx.index() as u64))
    }

    /// Iterate over all edge ids in insertion order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.inner
            .edge_indices()
            .map(|idx| EdgeId(idx.index() as u64))
    }

    /// Canonicals of every node in insertion order.
    pub fn canonicals(&self) -> Vec<&str> {
        self.nodes().map(|n| n.canonical.as_str()).collect()
    }

    /// Every edge with its endpoints resolved to canonicals.
    pub fn edge_views(&self) -> Vec<EdgeView> {
        self.inner
            .edge_indices()
            .filter_map(|idx| {
                let (s, t) = self.inner.edge_endpoints(idx)?;
                let edge = self.inner.edge_weight(idx)?;
                Some(EdgeView {
                    source: self.inner[s].canonical.clone(),
                    target: self.inner[t].canonical.clone(),
                    canonicals: edge.canonicals.clone(),
                })
            })
            .collect()
    }

    /// The edge between two canonicals, if both nodes and the edge exist.
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&Edge> {
        let s = self.node_id(source)?;
        let t = self.node_id(target)?;
        self.find_edge(s, t).and_then(|e| self.edge(e))
    }

    /// Get all outgoing edge ids of a node.
    pub fn edges_from(&self, source: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.inner
            .edges_directed(node_index(source), Direction::Outgoing)
            .map(|edge_ref| EdgeId(edge_ref.id().index() as u64))
    }

    /// Get all incoming edge ids of a node.
    pub fn edges_to(&self, target: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.inner
            .edges_directed(node_index(target), Direction::Incoming)
            .map(|edge_ref| EdgeId(edge_ref.id().index() as u64))
    }

    /// Remove an edge by ID.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        self.inner.remove_edge(edge_index(id))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&Node> = self.nodes().collect();
        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &self.edge_views())?;
        state.end()
    }
}

fn node_index(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.0 as usize)
}

fn edge_index(id: EdgeId) -> EdgeIndex {
    EdgeIndex::new(id.0 as usize)
}
