//! Chain contraction and edge cleanup

use crate::builder::RawGraph;
use infragraph_core::{Edge, EdgeId, Graph, Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Collapse every path through mediating vertices into a direct edge between
/// the Node-role resources at its ends.
///
/// One edge is emitted per (source, first hop, target); its canonicals are
/// the mediating resources lying on some path from that first hop to the
/// target, in forward discovery order. Parallel edges are left for
/// [`clean`] to merge.
pub fn contract(raw: &RawGraph<'_>) -> Graph {
    let mut graph = Graph::new();
    let mut node_of: HashMap<usize, NodeId> = HashMap::new();
    for (position, entry) in raw.entries().iter().enumerate() {
        if !entry.role.is_node() {
            continue;
        }
        if let Some(vertex) = entry.faces.ingress() {
            let id = graph.add_node(Node::from_resource(entry.resource, position));
            node_of.insert(vertex, id);
        }
    }

    let sources: Vec<(usize, NodeId)> = raw
        .entries()
        .iter()
        .filter(|entry| entry.role.is_node())
        .filter_map(|entry| entry.faces.ingress())
        .filter_map(|vertex| node_of.get(&vertex).map(|id| (vertex, *id)))
        .collect();

    for (vertex, source) in sources {
        for &hop in raw.successors(vertex) {
            if let Some(&target) = node_of.get(&hop) {
                graph.add_edge(source, target, Edge::direct());
                continue;
            }
            let walk = Walk::forward(raw, hop);
            for &target_vertex in &walk.targets {
                let Some(&target) = node_of.get(&target_vertex) else {
                    continue;
                };
                let canonicals = walk.canonicals_towards(raw, target_vertex);
                graph.add_edge(source, target, Edge::via(canonicals));
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "contracted mediating chains"
    );
    graph
}

/// Mediating vertices reachable from one first hop, plus the Node-role
/// vertices they lead to.
struct Walk {
    /// Mediating vertices in discovery order.
    order: Vec<usize>,
    visited: HashSet<usize>,
    targets: Vec<usize>,
}

impl Walk {
    fn forward(raw: &RawGraph<'_>, start: usize) -> Self {
        let mut walk = Walk {
            order: vec![start],
            visited: HashSet::from([start]),
            targets: Vec::new(),
        };
        let mut queue = VecDeque::from([start]);
        while let Some(vertex) = queue.pop_front() {
            for &next in raw.successors(vertex) {
                if raw.is_node(next) {
                    if !walk.targets.contains(&next) {
                        walk.targets.push(next);
                    }
                } else if walk.visited.insert(next) {
                    walk.order.push(next);
                    queue.push_back(next);
                }
            }
        }
        walk
    }

    /// Canonicals of the walked vertices that also reach `target`.
    fn canonicals_towards(&self, raw: &RawGraph<'_>, target: usize) -> Vec<String> {
        let mut on_path = HashSet::new();
        let mut stack: Vec<usize> = Vec::new();
        for &prev in raw.predecessors(target) {
            if self.visited.contains(&prev) && on_path.insert(prev) {
                stack.push(prev);
            }
        }
        while let Some(vertex) = stack.pop() {
            for &prev in raw.predecessors(vertex) {
                if self.visited.contains(&prev) && on_path.insert(prev) {
                    stack.push(prev);
                }
            }
        }

        let mut canonicals: Vec<String> = Vec::new();
        for vertex in self.order.iter().filter(|v| on_path.contains(*v)) {
            let canonical = raw.canonical(*vertex);
            if !canonicals.iter().any(|c| c == canonical) {
                canonicals.push(canonical.to_string());
            }
        }
        canonicals
    }
}

/// Merge parallel edges, fold reverse edges into the edge discovered first,
/// and drop self-loops. Running it twice changes nothing.
///
/// Edges leaving an external node are only merged, never folded.
pub fn clean(graph: &mut Graph) {
    let before = graph.edge_count();
    let mut kept: HashMap<(NodeId, NodeId), EdgeId> = HashMap::new();
    let ids: Vec<EdgeId> = graph.edge_ids().collect();

    for id in ids {
        let Some((source, target)) = graph.endpoints(id) else {
            continue;
        };
        if source == target {
            graph.remove_edge(id);
            continue;
        }
        let external = is_external(graph, source) || is_external(graph, target);
        let existing = kept.get(&(source, target)).copied().or_else(|| {
            if external {
                None
            } else {
                kept.get(&(target, source)).copied()
            }
        });
        match existing {
            Some(first) => {
                if let Some(edge) = graph.remove_edge(id) {
                    if let Some(weight) = graph.edge_mut(first) {
                        weight.absorb(edge.canonicals);
                    }
                }
            }
            None => {
                kept.insert((source, target), id);
            }
        }
    }

    debug!(before, after = graph.edge_count(), "cleaned edges");
}

fn is_external(graph: &Graph, id: NodeId) -> bool {
    graph.node(id).is_some_and(Node::is_external)
}
