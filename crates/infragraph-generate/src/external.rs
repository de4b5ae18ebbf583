//! External node synthesis for resources reachable from anywhere

use crate::builder::RawGraph;
use infragraph_core::{Edge, Graph, Node, Role};
use infragraph_providers::ReferenceResolver;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Add an `im_out.<protocol>/<from>-><to>` node for every open ingress rule
/// and connect it to each Node-role resource the rule admits traffic to.
///
/// A rule admits traffic to the members of its group: the walk starts at the
/// group's ingress face and only moves between ingress faces, so it never
/// crosses into groups the exposed group itself may talk to. A group without
/// members passes traffic straight through to whatever its egress face
/// reaches.
pub fn synthesize(raw: &RawGraph<'_>, graph: &mut Graph) {
    let mut added = 0;
    for (position, entry) in raw.entries().iter().enumerate() {
        for exposure in entry.provider.exposures(entry.resource) {
            let groups = match &exposure.group {
                Some(key) => raw.resolve(key, entry.resource),
                None => vec![position],
            };
            if groups.is_empty() {
                debug!(
                    from = %entry.resource.address,
                    group = ?exposure.group,
                    "exposure on an unresolved group"
                );
                continue;
            }

            let canonical = exposure.canonical();
            for group in groups {
                for target in exposed_nodes(raw, group) {
                    let Some(target_id) = graph.node_id(raw.canonical(target)) else {
                        continue;
                    };
                    let external = graph.add_node(Node::new(canonical.as_str()));
                    graph.connect(external, target_id, Edge::direct());
                    added += 1;
                }
            }
        }
    }
    debug!(edges = added, "synthesized external exposures");
}

/// Node-role vertices receiving traffic that enters `group`.
fn exposed_nodes(raw: &RawGraph<'_>, group: usize) -> Vec<usize> {
    let entry = &raw.entries()[group];
    let mut targets = Vec::new();
    let (Some(ingress), Some(egress)) = (entry.faces.ingress(), entry.faces.egress()) else {
        return targets;
    };
    if entry.role.is_node() {
        if entry.role == Role::Node {
            targets.push(ingress);
        }
        return targets;
    }

    let mut visited = HashSet::from([ingress]);
    let mut queue = VecDeque::from([ingress]);
    if entry.conduit {
        visited.insert(egress);
        queue.push_back(egress);
    }
    while let Some(vertex) = queue.pop_front() {
        for &next in raw.successors(vertex) {
            let next_entry = raw.entry_of(next);
            if next_entry.role.is_node() {
                if next_entry.role == Role::Node && !targets.contains(&next) {
                    targets.push(next);
                }
            } else if next_entry.faces.ingress() == Some(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    targets
}
