//! Scaleway

use infragraph_core::{Resource, Role};

use super::role_from_tables;
use crate::attrs;
use crate::extractor::{Exposure, Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "scaleway_instance_placement_group",
    "scaleway_instance_server",
    "scaleway_k8s_cluster",
    "scaleway_k8s_cluster_beta",
    "scaleway_k8s_pool",
    "scaleway_k8s_pool_beta",
    "scaleway_lb",
    "scaleway_lb_beta",
    "scaleway_object_bucket",
    "scaleway_rdb_instance",
    "scaleway_rdb_instance_beta",
];

const NO_SECURITY_GROUP: &[&str] = &["scaleway_object_bucket"];

const EDGES: &[&str] = &["scaleway_instance_security_group"];

/// Direct node-to-node dependencies per type.
const DEPENDENCIES: &[(&str, &[&str])] = &[
    ("scaleway_k8s_pool", &["cluster_id", "placement_group_id"]),
    ("scaleway_k8s_pool_beta", &["cluster_id", "placement_group_id"]),
    ("scaleway_instance_server", &["placement_group_id"]),
];

pub struct Scaleway;

impl Provider for Scaleway {
    fn name(&self) -> &'static str {
        "scaleway"
    }

    fn namespace(&self) -> &'static str {
        "scaleway_"
    }
}

impl RoleClassifier for Scaleway {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, NO_SECURITY_GROUP, EDGES)
    }
}

impl ReferenceResolver for Scaleway {
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        let attrs = &resource.attributes;
        let mut refs: Vec<Reference> = DEPENDENCIES
            .iter()
            .filter(|(t, _)| *t == resource.resource_type)
            .flat_map(|(_, keys)| keys.iter())
            .flat_map(|key| attrs::field(attrs, key))
            .map(Reference::to)
            .collect();
        if resource.resource_type == "scaleway_instance_server" {
            refs.extend(attrs::field(attrs, "security_group_id").into_iter().map(Reference::member_of));
        }
        refs
    }

    fn exposures(&self, resource: &Resource) -> Vec<Exposure> {
        if resource.resource_type != "scaleway_instance_security_group" {
            return Vec::new();
        }
        attrs::blocks(&resource.attributes, "inbound_rule")
            .into_iter()
            .filter(|rule| attrs::first(rule, "action").as_deref() != Some("drop"))
            .filter(|rule| attrs::any_open_range(rule, &["ip_range", "ip"]))
            .map(|rule| {
                let protocol = attrs::first(rule, "protocol").unwrap_or_else(|| "tcp".to_string());
                let (from, to) = match attrs::port(rule, "port") {
                    Some(port) => (port, port),
                    None => attrs::first(rule, "port_range")
                        .and_then(|range| attrs::port_range(&range))
                        .unwrap_or((0, 65535)),
                };
                Exposure::on_self(&protocol, from, to)
            })
            .collect()
    }
}
