//! Orange FlexibleEngine. Same resource shapes as OpenStack under its own
//! namespace.

use infragraph_core::{Resource, Role};

use super::{openstack, role_from_tables};
use crate::extractor::{Exposure, Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "flexibleengine_blockstorage_volume_v2",
    "flexibleengine_compute_instance_v2",
    "flexibleengine_lb_loadbalancer_v2",
];

const EDGES: &[&str] = &[
    "flexibleengine_compute_interface_attach_v2",
    "flexibleengine_compute_volume_attach_v2",
    "flexibleengine_lb_listener_v2",
    "flexibleengine_lb_member_v2",
    "flexibleengine_lb_pool_v2",
    "flexibleengine_networking_port_v2",
    "flexibleengine_networking_secgroup_rule_v2",
    "flexibleengine_networking_secgroup_v2",
];

pub struct FlexibleEngine;

impl Provider for FlexibleEngine {
    fn name(&self) -> &'static str {
        "flexibleengine"
    }

    fn namespace(&self) -> &'static str {
        "flexibleengine_"
    }
}

impl RoleClassifier for FlexibleEngine {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, &[], EDGES)
    }
}

impl ReferenceResolver for FlexibleEngine {
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        openstack::references(self.namespace(), resource)
    }

    fn aliases(&self, resource: &Resource) -> Vec<String> {
        openstack::aliases(self.namespace(), resource)
    }

    fn exposures(&self, resource: &Resource) -> Vec<Exposure> {
        openstack::exposures(self.namespace(), resource)
    }
}
