//! OpenStack, and the reference rules shared with OpenStack-derived clouds

use infragraph_core::{Resource, Role};
use serde_json::Value;

use super::role_from_tables;
use crate::attrs;
use crate::extractor::{Exposure, Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "openstack_blockstorage_volume_v2",
    "openstack_blockstorage_volume_v3",
    "openstack_compute_instance_v2",
    "openstack_lb_loadbalancer_v2",
];

const EDGES: &[&str] = &[
    "openstack_compute_interface_attach_v2",
    "openstack_compute_volume_attach_v2",
    "openstack_lb_listener_v2",
    "openstack_lb_member_v2",
    "openstack_lb_pool_v2",
    "openstack_networking_port_v2",
    "openstack_networking_secgroup_rule_v2",
    "openstack_networking_secgroup_v2",
];

pub struct OpenStack;

impl Provider for OpenStack {
    fn name(&self) -> &'static str {
        "openstack"
    }

    fn namespace(&self) -> &'static str {
        "openstack_"
    }
}

impl RoleClassifier for OpenStack {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, &[], EDGES)
    }
}

impl ReferenceResolver for OpenStack {
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        references(self.namespace(), resource)
    }

    fn aliases(&self, resource: &Resource) -> Vec<String> {
        aliases(self.namespace(), resource)
    }

    fn exposures(&self, resource: &Resource) -> Vec<Exposure> {
        exposures(self.namespace(), resource)
    }
}

/// Resource kind with the namespace stripped: `compute_instance_v2`.
fn kind<'a>(namespace: &str, resource: &'a Resource) -> &'a str {
    resource
        .resource_type
        .strip_prefix(namespace)
        .unwrap_or(&resource.resource_type)
}

pub(crate) fn references(namespace: &str, resource: &Resource) -> Vec<Reference> {
    let attrs = &resource.attributes;
    match kind(namespace, resource) {
        "compute_instance_v2" => {
            let mut refs: Vec<Reference> = attrs::nested(attrs, &["network", "port"])
                .into_iter()
                .map(Reference::member_of)
                .collect();
            refs.extend(
                attrs::field(attrs, "security_groups")
                    .iter()
                    .map(|name| Reference::member_of(attrs::alias_key("secgroup", name))),
            );
            refs.extend(
                attrs::blocks(attrs, "block_device")
                    .into_iter()
                    .filter(|device| attrs::first(device, "source_type").as_deref() != Some("image"))
                    .flat_map(|device| attrs::field(device, "uuid"))
                    .map(Reference::to),
            );
            refs
        }
        "networking_port_v2" => attrs::field(attrs, "security_group_ids")
            .into_iter()
            .map(Reference::member_of)
            .collect(),
        "compute_interface_attach_v2" => {
            let mut refs: Vec<Reference> = attrs::field(attrs, "instance_id")
                .into_iter()
                .map(Reference::holds)
                .collect();
            refs.extend(attrs::field(attrs, "port_id").into_iter().map(Reference::member_of));
            refs
        }
        "compute_volume_attach_v2" => {
            let mut refs: Vec<Reference> = attrs::field(attrs, "instance_id")
                .into_iter()
                .map(Reference::from)
                .collect();
            refs.extend(attrs::field(attrs, "volume_id").into_iter().map(Reference::to));
            refs
        }
        "networking_secgroup_rule_v2" => rule_references(attrs),
        "lb_loadbalancer_v2" => attrs::field(attrs, "vip_port_id")
            .into_iter()
            .map(Reference::member_of)
            .collect(),
        "lb_listener_v2" => attrs::field(attrs, "loadbalancer_id")
            .into_iter()
            .map(Reference::from)
            .collect(),
        "lb_pool_v2" => {
            let listeners = attrs::field(attrs, "listener_id");
            let sources = if listeners.is_empty() {
                attrs::field(attrs, "loadbalancer_id")
            } else {
                listeners
            };
            sources.into_iter().map(Reference::from).collect()
        }
        "lb_member_v2" => {
            let mut refs: Vec<Reference> = attrs::field(attrs, "pool_id")
                .into_iter()
                .map(Reference::from)
                .collect();
            refs.extend(
                attrs::field(attrs, "address")
                    .iter()
                    .map(|ip| Reference::to(attrs::alias_key("ip", ip))),
            );
            refs
        }
        _ => Vec::new(),
    }
}

/// Rules link `remote_group_id` and `security_group_id` in the direction
/// given by `direction`.
fn rule_references(attrs: &Value) -> Vec<Reference> {
    let (Some(group), Some(remote)) = (
        attrs::first(attrs, "security_group_id"),
        attrs::first(attrs, "remote_group_id"),
    ) else {
        return Vec::new();
    };
    match attrs::first(attrs, "direction").as_deref() {
        Some("egress") => vec![Reference::from(group), Reference::to(remote)],
        _ => vec![Reference::from(remote), Reference::to(group)],
    }
}

pub(crate) fn aliases(namespace: &str, resource: &Resource) -> Vec<String> {
    let attrs = &resource.attributes;
    let ips = match kind(namespace, resource) {
        "compute_instance_v2" => {
            let mut ips = attrs::field(attrs, "access_ip_v4");
            ips.extend(attrs::field(attrs, "access_ip_v6"));
            ips.extend(attrs::nested(attrs, &["network", "fixed_ip_v4"]));
            ips.extend(attrs::nested(attrs, &["network", "fixed_ip_v6"]));
            ips
        }
        "networking_secgroup_v2" => {
            return attrs::field(attrs, "name")
                .iter()
                .map(|name| attrs::alias_key("secgroup", name))
                .collect();
        }
        _ => Vec::new(),
    };
    let mut keys: Vec<String> = Vec::new();
    for ip in ips {
        let key = attrs::alias_key("ip", &ip);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

pub(crate) fn exposures(namespace: &str, resource: &Resource) -> Vec<Exposure> {
    let attrs = &resource.attributes;
    if kind(namespace, resource) != "networking_secgroup_rule_v2" {
        return Vec::new();
    }
    let ingress = attrs::first(attrs, "direction").as_deref() != Some("egress");
    if !ingress || !attrs::any_open_range(attrs, &["remote_ip_prefix"]) {
        return Vec::new();
    }
    let Some(group) = attrs::first(attrs, "security_group_id") else {
        return Vec::new();
    };
    let protocol = attrs::first(attrs, "protocol").unwrap_or_default();
    let from = attrs::port(attrs, "port_range_min").unwrap_or(0);
    let to = attrs::port(attrs, "port_range_max").unwrap_or(65535);
    vec![Exposure::on(group, &protocol, from, to)]
}
