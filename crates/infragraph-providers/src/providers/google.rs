//! Google Cloud Platform

use infragraph_core::{Resource, Role};
use serde_json::Value;

use super::role_from_tables;
use crate::attrs;
use crate::extractor::{Exposure, Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "google_compute_instance",
    "google_container_cluster",
    "google_sql_database_instance",
    "google_storage_bucket",
];

const NO_SECURITY_GROUP: &[&str] = &["google_storage_bucket"];

const EDGES: &[&str] = &["google_compute_firewall"];

const FIREWALL: &str = "google_compute_firewall";

pub struct Google;

impl Provider for Google {
    fn name(&self) -> &'static str {
        "google"
    }

    fn namespace(&self) -> &'static str {
        "google_"
    }
}

impl RoleClassifier for Google {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, NO_SECURITY_GROUP, EDGES)
    }
}

impl ReferenceResolver for Google {
    /// Firewalls connect instances by network tag: traffic from instances
    /// carrying a source tag to instances carrying a target tag.
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        if resource.resource_type != FIREWALL || !is_ingress(&resource.attributes) {
            return Vec::new();
        }
        let attrs = &resource.attributes;
        let sources = attrs::field(attrs, "source_tags")
            .into_iter()
            .map(|tag| Reference::from(attrs::alias_key("tag", &tag)));
        let targets = attrs::field(attrs, "target_tags")
            .into_iter()
            .map(|tag| Reference::to(attrs::alias_key("tag", &tag)));
        sources.chain(targets).collect()
    }

    fn aliases(&self, resource: &Resource) -> Vec<String> {
        if resource.resource_type != "google_compute_instance" {
            return Vec::new();
        }
        let attrs = &resource.attributes;
        let mut keys: Vec<String> = attrs::field(attrs, "tags")
            .iter()
            .map(|tag| attrs::alias_key("tag", tag))
            .collect();
        keys.extend(
            attrs::nested(attrs, &["network_interface", "network_ip"])
                .iter()
                .map(|ip| attrs::alias_key("ip", ip)),
        );
        keys
    }

    fn exposures(&self, resource: &Resource) -> Vec<Exposure> {
        let attrs = &resource.attributes;
        if resource.resource_type != FIREWALL
            || !is_ingress(attrs)
            || !attrs::any_open_range(attrs, &["source_ranges"])
        {
            return Vec::new();
        }
        let mut exposures = Vec::new();
        for allow in attrs::blocks(attrs, "allow") {
            let protocol = attrs::first(allow, "protocol").unwrap_or_default();
            let ports = attrs::field(allow, "ports");
            if ports.is_empty() {
                exposures.push(Exposure::on_self(&protocol, 0, 65535));
            }
            for (from, to) in ports.iter().filter_map(|spec| attrs::port_range(spec)) {
                exposures.push(Exposure::on_self(&protocol, from, to));
            }
        }
        exposures
    }
}

fn is_ingress(attrs: &Value) -> bool {
    attrs::first(attrs, "direction").map_or(true, |d| d.eq_ignore_ascii_case("ingress"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn firewall(attributes: Value) -> Resource {
        Resource::new(vec![], FIREWALL, "fw", None, attributes)
    }

    #[test]
    fn tags_link_instances() {
        let fw = firewall(json!({"source_tags": ["bastion"], "target_tags": ["web"]}));
        assert_eq!(
            Google.references(&fw),
            vec![Reference::from("tag:bastion"), Reference::to("tag:web")]
        );

        let instance = Resource::new(
            vec![],
            "google_compute_instance",
            "web",
            None,
            json!({"tags": ["web"], "network_interface": [{"network_ip": "10.1.0.2"}]}),
        );
        assert_eq!(Google.aliases(&instance), vec!["tag:web", "ip:10.1.0.2"]);
    }

    #[test]
    fn egress_firewalls_are_ignored() {
        let fw = firewall(json!({"direction": "EGRESS", "target_tags": ["web"]}));
        assert!(Google.references(&fw).is_empty());
    }

    #[test]
    fn open_source_ranges() {
        let fw = firewall(json!({
            "source_ranges": ["0.0.0.0/0"],
            "allow": [
                {"protocol": "tcp", "ports": ["22", "8000-8080"]},
                {"protocol": "icmp"}
            ]
        }));
        let canonicals: Vec<String> = Google.exposures(&fw).iter().map(Exposure::canonical).collect();
        assert_eq!(
            canonicals,
            vec!["im_out.tcp/22->22", "im_out.tcp/8000->8080", "im_out.icmp/0->65535"]
        );
    }

    #[test]
    fn buckets_skip_security() {
        assert_eq!(Google.role("google_storage_bucket"), Role::NoSecurityGroup);
        assert_eq!(Google.role("google_compute_network"), Role::Unknown);
    }
}
