//! Unit tests for infragraph-providers module

use crate::*;
use infragraph_core::{Resource, Role};
use serde_json::json;
use std::sync::Arc;

struct Custom;

impl RoleClassifier for Custom {
    fn role(&self, resource_type: &str) -> Role {
        match resource_type {
            "custom_box" => Role::Node,
            _ => Role::Unknown,
        }
    }
}

impl ReferenceResolver for Custom {
    fn references(&self, _resource: &Resource) -> Vec<Reference> {
        Vec::new()
    }
}

impl Provider for Custom {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn namespace(&self) -> &'static str {
        "custom_"
    }
}

#[test]
fn test_builtin_namespaces() {
    let registry = ProviderRegistry::builtin();
    assert_eq!(
        registry.namespaces(),
        vec!["aws_", "azurerm_", "flexibleengine_", "google_", "openstack_", "scaleway_"]
    );
    assert_eq!(registry.len(), 6);
}

#[test]
fn test_dispatch_by_prefix() {
    let registry = ProviderRegistry::builtin();
    let cases = vec![
        ("aws_instance", Some("aws"), Role::Node),
        ("aws_security_group", Some("aws"), Role::Edge),
        ("openstack_networking_port_v2", Some("openstack"), Role::Edge),
        ("flexibleengine_compute_instance_v2", Some("flexibleengine"), Role::Node),
        ("google_storage_bucket", Some("google"), Role::NoSecurityGroup),
        ("azurerm_virtual_network", Some("azurerm"), Role::Node),
        ("scaleway_k8s_pool_beta", Some("scaleway"), Role::Node),
        ("null_resource", None, Role::Unknown),
        ("awsinstance", None, Role::Unknown),
    ];

    for (resource_type, provider, role) in cases {
        assert_eq!(
            registry.provider_for(resource_type).map(|p| p.name()),
            provider,
            "provider for {}",
            resource_type
        );
        assert_eq!(registry.classify(resource_type), role, "role of {}", resource_type);
    }
}

#[test]
fn test_register_custom_provider() {
    let mut registry = ProviderRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.classify("custom_box"), Role::Unknown);

    registry.register(Arc::new(Custom)).unwrap();
    assert_eq!(registry.classify("custom_box"), Role::Node);
    assert_eq!(registry.classify("custom_other"), Role::Unknown);
}

#[test]
fn test_duplicate_registration_fails() {
    let mut registry = ProviderRegistry::builtin();
    let err = registry.register(Arc::new(providers::aws::Aws)).unwrap_err();
    assert_eq!(err, RegistryError::Duplicate("aws_".into()));
    assert_eq!(registry.len(), 6);
}

#[test]
fn test_tables_are_disjoint() {
    let registry = ProviderRegistry::builtin();
    let resource = Resource::new(vec![], "aws_s3_bucket", "b", None, json!({"security_groups": ["sg-1"]}));
    let provider = registry.provider_for(&resource.resource_type).unwrap();

    // Buckets never join security groups, whatever their attributes say.
    assert!(provider.references(&resource).is_empty());
    assert_eq!(provider.role("aws_s3_bucket"), Role::NoSecurityGroup);
}

#[test]
fn test_protocol_normalization() {
    assert_eq!(normalize_protocol("-1"), "all");
    assert_eq!(normalize_protocol("TCP"), "tcp");
    assert_eq!(normalize_protocol("6"), "tcp");
    assert_eq!(normalize_protocol("17"), "udp");
    assert_eq!(normalize_protocol(""), "all");
    assert_eq!(normalize_protocol("icmpv6"), "icmpv6");
}

#[test]
fn test_exposure_canonical() {
    let exposure = Exposure::on("sg-1", "-1", 0, 65535);
    assert_eq!(exposure.canonical(), "im_out.all/0->65535");
    assert_eq!(exposure.group.as_deref(), Some("sg-1"));
}
