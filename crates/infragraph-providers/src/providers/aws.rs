//! Amazon Web Services

use infragraph_core::{Resource, Role};
use serde_json::Value;

use super::role_from_tables;
use crate::attrs;
use crate::extractor::{Exposure, Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "aws_alb",
    "aws_api_gateway_resource",
    "aws_athena_database",
    "aws_autoscaling_group",
    "aws_batch_job_definition",
    "aws_cloudfront_distribution",
    "aws_dax_cluster",
    "aws_db_instance",
    "aws_directory_service_directory",
    "aws_dms_replication_instance",
    "aws_dx_gateway",
    "aws_dynamodb_table",
    "aws_ebs_volume",
    "aws_ecs_cluster",
    "aws_ecs_service",
    "aws_efs_file_system",
    "aws_eip",
    "aws_eks_cluster",
    "aws_elastic_beanstalk_application",
    "aws_elasticache_cluster",
    "aws_elasticache_replication_group",
    "aws_elasticsearch_domain",
    "aws_elb",
    "aws_emr_cluster",
    "aws_iam_user",
    "aws_instance",
    "aws_internet_gateway",
    "aws_kinesis_stream",
    "aws_lambda_function",
    "aws_launch_template",
    "aws_lb",
    "aws_lightsail_instance",
    "aws_media_store_container",
    "aws_mq_broker",
    "aws_nat_gateway",
    "aws_neptune_cluster",
    "aws_rds_cluster",
    "aws_rds_cluster_instance",
    "aws_redshift_cluster",
    "aws_s3_bucket",
    "aws_sqs_queue",
    "aws_storagegateway_gateway",
    "aws_vpn_gateway",
];

/// Nodes that never sit behind a security group.
const NO_SECURITY_GROUP: &[&str] = &["aws_cloudfront_distribution", "aws_s3_bucket"];

const EDGES: &[&str] = &["aws_security_group", "aws_security_group_rule"];

const SECURITY_GROUP: &str = "aws_security_group";
const SECURITY_GROUP_RULE: &str = "aws_security_group_rule";

/// Attribute paths that place a resource inside security groups.
const MEMBERSHIPS: &[&[&str]] = &[
    &["security_groups"],
    &["vpc_security_group_ids"],
    &["security_group_ids"],
    &["network_interfaces", "security_groups"],
    &["vpc_config", "security_group_ids"],
    &["vpc_options", "security_group_ids"],
    &["network_configuration", "security_groups"],
];

/// Node-to-node dependencies, read as traffic leaving the referrer.
const DEPENDENCIES: &[(&str, &[&str])] = &[
    ("aws_ecs_service", &["cluster"]),
    ("aws_eip", &["instance"]),
    ("aws_rds_cluster_instance", &["cluster_identifier"]),
    ("aws_cloudfront_distribution", &["origin", "domain_name"]),
];

const CIDRS: &[&str] = &["cidr_blocks", "ipv6_cidr_blocks"];

pub struct Aws;

impl Provider for Aws {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn namespace(&self) -> &'static str {
        "aws_"
    }
}

impl RoleClassifier for Aws {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, NO_SECURITY_GROUP, EDGES)
    }
}

impl ReferenceResolver for Aws {
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        let attrs = &resource.attributes;
        match resource.resource_type.as_str() {
            SECURITY_GROUP => group_references(resource),
            SECURITY_GROUP_RULE => rule_references(attrs),
            resource_type => {
                let mut refs = Vec::new();
                if self.role(resource_type) != Role::NoSecurityGroup {
                    refs.extend(
                        MEMBERSHIPS
                            .iter()
                            .flat_map(|path| attrs::nested(attrs, path))
                            .map(Reference::member_of),
                    );
                }
                if let Some((_, path)) = DEPENDENCIES.iter().find(|(t, _)| *t == resource_type) {
                    refs.extend(attrs::nested(attrs, path).into_iter().map(Reference::to));
                }
                refs
            }
        }
    }

    fn aliases(&self, resource: &Resource) -> Vec<String> {
        let keys: &[&str] = match resource.resource_type.as_str() {
            "aws_s3_bucket" => &["bucket_domain_name", "bucket_regional_domain_name", "arn"],
            "aws_lb" | "aws_alb" | "aws_elb" => &["dns_name", "arn"],
            _ => &["arn"],
        };
        keys.iter()
            .filter_map(|key| resource.attr_str(key))
            .filter(|value| !value.is_empty() && *value != resource.id().unwrap_or_default())
            .map(str::to_string)
            .collect()
    }

    fn exposures(&self, resource: &Resource) -> Vec<Exposure> {
        let attrs = &resource.attributes;
        match resource.resource_type.as_str() {
            SECURITY_GROUP => attrs::blocks(attrs, "ingress")
                .into_iter()
                .filter(|rule| attrs::any_open_range(rule, CIDRS))
                .map(|rule| {
                    let (protocol, from, to) = port_spec(rule);
                    Exposure::on_self(&protocol, from, to)
                })
                .collect(),
            SECURITY_GROUP_RULE => {
                let ingress = attrs::first(attrs, "type").as_deref() == Some("ingress");
                match attrs::first(attrs, "security_group_id") {
                    Some(group) if ingress && attrs::any_open_range(attrs, CIDRS) => {
                        let (protocol, from, to) = port_spec(attrs);
                        vec![Exposure::on(group, &protocol, from, to)]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Inline `ingress`/`egress` blocks of a security group.
fn group_references(group: &Resource) -> Vec<Reference> {
    let mut refs = Vec::new();
    for rule in attrs::blocks(&group.attributes, "ingress") {
        refs.extend(attrs::field(rule, "security_groups").into_iter().map(Reference::from));
        if attrs::truthy(rule, "self") {
            refs.push(Reference::from(group.address.clone()));
        }
    }
    for rule in attrs::blocks(&group.attributes, "egress") {
        refs.extend(attrs::field(rule, "security_groups").into_iter().map(Reference::to));
        if attrs::truthy(rule, "self") {
            refs.push(Reference::to(group.address.clone()));
        }
    }
    refs
}

/// A standalone rule links `source_security_group_id` and
/// `security_group_id` in the direction given by `type`.
fn rule_references(attrs: &Value) -> Vec<Reference> {
    let Some(group) = attrs::first(attrs, "security_group_id") else {
        return Vec::new();
    };
    let peer = if attrs::truthy(attrs, "self") {
        Some(group.clone())
    } else {
        attrs::first(attrs, "source_security_group_id")
    };
    let Some(peer) = peer else {
        return Vec::new();
    };
    match attrs::first(attrs, "type").as_deref() {
        Some("egress") => vec![Reference::from(group), Reference::to(peer)],
        _ => vec![Reference::from(peer), Reference::to(group)],
    }
}

/// Missing or negative ports (`-1` for ICMP and all-traffic rules) widen to
/// the whole 0-65535 range.
fn port_spec(rule: &Value) -> (String, u32, u32) {
    let protocol = attrs::first(rule, "protocol").unwrap_or_default();
    let from = attrs::port(rule, "from_port").unwrap_or(0);
    let to = attrs::port(rule, "to_port").unwrap_or(65535);
    (protocol, from, to)
}
