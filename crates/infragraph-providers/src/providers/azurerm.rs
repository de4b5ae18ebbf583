//! Microsoft Azure (azurerm)

use infragraph_core::{Resource, Role};

use super::role_from_tables;
use crate::attrs;
use crate::extractor::{Provider, Reference, ReferenceResolver, RoleClassifier};

const NODES: &[&str] = &[
    "azurerm_linux_virtual_machine",
    "azurerm_virtual_machine",
    "azurerm_virtual_network",
    "azurerm_windows_virtual_machine",
];

const EDGES: &[&str] = &[
    "azurerm_network_interface",
    "azurerm_subnet",
    "azurerm_virtual_network_peering",
];

pub struct Azurerm;

impl Provider for Azurerm {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn namespace(&self) -> &'static str {
        "azurerm_"
    }
}

impl RoleClassifier for Azurerm {
    fn role(&self, resource_type: &str) -> Role {
        role_from_tables(resource_type, NODES, &[], EDGES)
    }
}

impl ReferenceResolver for Azurerm {
    fn references(&self, resource: &Resource) -> Vec<Reference> {
        let attrs = &resource.attributes;
        match resource.resource_type.as_str() {
            "azurerm_linux_virtual_machine" | "azurerm_windows_virtual_machine" | "azurerm_virtual_machine" => {
                attrs::field(attrs, "network_interface_ids")
                    .into_iter()
                    .map(Reference::to)
                    .collect()
            }
            "azurerm_network_interface" => attrs::nested(attrs, &["ip_configuration", "subnet_id"])
                .into_iter()
                .map(Reference::to)
                .collect(),
            "azurerm_subnet" => attrs::field(attrs, "virtual_network_name")
                .iter()
                .map(|name| Reference::to(attrs::alias_key("vnet", name)))
                .collect(),
            "azurerm_virtual_network_peering" => {
                let mut refs: Vec<Reference> = attrs::field(attrs, "virtual_network_name")
                    .iter()
                    .map(|name| Reference::from(attrs::alias_key("vnet", name)))
                    .collect();
                refs.extend(
                    attrs::field(attrs, "remote_virtual_network_id")
                        .into_iter()
                        .map(Reference::to),
                );
                refs
            }
            _ => Vec::new(),
        }
    }

    fn aliases(&self, resource: &Resource) -> Vec<String> {
        if resource.resource_type != "azurerm_virtual_network" {
            return Vec::new();
        }
        attrs::field(&resource.attributes, "name")
            .iter()
            .map(|name| attrs::alias_key("vnet", name))
            .collect()
    }
}
