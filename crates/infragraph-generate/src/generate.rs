//! Entry points: state snapshots and HCL module trees to graphs

use crate::builder::GraphBuilder;
use crate::{cleaner, external};
use infragraph_core::{Graph, Options, ResolvedConfig, Resource, Result, Role};
use infragraph_providers::ProviderRegistry;
use infragraph_source::{ModuleTree, parse_state_with};
use std::path::Path;
use tracing::info;

/// Build a graph from a Terraform state document, together with the
/// attributes of every resource a provider recognises.
///
/// Only recognised resources must carry an `id`; unknown types are ignored.
pub fn from_state(
    raw: &[u8],
    registry: &ProviderRegistry,
    options: Options,
) -> Result<(Graph, ResolvedConfig)> {
    let snapshot = parse_state_with(raw, |resource_type| {
        registry.classify(resource_type) != Role::Unknown
    })?;
    let resources: Vec<&Resource> = snapshot.resources.iter().collect();
    let graph = generate(&resources, registry, options)?;

    let mut config = ResolvedConfig::new();
    for resource in &snapshot.resources {
        if registry.classify(&resource.resource_type) != Role::Unknown {
            config.insert(resource.address.clone(), resource.attributes.clone());
        }
    }

    info!(
        version = snapshot.version,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "generated graph from state"
    );
    Ok((graph, config))
}

/// Build a graph from a parsed configuration module tree.
pub fn from_hcl(tree: &ModuleTree, registry: &ProviderRegistry, options: Options) -> Result<Graph> {
    let resources = tree.all_resources();
    let graph = generate(&resources, registry, options)?;
    info!(
        modules = tree.module_count(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "generated graph from configuration"
    );
    Ok(graph)
}

/// Load a configuration directory (or single `.tf` file) and build its graph.
pub fn from_hcl_path(path: &Path, registry: &ProviderRegistry, options: Options) -> Result<Graph> {
    let tree = ModuleTree::load(path)?;
    from_hcl(&tree, registry, options)
}

/// Run the pipeline over an ordered resource list: build, then contract and
/// clean when `options.clean`, then add external nodes when
/// `options.external_nodes`.
pub fn generate(
    resources: &[&Resource],
    registry: &ProviderRegistry,
    options: Options,
) -> Result<Graph> {
    let raw = GraphBuilder::new(registry, options).build(resources)?;
    let mut graph = if options.clean {
        let mut graph = cleaner::contract(&raw);
        cleaner::clean(&mut graph);
        graph
    } else {
        raw.literal()
    };
    if options.external_nodes {
        external::synthesize(&raw, &mut graph);
    }
    Ok(graph)
}
