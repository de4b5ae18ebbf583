//! CLI command implementations

use crate::GenerateArgs;
use crate::config::{self, Overrides};
use anyhow::{Context, bail};
use infragraph_core::Graph;
use infragraph_generate::{from_hcl_path, from_state};
use infragraph_providers::ProviderRegistry;
use infragraph_source::{InputKind, detect_input};

pub fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let overrides = Overrides {
        raw: args.raw,
        no_connections: args.no_connections,
        no_external_nodes: args.no_external_nodes,
    };
    let options = config::resolve(args.config.as_deref(), overrides)?;
    tracing::debug!(?options, "generation options");

    let kind = if args.hcl {
        InputKind::Hcl
    } else if args.tfstate {
        InputKind::State
    } else {
        match detect_input(&args.path) {
            Some(kind) => kind,
            None => bail!(
                "cannot tell whether {} is a state file or configuration, pass --hcl or --tfstate",
                args.path.display()
            ),
        }
    };

    let registry = ProviderRegistry::builtin();
    let graph = match kind {
        InputKind::State => {
            let raw = std::fs::read(&args.path)
                .with_context(|| format!("reading {}", args.path.display()))?;
            let (graph, config) = from_state(&raw, &registry, options)
                .with_context(|| format!("generating graph from {}", args.path.display()))?;
            tracing::debug!(resources = config.len(), "resolved configuration");
            graph
        }
        InputKind::Hcl => from_hcl_path(&args.path, &registry, options)
            .with_context(|| format!("generating graph from {}", args.path.display()))?,
    };

    println!("{}", render(&graph, args.pretty)?);
    Ok(())
}

pub fn providers() -> anyhow::Result<()> {
    let registry = ProviderRegistry::builtin();
    for provider in registry.providers() {
        println!("{:<16} {}*", provider.name(), provider.namespace());
    }
    Ok(())
}

fn render(graph: &Graph, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(graph)?
    } else {
        serde_json::to_string(graph)?
    };
    Ok(json)
}
