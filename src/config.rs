//! Generation options from a TOML file and command-line flags

use anyhow::Context;
use infragraph_core::Options;
use serde::Deserialize;
use std::path::Path;

/// Options file. Keys left out keep the all-on default.
///
/// ```toml
/// clean = true
/// connections = true
/// external_nodes = false
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub clean: Option<bool>,
    pub connections: Option<bool>,
    pub external_nodes: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn apply(&self, mut options: Options) -> Options {
        if let Some(clean) = self.clean {
            options.clean = clean;
        }
        if let Some(connections) = self.connections {
            options.connections = connections;
        }
        if let Some(external_nodes) = self.external_nodes {
            options.external_nodes = external_nodes;
        }
        options
    }
}

/// Command-line switches; each one can only turn a feature off.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub raw: bool,
    pub no_connections: bool,
    pub no_external_nodes: bool,
}

/// Start from [`Options::full`], apply the file, then the flags.
pub fn resolve(file: Option<&Path>, overrides: Overrides) -> anyhow::Result<Options> {
    let mut options = Options::full();
    if let Some(path) = file {
        options = FileConfig::load(path)?.apply(options);
    }
    if overrides.raw {
        options.clean = false;
    }
    if overrides.no_connections {
        options.connections = false;
    }
    if overrides.no_external_nodes {
        options.external_nodes = false;
    }
    Ok(options)
}
