//! Terraform configuration (HCL) module trees

use ::hcl::{Block, Body};
use ignore::WalkBuilder;
use infragraph_core::{Error, Resource, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of configuration files.
pub const TERRAFORM_EXTENSION: &str = "tf";

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[".terraform", ".terragrunt-cache"];

/// Nested module calls deeper than this are ignored.
const MAX_MODULE_DEPTH: usize = 32;

/// One configuration module: its resources plus the local modules it calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleTree {
    /// Directory (or single file) the module was read from. Empty for
    /// in-memory sources.
    pub source: PathBuf,
    /// Address prefix segments, e.g. `["module.network"]`.
    pub module_path: Vec<String>,
    pub resources: Vec<Resource>,
    pub children: Vec<ModuleTree>,
}

impl ModuleTree {
    /// Load a root module from a directory of `.tf` files or a single file,
    /// following local `module` sources.
    pub fn load(path: &Path) -> Result<Self> {
        let mut visiting = HashSet::new();
        load_module(path, Vec::new(), &mut visiting, 0)
    }

    /// Parse configuration text as a root module. Module calls are not
    /// followed.
    pub fn parse_str(content: &str) -> Result<Self> {
        let body = parse_body(content, Path::new("<memory>"))?;
        Ok(ModuleTree {
            resources: resources_of(&body, &[]),
            ..ModuleTree::default()
        })
    }

    /// Every resource of the tree: this module first, then each child in
    /// declaration order.
    pub fn all_resources(&self) -> Vec<&Resource> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(module) = stack.pop() {
            out.extend(module.resources.iter());
            stack.extend(module.children.iter().rev());
        }
        out
    }

    /// Number of modules in the tree, root included.
    pub fn module_count(&self) -> usize {
        1 + self.children.iter().map(ModuleTree::module_count).sum::<usize>()
    }
}

fn load_module(
    path: &Path,
    module_path: Vec<String>,
    visiting: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<ModuleTree> {
    let key = path.canonicalize().map_err(|e| Error::io(path, e))?;
    let files = if path.is_dir() {
        config_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    let base = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    visiting.insert(key.clone());
    let mut tree = ModuleTree {
        source: path.to_path_buf(),
        module_path,
        ..ModuleTree::default()
    };
    for file in &files {
        let content = std::fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
        let body = parse_body(&content, file)?;
        tree.resources.extend(resources_of(&body, &tree.module_path));

        for call in body.blocks().filter(|b| b.identifier() == "module") {
            let Some(name) = call.labels().first().map(|l| l.as_str().to_string()) else {
                continue;
            };
            let Some(child_dir) = local_source(call, &base) else {
                debug!(module = %name, "skipping module without a local source");
                continue;
            };
            let child_key = match child_dir.canonicalize() {
                Ok(dir) => dir,
                Err(err) => {
                    warn!(module = %name, path = %child_dir.display(), "module source not readable: {}", err);
                    continue;
                }
            };
            if visiting.contains(&child_key) || depth + 1 > MAX_MODULE_DEPTH {
                warn!(module = %name, "recursive module call ignored");
                continue;
            }
            let mut child_path = tree.module_path.clone();
            child_path.push(format!("module.{}", name));
            tree.children
                .push(load_module(&child_dir, child_path, visiting, depth + 1)?);
        }
    }
    visiting.remove(&key);

    debug!(
        path = %path.display(),
        files = files.len(),
        resources = tree.resources.len(),
        "loaded module"
    );
    Ok(tree)
}

/// `.tf` files directly inside `dir`, sorted by name.
fn config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(false)
        .git_ignore(false)
        .filter_entry(|entry| {
            !SKIP_DIRS
                .iter()
                .any(|skip| entry.file_name() == std::ffi::OsStr::new(skip))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping entry under {}: {}", dir.display(), err);
                continue;
            }
        };
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        let is_config = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == TERRAFORM_EXTENSION);
        if is_file && is_config {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn parse_body(content: &str, path: &Path) -> Result<Body> {
    ::hcl::from_str(content).map_err(|e| Error::Hcl {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve a module call's `source` to a directory when it is a local path.
fn local_source(call: &Block, base: &Path) -> Option<PathBuf> {
    let source = call
        .body()
        .attributes()
        .find(|attr| attr.key() == "source")
        .and_then(|attr| match ::hcl::Value::from(attr.expr().clone()) {
            ::hcl::Value::String(s) => Some(s),
            _ => None,
        })?;
    if source.starts_with("./") || source.starts_with("../") {
        Some(base.join(source))
    } else {
        None
    }
}

fn resources_of(body: &Body, module_path: &[String]) -> Vec<Resource> {
    body.blocks()
        .filter(|block| block.identifier() == "resource")
        .filter_map(|block| {
            let labels = block.labels();
            if labels.len() < 2 {
                warn!("resource block without type and name labels");
                return None;
            }
            Some(Resource::new(
                module_path.to_vec(),
                labels[0].as_str(),
                labels[1].as_str(),
                None,
                body_to_json(block.body()),
            ))
        })
        .collect()
}

/// Attributes become JSON values (references stay as `${...}` strings);
/// nested blocks become arrays of objects keyed by block identifier.
fn body_to_json(body: &Body) -> Value {
    let mut map = Map::new();
    for attr in body.attributes() {
        let value = ::hcl::Value::from(attr.expr().clone());
        map.insert(
            attr.key().to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }
    for block in body.blocks() {
        let entry = map
            .entry(block.identifier().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(body_to_json(block.body()));
        }
    }
    Value::Object(map)
}
