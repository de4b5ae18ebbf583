//! Terraform state snapshots (format versions 3 and 4)

use infragraph_core::{Error, InstanceKey, Resource, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Resources of one state snapshot, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub version: u64,
    pub resources: Vec<Resource>,
}

/// Parse a raw state document.
///
/// Only managed resources are returned; data sources are skipped. Every
/// instance must carry a non-empty `id`.
pub fn parse_state(raw: &[u8]) -> Result<StateSnapshot> {
    parse_state_with(raw, |_| true)
}

/// Like [`parse_state`], but only instances whose type satisfies
/// `requires_id` must carry an `id`. Others are returned as they are.
pub fn parse_state_with<F>(raw: &[u8], requires_id: F) -> Result<StateSnapshot>
where
    F: Fn(&str) -> bool,
{
    let document: Value = serde_json::from_slice(raw)?;
    let version = match document.get("version") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    let Some(version @ (3 | 4)) = version else {
        let raw = document
            .get("version")
            .map_or_else(|| "missing".to_string(), Value::to_string);
        return Err(Error::InvalidStateVersion(raw));
    };
    let resources = if version == 4 {
        resources_v4(serde_json::from_value(document)?, &requires_id)?
    } else {
        resources_v3(serde_json::from_value(document)?, &requires_id)?
    };
    debug!(version, resources = resources.len(), "parsed state");
    Ok(StateSnapshot { version, resources })
}

#[derive(Debug, Deserialize)]
struct StateV4 {
    #[serde(default)]
    resources: Vec<ResourceV4>,
}

#[derive(Debug, Deserialize)]
struct ResourceV4 {
    #[serde(default)]
    module: Option<String>,
    #[serde(default = "managed")]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    instances: Vec<InstanceV4>,
}

#[derive(Debug, Deserialize)]
struct InstanceV4 {
    #[serde(default)]
    index_key: Option<InstanceKey>,
    #[serde(default)]
    attributes: Value,
    /// Pre-0.12 style attributes, still found in upgraded states.
    #[serde(default)]
    attributes_flat: Option<Map<String, Value>>,
}

fn managed() -> String {
    "managed".to_string()
}

fn resources_v4(state: StateV4, requires_id: &dyn Fn(&str) -> bool) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for entry in state.resources {
        if entry.mode != "managed" {
            continue;
        }
        let module_path = entry
            .module
            .as_deref()
            .map(parse_module_address)
            .unwrap_or_default();
        for instance in entry.instances {
            let attributes = match instance.attributes_flat {
                Some(flat) if !instance.attributes.is_object() => expand_flatmap(&flat),
                _ => instance.attributes,
            };
            let resource = Resource::new(
                module_path.clone(),
                entry.resource_type.as_str(),
                entry.name.as_str(),
                instance.index_key,
                attributes,
            );
            resources.push(identified(resource, requires_id)?);
        }
    }
    Ok(resources)
}

#[derive(Debug, Deserialize)]
struct StateV3 {
    #[serde(default)]
    modules: Vec<ModuleV3>,
}

#[derive(Debug, Deserialize)]
struct ModuleV3 {
    #[serde(default)]
    path: Vec<String>,
    #[serde(default)]
    resources: BTreeMap<String, ResourceV3>,
}

#[derive(Debug, Deserialize)]
struct ResourceV3 {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    primary: Option<PrimaryV3>,
}

#[derive(Debug, Deserialize)]
struct PrimaryV3 {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

fn resources_v3(state: StateV3, requires_id: &dyn Fn(&str) -> bool) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for module in state.modules {
        let module_path: Vec<String> = module
            .path
            .iter()
            .skip_while(|segment| *segment == "root")
            .map(|segment| format!("module.{}", segment))
            .collect();
        for (key, entry) in module.resources {
            if key.starts_with("data.") {
                continue;
            }
            let (name, index) = split_v3_key(&key, &entry.resource_type);
            let primary = entry.primary.unwrap_or(PrimaryV3 {
                id: String::new(),
                attributes: Map::new(),
            });
            let mut attributes = expand_flatmap(&primary.attributes);
            if let Value::Object(map) = &mut attributes {
                if !primary.id.is_empty() {
                    map.entry("id").or_insert_with(|| Value::String(primary.id.clone()));
                }
            }
            let resource = Resource::new(
                module_path.clone(),
                entry.resource_type.as_str(),
                name,
                index,
                attributes,
            );
            resources.push(identified(resource, requires_id)?);
        }
    }
    Ok(resources)
}

/// Split a v3 resource key (`aws_instance.web` or `aws_instance.web.2`)
/// into name and count index.
fn split_v3_key(key: &str, resource_type: &str) -> (String, Option<InstanceKey>) {
    let rest = key
        .strip_prefix(resource_type)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(key);
    match rest.rsplit_once('.') {
        Some((name, index)) => match index.parse::<i64>() {
            Ok(i) => (name.to_string(), Some(InstanceKey::Int(i))),
            Err(_) => (rest.to_string(), None),
        },
        None => (rest.to_string(), None),
    }
}

fn identified(resource: Resource, requires_id: &dyn Fn(&str) -> bool) -> Result<Resource> {
    let missing_id = resource.id().is_none() && requires_id(&resource.resource_type);
    if resource.address.is_empty() || missing_id {
        return Err(Error::missing_identity(resource.address));
    }
    Ok(resource)
}

/// Split a module address such as `module.a[0].module.b` into segments
/// (`["module.a[0]", "module.b"]`). Input that does not follow the
/// `module.<name>[key]` grammar is kept as a single verbatim segment.
pub fn parse_module_address(address: &str) -> Vec<String> {
    if address.is_empty() {
        return Vec::new();
    }
    match split_module_address(address) {
        Some(segments) => segments,
        None => {
            warn!(module = address, "malformed module address, keeping it verbatim");
            vec![address.to_string()]
        }
    }
}

fn split_module_address(address: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut rest = address;
    while !rest.is_empty() {
        let body = rest.strip_prefix("module.")?;
        let name_end = body.find(['.', '[']).unwrap_or(body.len());
        if name_end == 0 {
            return None;
        }
        let mut end = name_end;
        if body[end..].starts_with('[') {
            end += closing_bracket(&body[end..])? + 1;
        }
        segments.push(format!("module.{}", &body[..end]));
        rest = &body[end..];
        if let Some(next) = rest.strip_prefix('.') {
            if next.is_empty() {
                return None;
            }
            rest = next;
        } else if !rest.is_empty() {
            return None;
        }
    }
    Some(segments)
}

/// Offset of the `]` closing the bracket `s` starts with, skipping quoted
/// keys.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ']' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

#[derive(Debug, Default)]
enum Flat {
    #[default]
    Empty,
    Leaf(Value),
    Branch(BTreeMap<String, Flat>),
}

impl Flat {
    fn insert(&mut self, path: &[&str], value: Value) {
        let Some((head, tail)) = path.split_first() else {
            *self = Flat::Leaf(value);
            return;
        };
        if !matches!(self, Flat::Branch(_)) {
            *self = Flat::Branch(BTreeMap::new());
        }
        if let Flat::Branch(children) = self {
            children.entry(head.to_string()).or_default().insert(tail, value);
        }
    }

    fn into_json(self) -> Value {
        match self {
            Flat::Empty => Value::Null,
            Flat::Leaf(value) => value,
            Flat::Branch(mut children) => {
                if children.remove("#").is_some() {
                    let mut items: Vec<(String, Flat)> = children.into_iter().collect();
                    items.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(a), Ok(b)) => a.cmp(&b),
                        _ => a.cmp(b),
                    });
                    Value::Array(items.into_iter().map(|(_, child)| child.into_json()).collect())
                } else {
                    children.remove("%");
                    Value::Object(
                        children
                            .into_iter()
                            .map(|(key, child)| (key, child.into_json()))
                            .collect(),
                    )
                }
            }
        }
    }
}

/// Expand flatmap attributes (`ingress.#`, `ingress.1234.from_port`,
/// `tags.%`) into nested JSON. Lists keyed by set hashes are ordered by hash.
pub fn expand_flatmap(flat: &Map<String, Value>) -> Value {
    let mut root = Flat::Branch(BTreeMap::new());
    for (key, value) in flat {
        let path: Vec<&str> = key.split('.').collect();
        root.insert(&path, value.clone());
    }
    root.into_json()
}
