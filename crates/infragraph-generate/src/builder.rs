//! Raw graph construction
//!
//! Every classified resource becomes one or two vertices: a Node-role
//! resource is a single vertex, a mediating resource gets an ingress face and
//! an egress face. References become directed links between faces, oriented
//! along the traffic they allow. Nothing is merged or contracted here.

use infragraph_core::{
    Edge, Error, Graph, LookupTable, Node, Options, Resource, Result, Role, qualify,
};
use infragraph_providers::{Provider, ProviderRegistry, ReferenceKind, ReferenceResolver, RoleClassifier};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static INTERPOLATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{\s*([^}]*?)\s*\}").ok());

/// Vertices owned by one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faces {
    /// Mediating resource skipped because connections are disabled.
    None,
    Single(usize),
    Split { ingress: usize, egress: usize },
}

impl Faces {
    pub fn ingress(self) -> Option<usize> {
        match self {
            Faces::None => None,
            Faces::Single(v) => Some(v),
            Faces::Split { ingress, .. } => Some(ingress),
        }
    }

    pub fn egress(self) -> Option<usize> {
        match self {
            Faces::None => None,
            Faces::Single(v) => Some(v),
            Faces::Split { egress, .. } => Some(egress),
        }
    }
}

/// A classified resource taking part in the graph.
pub struct Entry<'a> {
    pub resource: &'a Resource,
    pub role: Role,
    pub provider: Arc<dyn Provider>,
    pub faces: Faces,
    /// Mediating resource without members: traffic crosses it from its
    /// ingress face to its egress face.
    pub conduit: bool,
}

/// The uncleaned graph over resource faces.
pub struct RawGraph<'a> {
    entries: Vec<Entry<'a>>,
    /// Owning entry of each vertex.
    owners: Vec<usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    links: Vec<(usize, usize)>,
    lookup: LookupTable,
}

impl<'a> RawGraph<'a> {
    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }

    pub fn entry_of(&self, vertex: usize) -> &Entry<'a> {
        &self.entries[self.owners[vertex]]
    }

    pub fn vertex_count(&self) -> usize {
        self.owners.len()
    }

    /// True when the vertex belongs to a Node-role resource.
    pub fn is_node(&self, vertex: usize) -> bool {
        self.entry_of(vertex).role.is_node()
    }

    pub fn canonical(&self, vertex: usize) -> &str {
        &self.entry_of(vertex).resource.address
    }

    pub fn successors(&self, vertex: usize) -> &[usize] {
        &self.outgoing[vertex]
    }

    pub fn predecessors(&self, vertex: usize) -> &[usize] {
        &self.incoming[vertex]
    }

    /// Links in creation order.
    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    /// Resolve a reference key to entries, as seen from `referrer`.
    ///
    /// Exact keys (address, provider ID, alias) win. Otherwise every
    /// `${...}` interpolation is resolved by its longest dotted prefix that
    /// names a resource, first inside the referrer's module, then from the
    /// root. An indexed step (`web[0]`, `web[*]`) that names nothing falls
    /// back to the resource without its index.
    pub fn resolve(&self, key: &str, referrer: &Resource) -> Vec<usize> {
        let exact = self.lookup.lookup(key);
        if !exact.is_empty() {
            return exact.to_vec();
        }
        let Some(pattern) = INTERPOLATION.as_ref() else {
            return Vec::new();
        };
        let module = referrer.module_prefix();
        let expressions: Vec<&str> = pattern
            .captures_iter(key)
            .filter_map(|capture| capture.get(1))
            .map(|m| m.as_str())
            .collect();
        if expressions.is_empty() {
            // A bare traversal such as `aws_security_group.web.id`.
            return self.resolve_expression(key, &module).to_vec();
        }
        let mut found = Vec::new();
        for expr in expressions {
            for &position in self.resolve_expression(expr, &module) {
                if !found.contains(&position) {
                    found.push(position);
                }
            }
        }
        found
    }

    fn resolve_expression(&self, expr: &str, module: &str) -> &[usize] {
        let parts = split_traversal(expr);
        for n in (2..=parts.len()).rev() {
            let mut candidates = vec![parts[..n].join(".")];
            if let Some(base) = strip_index(parts[n - 1]) {
                let mut unindexed = parts[..n - 1].to_vec();
                unindexed.push(base);
                candidates.push(unindexed.join("."));
            }
            for candidate in &candidates {
                if !module.is_empty() {
                    let relative = self.lookup.lookup(&format!("{}.{}", module, candidate));
                    if !relative.is_empty() {
                        return relative;
                    }
                }
                let absolute = self.lookup.lookup(candidate);
                if !absolute.is_empty() {
                    return absolute;
                }
            }
        }
        &[]
    }

    /// The graph without contraction: each link between two different
    /// resources is one edge, mediating resources included as nodes.
    pub fn literal(&self) -> Graph {
        let mut graph = Graph::new();
        for (position, entry) in self.entries.iter().enumerate() {
            if entry.faces != Faces::None {
                graph.add_node(Node::from_resource(entry.resource, position));
            }
        }
        for &(from, to) in &self.links {
            if self.owners[from] == self.owners[to] {
                continue;
            }
            let (Some(source), Some(target)) = (
                graph.node_id(self.canonical(from)),
                graph.node_id(self.canonical(to)),
            ) else {
                continue;
            };
            graph.connect(source, target, Edge::direct());
        }
        graph
    }
}

/// Split a traversal on the dots that separate its steps. Dots inside an
/// index such as `["a.b"]` stay put.
pub(crate) fn split_traversal(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut depth, mut quoted, mut start) = (0usize, false, 0);
    let mut chars = expr.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if quoted => {
                chars.next();
            }
            '"' => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => depth = depth.saturating_sub(1),
            '.' if !quoted && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// `web[0]`, `web["a"]` or `web[*]` without its trailing index.
fn strip_index(step: &str) -> Option<&str> {
    if !step.ends_with(']') {
        return None;
    }
    let open = step.find('[')?;
    (open > 0).then(|| &step[..open])
}

/// Builds [`RawGraph`]s from resource lists.
pub struct GraphBuilder<'r> {
    registry: &'r ProviderRegistry,
    options: Options,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r ProviderRegistry, options: Options) -> Self {
        Self { registry, options }
    }

    pub fn build<'a>(&self, resources: &[&'a Resource]) -> Result<RawGraph<'a>> {
        let mut raw = RawGraph {
            entries: Vec::new(),
            owners: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            links: Vec::new(),
            lookup: LookupTable::new(),
        };

        let mut seen = HashSet::new();
        for &resource in resources {
            if resource.address.is_empty() || resource.resource_type.is_empty() || resource.name.is_empty() {
                return Err(Error::missing_identity(resource.address.clone()));
            }
            let Some(provider) = self.registry.provider_for(&resource.resource_type) else {
                continue;
            };
            let role = provider.role(&resource.resource_type);
            if role == Role::Unknown {
                continue;
            }
            if !seen.insert(resource.address.as_str()) {
                warn!(address = %resource.address, "duplicate resource address, keeping the first");
                continue;
            }
            let position = raw.entries.len();
            let faces = if role.is_node() {
                Faces::Single(raw.add_vertex(position))
            } else if self.options.connections {
                Faces::Split {
                    ingress: raw.add_vertex(position),
                    egress: raw.add_vertex(position),
                }
            } else {
                Faces::None
            };
            raw.index(resource, provider.as_ref(), position);
            raw.entries.push(Entry {
                resource,
                role,
                provider: Arc::clone(provider),
                faces,
                conduit: false,
            });
        }

        let mut members = vec![false; raw.entries.len()];
        for position in 0..raw.entries.len() {
            let entry = &raw.entries[position];
            let references = entry.provider.references(entry.resource);
            for reference in references {
                let targets = raw.resolve(&reference.key, raw.entries[position].resource);
                if targets.is_empty() {
                    debug!(
                        from = %raw.entries[position].resource.address,
                        reference = %reference.key,
                        "dropping unresolved reference"
                    );
                    continue;
                }
                let membership = matches!(reference.kind, ReferenceKind::MemberOf | ReferenceKind::Holds);
                for target in targets {
                    if raw.link(position, target, reference.kind) && membership {
                        members[position] = true;
                        members[target] = true;
                    }
                }
            }
        }

        for (position, has_members) in members.into_iter().enumerate() {
            if let Faces::Split { ingress, egress } = raw.entries[position].faces {
                if !has_members {
                    raw.entries[position].conduit = true;
                    raw.add_link(ingress, egress);
                }
            }
        }

        debug!(
            resources = raw.entries.len(),
            vertices = raw.vertex_count(),
            links = raw.links.len(),
            "built raw graph"
        );
        Ok(raw)
    }
}

impl<'a> RawGraph<'a> {
    fn add_vertex(&mut self, owner: usize) -> usize {
        self.owners.push(owner);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.owners.len() - 1
    }

    fn index(&mut self, resource: &Resource, provider: &dyn Provider, position: usize) {
        self.lookup.insert(resource.address.clone(), position);
        if resource.index.is_some() {
            // `aws_instance.web` names every instance of a counted resource.
            let base = qualify(&resource.module_path, &resource.resource_type, &resource.name, None);
            self.lookup.insert(base, position);
        }
        if let Some(id) = resource.id() {
            self.lookup.insert(id, position);
        }
        for alias in provider.aliases(resource) {
            self.lookup.insert(alias, position);
        }
    }

    fn add_link(&mut self, from: usize, to: usize) {
        if from == to || self.outgoing[from].contains(&to) {
            return;
        }
        self.outgoing[from].push(to);
        self.incoming[to].push(from);
        self.links.push((from, to));
    }

    /// Turn one resolved reference into face links. Returns false when the
    /// reference does not apply (self membership, missing faces, or a
    /// membership involving a resource outside security groups).
    fn link(&mut self, source: usize, target: usize, kind: ReferenceKind) -> bool {
        let (s, t) = (&self.entries[source], &self.entries[target]);
        let membership = matches!(kind, ReferenceKind::MemberOf | ReferenceKind::Holds);
        if source == target && (s.role.is_node() || membership) {
            return false;
        }
        if membership && (s.role == Role::NoSecurityGroup || t.role == Role::NoSecurityGroup) {
            return false;
        }
        let (s, t) = (s.faces, t.faces);
        let (Some(s_in), Some(s_out), Some(t_in), Some(t_out)) =
            (s.ingress(), s.egress(), t.ingress(), t.egress())
        else {
            return false;
        };
        match kind {
            ReferenceKind::MemberOf => {
                self.add_link(s_out, t_out);
                self.add_link(t_in, s_in);
            }
            ReferenceKind::Holds => {
                self.add_link(t_out, s_out);
                self.add_link(s_in, t_in);
            }
            ReferenceKind::From => self.add_link(t_out, s_in),
            ReferenceKind::To => self.add_link(s_out, t_in),
        }
        true
    }
}
