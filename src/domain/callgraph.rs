//! Static call-graph extraction.
//!
//! Resolves textual root specifications against the semantic provider,
//! then explores the static call graph outward with a bounded,
//! deterministic breadth-first traversal. One graph is produced per
//! (project, resolved root); graphs are grouped per project and fully
//! ordered so the serialized output is byte-stable.

use std::collections::{HashSet, VecDeque};

use crate::domain::model::{CallEdge, Callgraph, CallgraphsSection, ProjectRef};
use crate::ports::{CallResolution, DeclId, MethodSig, SemanticProvider};

/// Traversal configuration, one per extraction run.
#[derive(Debug, Clone)]
pub struct CallgraphOptions {
    /// Root specifications, e.g. `my_crate::Router.dispatch/2`.
    pub roots: Vec<String>,
    pub max_depth: usize,
    pub max_nodes: usize,
    /// Keep callees that resolve outside the workspace (or not at all)
    /// as leaf nodes instead of dropping them.
    pub include_external: bool,
    pub verbose: bool,
}

impl Default for CallgraphOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: 2,
            max_nodes: 200,
            include_external: false,
            verbose: false,
        }
    }
}

/// Canonical method id: `Type.member(param_count)`.
///
/// Constructors render the member as the literal `.ctor`; generic-arity
/// markers are stripped from both the type and the member token. The id
/// depends only on structural properties of the method, never on source
/// position.
pub fn format_method_id(sig: &MethodSig) -> String {
    let type_name = strip_generics(&sig.containing_type);
    let member = if sig.is_ctor {
        ".ctor"
    } else {
        strip_generics(&sig.name)
    };
    format!("{}.{}({})", type_name, member, sig.param_count)
}

fn strip_generics(name: &str) -> &str {
    match name.find(|c| c == '`' || c == '<') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// A parsed root specification.
///
/// Accepted shapes: `Type.method`, `Type.method/N`, `Type..ctor` and
/// `Type..ctor/N`, where `Type` is a qualified display name such as
/// `my_crate::RootClass`. A spec with no `.` separator is malformed and
/// parses to `None`, which downstream behaves exactly like a lookup that
/// matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSpec {
    pub type_part: String,
    pub member_part: String,
    pub explicit_arity: Option<usize>,
    pub is_ctor: bool,
}

impl RootSpec {
    pub fn parse(raw: &str) -> Option<RootSpec> {
        let mut spec = raw;
        let mut explicit_arity = None;
        if let Some(slash) = raw.rfind('/') {
            if slash > 0 {
                if let Ok(arity) = raw[slash + 1..].parse::<usize>() {
                    explicit_arity = Some(arity);
                    spec = &raw[..slash];
                }
            }
        }
        if let Some(type_part) = spec.strip_suffix("..ctor") {
            if type_part.is_empty() {
                return None;
            }
            return Some(RootSpec {
                type_part: type_part.to_string(),
                member_part: ".ctor".to_string(),
                explicit_arity,
                is_ctor: true,
            });
        }
        let last_dot = spec.rfind('.')?;
        let type_part = &spec[..last_dot];
        let member_part = &spec[last_dot + 1..];
        if type_part.is_empty() || member_part.is_empty() {
            return None;
        }
        Some(RootSpec {
            type_part: type_part.to_string(),
            member_part: member_part.to_string(),
            explicit_arity,
            is_ctor: false,
        })
    }
}

/// Outcome of resolving one root spec within one project.
#[derive(Debug)]
pub enum Resolution {
    NotFound,
    /// Exactly one declaration matched, or arity narrowed the field.
    Resolved { decl: DeclId, id: String },
    /// Several declarations matched and no arity was given; the first
    /// declaration in enumeration order is picked deterministically.
    Ambiguous { decl: DeclId, id: String },
}

/// Locates the declaration a root specification refers to.
pub struct MethodResolver<'a, P: SemanticProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: SemanticProvider + ?Sized> MethodResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    pub fn resolve(&self, project: &str, raw: &str) -> Resolution {
        let Some(spec) = RootSpec::parse(raw) else {
            return Resolution::NotFound;
        };
        let mut matches = Vec::new();
        for decl_id in self.provider.declarations(project) {
            let sig = &self.provider.declaration(decl_id).sig;
            if !type_matches(&sig.containing_type, &spec.type_part) {
                continue;
            }
            if spec.is_ctor {
                if !sig.is_ctor {
                    continue;
                }
            } else if sig.name != spec.member_part {
                continue;
            }
            if let Some(arity) = spec.explicit_arity {
                if sig.param_count != arity {
                    continue;
                }
            }
            matches.push(decl_id);
        }
        let Some(&first) = matches.first() else {
            return Resolution::NotFound;
        };
        let id = format_method_id(&self.provider.declaration(first).sig);
        if matches.len() > 1 && spec.explicit_arity.is_none() {
            Resolution::Ambiguous { decl: first, id }
        } else {
            Resolution::Resolved { decl: first, id }
        }
    }
}

/// A type display name matches when it equals the requested part, or when
/// the request merely omits the leading crate qualifier.
fn type_matches(display: &str, type_part: &str) -> bool {
    if display == type_part {
        return true;
    }
    match display.split_once("::") {
        Some((_, rest)) => rest == type_part,
        None => false,
    }
}

/// A classified callee: `decl` is set only for targets declared inside
/// the workspace, which are the only ones traversal may expand.
#[derive(Debug, Clone)]
pub struct Callee {
    pub id: String,
    pub decl: Option<DeclId>,
}

/// Enumerates and classifies the callees of one declaration.
pub struct CalleeEnumerator<'a, P: SemanticProvider + ?Sized> {
    provider: &'a P,
    include_external: bool,
}

impl<'a, P: SemanticProvider + ?Sized> CalleeEnumerator<'a, P> {
    pub fn new(provider: &'a P, include_external: bool) -> Self {
        Self {
            provider,
            include_external,
        }
    }

    pub fn callees(&self, decl: DeclId) -> Vec<Callee> {
        let mut out = Vec::new();
        for site in self.provider.call_sites(decl) {
            match self.provider.resolve_call(site) {
                CallResolution::Source(target) => out.push(Callee {
                    id: format_method_id(&self.provider.declaration(target).sig),
                    decl: Some(target),
                }),
                CallResolution::External(sig) => {
                    if self.include_external {
                        out.push(Callee {
                            id: format_method_id(&sig),
                            decl: None,
                        });
                    }
                }
                CallResolution::Unknown => {
                    if self.include_external {
                        // Best effort: keep the literal call text as the id.
                        let text = self.provider.call_text(site);
                        if !text.trim().is_empty() {
                            out.push(Callee {
                                id: text,
                                decl: None,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

/// Bounded breadth-first exploration from a resolved root.
///
/// Nodes dequeued at `max_depth` are never expanded; they appear only as
/// edge targets recorded by their callers. Hitting the node budget sets
/// `truncated` and stops the whole traversal for good.
pub struct GraphBuilder<'a, P: SemanticProvider + ?Sized> {
    provider: &'a P,
    enumerator: CalleeEnumerator<'a, P>,
    max_depth: usize,
    max_nodes: usize,
}

impl<'a, P: SemanticProvider + ?Sized> GraphBuilder<'a, P> {
    pub fn new(provider: &'a P, options: &CallgraphOptions) -> Self {
        Self {
            provider,
            enumerator: CalleeEnumerator::new(provider, options.include_external),
            max_depth: options.max_depth,
            max_nodes: options.max_nodes,
        }
    }

    pub fn build(&self, root: DeclId, root_id: &str) -> Callgraph {
        let mut edges: HashSet<CallEdge> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(DeclId, usize)> = VecDeque::new();
        visited.insert(root_id.to_string());
        queue.push_back((root, 0));
        let mut truncated = false;

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            let caller_id = format_method_id(&self.provider.declaration(current).sig);
            for callee in self.enumerator.callees(current) {
                edges.insert(CallEdge {
                    caller: caller_id.clone(),
                    callee: callee.id.clone(),
                });
                let Some(target) = callee.decl else {
                    // External and unresolved callees are leaves: never
                    // visited, never counted against the node budget.
                    continue;
                };
                if visited.contains(&callee.id) {
                    continue;
                }
                if visited.len() >= self.max_nodes {
                    truncated = true;
                    break;
                }
                visited.insert(callee.id);
                if depth + 1 < self.max_depth {
                    queue.push_back((target, depth + 1));
                }
            }
            if truncated {
                break;
            }
        }

        let mut ordered: Vec<CallEdge> = edges.into_iter().collect();
        ordered.sort();
        Callgraph {
            root: root_id.to_string(),
            depth: self.max_depth,
            truncated,
            edges: ordered,
        }
    }
}

/// Runs every root spec against every project and groups the results.
pub struct CallgraphExtractor<'a, P: SemanticProvider + ?Sized> {
    provider: &'a P,
    options: CallgraphOptions,
    diagnostics: Vec<String>,
}

impl<'a, P: SemanticProvider + ?Sized> CallgraphExtractor<'a, P> {
    pub fn new(provider: &'a P, options: CallgraphOptions) -> Self {
        Self {
            provider,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics recorded by the last `extract` call, in emission order.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn extract(&mut self) -> Vec<CallgraphsSection> {
        self.diagnostics.clear();
        if self.options.roots.is_empty() {
            return Vec::new();
        }
        let resolver = MethodResolver::new(self.provider);
        let builder = GraphBuilder::new(self.provider, &self.options);

        let mut sections = Vec::new();
        for project in self.provider.projects() {
            let mut graphs = Vec::new();
            for root in &self.options.roots {
                match resolver.resolve(&project.name, root) {
                    Resolution::NotFound => {
                        if self.options.verbose {
                            self.diagnostics
                                .push(format!("CLG100 root-not-found {} {}", project.name, root));
                        }
                    }
                    Resolution::Ambiguous { decl, id } => {
                        if self.options.verbose {
                            self.diagnostics
                                .push(format!("CLG110 ambiguous-root {} {}", project.name, root));
                        }
                        graphs.push(builder.build(decl, &id));
                    }
                    Resolution::Resolved { decl, id } => graphs.push(builder.build(decl, &id)),
                }
            }
            if graphs.is_empty() {
                continue;
            }
            graphs.sort_by(|a, b| a.root.cmp(&b.root));
            sections.push(CallgraphsSection {
                project: ProjectRef {
                    name: project.name,
                    file: project.relative_path,
                },
                graphs,
            });
        }
        sections.sort_by(|a, b| a.project.name.cmp(&b.project.name));
        sections
    }
}
