//! Index document model.
//!
//! These records are what `codeatlas scan` ultimately serializes. Every
//! collection is sorted by the JSON emitter before writing, so the
//! structs themselves stay plain data.

use serde::Serialize;

/// Document header. `generated_at` is injectable so tests can pin it.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub version: String,
    pub schema_version: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,
}

pub const SCHEMA_VERSION: &str = "1.2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSection {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One scanned file: normalized relative path, kind (extension), line
/// count and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub kind: String,
    pub loc: usize,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiRegistration {
    pub interface: String,
    pub implementation: String,
    pub lifetime: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HostedService {
    #[serde(rename = "type")]
    pub type_name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiSection {
    pub registrations: Vec<DiRegistration>,
    pub hosted_services: Vec<HostedService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramMain {
    pub file: String,
    pub line: usize,
    pub is_async: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntrypointsSection {
    pub project: ProjectRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_main: Option<ProgramMain>,
    pub hosted_services: Vec<HostedService>,
}

/// One step in a handler outline: a guard, a delegate call or a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub order: usize,
    pub kind: String,
    pub detail: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageFlowSection {
    pub handler: String,
    pub method: String,
    pub nodes: Vec<FlowNode>,
}

/// A deduplicated caller/callee pair of canonical method ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

/// One explored graph: root id, the configured depth bound, whether the
/// node budget cut exploration short, and the ordered edge set.
#[derive(Debug, Clone, Serialize)]
pub struct Callgraph {
    pub root: String,
    pub depth: usize,
    pub truncated: bool,
    pub edges: Vec<CallEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallgraphsSection {
    pub project: ProjectRef,
    pub graphs: Vec<Callgraph>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSection {
    pub env_keys: Vec<String>,
    pub app_props: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandItem {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    pub source: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandsSection {
    pub items: Vec<CommandItem>,
}

/// Root index document.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectIndex {
    pub meta: Meta,
    pub projects: Vec<ProjectSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<FileEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub di: Option<DiSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoints: Option<Vec<EntrypointsSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_flow: Option<Vec<MessageFlowSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callgraphs: Option<Vec<CallgraphsSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configs: Option<ConfigSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<CommandsSection>,
}
