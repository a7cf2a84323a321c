//! Scan configuration file.
//!
//! `codeatlas scan --config codeatlas.toml` loads these settings; CLI
//! flags override whatever the file provides. Every field has a default
//! so a partial file is fine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extractors::commands::{DEFAULT_ALLOW_REGEX, DEFAULT_ATTR_NAMES, DEFAULT_ROUTER_NAMES};
use crate::extractors::di::DEFAULT_REGISTRARS;
use crate::extractors::flow::{DEFAULT_DELEGATE_SUFFIXES, DEFAULT_FLOW_METHOD};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub scan: ScanSection,
    pub tree: TreeSection,
    pub di: DiSection,
    pub commands: CommandsSection,
    pub configs: ConfigsSection,
    pub flow: FlowSection,
    pub callgraph: CallgraphSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    pub ignore: Vec<String>,
    pub ext: Vec<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            ignore: ["target", ".git", "logs"].map(String::from).to_vec(),
            ext: [".rs", ".toml", ".json", ".yaml", ".yml", ".md"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeSection {
    pub loc_mode: String,
    pub use_gitignore: bool,
}

impl Default for TreeSection {
    fn default() -> Self {
        Self {
            loc_mode: "physical".to_string(),
            use_gitignore: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiSection {
    pub dedupe: String,
    pub registrars: Vec<String>,
}

impl Default for DiSection {
    fn default() -> Self {
        Self {
            dedupe: "keep-all".to_string(),
            registrars: DEFAULT_REGISTRARS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsSection {
    pub router_names: Vec<String>,
    pub attr_names: Vec<String>,
    pub include: Vec<String>,
    pub normalize: Vec<String>,
    pub allow_regex: String,
    pub dedup: String,
    pub conflicts: String,
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            router_names: DEFAULT_ROUTER_NAMES.iter().map(|s| s.to_string()).collect(),
            attr_names: DEFAULT_ATTR_NAMES.iter().map(|s| s.to_string()).collect(),
            include: ["router", "attributes"].map(String::from).to_vec(),
            normalize: ["trim", "ensure-slash"].map(String::from).to_vec(),
            allow_regex: DEFAULT_ALLOW_REGEX.to_string(),
            dedup: "case-sensitive".to_string(),
            conflicts: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigsSection {
    pub env_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowSection {
    pub handler: Option<String>,
    pub method: String,
    pub delegate_suffixes: Vec<String>,
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            handler: None,
            method: DEFAULT_FLOW_METHOD.to_string(),
            delegate_suffixes: DEFAULT_DELEGATE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallgraphSection {
    pub methods: Vec<String>,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub include_external: bool,
}

impl Default for CallgraphSection {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            max_depth: 2,
            max_nodes: 200,
            include_external: false,
        }
    }
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<ScanConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Commented example for `codeatlas init-config`.
    pub fn example() -> &'static str {
        r#"# codeatlas scan configuration. CLI flags override these values.

[scan]
# Path prefixes excluded from the tree section.
ignore = ["target", ".git", "logs"]
# File suffixes included in the tree section.
ext = [".rs", ".toml", ".json", ".yaml", ".yml", ".md"]

[tree]
# physical counts every line; logical skips blanks and // comments.
loc_mode = "physical"
use_gitignore = true

[di]
# keep-all | keep-first (dedupe identical interface/implementation pairs)
dedupe = "keep-all"
registrars = ["add_singleton", "add_scoped", "add_transient", "add_hosted_service", "register", "provide"]

[commands]
router_names = ["map", "register", "add", "on", "route", "bind"]
attr_names = ["command", "commands"]
include = ["router", "attributes"]
normalize = ["trim", "ensure-slash"]
allow_regex = "^/[a-z][a-z0-9_]*$"
# case-sensitive | case-insensitive
dedup = "case-sensitive"
# warn | error | ignore
conflicts = "warn"

[configs]
env_prefixes = []

[flow]
# handler = "UpdateHandler"
method = "handle"
delegate_suffixes = ["router", "facade", "service", "dispatcher", "processor", "manager", "module"]

[callgraph]
# methods = ["my_crate::Router.dispatch/2"]
max_depth = 2
max_nodes = 200
include_external = false
"#
    }
}
