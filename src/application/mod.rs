//! Scan orchestration.
//!
//! `ScanUsecase::run` loads the workspace, builds the semantic provider
//! and runs every enabled extractor. Sections degrade independently: a
//! section that cannot be produced is skipped with a warning, only
//! workspace loading (and the `error` conflict policy) abort the scan.

use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, warn};

pub mod config;

use crate::domain::callgraph::{CallgraphExtractor, CallgraphOptions};
use crate::domain::model::{Meta, ProjectIndex, ProjectSection, SCHEMA_VERSION};
use crate::extractors::commands::{CommandsExtractor, CommandsOptions};
use crate::extractors::configs::{ConfigsExtractor, ConfigsOptions};
use crate::extractors::di::{DiExtractor, DiOptions};
use crate::extractors::entrypoints::EntrypointsExtractor;
use crate::extractors::flow::{FlowExtractor, FlowOptions};
use crate::infrastructure::project_loader::ProjectLoader;
use crate::infrastructure::symbol_store::{DiskSymbolStore, MemorySymbolStore, SymbolStore};
use crate::infrastructure::syn_provider::SynProvider;
use crate::infrastructure::tree_scanner::{LocMode, TreeScanner};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to load workspace: {0:#}")]
    Load(#[source] anyhow::Error),
    #[error("{0} command conflict(s) under the error policy")]
    CommandConflicts(usize),
    #[error("invalid option: {0}")]
    Usage(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Load(_) => 3,
            ScanError::CommandConflicts(_) => 4,
            ScanError::Usage(_) => 5,
            ScanError::Other(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Warn,
    Error,
    Ignore,
}

impl ConflictPolicy {
    pub fn parse(s: &str) -> Option<ConflictPolicy> {
        match s {
            "warn" => Some(ConflictPolicy::Warn),
            "error" => Some(ConflictPolicy::Error),
            "ignore" => Some(ConflictPolicy::Ignore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StoreKind {
    Memory,
    Disk(PathBuf),
}

/// Fully merged scan settings (config file + CLI flags).
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub manifest: PathBuf,
    pub exts: Vec<String>,
    pub ignores: Vec<String>,
    pub use_gitignore: bool,
    pub loc_mode: LocMode,
    pub scan_tree: bool,
    pub scan_di: bool,
    pub scan_entrypoints: bool,
    pub scan_configs: bool,
    pub scan_commands: bool,
    pub scan_flow: bool,
    pub di: DiOptions,
    pub commands: CommandsOptions,
    pub conflict_policy: ConflictPolicy,
    pub configs: ConfigsOptions,
    pub flow: Option<FlowOptions>,
    pub callgraph: CallgraphOptions,
    pub store: StoreKind,
    /// Pinned timestamp for reproducible output; `None` means now.
    pub generated_at: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("Cargo.toml"),
            exts: Vec::new(),
            ignores: Vec::new(),
            use_gitignore: true,
            loc_mode: LocMode::Physical,
            scan_tree: true,
            scan_di: true,
            scan_entrypoints: true,
            scan_configs: false,
            scan_commands: false,
            scan_flow: false,
            di: DiOptions::default(),
            commands: CommandsOptions::default(),
            conflict_policy: ConflictPolicy::Warn,
            configs: ConfigsOptions::default(),
            flow: None,
            callgraph: CallgraphOptions::default(),
            store: StoreKind::Memory,
            generated_at: None,
        }
    }
}

pub struct ScanUsecase;

impl ScanUsecase {
    pub fn run(options: &ScanOptions) -> Result<ProjectIndex, ScanError> {
        let workspace =
            ProjectLoader::load_workspace(&options.manifest).map_err(ScanError::Load)?;

        let store: Box<dyn SymbolStore> = match &options.store {
            StoreKind::Memory => Box::new(MemorySymbolStore::default()),
            StoreKind::Disk(path) => {
                let path = path.to_string_lossy().to_string();
                Box::new(DiskSymbolStore::new(&path).map_err(ScanError::Other)?)
            }
        };
        let provider = SynProvider::build(&workspace.projects, store);

        let mut projects: Vec<ProjectSection> = workspace
            .projects
            .iter()
            .map(|p| ProjectSection {
                name: p.info.name.clone(),
                path: p.info.relative_path.clone(),
                language: Some("rust".to_string()),
            })
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));

        let tree = if options.scan_tree {
            Some(TreeScanner::scan(
                &workspace.root,
                Some(&options.exts),
                Some(&options.ignores),
                options.use_gitignore,
                options.loc_mode,
            ))
        } else {
            None
        };

        let di = if options.scan_di {
            Some(DiExtractor::new(options.di.clone()).extract(&provider))
        } else {
            None
        };

        let entrypoints = if options.scan_entrypoints {
            let mut extractor = EntrypointsExtractor::new();
            if let Some(di) = &di {
                extractor.seed_hosted_services(&di.hosted_services);
            }
            Some(extractor.extract(&provider))
        } else {
            None
        };

        let configs = if options.scan_configs {
            Some(ConfigsExtractor::new(options.configs.clone()).extract(&provider))
        } else {
            None
        };

        let commands = if options.scan_commands {
            let extractor = CommandsExtractor::new(options.commands.clone())
                .map_err(|e| ScanError::Usage(format!("commands allow regex: {}", e)))?;
            let outcome = extractor.extract(&provider);
            if !outcome.conflicts.is_empty() {
                match options.conflict_policy {
                    ConflictPolicy::Ignore => {}
                    ConflictPolicy::Warn | ConflictPolicy::Error => {
                        for conflict in &outcome.conflicts {
                            for variant in &conflict.variants {
                                warn!(
                                    canonical = %conflict.canonical,
                                    command = %variant.command,
                                    file = %variant.file,
                                    line = variant.line,
                                    "command conflict"
                                );
                            }
                        }
                        if options.conflict_policy == ConflictPolicy::Error {
                            return Err(ScanError::CommandConflicts(outcome.conflicts.len()));
                        }
                    }
                }
            }
            Some(outcome.section)
        } else {
            None
        };

        let message_flow = match (options.scan_flow, &options.flow) {
            (true, Some(flow_options)) => {
                Some(FlowExtractor::new(flow_options.clone()).extract(&provider))
            }
            (true, None) => {
                return Err(ScanError::Usage(
                    "--scan-flow requires --flow-handler".to_string(),
                ))
            }
            _ => None,
        };

        let callgraphs = if options.callgraph.roots.is_empty() {
            None
        } else {
            let mut extractor = CallgraphExtractor::new(&provider, options.callgraph.clone());
            let sections = extractor.extract();
            for diagnostic in extractor.diagnostics() {
                debug!("{}", diagnostic);
            }
            Some(sections)
        };

        let generated_at = options
            .generated_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        Ok(ProjectIndex {
            meta: Meta {
                version: env!("CARGO_PKG_VERSION").to_string(),
                schema_version: SCHEMA_VERSION.to_string(),
                generated_at,
                sections: None,
            },
            projects,
            tree,
            di,
            entrypoints,
            message_flow,
            callgraphs,
            configs,
            commands,
        })
    }
}
