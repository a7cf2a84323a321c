//! Command-registration extraction.
//!
//! Two discovery sources: *router* calls whose first argument is a string
//! literal (`router.on("/start", ...)`) and *attribute* payloads
//! (`#[command("/start")]`). Candidates are normalized, filtered through
//! an allow-pattern, deduplicated per canonical command, and conflicting
//! spellings of one canonical command are reported for the caller's
//! conflict policy.

use regex::Regex;

use crate::domain::model::{CommandItem, CommandsSection};
use crate::ports::SemanticProvider;

pub const DEFAULT_ROUTER_NAMES: &[&str] = &["map", "register", "add", "on", "route", "bind"];
pub const DEFAULT_ATTR_NAMES: &[&str] = &["command", "commands"];
pub const DEFAULT_ALLOW_REGEX: &str = "^/[a-z][a-z0-9_]*$";

#[derive(Debug, Clone)]
pub struct CommandsOptions {
    pub router_names: Vec<String>,
    pub attr_names: Vec<String>,
    pub include_router: bool,
    pub include_attributes: bool,
    pub case_insensitive: bool,
    pub normalize_trim: bool,
    pub normalize_ensure_slash: bool,
    pub allow_regex: String,
}

impl Default for CommandsOptions {
    fn default() -> Self {
        Self {
            router_names: DEFAULT_ROUTER_NAMES.iter().map(|s| s.to_string()).collect(),
            attr_names: DEFAULT_ATTR_NAMES.iter().map(|s| s.to_string()).collect(),
            include_router: true,
            include_attributes: true,
            case_insensitive: false,
            normalize_trim: true,
            normalize_ensure_slash: true,
            allow_regex: DEFAULT_ALLOW_REGEX.to_string(),
        }
    }
}

/// Conflicting spellings that collapse onto one canonical command.
#[derive(Debug, Clone)]
pub struct CommandConflict {
    pub canonical: String,
    pub variants: Vec<CommandItem>,
}

pub struct CommandsOutcome {
    pub section: CommandsSection,
    pub conflicts: Vec<CommandConflict>,
}

pub struct CommandsExtractor {
    options: CommandsOptions,
    allow: Regex,
}

impl CommandsExtractor {
    pub fn new(options: CommandsOptions) -> anyhow::Result<Self> {
        let allow = Regex::new(&options.allow_regex)?;
        Ok(Self { options, allow })
    }

    pub fn extract<P: SemanticProvider + ?Sized>(&self, provider: &P) -> CommandsOutcome {
        let mut items = Vec::new();

        for project in provider.projects() {
            if self.options.include_router {
                for inv in provider.invocations(&project.name) {
                    if !self.options.router_names.iter().any(|n| n == &inv.method) {
                        continue;
                    }
                    let Some(raw) = &inv.first_str_arg else {
                        continue;
                    };
                    if let Some(command) = self.normalize(raw) {
                        items.push(CommandItem {
                            command,
                            handler: inv.receiver.clone(),
                            source: "router".to_string(),
                            file: inv.file.clone(),
                            line: inv.line,
                        });
                    }
                }
            }
            if self.options.include_attributes {
                for attr in provider.fn_attributes(&project.name) {
                    if !self.options.attr_names.iter().any(|n| n == &attr.name) {
                        continue;
                    }
                    for raw in &attr.str_args {
                        if let Some(command) = self.normalize(raw) {
                            let handler = match &attr.containing_type {
                                Some(t) => format!("{}::{}", t, attr.fn_name),
                                None => attr.fn_name.clone(),
                            };
                            items.push(CommandItem {
                                command,
                                handler: Some(handler),
                                source: "attribute".to_string(),
                                file: attr.file.clone(),
                                line: attr.line,
                            });
                        }
                    }
                }
            }
        }

        items.sort_by(|a, b| (&a.command, &a.file, a.line).cmp(&(&b.command, &b.file, b.line)));

        // Dedupe per canonical command; divergent spellings are conflicts.
        let mut kept: Vec<CommandItem> = Vec::new();
        let mut conflicts: Vec<CommandConflict> = Vec::new();
        for item in items {
            let canonical = self.canonical(&item.command);
            match kept.iter().find(|k| self.canonical(&k.command) == canonical) {
                None => kept.push(item),
                Some(existing) => {
                    if existing.command != item.command {
                        match conflicts.iter_mut().find(|c| c.canonical == canonical) {
                            Some(conflict) => conflict.variants.push(item),
                            None => conflicts.push(CommandConflict {
                                canonical,
                                variants: vec![existing.clone(), item],
                            }),
                        }
                    }
                }
            }
        }
        conflicts.sort_by(|a, b| a.canonical.cmp(&b.canonical));

        CommandsOutcome {
            section: CommandsSection { items: kept },
            conflicts,
        }
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let mut command = raw.to_string();
        if self.options.normalize_trim {
            command = command.trim().to_string();
        }
        if command.is_empty() {
            return None;
        }
        if self.options.normalize_ensure_slash && !command.starts_with('/') {
            command = format!("/{}", command);
        }
        let probe = if self.options.case_insensitive {
            command.to_lowercase()
        } else {
            command.clone()
        };
        if self.allow.is_match(&probe) {
            Some(command)
        } else {
            None
        }
    }

    fn canonical(&self, command: &str) -> String {
        if self.options.case_insensitive {
            command.to_lowercase()
        } else {
            command.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::project_loader::ProjectSources;
    use crate::infrastructure::symbol_store::MemorySymbolStore;
    use crate::infrastructure::syn_provider::SynProvider;
    use crate::ports::ProjectInfo;

    fn provider(source: &str) -> SynProvider {
        let sources = vec![ProjectSources {
            info: ProjectInfo {
                name: "bot".to_string(),
                relative_path: "bot/Cargo.toml".to_string(),
            },
            files: vec![("bot/src/lib.rs".to_string(), source.to_string())],
        }];
        SynProvider::build(&sources, Box::new(MemorySymbolStore::default()))
    }

    #[test]
    fn test_router_and_attribute_sources() {
        let provider = provider(
            r#"
pub fn wire(router: &mut Router) {
    router.on("/start", on_start);
    router.on(" stop ", on_stop);
    router.on("not a command!", broken);
}

#[command("/help")]
fn on_help() {}

pub struct Router;
"#,
        );
        let outcome = CommandsExtractor::new(CommandsOptions::default())
            .unwrap()
            .extract(&provider);
        let commands: Vec<&str> = outcome
            .section
            .items
            .iter()
            .map(|i| i.command.as_str())
            .collect();
        // Trim + ensure-slash normalizes " stop "; the bang fails the allow
        // pattern and is dropped.
        assert_eq!(commands, vec!["/help", "/start", "/stop"]);
        let help = &outcome.section.items[0];
        assert_eq!(help.source, "attribute");
        assert_eq!(help.handler.as_deref(), Some("on_help"));
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_case_insensitive_dedup_reports_conflicts() {
        let provider = provider(
            r#"
pub fn wire(router: &mut Router) {
    router.on("/Start", a);
    router.on("/start", b);
}

pub struct Router;
"#,
        );
        let options = CommandsOptions {
            case_insensitive: true,
            // Allow uppercase so both spellings survive normalization.
            allow_regex: "^/[A-Za-z][A-Za-z0-9_]*$".to_string(),
            ..CommandsOptions::default()
        };
        let outcome = CommandsExtractor::new(options).unwrap().extract(&provider);
        assert_eq!(outcome.section.items.len(), 1);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].canonical, "/start");
        assert_eq!(outcome.conflicts[0].variants.len(), 2);
    }

    #[test]
    fn test_invalid_allow_regex_is_an_error() {
        let options = CommandsOptions {
            allow_regex: "([".to_string(),
            ..CommandsOptions::default()
        };
        assert!(CommandsExtractor::new(options).is_err());
    }
}
