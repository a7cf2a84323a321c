//! JSON Emitter
//!
//! Serializes a `ProjectIndex` after a final deterministic ordering pass.
//! Downstream tooling diffs this output byte-for-byte, so every
//! collection is sorted here regardless of how the extractors produced it.

use std::io::Write;

use anyhow::{Context, Result};

use crate::domain::model::*;

pub struct JsonEmitter;

impl JsonEmitter {
    pub fn emit(index: &ProjectIndex, out: &mut dyn Write, pretty: bool) -> Result<()> {
        let ordered = Self::order_collections(index.clone());
        if pretty {
            serde_json::to_writer_pretty(&mut *out, &ordered)
        } else {
            serde_json::to_writer(&mut *out, &ordered)
        }
        .context("failed to serialize index")?;
        out.write_all(b"\n").context("failed to write output")?;
        Ok(())
    }

    pub fn emit_string(index: &ProjectIndex, pretty: bool) -> Result<String> {
        let mut buf = Vec::new();
        Self::emit(index, &mut buf, pretty)?;
        String::from_utf8(buf).context("emitted JSON was not UTF-8")
    }

    fn order_collections(mut index: ProjectIndex) -> ProjectIndex {
        index.projects.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(tree) = index.tree.as_mut() {
            tree.sort_by(|a, b| a.path.cmp(&b.path));
        }

        if let Some(di) = index.di.as_mut() {
            di.registrations.sort_by(|a, b| {
                (&a.interface, &a.implementation, &a.file, a.line)
                    .cmp(&(&b.interface, &b.implementation, &b.file, b.line))
            });
            di.hosted_services.sort_by(|a, b| {
                (&a.type_name, &a.file, a.line).cmp(&(&b.type_name, &b.file, b.line))
            });
        }

        if let Some(entrypoints) = index.entrypoints.as_mut() {
            for section in entrypoints.iter_mut() {
                section.hosted_services.sort_by(|a, b| {
                    (&a.type_name, &a.file, a.line).cmp(&(&b.type_name, &b.file, b.line))
                });
            }
            entrypoints.sort_by(|a, b| {
                (&a.project.name, &a.project.file).cmp(&(&b.project.name, &b.project.file))
            });
        }

        if let Some(flows) = index.message_flow.as_mut() {
            // Node order is the extraction order; only the sections sort.
            flows.sort_by(|a, b| (&a.handler, &a.method).cmp(&(&b.handler, &b.method)));
        }

        if let Some(callgraphs) = index.callgraphs.as_mut() {
            for section in callgraphs.iter_mut() {
                for graph in section.graphs.iter_mut() {
                    graph.edges.sort();
                }
                section.graphs.sort_by(|a, b| a.root.cmp(&b.root));
            }
            callgraphs.sort_by(|a, b| a.project.name.cmp(&b.project.name));
        }

        if let Some(configs) = index.configs.as_mut() {
            configs.env_keys.sort();
            configs.env_keys.dedup();
            configs.app_props.sort();
            configs.app_props.dedup();
        }

        if let Some(commands) = index.commands.as_mut() {
            commands
                .items
                .sort_by(|a, b| (&a.command, &a.file, a.line).cmp(&(&b.command, &b.file, b.line)));
        }

        index.meta.sections = Self::section_names(&index);
        index
    }

    fn section_names(index: &ProjectIndex) -> Option<Vec<String>> {
        let mut names = Vec::new();
        let mut add = |present: bool, name: &str| {
            if present {
                names.push(name.to_string());
            }
        };
        add(index.tree.as_ref().is_some_and(|t| !t.is_empty()), "Tree");
        add(
            index
                .di
                .as_ref()
                .is_some_and(|d| !d.registrations.is_empty() || !d.hosted_services.is_empty()),
            "DI",
        );
        add(
            index.entrypoints.as_ref().is_some_and(|e| !e.is_empty()),
            "Entrypoints",
        );
        add(
            index.message_flow.as_ref().is_some_and(|f| !f.is_empty()),
            "MessageFlow",
        );
        add(
            index.callgraphs.as_ref().is_some_and(|c| !c.is_empty()),
            "Callgraphs",
        );
        add(
            index
                .configs
                .as_ref()
                .is_some_and(|c| !c.env_keys.is_empty() || !c.app_props.is_empty()),
            "Configs",
        );
        add(
            index.commands.as_ref().is_some_and(|c| !c.items.is_empty()),
            "Commands",
        );
        if names.is_empty() {
            return None;
        }
        names.sort();
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_index() -> ProjectIndex {
        ProjectIndex {
            meta: Meta {
                version: "0.1.0".to_string(),
                schema_version: SCHEMA_VERSION.to_string(),
                generated_at: "2026-01-01T00:00:00Z".to_string(),
                sections: None,
            },
            projects: vec![
                ProjectSection {
                    name: "beta".to_string(),
                    path: "beta/Cargo.toml".to_string(),
                    language: None,
                },
                ProjectSection {
                    name: "alpha".to_string(),
                    path: "alpha/Cargo.toml".to_string(),
                    language: None,
                },
            ],
            tree: None,
            di: None,
            entrypoints: None,
            message_flow: None,
            callgraphs: None,
            configs: None,
            commands: None,
        }
    }

    #[test]
    fn test_projects_sorted_by_name() {
        let json = JsonEmitter::emit_string(&minimal_index(), false).unwrap();
        let alpha = json.find("alpha").unwrap();
        let beta = json.find("beta").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut index = minimal_index();
        index.commands = Some(CommandsSection::default());
        let json = JsonEmitter::emit_string(&index, false).unwrap();
        // Present but empty: serialized, yet not listed in meta.sections.
        assert!(!json.contains("\"sections\""));
    }

    #[test]
    fn test_section_names_listed_and_sorted() {
        let mut index = minimal_index();
        index.tree = Some(vec![FileEntry {
            path: "src/lib.rs".to_string(),
            kind: "rs".to_string(),
            loc: 1,
            hash: "00".to_string(),
        }]);
        index.configs = Some(ConfigSection {
            env_keys: vec!["APP_TOKEN".to_string()],
            app_props: Vec::new(),
        });
        let json = JsonEmitter::emit_string(&index, false).unwrap();
        assert!(json.contains("\"sections\":[\"Configs\",\"Tree\"]"));
    }

    #[test]
    fn test_emit_is_byte_stable() {
        let mut index = minimal_index();
        index.callgraphs = Some(vec![CallgraphsSection {
            project: ProjectRef {
                name: "alpha".to_string(),
                file: "alpha/Cargo.toml".to_string(),
            },
            graphs: vec![Callgraph {
                root: "alpha::A.run(0)".to_string(),
                depth: 2,
                truncated: false,
                edges: vec![
                    CallEdge {
                        caller: "alpha::A.run(0)".to_string(),
                        callee: "alpha::B.step(1)".to_string(),
                    },
                    CallEdge {
                        caller: "alpha::A.run(0)".to_string(),
                        callee: "alpha::B.init(0)".to_string(),
                    },
                ],
            }],
        }]);
        let first = JsonEmitter::emit_string(&index, true).unwrap();
        let second = JsonEmitter::emit_string(&index, true).unwrap();
        assert_eq!(first, second);
        // Edges come out ordered even though they were inserted unordered.
        let init = first.find("B.init").unwrap();
        let step = first.find("B.step").unwrap();
        assert!(init < step);
    }
}
