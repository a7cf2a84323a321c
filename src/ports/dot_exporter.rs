//! Callgraph DOT Exporter
//!
//! Renders callgraph sections as Graphviz DOT, one cluster per graph.
//! Secondary to the JSON artifact; meant for eyeballing a graph quickly.

use std::io::Result;
use std::path::Path;

use crate::domain::model::CallgraphsSection;

pub struct DotExporter;

impl DotExporter {
    pub fn export(sections: &[CallgraphsSection], path: &Path) -> Result<()> {
        std::fs::write(path, Self::to_dot(sections))
    }

    /// Convert callgraph sections to one DOT document.
    pub fn to_dot(sections: &[CallgraphsSection]) -> String {
        let mut lines = Vec::new();
        lines.push("digraph Callgraphs {".to_string());
        lines.push("    rankdir=LR;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=11, shape=box];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=9];".to_string());

        for (si, section) in sections.iter().enumerate() {
            for (gi, graph) in section.graphs.iter().enumerate() {
                lines.push(String::new());
                lines.push(format!("    subgraph cluster_{}_{} {{", si, gi));
                lines.push(format!(
                    "        label=\"{} {}{}\";",
                    Self::escape(&section.project.name),
                    Self::escape(&graph.root),
                    if graph.truncated { " (truncated)" } else { "" }
                ));
                lines.push(format!(
                    "        \"{}\" [style=\"filled,rounded\", fillcolor=\"#a6e3a1\"];",
                    Self::escape(&graph.root)
                ));
                for edge in &graph.edges {
                    lines.push(format!(
                        "        \"{}\" -> \"{}\";",
                        Self::escape(&edge.caller),
                        Self::escape(&edge.callee)
                    ));
                }
                lines.push("    }".to_string());
            }
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    fn escape(label: &str) -> String {
        label.replace('\\', "\\\\").replace('"', "\\\"")
    }
}
