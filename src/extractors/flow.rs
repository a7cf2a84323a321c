//! Message-flow extraction.
//!
//! Outlines a handler method as an ordered list of guard, delegate and
//! return nodes. A guard of the shape `if cond { delegate(); return; }`
//! collapses to the delegate node alone, so the common early-dispatch
//! pattern reads as a single step.

use crate::domain::model::{FlowNode, MessageFlowSection};
use crate::ports::{BodyStmt, SemanticProvider};

pub const DEFAULT_DELEGATE_SUFFIXES: &[&str] = &[
    "router",
    "facade",
    "service",
    "dispatcher",
    "processor",
    "manager",
    "module",
];

pub const DEFAULT_FLOW_METHOD: &str = "handle";

#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Simple name of the handler type, e.g. `UpdateHandler`.
    pub handler: String,
    pub method: String,
    pub delegate_suffixes: Vec<String>,
}

impl FlowOptions {
    pub fn for_handler(handler: &str) -> Self {
        Self {
            handler: handler.to_string(),
            method: DEFAULT_FLOW_METHOD.to_string(),
            delegate_suffixes: DEFAULT_DELEGATE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct FlowExtractor {
    options: FlowOptions,
}

impl FlowExtractor {
    pub fn new(options: FlowOptions) -> Self {
        Self { options }
    }

    pub fn extract<P: SemanticProvider + ?Sized>(&self, provider: &P) -> Vec<MessageFlowSection> {
        let mut sections = Vec::new();
        for project in provider.projects() {
            for decl_id in provider.declarations(&project.name) {
                let decl = provider.declaration(decl_id);
                let type_name = decl
                    .sig
                    .containing_type
                    .rsplit("::")
                    .next()
                    .unwrap_or_default();
                if type_name != self.options.handler || decl.sig.name != self.options.method {
                    continue;
                }
                let mut nodes = Vec::new();
                for stmt in provider.body_outline(decl_id) {
                    self.emit(&stmt, &mut nodes);
                }
                for (order, node) in nodes.iter_mut().enumerate() {
                    node.order = order;
                }
                sections.push(MessageFlowSection {
                    handler: self.options.handler.clone(),
                    method: self.options.method.clone(),
                    nodes,
                });
            }
        }
        sections
    }

    fn emit(&self, stmt: &BodyStmt, out: &mut Vec<FlowNode>) {
        match stmt {
            BodyStmt::If {
                cond,
                then,
                file,
                line,
            } => {
                // Collapse `if cond { delegate(); return; }` to the delegate.
                if let [delegate @ BodyStmt::Call { .. }, BodyStmt::Return { .. }] = &then[..] {
                    if let Some(node) = self.delegate_node(delegate) {
                        out.push(node);
                        return;
                    }
                }
                out.push(FlowNode {
                    order: 0,
                    kind: "guard".to_string(),
                    detail: cond.clone(),
                    file: file.clone(),
                    line: *line,
                });
                for inner in then {
                    match inner {
                        BodyStmt::Call { .. } => {
                            if let Some(node) = self.delegate_node(inner) {
                                out.push(node);
                            }
                        }
                        BodyStmt::Return { file, line } => out.push(FlowNode {
                            order: 0,
                            kind: "return".to_string(),
                            detail: "return".to_string(),
                            file: file.clone(),
                            line: *line,
                        }),
                        BodyStmt::If { .. } => {}
                    }
                }
            }
            BodyStmt::Call { .. } => {
                if let Some(node) = self.delegate_node(stmt) {
                    out.push(node);
                }
            }
            BodyStmt::Return { file, line } => out.push(FlowNode {
                order: 0,
                kind: "return".to_string(),
                detail: "return".to_string(),
                file: file.clone(),
                line: *line,
            }),
        }
    }

    fn delegate_node(&self, stmt: &BodyStmt) -> Option<FlowNode> {
        let BodyStmt::Call {
            receiver: Some(receiver),
            method,
            file,
            line,
        } = stmt
        else {
            return None;
        };
        let tail = receiver
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(receiver)
            .to_lowercase();
        if !self
            .options
            .delegate_suffixes
            .iter()
            .any(|suffix| tail.ends_with(suffix))
        {
            return None;
        }
        let detail = format!(
            "{}.{}",
            receiver.rsplit(['.', ':']).next().unwrap_or(receiver),
            method
        );
        Some(FlowNode {
            order: 0,
            kind: "delegate".to_string(),
            detail,
            file: file.clone(),
            line: *line,
        })
    }
}
