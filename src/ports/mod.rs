//! Boundary traits and types for codeatlas.
//!
//! `SemanticProvider` is the seam between the analysis core and whatever
//! parses the workspace: the core never reads source text, it only asks
//! symbol questions through this trait.

use serde::{Deserialize, Serialize};

pub mod dot_exporter;
pub mod json_emitter;

/// Opaque handle to a method or constructor declaration owned by a provider.
pub type DeclId = usize;

/// Structural identity of a method: everything a canonical id is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    /// Qualified display name of the containing type, e.g. `my_crate::Router`.
    /// Free functions use their crate name here.
    pub containing_type: String,
    pub name: String,
    pub param_count: usize,
    pub is_ctor: bool,
}

/// A method or constructor declared inside the analyzed workspace.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub sig: MethodSig,
    pub file: String,
    pub line: usize,
    pub is_async: bool,
    /// Attribute path names attached to the item, e.g. `tokio::main`.
    pub attrs: Vec<String>,
}

/// A workspace member as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    /// Repo-relative manifest path, `/`-separated.
    pub relative_path: String,
}

/// One call expression inside a declaration body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSiteId {
    pub decl: DeclId,
    pub index: usize,
}

/// Provider answer for a single call site.
#[derive(Debug, Clone)]
pub enum CallResolution {
    /// Resolved to a declaration inside the analyzed workspace.
    Source(DeclId),
    /// Resolved, but the declaration lives outside the workspace.
    External(MethodSig),
    /// Symbol binding failed.
    Unknown,
}

/// A call expression with enough surface detail for the pattern extractors.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub method: String,
    pub receiver: Option<String>,
    /// Turbofish type arguments, rendered as source text.
    pub type_args: Vec<String>,
    pub first_str_arg: Option<String>,
    pub arg_count: usize,
    pub file: String,
    pub line: usize,
}

/// An attribute attached to a function item.
#[derive(Debug, Clone)]
pub struct FnAttribute {
    /// Last path segment of the attribute, e.g. `command`.
    pub name: String,
    /// String literals found in the attribute tokens, in source order.
    pub str_args: Vec<String>,
    pub fn_name: String,
    pub containing_type: Option<String>,
    pub file: String,
    pub line: usize,
}

/// A `receiver.field` expression.
#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub receiver: String,
    pub field: String,
    pub file: String,
    pub line: usize,
}

/// A string literal with its location.
#[derive(Debug, Clone)]
pub struct StrLiteral {
    pub value: String,
    pub file: String,
    pub line: usize,
}

/// One-level outline of a method body, for message-flow extraction.
#[derive(Debug, Clone)]
pub enum BodyStmt {
    If {
        cond: String,
        then: Vec<BodyStmt>,
        file: String,
        line: usize,
    },
    Call {
        receiver: Option<String>,
        method: String,
        file: String,
        line: usize,
    },
    Return {
        file: String,
        line: usize,
    },
}

/// Read-only semantic index of an analyzed workspace.
///
/// Implementations must answer every query deterministically: project and
/// declaration enumeration order is part of the output contract.
pub trait SemanticProvider {
    fn projects(&self) -> Vec<ProjectInfo>;

    /// Declarations of one project, in declaration-enumeration order.
    fn declarations(&self, project: &str) -> Vec<DeclId>;

    fn declaration(&self, decl: DeclId) -> &MethodDecl;

    /// Call expressions of a declaration body, in source order.
    fn call_sites(&self, decl: DeclId) -> Vec<CallSiteId>;

    fn resolve_call(&self, site: CallSiteId) -> CallResolution;

    /// Literal textual form of the call target, used as a best-effort id
    /// when resolution fails.
    fn call_text(&self, site: CallSiteId) -> String;

    // Structure queries consumed by the section extractors. Providers that
    // only serve call-graph extraction can rely on the empty defaults.

    fn invocations(&self, project: &str) -> Vec<Invocation> {
        let _ = project;
        Vec::new()
    }

    fn fn_attributes(&self, project: &str) -> Vec<FnAttribute> {
        let _ = project;
        Vec::new()
    }

    fn string_literals(&self, project: &str) -> Vec<StrLiteral> {
        let _ = project;
        Vec::new()
    }

    fn field_accesses(&self, project: &str) -> Vec<FieldAccess> {
        let _ = project;
        Vec::new()
    }

    fn body_outline(&self, decl: DeclId) -> Vec<BodyStmt> {
        let _ = decl;
        Vec::new()
    }
}
