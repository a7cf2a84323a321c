//! Syn-backed semantic provider.
//!
//! Parses every workspace source file with `syn` (in parallel), indexes
//! function and method declarations, and answers the provider queries the
//! analysis core and extractors ask. Per-file results are merged in
//! sorted-file order so declaration handles are stable across runs.
//!
//! Call resolution is conservative: a call is only reported as in-source
//! when the symbol tables pin it to exactly one workspace declaration;
//! paths rooted in foreign crates are reported as external; everything
//! else is a binding failure.

use std::collections::HashSet;

use proc_macro2::TokenTree;
use rayon::prelude::*;
use syn::spanned::Spanned;
use syn::visit::Visit;
use syn::{Expr, FnArg, ImplItem, Item, Lit, Meta, Type};
use tracing::warn;

use crate::infrastructure::project_loader::ProjectSources;
use crate::infrastructure::symbol_store::SymbolStore;
use crate::ports::{
    BodyStmt, CallResolution, CallSiteId, DeclId, FieldAccess, FnAttribute, Invocation, MethodDecl,
    MethodSig, ProjectInfo, SemanticProvider, StrLiteral,
};

/// A call expression as harvested from a declaration body.
#[derive(Debug, Clone)]
enum RawCall {
    Path {
        segments: Vec<String>,
        text: String,
        args: usize,
    },
    Method {
        receiver: String,
        name: String,
    },
}

pub struct SynProvider {
    projects: Vec<ProjectInfo>,
    crate_idents: Vec<String>,
    type_names: HashSet<String>,
    decls: Vec<MethodDecl>,
    decl_project: Vec<usize>,
    by_project: Vec<Vec<DeclId>>,
    calls: Vec<Vec<RawCall>>,
    outlines: Vec<Vec<BodyStmt>>,
    invocations: Vec<Vec<Invocation>>,
    attributes: Vec<Vec<FnAttribute>>,
    literals: Vec<Vec<StrLiteral>>,
    fields: Vec<Vec<FieldAccess>>,
    store: Box<dyn SymbolStore>,
}

impl SynProvider {
    /// Parse all project sources and build the semantic index.
    pub fn build(projects: &[ProjectSources], store: Box<dyn SymbolStore>) -> SynProvider {
        let jobs: Vec<(usize, &str, &str)> = projects
            .iter()
            .enumerate()
            .flat_map(|(pi, p)| {
                p.files
                    .iter()
                    .map(move |(path, content)| (pi, path.as_str(), content.as_str()))
            })
            .collect();

        // Parsing is parallel; `collect` preserves job order, so the merge
        // below assigns the same DeclIds on every run.
        let harvests: Vec<(usize, FileHarvest)> = jobs
            .par_iter()
            .map(|&(pi, path, content)| (pi, harvest_file(path, content)))
            .collect();

        let mut provider = SynProvider {
            projects: projects.iter().map(|p| p.info.clone()).collect(),
            crate_idents: projects
                .iter()
                .map(|p| p.info.name.replace('-', "_"))
                .collect(),
            type_names: HashSet::new(),
            decls: Vec::new(),
            decl_project: Vec::new(),
            by_project: vec![Vec::new(); projects.len()],
            calls: Vec::new(),
            outlines: Vec::new(),
            invocations: vec![Vec::new(); projects.len()],
            attributes: vec![Vec::new(); projects.len()],
            literals: vec![Vec::new(); projects.len()],
            fields: vec![Vec::new(); projects.len()],
            store,
        };

        for (pi, harvest) in harvests {
            let crate_ident = provider.crate_idents[pi].clone();
            for mut harvested in harvest.decls {
                // Containing displays are harvested without the crate
                // qualifier; attach it here where the crate is known.
                qualify(&mut harvested.decl.sig.containing_type, &crate_ident);
                let id = provider.decls.len();
                let sig = &harvested.decl.sig;
                if let Some(type_name) = simple_type_name(&sig.containing_type, &crate_ident) {
                    provider.type_names.insert(type_name.to_string());
                    provider
                        .store
                        .insert_method(type_name.to_string(), sig.name.clone(), id);
                } else {
                    provider
                        .store
                        .insert_function(format!("{}::{}", crate_ident, sig.name), id);
                }
                provider.decls.push(harvested.decl);
                provider.decl_project.push(pi);
                provider.by_project[pi].push(id);
                provider.calls.push(harvested.calls);
                provider.outlines.push(harvested.outline);
            }
            provider.invocations[pi].extend(harvest.invocations);
            provider.attributes[pi].extend(harvest.attributes);
            provider.literals[pi].extend(harvest.literals);
            provider.fields[pi].extend(harvest.fields);
        }

        provider
    }

    fn project_index(&self, project: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.name == project)
    }

    fn resolve_path_call(&self, decl: DeclId, segments: &[String], args: usize) -> CallResolution {
        let current = &self.crate_idents[self.decl_project[decl]];
        let mut segs: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut local_hint = false;
        while matches!(segs.first(), Some(&"crate") | Some(&"self") | Some(&"super")) {
            local_hint = true;
            segs.remove(0);
        }
        let Some(&name) = segs.last() else {
            return CallResolution::Unknown;
        };

        if segs.len() == 1 {
            if let Some(d) = self.store.get_function(&format!("{}::{}", current, name)) {
                return CallResolution::Source(d);
            }
            let candidates = self.store.find_functions_by_name(name);
            if candidates.len() == 1 {
                return CallResolution::Source(candidates[0]);
            }
            return CallResolution::Unknown;
        }

        let penult = segs[segs.len() - 2];
        if penult.starts_with(char::is_uppercase) {
            if let Some(d) = self.store.get_method(penult, name) {
                return CallResolution::Source(d);
            }
            if local_hint || self.type_names.contains(penult) {
                // A workspace type, but no such method: binding failure.
                return CallResolution::Unknown;
            }
            return self.external(&segs, name, args);
        }

        let head = segs[0];
        if local_hint {
            return match self.store.get_function(&format!("{}::{}", current, name)) {
                Some(d) => CallResolution::Source(d),
                None => CallResolution::Unknown,
            };
        }
        if self.crate_idents.iter().any(|c| c == head) {
            return match self.store.get_function(&format!("{}::{}", head, name)) {
                Some(d) => CallResolution::Source(d),
                None => CallResolution::Unknown,
            };
        }
        // Relative module path or a foreign crate; prefer workspace hits.
        if let Some(d) = self.store.get_function(&format!("{}::{}", current, name)) {
            return CallResolution::Source(d);
        }
        let candidates = self.store.find_functions_by_name(name);
        if candidates.len() == 1 {
            return CallResolution::Source(candidates[0]);
        }
        self.external(&segs, name, args)
    }

    fn external(&self, segs: &[&str], name: &str, args: usize) -> CallResolution {
        CallResolution::External(MethodSig {
            containing_type: segs[..segs.len() - 1].join("::"),
            name: name.to_string(),
            param_count: args,
            is_ctor: name == "new",
        })
    }

    fn resolve_method_call(&self, decl: DeclId, receiver: &str, name: &str) -> CallResolution {
        if receiver == "self" {
            let current = &self.crate_idents[self.decl_project[decl]];
            let own = &self.decls[decl].sig.containing_type;
            if let Some(type_name) = simple_type_name(own, current) {
                if let Some(d) = self.store.get_method(type_name, name) {
                    return CallResolution::Source(d);
                }
            }
        }
        let candidates = self.store.find_methods_by_name(name);
        if candidates.len() == 1 {
            return CallResolution::Source(candidates[0]);
        }
        CallResolution::Unknown
    }
}

/// Attach the crate qualifier to a harvested containing display.
fn qualify(containing: &mut String, crate_ident: &str) {
    if containing.is_empty() {
        *containing = crate_ident.to_string();
    } else {
        *containing = format!("{}::{}", crate_ident, containing);
    }
}

/// Simple type name of a method's containing display, or `None` for a
/// free function (whose display is just the crate ident).
fn simple_type_name<'a>(containing: &'a str, crate_ident: &str) -> Option<&'a str> {
    if containing == crate_ident {
        return None;
    }
    containing.rsplit("::").next()
}

impl SemanticProvider for SynProvider {
    fn projects(&self) -> Vec<ProjectInfo> {
        self.projects.clone()
    }

    fn declarations(&self, project: &str) -> Vec<DeclId> {
        self.project_index(project)
            .map(|pi| self.by_project[pi].clone())
            .unwrap_or_default()
    }

    fn declaration(&self, decl: DeclId) -> &MethodDecl {
        &self.decls[decl]
    }

    fn call_sites(&self, decl: DeclId) -> Vec<CallSiteId> {
        (0..self.calls[decl].len())
            .map(|index| CallSiteId { decl, index })
            .collect()
    }

    fn resolve_call(&self, site: CallSiteId) -> CallResolution {
        match &self.calls[site.decl][site.index] {
            RawCall::Path {
                segments, args, ..
            } => self.resolve_path_call(site.decl, segments, *args),
            RawCall::Method { receiver, name } => {
                self.resolve_method_call(site.decl, receiver, name)
            }
        }
    }

    fn call_text(&self, site: CallSiteId) -> String {
        match &self.calls[site.decl][site.index] {
            RawCall::Path { text, .. } => text.clone(),
            RawCall::Method { receiver, name } => format!("{}.{}", receiver, name),
        }
    }

    fn invocations(&self, project: &str) -> Vec<Invocation> {
        self.project_index(project)
            .map(|pi| self.invocations[pi].clone())
            .unwrap_or_default()
    }

    fn fn_attributes(&self, project: &str) -> Vec<FnAttribute> {
        self.project_index(project)
            .map(|pi| self.attributes[pi].clone())
            .unwrap_or_default()
    }

    fn string_literals(&self, project: &str) -> Vec<StrLiteral> {
        self.project_index(project)
            .map(|pi| self.literals[pi].clone())
            .unwrap_or_default()
    }

    fn field_accesses(&self, project: &str) -> Vec<FieldAccess> {
        self.project_index(project)
            .map(|pi| self.fields[pi].clone())
            .unwrap_or_default()
    }

    fn body_outline(&self, decl: DeclId) -> Vec<BodyStmt> {
        self.outlines[decl].clone()
    }
}

// ============================================================================
// Per-file harvesting
// ============================================================================

#[derive(Default)]
struct FileHarvest {
    decls: Vec<DeclHarvest>,
    invocations: Vec<Invocation>,
    attributes: Vec<FnAttribute>,
    literals: Vec<StrLiteral>,
    fields: Vec<FieldAccess>,
}

struct DeclHarvest {
    decl: MethodDecl,
    calls: Vec<RawCall>,
    outline: Vec<BodyStmt>,
}

fn harvest_file(path: &str, src: &str) -> FileHarvest {
    let ast = match syn::parse_file(src) {
        Ok(ast) => ast,
        Err(e) => {
            warn!(file = path, error = %e, "failed to parse source file");
            return FileHarvest::default();
        }
    };

    let mut harvest = FileHarvest::default();
    harvest_items(&ast.items, path, src, &mut harvest);

    let mut file_visitor = FileVisitor {
        src,
        file: path,
        literals: &mut harvest.literals,
        fields: &mut harvest.fields,
    };
    file_visitor.visit_file(&ast);

    harvest
}

fn harvest_items(items: &[Item], path: &str, src: &str, harvest: &mut FileHarvest) {
    for item in items {
        match item {
            Item::Fn(func) => {
                harvest_fn(
                    &func.sig,
                    &func.attrs,
                    &func.block,
                    String::new(),
                    path,
                    src,
                    harvest,
                );
            }
            Item::Impl(imp) => {
                let Type::Path(tp) = &*imp.self_ty else {
                    continue;
                };
                let Some(segment) = tp.path.segments.last() else {
                    continue;
                };
                let type_name = segment.ident.to_string();
                for impl_item in &imp.items {
                    if let ImplItem::Fn(method) = impl_item {
                        harvest_fn(
                            &method.sig,
                            &method.attrs,
                            &method.block,
                            type_name.clone(),
                            path,
                            src,
                            harvest,
                        );
                    }
                }
            }
            Item::Mod(module) => {
                if let Some((_, content)) = &module.content {
                    harvest_items(content, path, src, harvest);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn harvest_fn(
    sig: &syn::Signature,
    attrs: &[syn::Attribute],
    block: &syn::Block,
    containing_type: String,
    path: &str,
    src: &str,
    harvest: &mut FileHarvest,
) {
    let name = sig.ident.to_string();
    let line = sig.ident.span().start().line;
    let param_count = sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();
    let is_ctor = !containing_type.is_empty() && name == "new" && sig.receiver().is_none();
    let attr_names: Vec<String> = attrs.iter().map(|a| path_display(a.path())).collect();

    for attr in attrs {
        let attr_name = attr
            .path()
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .unwrap_or_default();
        let str_args = attr_str_args(attr);
        harvest.attributes.push(FnAttribute {
            name: attr_name,
            str_args,
            fn_name: name.clone(),
            containing_type: if containing_type.is_empty() {
                None
            } else {
                Some(containing_type.clone())
            },
            file: path.to_string(),
            line,
        });
    }

    let mut calls = Vec::new();
    let mut body_visitor = BodyVisitor {
        src,
        file: path,
        calls: &mut calls,
        invocations: &mut harvest.invocations,
    };
    body_visitor.visit_block(block);

    let outline = outline_block(block, src, path);

    harvest.decls.push(DeclHarvest {
        decl: MethodDecl {
            sig: MethodSig {
                containing_type,
                name,
                param_count,
                is_ctor,
            },
            file: path.to_string(),
            line,
            is_async: sig.asyncness.is_some(),
            attrs: attr_names,
        },
        calls,
        outline,
    });
}

fn path_display(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// String literals mentioned by an attribute, e.g. `#[command("/start")]`
/// or `#[command = "/start"]`.
fn attr_str_args(attr: &syn::Attribute) -> Vec<String> {
    let mut out = Vec::new();
    match &attr.meta {
        Meta::List(list) => collect_str_tokens(list.tokens.clone(), &mut out),
        Meta::NameValue(nv) => {
            if let Expr::Lit(lit) = &nv.value {
                if let Lit::Str(s) = &lit.lit {
                    out.push(s.value());
                }
            }
        }
        Meta::Path(_) => {}
    }
    out
}

fn collect_str_tokens(tokens: proc_macro2::TokenStream, out: &mut Vec<String>) {
    for token in tokens {
        match token {
            TokenTree::Literal(lit) => {
                if let Lit::Str(s) = Lit::new(lit) {
                    out.push(s.value());
                }
            }
            TokenTree::Group(group) => collect_str_tokens(group.stream(), out),
            _ => {}
        }
    }
}

fn span_text<'s>(src: &'s str, span: proc_macro2::Span) -> &'s str {
    src.get(span.byte_range()).unwrap_or("")
}

/// Strip `.await` and `?` layers so the interesting call shows through.
fn peel(expr: &Expr) -> &Expr {
    match expr {
        Expr::Await(inner) => peel(&inner.base),
        Expr::Try(inner) => peel(&inner.expr),
        _ => expr,
    }
}

struct BodyVisitor<'s, 'o> {
    src: &'s str,
    file: &'s str,
    calls: &'o mut Vec<RawCall>,
    invocations: &'o mut Vec<Invocation>,
}

impl<'s, 'o, 'ast> Visit<'ast> for BodyVisitor<'s, 'o> {
    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if let Expr::Path(expr_path) = &*node.func {
            let segments: Vec<String> = expr_path
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect();
            if !segments.is_empty() {
                let args = node.args.len();
                self.calls.push(RawCall::Path {
                    segments: segments.clone(),
                    text: span_text(self.src, node.func.span()).to_string(),
                    args,
                });
                let receiver = if segments.len() > 1 {
                    Some(segments[..segments.len() - 1].join("::"))
                } else {
                    None
                };
                self.invocations.push(Invocation {
                    method: segments[segments.len() - 1].clone(),
                    receiver,
                    type_args: generic_args(expr_path.path.segments.last(), self.src),
                    first_str_arg: first_str_arg(node.args.first()),
                    arg_count: args,
                    file: self.file.to_string(),
                    line: node.func.span().start().line,
                });
            }
        }
        syn::visit::visit_expr_call(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        let receiver = span_text(self.src, node.receiver.span()).to_string();
        let name = node.method.to_string();
        let args = node.args.len();
        self.calls.push(RawCall::Method {
            receiver: receiver.clone(),
            name: name.clone(),
        });
        self.invocations.push(Invocation {
            method: name,
            receiver: Some(receiver),
            type_args: node
                .turbofish
                .as_ref()
                .map(|tf| {
                    tf.args
                        .iter()
                        .filter_map(|arg| match arg {
                            syn::GenericArgument::Type(ty) => {
                                Some(span_text(self.src, ty.span()).to_string())
                            }
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            first_str_arg: first_str_arg(node.args.first()),
            arg_count: args,
            file: self.file.to_string(),
            line: node.method.span().start().line,
        });
        syn::visit::visit_expr_method_call(self, node);
    }
}

fn generic_args(segment: Option<&syn::PathSegment>, src: &str) -> Vec<String> {
    let Some(segment) = segment else {
        return Vec::new();
    };
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(ab) => ab
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(span_text(src, ty.span()).to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn first_str_arg(arg: Option<&Expr>) -> Option<String> {
    match arg.map(peel) {
        Some(Expr::Lit(lit)) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

struct FileVisitor<'s, 'o> {
    src: &'s str,
    file: &'s str,
    literals: &'o mut Vec<StrLiteral>,
    fields: &'o mut Vec<FieldAccess>,
}

impl<'s, 'o, 'ast> Visit<'ast> for FileVisitor<'s, 'o> {
    fn visit_lit_str(&mut self, node: &'ast syn::LitStr) {
        self.literals.push(StrLiteral {
            value: node.value(),
            file: self.file.to_string(),
            line: node.span().start().line,
        });
    }

    fn visit_expr_field(&mut self, node: &'ast syn::ExprField) {
        if let syn::Member::Named(field) = &node.member {
            self.fields.push(FieldAccess {
                receiver: span_text(self.src, node.base.span()).to_string(),
                field: field.to_string(),
                file: self.file.to_string(),
                line: field.span().start().line,
            });
        }
        syn::visit::visit_expr_field(self, node);
    }
}

// ============================================================================
// Body outline (one level deep, for message-flow extraction)
// ============================================================================

fn outline_block(block: &syn::Block, src: &str, file: &str) -> Vec<BodyStmt> {
    let mut out = Vec::new();
    for stmt in &block.stmts {
        if let syn::Stmt::Expr(expr, _) = stmt {
            outline_expr(expr, src, file, &mut out);
        }
    }
    out
}

fn outline_expr(expr: &Expr, src: &str, file: &str, out: &mut Vec<BodyStmt>) {
    match peel(expr) {
        Expr::If(expr_if) => {
            let mut then = Vec::new();
            for stmt in &expr_if.then_branch.stmts {
                if let syn::Stmt::Expr(inner, _) = stmt {
                    outline_leaf(inner, src, file, &mut then);
                }
            }
            out.push(BodyStmt::If {
                cond: span_text(src, expr_if.cond.span()).to_string(),
                then,
                file: file.to_string(),
                line: expr_if.cond.span().start().line,
            });
        }
        other => outline_leaf(other, src, file, out),
    }
}

fn outline_leaf(expr: &Expr, src: &str, file: &str, out: &mut Vec<BodyStmt>) {
    match peel(expr) {
        Expr::MethodCall(mc) => out.push(BodyStmt::Call {
            receiver: Some(span_text(src, mc.receiver.span()).to_string()),
            method: mc.method.to_string(),
            file: file.to_string(),
            line: mc.method.span().start().line,
        }),
        Expr::Call(call) => {
            if let Expr::Path(expr_path) = &*call.func {
                let segments: Vec<String> = expr_path
                    .path
                    .segments
                    .iter()
                    .map(|s| s.ident.to_string())
                    .collect();
                if let Some((method, prefix)) = segments.split_last() {
                    out.push(BodyStmt::Call {
                        receiver: if prefix.is_empty() {
                            None
                        } else {
                            Some(prefix.join("::"))
                        },
                        method: method.clone(),
                        file: file.to_string(),
                        line: call.func.span().start().line,
                    });
                }
            }
        }
        Expr::Return(ret) => out.push(BodyStmt::Return {
            file: file.to_string(),
            line: ret.span().start().line,
        }),
        _ => {}
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::symbol_store::MemorySymbolStore;

    fn project(name: &str, files: Vec<(&str, &str)>) -> ProjectSources {
        ProjectSources {
            info: ProjectInfo {
                name: name.to_string(),
                relative_path: format!("{}/Cargo.toml", name),
            },
            files: files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        }
    }

    fn build(projects: Vec<ProjectSources>) -> SynProvider {
        SynProvider::build(&projects, Box::new(MemorySymbolStore::default()))
    }

    fn decl_ids(provider: &SynProvider, project: &str) -> Vec<String> {
        provider
            .declarations(project)
            .into_iter()
            .map(|d| {
                let sig = &provider.declaration(d).sig;
                format!("{}::{}", sig.containing_type, sig.name)
            })
            .collect()
    }

    #[test]
    fn test_indexes_free_fns_and_methods() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/lib.rs",
                r#"
pub fn run() {}

pub struct Router;

impl Router {
    pub fn new() -> Self { Router }
    pub fn dispatch(&self, msg: &str) {}
}
"#,
            )],
        )]);
        assert_eq!(
            decl_ids(&provider, "app"),
            vec!["app::run", "app::Router::new", "app::Router::dispatch"]
        );
        let new_decl = provider.declarations("app")[1];
        assert!(provider.declaration(new_decl).sig.is_ctor);
        let dispatch = provider.declarations("app")[2];
        assert_eq!(provider.declaration(dispatch).sig.param_count, 1);
    }

    #[test]
    fn test_resolves_local_and_cross_crate_calls() {
        let provider = build(vec![
            project(
                "core",
                vec![("core/src/lib.rs", "pub fn shared() {}\n")],
            ),
            project(
                "app",
                vec![(
                    "app/src/lib.rs",
                    r#"
pub fn helper() {}

pub fn run() {
    helper();
    core::shared();
    std::fs::read_to_string("x");
}
"#,
                )],
            ),
        ]);
        let run = provider
            .declarations("app")
            .into_iter()
            .find(|&d| provider.declaration(d).sig.name == "run")
            .unwrap();
        let resolutions: Vec<CallResolution> = provider
            .call_sites(run)
            .into_iter()
            .map(|s| provider.resolve_call(s))
            .collect();
        assert!(matches!(resolutions[0], CallResolution::Source(_)));
        assert!(matches!(resolutions[1], CallResolution::Source(_)));
        match &resolutions[2] {
            CallResolution::External(sig) => {
                assert_eq!(sig.containing_type, "std::fs");
                assert_eq!(sig.name, "read_to_string");
                assert_eq!(sig.param_count, 1);
            }
            other => panic!("expected external, got {:?}", other),
        }
    }

    #[test]
    fn test_resolves_self_method_calls() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/lib.rs",
                r#"
pub struct Worker;

impl Worker {
    pub fn step(&self) {}
    pub fn run(&self) { self.step(); }
}

pub struct Other;

impl Other {
    pub fn step(&self) {}
}
"#,
            )],
        )]);
        let run = provider
            .declarations("app")
            .into_iter()
            .find(|&d| provider.declaration(d).sig.name == "run")
            .unwrap();
        let site = provider.call_sites(run)[0];
        // `step` exists on two types, but `self.step()` pins the receiver.
        match provider.resolve_call(site) {
            CallResolution::Source(d) => {
                assert_eq!(
                    provider.declaration(d).sig.containing_type,
                    "app::Worker"
                );
            }
            other => panic!("expected source, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_method_call_is_unknown() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/lib.rs",
                r#"
pub fn run(values: Vec<i32>) {
    values.iter();
}
"#,
            )],
        )]);
        let run = provider.declarations("app")[0];
        let site = provider.call_sites(run)[0];
        assert!(matches!(provider.resolve_call(site), CallResolution::Unknown));
        assert_eq!(provider.call_text(site), "values.iter");
    }

    #[test]
    fn test_invocations_capture_turbofish_and_literals() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/lib.rs",
                r#"
pub fn setup(builder: &mut Builder) {
    builder.add_singleton::<dyn Store, MemoryStore>();
    builder.route("/start", on_start);
}

pub struct Builder;
"#,
            )],
        )]);
        let invocations = provider.invocations("app");
        let add = invocations
            .iter()
            .find(|i| i.method == "add_singleton")
            .unwrap();
        assert_eq!(add.type_args, vec!["dyn Store", "MemoryStore"]);
        let route = invocations.iter().find(|i| i.method == "route").unwrap();
        assert_eq!(route.first_str_arg.as_deref(), Some("/start"));
        assert_eq!(route.arg_count, 2);
    }

    #[test]
    fn test_fn_attributes_and_literals() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/main.rs",
                r#"
#[tokio::main]
async fn main() {
    let _token = std::env::var("APP_TOKEN");
}

#[command("/help")]
fn on_help() {}
"#,
            )],
        )]);
        let attrs = provider.fn_attributes("app");
        let main_attr = attrs.iter().find(|a| a.fn_name == "main").unwrap();
        assert_eq!(main_attr.name, "main");
        let command = attrs.iter().find(|a| a.name == "command").unwrap();
        assert_eq!(command.str_args, vec!["/help"]);

        let main_decl = provider.declarations("app")[0];
        assert!(provider.declaration(main_decl).is_async);
        assert_eq!(provider.declaration(main_decl).attrs, vec!["tokio::main"]);

        assert!(provider
            .string_literals("app")
            .iter()
            .any(|l| l.value == "APP_TOKEN"));
    }

    #[test]
    fn test_body_outline_guard_and_delegate() {
        let provider = build(vec![project(
            "app",
            vec![(
                "app/src/lib.rs",
                r#"
pub struct Handler { facade: Facade }
pub struct Facade;

impl Facade {
    pub fn forward(&self) {}
}

impl Handler {
    pub fn handle(&self, msg: &str) {
        if msg.is_empty() {
            return;
        }
        self.facade.forward();
    }
}
"#,
            )],
        )]);
        let handle = provider
            .declarations("app")
            .into_iter()
            .find(|&d| provider.declaration(d).sig.name == "handle")
            .unwrap();
        let outline = provider.body_outline(handle);
        assert_eq!(outline.len(), 2);
        match &outline[0] {
            BodyStmt::If { cond, then, .. } => {
                assert_eq!(cond, "msg.is_empty()");
                assert!(matches!(then[0], BodyStmt::Return { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
        match &outline[1] {
            BodyStmt::Call { receiver, method, .. } => {
                assert_eq!(receiver.as_deref(), Some("self.facade"));
                assert_eq!(method, "forward");
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let sources = vec![project(
            "app",
            vec![
                ("app/src/a.rs", "pub fn a() { b(); }\npub fn b() {}\n"),
                ("app/src/b.rs", "pub fn c() { a(); }\n"),
            ],
        )];
        let first = decl_ids(&build(sources.clone()), "app");
        let second = decl_ids(&build(sources), "app");
        assert_eq!(first, second);
    }
}
