/// Full scan over a real on-disk workspace: loader, provider, extractors
/// and emitter together, with determinism checked byte-for-byte.
use std::fs;
use std::path::Path;

use tempfile::tempdir;

use codeatlas::application::{ScanOptions, ScanUsecase};
use codeatlas::domain::callgraph::CallgraphOptions;
use codeatlas::extractors::configs::ConfigsOptions;
use codeatlas::extractors::flow::FlowOptions;
use codeatlas::infrastructure::tree_scanner::LocMode;
use codeatlas::ports::json_emitter::JsonEmitter;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture_workspace(root: &Path) {
    write(
        &root.join("Cargo.toml"),
        "[workspace]\nmembers = [\"bot\"]\nresolver = \"2\"\n",
    );
    write(
        &root.join("bot/Cargo.toml"),
        "[package]\nname = \"bot\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    );
    write(
        &root.join("bot/src/main.rs"),
        r#"fn main() {
    let token = std::env::var("BOT_TOKEN");
    let mut router = Router::new();
    wire(&mut router);
    run(router, token.unwrap_or_default());
}

pub struct Router;

impl Router {
    pub fn new() -> Self {
        Router
    }
    pub fn on(&mut self, command: &str, handler: fn()) {
        let _ = (command, handler);
    }
}

pub struct UpdateHandler {
    service: Service,
}

impl UpdateHandler {
    pub fn handle(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.service.forward();
    }
}

pub struct Service;

impl Service {
    pub fn forward(&self) {}
}

fn wire(router: &mut Router) {
    router.on("/start", on_start);
    router.on("/help", on_help);
}

fn on_start() {}
fn on_help() {}

fn run(router: Router, token: String) {
    let _ = (router, token);
}
"#,
    );
}

fn scan_options(root: &Path) -> ScanOptions {
    ScanOptions {
        manifest: root.join("Cargo.toml"),
        scan_configs: true,
        scan_commands: true,
        scan_flow: true,
        configs: ConfigsOptions {
            env_prefixes: vec!["BOT_".to_string()],
        },
        flow: Some(FlowOptions::for_handler("UpdateHandler")),
        callgraph: CallgraphOptions {
            roots: vec!["bot.main".to_string()],
            max_depth: 3,
            max_nodes: 100,
            ..Default::default()
        },
        loc_mode: LocMode::Physical,
        generated_at: Some("2026-08-01T00:00:00Z".to_string()),
        ..Default::default()
    }
}

#[test]
fn scan_produces_all_requested_sections() {
    let dir = tempdir().unwrap();
    fixture_workspace(dir.path());

    let index = ScanUsecase::run(&scan_options(dir.path())).unwrap();

    assert_eq!(index.projects.len(), 1);
    assert_eq!(index.projects[0].name, "bot");
    assert_eq!(index.projects[0].path, "bot/Cargo.toml");

    let tree = index.tree.as_ref().unwrap();
    assert!(tree.iter().any(|f| f.path == "bot/src/main.rs"));
    assert!(tree.iter().all(|f| !f.hash.is_empty()));

    let entrypoints = index.entrypoints.as_ref().unwrap();
    let main = entrypoints[0].program_main.as_ref().unwrap();
    assert_eq!(main.file, "bot/src/main.rs");
    assert_eq!(main.line, 1);
    assert!(!main.is_async);

    let commands = index.commands.as_ref().unwrap();
    let listed: Vec<&str> = commands.items.iter().map(|i| i.command.as_str()).collect();
    assert_eq!(listed, vec!["/help", "/start"]);

    let configs = index.configs.as_ref().unwrap();
    assert_eq!(configs.env_keys, vec!["BOT_TOKEN"]);

    let flows = index.message_flow.as_ref().unwrap();
    assert_eq!(flows.len(), 1);
    let kinds: Vec<&str> = flows[0].nodes.iter().map(|n| n.kind.as_str()).collect();
    assert_eq!(kinds, vec!["guard", "return", "delegate"]);

    let callgraphs = index.callgraphs.as_ref().unwrap();
    assert_eq!(callgraphs.len(), 1);
    let graph = &callgraphs[0].graphs[0];
    assert_eq!(graph.root, "bot.main(0)");
    assert!(!graph.truncated);
    assert!(graph
        .edges
        .iter()
        .any(|e| e.caller == "bot.main(0)" && e.callee == "bot::Router..ctor(0)"));
    assert!(graph
        .edges
        .iter()
        .any(|e| e.caller == "bot.wire(0)" && e.callee == "bot::Router.on(2)"));
}

#[test]
fn scan_output_is_byte_stable() {
    let dir = tempdir().unwrap();
    fixture_workspace(dir.path());
    let options = scan_options(dir.path());

    let first = JsonEmitter::emit_string(&ScanUsecase::run(&options).unwrap(), true).unwrap();
    let second = JsonEmitter::emit_string(&ScanUsecase::run(&options).unwrap(), true).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("\"Callgraphs\""));
}

#[test]
fn missing_manifest_is_a_load_error() {
    let dir = tempdir().unwrap();
    let options = ScanOptions {
        manifest: dir.path().join("Cargo.toml"),
        ..Default::default()
    };
    let err = ScanUsecase::run(&options).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
