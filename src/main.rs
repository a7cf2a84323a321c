// Command-line entry point for codeatlas.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use codeatlas::application::config::ScanConfig;
use codeatlas::application::{ConflictPolicy, ScanError, ScanOptions, ScanUsecase, StoreKind};
use codeatlas::domain::callgraph::CallgraphOptions;
use codeatlas::extractors::commands::CommandsOptions;
use codeatlas::extractors::configs::ConfigsOptions;
use codeatlas::extractors::di::{DedupeMode, DiOptions};
use codeatlas::extractors::flow::FlowOptions;
use codeatlas::infrastructure::concurrency;
use codeatlas::infrastructure::tree_scanner::LocMode;
use codeatlas::ports::dot_exporter::DotExporter;
use codeatlas::ports::json_emitter::JsonEmitter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a Cargo workspace and emit the architectural index as JSON
    Scan(ScanArgs),
    /// Print a commented example configuration file
    InitConfig,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Path to the workspace Cargo.toml
    #[arg(long, default_value = "Cargo.toml")]
    manifest: PathBuf,

    /// Write JSON to a file (default stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Also write the callgraph sections as Graphviz DOT
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Load scan settings from a TOML file (flags override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Additional file suffix for the tree section (repeatable)
    #[arg(long)]
    ext: Vec<String>,

    /// Path prefix to exclude from the tree section (repeatable)
    #[arg(long)]
    ignore: Vec<String>,

    /// Do not honor .gitignore while scanning the tree
    #[arg(long)]
    no_gitignore: bool,

    /// LOC counting mode: physical or logical
    #[arg(long)]
    loc_mode: Option<String>,

    #[arg(long)]
    no_scan_tree: bool,
    #[arg(long)]
    no_scan_di: bool,
    #[arg(long)]
    no_scan_entrypoints: bool,
    #[arg(long)]
    scan_configs: bool,
    #[arg(long)]
    scan_commands: bool,
    #[arg(long)]
    scan_flow: bool,

    /// Env-key prefix for the configs section (repeatable)
    #[arg(long)]
    env_prefix: Vec<String>,

    /// Comma/space separated router method names
    #[arg(long)]
    commands_router_names: Option<String>,
    /// Comma/space separated attribute names
    #[arg(long)]
    commands_attr_names: Option<String>,
    /// Comma/space separated normalization rules: trim, ensure-slash
    #[arg(long)]
    commands_normalize: Option<String>,
    /// case-sensitive | case-insensitive
    #[arg(long)]
    commands_dedup: Option<String>,
    /// warn | error | ignore
    #[arg(long)]
    commands_conflicts: Option<String>,
    /// Allow-pattern commands must match
    #[arg(long)]
    commands_allow_regex: Option<String>,
    /// DI dedupe mode: keep-all | keep-first
    #[arg(long)]
    di_dedupe: Option<String>,

    /// Handler type for message-flow extraction
    #[arg(long)]
    flow_handler: Option<String>,
    /// Handler method name (default handle)
    #[arg(long)]
    flow_method: Option<String>,

    /// Root method to build a call graph from (repeatable),
    /// e.g. my_crate::Router.dispatch/2
    #[arg(long = "callgraph-method")]
    callgraph_method: Vec<String>,
    #[arg(long)]
    max_call_depth: Option<usize>,
    #[arg(long)]
    max_call_nodes: Option<usize>,
    /// Keep external/unresolved callees as leaf nodes
    #[arg(long)]
    include_external: bool,

    /// Symbol store backend: memory | disk
    #[arg(long, default_value = "memory")]
    store: String,
    /// Directory for the disk symbol store
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Verbose diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig => {
            println!("{}", ScanConfig::example());
            ExitCode::SUCCESS
        }
        Command::Scan(args) => {
            init_tracing(args.verbose);
            if let Err(e) = concurrency::init_thread_pool() {
                tracing::debug!(error = %e, "thread pool already initialized");
            }
            match run_scan(&args) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    ExitCode::from(e.exit_code() as u8)
                }
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "codeatlas=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scan(args: &ScanArgs) -> Result<(), ScanError> {
    let options = build_options(args)?;
    let index = ScanUsecase::run(&options)?;

    if let Some(dot_path) = &args.dot {
        if let Some(callgraphs) = &index.callgraphs {
            DotExporter::export(callgraphs, dot_path)
                .map_err(|e| ScanError::Other(anyhow::anyhow!(e)))?;
        }
    }

    let pretty = !args.compact;
    match &args.out {
        Some(path) => {
            let mut file = File::create(path)
                .map_err(|e| ScanError::Other(anyhow::anyhow!("cannot create output: {}", e)))?;
            JsonEmitter::emit(&index, &mut file, pretty)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            JsonEmitter::emit(&index, &mut lock, pretty)?;
            lock.flush().ok();
        }
    }
    Ok(())
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Merge the config file (if any) under the CLI flags.
fn build_options(args: &ScanArgs) -> Result<ScanOptions, ScanError> {
    let file = match &args.config {
        Some(path) => ScanConfig::load(path).map_err(|e| ScanError::Usage(format!("{:#}", e)))?,
        None => ScanConfig::default(),
    };

    let loc_mode_raw = args
        .loc_mode
        .clone()
        .unwrap_or_else(|| file.tree.loc_mode.clone());
    let loc_mode = LocMode::parse(&loc_mode_raw)
        .ok_or_else(|| ScanError::Usage(format!("unknown loc-mode: {}", loc_mode_raw)))?;

    let di_dedupe_raw = args
        .di_dedupe
        .clone()
        .unwrap_or_else(|| file.di.dedupe.clone());
    let di = DiOptions {
        registrar_names: file.di.registrars.clone(),
        dedupe: DedupeMode::parse(&di_dedupe_raw)
            .ok_or_else(|| ScanError::Usage(format!("unknown di dedupe mode: {}", di_dedupe_raw)))?,
    };

    let normalize = args
        .commands_normalize
        .as_deref()
        .map(split_names)
        .unwrap_or_else(|| file.commands.normalize.clone());
    let dedup_raw = args
        .commands_dedup
        .clone()
        .unwrap_or_else(|| file.commands.dedup.clone());
    let case_insensitive = match dedup_raw.as_str() {
        "case-sensitive" => false,
        "case-insensitive" | "ci" => true,
        other => {
            return Err(ScanError::Usage(format!(
                "unknown commands dedup mode: {}",
                other
            )))
        }
    };
    let commands = CommandsOptions {
        router_names: args
            .commands_router_names
            .as_deref()
            .map(split_names)
            .unwrap_or_else(|| file.commands.router_names.clone()),
        attr_names: args
            .commands_attr_names
            .as_deref()
            .map(split_names)
            .unwrap_or_else(|| file.commands.attr_names.clone()),
        include_router: file.commands.include.iter().any(|i| i == "router"),
        include_attributes: file.commands.include.iter().any(|i| i == "attributes"),
        case_insensitive,
        normalize_trim: normalize.iter().any(|n| n == "trim"),
        normalize_ensure_slash: normalize.iter().any(|n| n == "ensure-slash"),
        allow_regex: args
            .commands_allow_regex
            .clone()
            .unwrap_or_else(|| file.commands.allow_regex.clone()),
    };
    let conflicts_raw = args
        .commands_conflicts
        .clone()
        .unwrap_or_else(|| file.commands.conflicts.clone());
    let conflict_policy = ConflictPolicy::parse(&conflicts_raw).ok_or_else(|| {
        ScanError::Usage(format!("unknown commands conflicts mode: {}", conflicts_raw))
    })?;

    let flow_handler = args.flow_handler.clone().or_else(|| file.flow.handler.clone());
    let flow = flow_handler.map(|handler| FlowOptions {
        handler,
        method: args
            .flow_method
            .clone()
            .unwrap_or_else(|| file.flow.method.clone()),
        delegate_suffixes: file.flow.delegate_suffixes.clone(),
    });

    let mut roots = file.callgraph.methods.clone();
    for method in &args.callgraph_method {
        if !roots.contains(method) {
            roots.push(method.clone());
        }
    }

    let store = match args.store.as_str() {
        "memory" => StoreKind::Memory,
        "disk" => {
            let path = args.store_path.clone().ok_or_else(|| {
                ScanError::Usage("--store disk requires --store-path".to_string())
            })?;
            StoreKind::Disk(path)
        }
        other => return Err(ScanError::Usage(format!("unknown store backend: {}", other))),
    };

    let mut exts = file.scan.ext.clone();
    exts.extend(args.ext.iter().cloned());
    let mut ignores = file.scan.ignore.clone();
    ignores.extend(args.ignore.iter().cloned());

    Ok(ScanOptions {
        manifest: args.manifest.clone(),
        exts,
        ignores,
        use_gitignore: file.tree.use_gitignore && !args.no_gitignore,
        loc_mode,
        scan_tree: !args.no_scan_tree,
        scan_di: !args.no_scan_di,
        scan_entrypoints: !args.no_scan_entrypoints,
        scan_configs: args.scan_configs,
        scan_commands: args.scan_commands,
        scan_flow: args.scan_flow,
        di,
        commands,
        conflict_policy,
        configs: ConfigsOptions {
            env_prefixes: if args.env_prefix.is_empty() {
                file.configs.env_prefixes.clone()
            } else {
                args.env_prefix.clone()
            },
        },
        flow,
        callgraph: CallgraphOptions {
            roots,
            max_depth: args.max_call_depth.unwrap_or(file.callgraph.max_depth),
            max_nodes: args.max_call_nodes.unwrap_or(file.callgraph.max_nodes),
            include_external: args.include_external || file.callgraph.include_external,
            verbose: args.verbose,
        },
        store,
        generated_at: None,
    })
}
