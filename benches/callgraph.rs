/// Traversal benchmarks over synthetic graphs: a deep call chain and a
/// wide fan-out, both far larger than the default node budget.
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use codeatlas::domain::callgraph::{CallgraphExtractor, CallgraphOptions};
use codeatlas::ports::{
    CallResolution, CallSiteId, DeclId, MethodDecl, MethodSig, ProjectInfo, SemanticProvider,
};

/// Synthetic provider: `width` callees per method, `size` methods total,
/// callee indexes wrapping around so the graph is cyclic.
struct SyntheticProvider {
    decls: Vec<MethodDecl>,
    width: usize,
}

impl SyntheticProvider {
    fn new(size: usize, width: usize) -> Self {
        let decls = (0..size)
            .map(|i| MethodDecl {
                sig: MethodSig {
                    containing_type: format!("bench::Type{:03}", i % 97),
                    name: format!("m{:05}", i),
                    param_count: i % 4,
                    is_ctor: false,
                },
                file: "bench/src/lib.rs".to_string(),
                line: i + 1,
                is_async: false,
                attrs: Vec::new(),
            })
            .collect();
        Self { decls, width }
    }
}

impl SemanticProvider for SyntheticProvider {
    fn projects(&self) -> Vec<ProjectInfo> {
        vec![ProjectInfo {
            name: "bench".to_string(),
            relative_path: "bench/Cargo.toml".to_string(),
        }]
    }

    fn declarations(&self, _project: &str) -> Vec<DeclId> {
        (0..self.decls.len()).collect()
    }

    fn declaration(&self, decl: DeclId) -> &MethodDecl {
        &self.decls[decl]
    }

    fn call_sites(&self, decl: DeclId) -> Vec<CallSiteId> {
        (0..self.width)
            .map(|index| CallSiteId { decl, index })
            .collect()
    }

    fn resolve_call(&self, site: CallSiteId) -> CallResolution {
        CallResolution::Source((site.decl * self.width + site.index + 1) % self.decls.len())
    }

    fn call_text(&self, _site: CallSiteId) -> String {
        String::new()
    }
}

fn bench_traversal(c: &mut Criterion) {
    let chain = SyntheticProvider::new(10_000, 1);
    let chain_root = format!(
        "{}.{}",
        chain.decls[0].sig.containing_type, chain.decls[0].sig.name
    );
    c.bench_function("deep_chain_within_budget", |b| {
        b.iter(|| {
            let options = CallgraphOptions {
                roots: vec![chain_root.clone()],
                max_depth: 512,
                max_nodes: 200,
                ..Default::default()
            };
            let sections = CallgraphExtractor::new(&chain, options).extract();
            black_box(sections)
        })
    });

    let fanout = SyntheticProvider::new(10_000, 8);
    let fanout_root = format!(
        "{}.{}",
        fanout.decls[0].sig.containing_type, fanout.decls[0].sig.name
    );
    c.bench_function("wide_fanout_truncates", |b| {
        b.iter(|| {
            let options = CallgraphOptions {
                roots: vec![fanout_root.clone()],
                max_depth: 16,
                max_nodes: 1_000,
                ..Default::default()
            };
            let sections = CallgraphExtractor::new(&fanout, options).extract();
            black_box(sections)
        })
    });
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
