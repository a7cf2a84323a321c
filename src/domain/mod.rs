pub mod callgraph;
pub mod determinism;
pub mod model;
