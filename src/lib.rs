// Main library entry point for codeatlas.

pub mod application;
pub mod domain;
pub mod extractors;
pub mod infrastructure;
pub mod ports;
