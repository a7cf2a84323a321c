//! Section extractors.
//!
//! Each extractor consumes only the `SemanticProvider` and produces one
//! section of the index, fully sorted. Extractors never parse source and
//! never abort the scan: a section that cannot be built is skipped by the
//! caller.

pub mod commands;
pub mod configs;
pub mod di;
pub mod entrypoints;
pub mod flow;
