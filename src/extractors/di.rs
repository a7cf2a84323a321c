//! Service-wiring extraction.
//!
//! Finds registrar-style invocations (`builder.add_singleton::<I, T>()`,
//! `registry.register::<T>()`, ...) and records what was wired where.
//! `add_hosted_service` registrations feed the hosted-services list that
//! the entrypoints section reuses.

use crate::domain::model::{DiRegistration, DiSection, HostedService};
use crate::ports::SemanticProvider;

pub const DEFAULT_REGISTRARS: &[&str] = &[
    "add_singleton",
    "add_scoped",
    "add_transient",
    "add_hosted_service",
    "register",
    "provide",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeMode {
    KeepAll,
    KeepFirst,
}

impl DedupeMode {
    pub fn parse(s: &str) -> Option<DedupeMode> {
        match s {
            "keep-all" => Some(DedupeMode::KeepAll),
            "keep-first" => Some(DedupeMode::KeepFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiOptions {
    pub registrar_names: Vec<String>,
    pub dedupe: DedupeMode,
}

impl Default for DiOptions {
    fn default() -> Self {
        Self {
            registrar_names: DEFAULT_REGISTRARS.iter().map(|s| s.to_string()).collect(),
            dedupe: DedupeMode::KeepAll,
        }
    }
}

pub struct DiExtractor {
    options: DiOptions,
}

impl DiExtractor {
    pub fn new(options: DiOptions) -> Self {
        Self { options }
    }

    pub fn extract<P: SemanticProvider + ?Sized>(&self, provider: &P) -> DiSection {
        let mut registrations = Vec::new();
        let mut hosted = Vec::new();

        for project in provider.projects() {
            for inv in provider.invocations(&project.name) {
                if !self.options.registrar_names.iter().any(|n| n == &inv.method) {
                    continue;
                }
                let Some(first_type) = inv.type_args.first() else {
                    continue; // registrar call without a type argument
                };
                if inv.method == "add_hosted_service" {
                    hosted.push(HostedService {
                        type_name: first_type.clone(),
                        file: inv.file.clone(),
                        line: inv.line,
                    });
                } else {
                    let implementation =
                        inv.type_args.get(1).unwrap_or(first_type).clone();
                    registrations.push(DiRegistration {
                        interface: first_type.clone(),
                        implementation,
                        lifetime: inv.method.clone(),
                        file: inv.file.clone(),
                        line: inv.line,
                    });
                }
            }
        }

        registrations.sort_by(|a, b| {
            (&a.interface, &a.implementation, &a.file, a.line)
                .cmp(&(&b.interface, &b.implementation, &b.file, b.line))
        });
        if self.options.dedupe == DedupeMode::KeepFirst {
            registrations.dedup_by(|a, b| {
                a.interface == b.interface && a.implementation == b.implementation
            });
        }

        hosted.sort_by(|a, b| {
            (&a.type_name, &a.file, a.line).cmp(&(&b.type_name, &b.file, b.line))
        });
        hosted.dedup();

        DiSection {
            registrations,
            hosted_services: hosted,
        }
    }
}
