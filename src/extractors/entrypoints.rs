//! Entrypoint extraction.
//!
//! Per project: the program `main` (a free, zero-parameter function) with
//! its location and async flag, plus the hosted services seeded from the
//! service-wiring section.

use std::collections::HashSet;

use crate::domain::model::{EntrypointsSection, HostedService, ProgramMain, ProjectRef};
use crate::ports::SemanticProvider;

#[derive(Default)]
pub struct EntrypointsExtractor {
    seeded: Vec<HostedService>,
}

impl EntrypointsExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse hosted services discovered by the wiring extractor.
    pub fn seed_hosted_services(&mut self, hosted: &[HostedService]) {
        self.seeded = hosted.to_vec();
    }

    pub fn extract<P: SemanticProvider + ?Sized>(&self, provider: &P) -> Vec<EntrypointsSection> {
        let mut sections = Vec::new();

        for project in provider.projects() {
            let mut program_main = None;
            for decl_id in provider.declarations(&project.name) {
                let decl = provider.declaration(decl_id);
                let is_free_fn = !decl.sig.containing_type.contains("::");
                if is_free_fn && decl.sig.name == "main" && decl.sig.param_count == 0 {
                    program_main = Some(ProgramMain {
                        file: decl.file.clone(),
                        line: decl.line,
                        is_async: decl.is_async,
                    });
                    break;
                }
            }

            let mut hosted = self.seeded.clone();
            hosted.sort_by(|a, b| {
                (&a.type_name, &a.file, a.line).cmp(&(&b.type_name, &b.file, b.line))
            });
            let mut seen = HashSet::new();
            hosted.retain(|h| seen.insert(h.clone()));

            sections.push(EntrypointsSection {
                project: ProjectRef {
                    name: project.name,
                    file: project.relative_path,
                },
                program_main,
                hosted_services: hosted,
            });
        }

        sections.sort_by(|a, b| {
            (&a.project.name, &a.project.file).cmp(&(&b.project.name, &b.project.file))
        });
        sections
    }
}
