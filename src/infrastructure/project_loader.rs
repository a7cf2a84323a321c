use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cargo_metadata::MetadataCommand;

use crate::domain::determinism::normalize_path;
use crate::ports::ProjectInfo;

/// One workspace member with its source files.
#[derive(Debug, Clone)]
pub struct ProjectSources {
    pub info: ProjectInfo,
    /// `(repo-relative path, content)`, sorted by path.
    pub files: Vec<(String, String)>,
}

/// Loaded workspace: repo root plus members sorted by package name.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub projects: Vec<ProjectSources>,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load all workspace members reachable from a Cargo manifest.
    pub fn load_workspace(manifest_path: &Path) -> Result<Workspace> {
        let metadata = MetadataCommand::new()
            .manifest_path(manifest_path)
            .no_deps()
            .exec()
            .context("failed to execute cargo metadata")?;

        let root = PathBuf::from(metadata.workspace_root.as_std_path());
        let mut projects = Vec::new();

        for package_id in &metadata.workspace_members {
            let Some(package) = metadata.packages.iter().find(|p| &p.id == package_id) else {
                continue;
            };

            let manifest = package.manifest_path.as_std_path();
            let info = ProjectInfo {
                name: package.name.clone(),
                relative_path: normalize_path(manifest, &root),
            };

            let mut files = Vec::new();
            for target in &package.targets {
                let wanted = target
                    .kind
                    .iter()
                    .any(|k| k == "lib" || k == "bin" || k == "proc-macro");
                if !wanted {
                    continue;
                }
                let src_path = target.src_path.as_std_path();
                let src_dir = src_path.parent().unwrap_or(src_path);
                Self::collect_rs_recursive(src_dir, &root, &mut files)?;
            }

            // Targets can share files (main.rs next to lib.rs); keep one copy.
            files.sort_by(|a, b| a.0.cmp(&b.0));
            files.dedup_by(|a, b| a.0 == b.0);

            projects.push(ProjectSources { info, files });
        }

        projects.sort_by(|a, b| a.info.name.cmp(&b.info.name));
        Ok(Workspace { root, projects })
    }

    fn collect_rs_recursive(
        dir: &Path,
        root: &Path,
        out: &mut Vec<(String, String)>,
    ) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") || !dir.exists() {
            return Ok(());
        }

        if dir.is_file() {
            // Single-file targets (a bare main.rs) land here.
            if dir.extension().is_some_and(|ext| ext == "rs") {
                let content = fs::read_to_string(dir)
                    .with_context(|| format!("failed to read {}", dir.display()))?;
                out.push((normalize_path(dir, root), content));
            }
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::collect_rs_recursive(&path, root, out)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                out.push((normalize_path(&path, root), content));
            }
        }
        Ok(())
    }
}
