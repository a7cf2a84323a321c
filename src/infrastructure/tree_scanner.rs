//! File tree scanning.
//!
//! Walks the repository honoring `.gitignore` (via the `ignore` crate),
//! filters by extension and ignore prefixes, and produces one `FileEntry`
//! per file: normalized path, kind, LOC and a blake3 content hash over
//! LF-normalized text.

use std::path::Path;

use ignore::WalkBuilder;

use crate::domain::determinism::normalize_path;
use crate::domain::model::FileEntry;

const DEFAULT_EXTS: &[&str] = &[".rs", ".toml", ".json", ".yaml", ".yml", ".md"];
const DEFAULT_IGNORES: &[&str] = &["target/", ".git/", "logs/"];

/// LOC counting mode: `physical` counts every line, `logical` skips blank
/// lines and `//` comment-only lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocMode {
    Physical,
    Logical,
}

impl LocMode {
    pub fn parse(s: &str) -> Option<LocMode> {
        match s {
            "physical" => Some(LocMode::Physical),
            "logical" => Some(LocMode::Logical),
            _ => None,
        }
    }
}

pub struct TreeScanner;

impl TreeScanner {
    pub fn scan(
        repo_root: &Path,
        include_exts: Option<&[String]>,
        ignore_prefixes: Option<&[String]>,
        use_gitignore: bool,
        loc_mode: LocMode,
    ) -> Vec<FileEntry> {
        let mut entries = Vec::new();
        let walker = WalkBuilder::new(repo_root)
            .git_ignore(use_gitignore)
            .git_global(false)
            .require_git(false)
            .hidden(false)
            .build();

        for result in walker {
            let Ok(entry) = result else { continue };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let rel = normalize_path(entry.path(), repo_root);
            if !Self::should_include(&rel, include_exts, ignore_prefixes) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue; // binary or unreadable, not part of the tree
            };
            entries.push(Self::scan_file(&rel, &content, loc_mode));
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    fn should_include(
        rel: &str,
        include_exts: Option<&[String]>,
        ignore_prefixes: Option<&[String]>,
    ) -> bool {
        let ignores: Vec<&str> = match ignore_prefixes {
            Some(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
            _ => DEFAULT_IGNORES.to_vec(),
        };
        for ig in ignores {
            let ig = ig.trim_end_matches('/');
            if ig.starts_with('.') && !ig.contains('/') && rel.ends_with(ig) {
                return false; // suffix rule, e.g. `.lock`
            }
            if rel == ig || rel.starts_with(&format!("{}/", ig)) {
                return false;
            }
        }
        let exts: Vec<&str> = match include_exts {
            Some(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
            _ => DEFAULT_EXTS.to_vec(),
        };
        exts.iter().any(|ext| rel.ends_with(ext))
    }

    fn scan_file(rel: &str, content: &str, loc_mode: LocMode) -> FileEntry {
        let kind = Path::new(rel)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let normalized = content.replace("\r\n", "\n");
        let text = normalized.strip_prefix('\u{feff}').unwrap_or(&normalized);
        FileEntry {
            path: rel.to_string(),
            kind,
            loc: Self::count_loc(text, loc_mode),
            hash: blake3::hash(text.as_bytes()).to_hex().to_string(),
        }
    }

    fn count_loc(text: &str, mode: LocMode) -> usize {
        let lines = text.lines();
        match mode {
            LocMode::Physical => lines.count(),
            LocMode::Logical => lines
                .filter(|line| {
                    let trimmed = line.trim();
                    !trimmed.is_empty() && !trimmed.starts_with("//")
                })
                .count(),
        }
    }
}
