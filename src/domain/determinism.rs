//! Output-stability helpers.
//!
//! Everything codeatlas emits is diffed byte-for-byte by downstream
//! tooling, so path rendering and ordering live here in one place.

use std::path::Path;

/// Render `path` relative to `root` with `/` separators and no leading
/// slash. Paths outside `root` come back as-is (normalized).
pub fn normalize_path(path: &Path, root: &Path) -> String {
    let rendered = match path.strip_prefix(root) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    };
    let mut p = rendered.replace('\\', "/");
    while p.contains("//") {
        p = p.replace("//", "/");
    }
    p.trim_start_matches('/').to_string()
}
