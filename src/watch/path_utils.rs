// src/watch/path_utils.rs

use std::path::Path;

/// Convert an event path into a string relative to `root`, with forward
/// slashes.
///
/// Event paths are usually absolute while the bindings' globs are rooted at
/// the project directory. A direct `strip_prefix` is tried first; if the
/// prefixes disagree (symlinks, macOS `/private/var` aliases) both sides are
/// canonicalized and the strip is retried.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
