use std::path::{Path, PathBuf};

/// Express `path` relative to `base` when it lies under it, otherwise keep
/// the path unchanged. Used by the project store so a project directory can
/// be moved or shared without breaking its internal references.
pub fn relativize(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve a stored path against `base`: absolute paths pass through,
/// relative ones are re-joined with the project file's directory.
pub fn resolve(stored: &Path, base: &Path) -> PathBuf {
    if stored.is_absolute() {
        stored.to_path_buf()
    } else {
        base.join(stored)
    }
}
