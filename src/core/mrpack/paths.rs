use std::path::{Component, Path, PathBuf};

use crate::core::error::{InstallerError, InstallerResult};

/// Lexically normalize `relative` and make sure it stays under `root`.
///
/// Works on paths that do not exist yet, so nothing is canonicalized.
pub fn normalize_relative(root: &Path, relative: &str) -> InstallerResult<PathBuf> {
    let escapes = || InstallerError::PathEscapesRoot {
        path: relative.to_string(),
        root: root.to_path_buf(),
    };

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escapes());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escapes()),
        }
    }
    Ok(normalized)
}

/// Join a pack-relative path onto `root`, rejecting anything that escapes it.
pub fn resolve_within(root: &Path, relative: &str) -> InstallerResult<PathBuf> {
    Ok(root.join(normalize_relative(root, relative)?))
}
