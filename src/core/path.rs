// LogRetrieval - core/path.rs
//
// Lexical path containment for client-supplied filenames.
//
// The client names a file relative to the log root. Resolution happens on
// path *components*, not strings: `.` is dropped, `..` pops one component,
// and the walk fails the moment a `..` would climb above the root. Absolute
// paths (root or prefix components) are rejected outright instead of being
// allowed to replace the root the way `Path::join` would.
//
// This module does no filesystem access. Symlink escapes are caught by the
// engine, which canonicalises the candidate once it is known to exist.

use std::path::{Component, Path, PathBuf};

/// Why a requested filename cannot be resolved inside the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The filename is absolute (`/etc/passwd`, `C:\...`).
    Absolute,
    /// A `..` component would climb above the root.
    Escapes,
    /// The filename contains a NUL byte.
    NulByte,
    /// The filename resolves to the root itself.
    IsRoot,
}

/// Resolve `requested` against `root`, returning the normalised candidate path.
///
/// `root` is expected to already be absolute and normalised (the engine
/// canonicalises it at construction). The returned path always starts with
/// `root` and names something strictly below it.
pub fn resolve_within(root: &Path, requested: &str) -> Result<PathBuf, Containment> {
    if requested.contains('\0') {
        return Err(Containment::NulByte);
    }

    let mut relative: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return Err(Containment::Absolute),
            Component::CurDir => {}
            Component::ParentDir => {
                if relative.pop().is_none() {
                    return Err(Containment::Escapes);
                }
            }
            Component::Normal(part) => relative.push(part),
        }
    }

    if relative.is_empty() {
        return Err(Containment::IsRoot);
    }

    let mut candidate = root.to_path_buf();
    candidate.extend(relative);

    // Component-wise prefix check: `/var/log2` never passes for root `/var/log`.
    if !candidate.starts_with(root) {
        return Err(Containment::Escapes);
    }
    Ok(candidate)
}
