use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves `path` to an absolute path with symlinks and `..` removed.
///
/// The deepest existing ancestor is canonicalized by the OS; any remaining
/// (not yet existing) components are applied lexically on top of it.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = std::fs::canonicalize(ancestor) else {
            continue;
        };
        let Ok(rest) = absolute.strip_prefix(ancestor) else {
            continue;
        };
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(resolved);
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no resolvable ancestor for {}", path.display()),
    ))
}
