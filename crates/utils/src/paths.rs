//! Mapping of request paths onto the mount and cache directories

use prewarm_core::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize a request path into a relative path beneath some base.
///
/// A leading `/` is ignored, `.` components are dropped and `..` is
/// rejected so a request can never name anything outside the base.
pub fn request_relative(request: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(request).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => {
                return Err(Error::invalid_path(
                    request,
                    "parent directory components are not allowed",
                ))
            }
            Component::Prefix(_) => {
                return Err(Error::invalid_path(request, "path prefixes are not allowed"))
            }
        }
    }
    Ok(relative)
}

/// Join a request path onto `base` after normalizing it
pub fn resolve_request_path(base: &Path, request: &str) -> Result<PathBuf> {
    Ok(base.join(request_relative(request)?))
}

/// True for the sentinel that addresses the whole mount
pub fn is_root_request(request: &str) -> bool {
    request.trim_matches('/').is_empty()
}

/// Display path of a child entry as seen by clients: `/parent/name`
pub fn display_child_path(parent: &Path, name: &str) -> String {
    let mut display = String::from("/");
    for part in parent.iter() {
        display.push_str(&part.to_string_lossy());
        display.push('/');
    }
    display.push_str(name);
    display
}
