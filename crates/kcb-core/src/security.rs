use std::path::{Component, Path, PathBuf};

use crate::domain::UserId;

// ============== Authorization ==============

/// Only the configured owner may drive the gallery. A message without a sender is denied.
pub fn is_owner(sender: Option<UserId>, owner: UserId) -> bool {
    sender == Some(owner)
}

// ============== Path Validation ==============

/// Join a request path onto a serving root without letting it escape.
///
/// Returns `None` for empty paths and for any `..`, absolute, or drive-prefix component.
pub fn resolve_within(base: &Path, requested: &str) -> Option<PathBuf> {
    let requested = requested.trim_start_matches('/');
    if requested.is_empty() {
        return None;
    }

    let mut out = base.to_path_buf();
    let mut pushed = false;
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    pushed.then_some(out)
}
