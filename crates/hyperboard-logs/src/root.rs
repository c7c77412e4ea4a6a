use std::path::Path;

use tracing::info;

use crate::error::{LogError, Result};
use crate::session::parse_session;
use crate::types::RootData;
use crate::util::{numbered_entries, EntryKind};

/// Parse every numbered session directory under `root_dir`, in ascending
/// order. Gaps in the numbering are tolerated here.
///
/// This is all-or-nothing: the first session that fails to parse fails the
/// whole root, wrapped in [`LogError::Session`] with its index. A root that
/// is being written while it is read either parses consistently or is
/// reported as malformed, never half-shown.
pub fn process_root(root_dir: &Path) -> Result<RootData> {
    if !root_dir.is_dir() {
        return Err(LogError::NotADirectory(root_dir.to_path_buf()));
    }

    info!(root = %root_dir.display(), "Processing log folder");

    let entries = numbered_entries(root_dir, "", EntryKind::Dir).map_err(|e| LogError::io(root_dir, e))?;

    let mut sessions = Vec::with_capacity(entries.len());
    for entry in entries {
        let session = parse_session(&root_dir.join(&entry.name), entry.number).map_err(|e| {
            LogError::Session {
                index: entry.number,
                source: Box::new(e),
            }
        })?;
        sessions.push(session);
    }

    Ok(RootData {
        root: root_dir.to_path_buf(),
        sessions,
    })
}
