use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;

/// Emitted when something under the root folder changes on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TreeEvent {
    Created { path: String },
    Modified { path: String },
    Removed { path: String },
}

impl TreeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TreeEvent::Created { .. } => "created",
            TreeEvent::Modified { .. } => "modified",
            TreeEvent::Removed { .. } => "removed",
        }
    }
}

/// Watches the root folder recursively so the dashboard can refresh as soon
/// as the producer writes, instead of on a fixed poll.
pub struct TreeWatcher {
    tx: broadcast::Sender<TreeEvent>,
    _watcher: RecommendedWatcher,
}

impl TreeWatcher {
    pub fn new(root_folder: &Path) -> notify::Result<Self> {
        let (tx, _) = broadcast::channel(256);
        let tx_clone = tx.clone();
        // Backends report either the watched path or its canonical form.
        let mut roots = vec![root_folder.to_path_buf()];
        if let Ok(canonical) = root_folder.canonicalize() {
            roots.push(canonical);
        }

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                Self::handle_event(&tx_clone, &roots, &event);
            }
        })?;

        watcher.watch(root_folder, RecursiveMode::Recursive)?;

        Ok(Self {
            tx,
            _watcher: watcher,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.tx.subscribe()
    }

    fn handle_event(tx: &broadcast::Sender<TreeEvent>, roots: &[PathBuf], event: &Event) {
        for path in &event.paths {
            let Some(path) = roots.iter().find_map(|root| relative_path(root, path)) else {
                continue;
            };

            let tree_event = match event.kind {
                EventKind::Create(_) => Some(TreeEvent::Created { path }),
                EventKind::Modify(_) => Some(TreeEvent::Modified { path }),
                EventKind::Remove(_) => Some(TreeEvent::Removed { path }),
                _ => None,
            };

            if let Some(evt) = tree_event {
                let _ = tx.send(evt);
            }
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
