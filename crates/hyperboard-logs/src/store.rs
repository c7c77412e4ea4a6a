use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::plot::{build_series, PlotPoint};
use crate::root::process_root;
use crate::scanner::{scan_candidate_roots, ScanOptions};
use crate::session::{PREDICATE_FILE, THUMBNAIL_DIR};
use crate::types::{ImageRecord, RootData, SessionRecord};

/// A directory that looks like a log root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoot {
    /// Path relative to the root folder with `/` separators, `.` for the folder itself.
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardState {
    /// The root folder is missing or not a directory.
    InvalidRoot,
    /// No candidate root below the root folder.
    NoCandidates,
    /// The selected root failed to parse; nothing is shown.
    Malformed,
    /// Sessions parsed, but no image has arrived yet.
    NoImages,
    Ready,
}

/// Everything the main page needs for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub state: DashboardState,
    pub root_folder: PathBuf,
    pub candidates: Vec<CandidateRoot>,
    pub selected: Option<CandidateRoot>,
    pub sessions: Vec<SessionRecord>,
    pub stat_keys: Option<Vec<String>>,
}

/// One session's images with the final labels, for stepping through thumbnails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayView {
    pub session: u64,
    pub per_img: Vec<ImageRecord>,
    pub positive_ids: BTreeSet<String>,
    pub negative_ids: BTreeSet<String>,
}

/// Read-only access to the log tree under one root folder.
///
/// Nothing is cached: every call rescans and reparses, so each answer is a
/// fresh snapshot of the disk. Callers pick a candidate root by name on each
/// call; an unknown or absent name falls back to the first candidate.
pub struct LogStore {
    root_folder: PathBuf,
    scan: ScanOptions,
}

impl LogStore {
    /// A relative `root_folder` is resolved against the current directory.
    pub fn new(root_folder: PathBuf) -> Self {
        Self {
            root_folder: std::path::absolute(&root_folder).unwrap_or(root_folder),
            scan: ScanOptions::default(),
        }
    }

    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// False if the root folder is missing or not a directory.
    pub fn root_is_valid(&self) -> bool {
        if !self.root_folder.exists() {
            warn!(root = %self.root_folder.display(), "Root folder doesn't exist");
            return false;
        }
        if !self.root_folder.is_dir() {
            warn!(root = %self.root_folder.display(), "Root folder exists but is not a directory");
            return false;
        }
        true
    }

    /// Candidate roots in discovery order.
    pub fn candidates(&self) -> Vec<CandidateRoot> {
        scan_candidate_roots(&self.root_folder, self.scan)
            .into_iter()
            .map(|path| CandidateRoot {
                name: relative_name(&self.root_folder, &path),
                path,
            })
            .collect()
    }

    /// Resolve a selection against the current candidates. Matches either the
    /// candidate name or its full path.
    pub fn select(&self, selection: Option<&str>) -> Option<CandidateRoot> {
        pick(self.candidates(), selection)
    }

    /// Parse every session of a candidate root.
    pub fn load(&self, candidate: &CandidateRoot) -> Result<RootData> {
        process_root(&candidate.path)
    }

    /// The selected root's data, or `None` if there is no candidate or it is malformed.
    pub fn sessions(&self, selection: Option<&str>) -> Option<RootData> {
        let candidate = self.select(selection)?;
        self.load_logged(&candidate)
    }

    pub fn dashboard(&self, selection: Option<&str>) -> DashboardView {
        let mut view = DashboardView {
            state: DashboardState::InvalidRoot,
            root_folder: self.root_folder.clone(),
            candidates: Vec::new(),
            selected: None,
            sessions: Vec::new(),
            stat_keys: None,
        };

        if !self.root_is_valid() {
            return view;
        }

        view.candidates = self.candidates();
        let Some(selected) = pick(view.candidates.clone(), selection) else {
            info!(root = %self.root_folder.display(), "No valid search paths under root folder");
            view.state = DashboardState::NoCandidates;
            return view;
        };
        view.selected = Some(selected.clone());

        let Some(data) = self.load_logged(&selected) else {
            view.state = DashboardState::Malformed;
            return view;
        };

        view.stat_keys = data.stat_keys();
        view.state = if view.stat_keys.is_some() {
            DashboardState::Ready
        } else {
            DashboardState::NoImages
        };
        view.sessions = data.sessions;
        view
    }

    /// Chart series for the selected root; empty when there is nothing valid to show.
    pub fn plot(&self, selection: Option<&str>) -> Vec<PlotPoint> {
        let series = self
            .sessions(selection)
            .map(|data| build_series(&data.sessions))
            .unwrap_or_default();
        info!(points = series.len(), "Refreshing plot series");
        series
    }

    /// `None` if the root has no valid data or no session with that index.
    pub fn replay(&self, selection: Option<&str>, session: u64) -> Option<ReplayView> {
        let data = self.sessions(selection)?;
        let record = data.sessions.into_iter().find(|s| s.index == session)?;
        Some(ReplayView {
            session,
            per_img: record.per_img.unwrap_or_default(),
            positive_ids: record.positive_ids,
            negative_ids: record.negative_ids,
        })
    }

    /// Resolve `<session>/thumbnail/<file>` inside the selected root.
    /// Anything else, including `..` or absolute paths, is refused.
    pub fn thumbnail_path(&self, selection: Option<&str>, relative: &str) -> Option<PathBuf> {
        let parts = normal_components(relative)?;
        if parts.len() != 3 || parts[1] != THUMBNAIL_DIR {
            return None;
        }
        let candidate = self.select(selection)?;
        let path = candidate.path.join(relative);
        path.is_file().then_some(path)
    }

    /// The predicate descriptor of one session in the selected root.
    pub fn predicate_path(&self, selection: Option<&str>, session: u64) -> Option<PathBuf> {
        let candidate = self.select(selection)?;
        let path = candidate.path.join(session.to_string()).join(PREDICATE_FILE);
        path.is_file().then_some(path)
    }

    fn load_logged(&self, candidate: &CandidateRoot) -> Option<RootData> {
        match self.load(candidate) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(
                    root = %candidate.path.display(),
                    session = ?e.session_index(),
                    error = %e,
                    "Invalid results from processing log folder"
                );
                None
            }
        }
    }
}

fn pick(candidates: Vec<CandidateRoot>, selection: Option<&str>) -> Option<CandidateRoot> {
    let wanted = selection.filter(|s| !s.is_empty());
    let position = wanted.and_then(|wanted| {
        candidates
            .iter()
            .position(|c| c.name == wanted || c.path == Path::new(wanted))
    });
    candidates.into_iter().nth(position.unwrap_or(0))
}

fn relative_name(root_folder: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root_folder).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Split a request path into plain components; `None` if any component
/// could escape the base directory.
fn normal_components(relative: &str) -> Option<Vec<String>> {
    let path = Path::new(relative);
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            _ => return None,
        }
    }
    (!parts.is_empty()).then_some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> CandidateRoot {
        CandidateRoot {
            name: name.to_string(),
            path: PathBuf::from("/logs").join(name),
        }
    }

    #[test]
    fn pick_falls_back_to_first() {
        let candidates = vec![candidate("a"), candidate("b/c")];
        assert_eq!(pick(candidates.clone(), None).unwrap().name, "a");
        assert_eq!(pick(candidates.clone(), Some("")).unwrap().name, "a");
        assert_eq!(pick(candidates.clone(), Some("missing")).unwrap().name, "a");
        assert_eq!(pick(candidates.clone(), Some("b/c")).unwrap().name, "b/c");
        assert_eq!(pick(candidates, Some("/logs/b/c")).unwrap().name, "b/c");
        assert!(pick(Vec::new(), Some("a")).is_none());
    }

    #[test]
    fn relative_names() {
        let root = Path::new("/logs");
        assert_eq!(relative_name(root, Path::new("/logs")), ".");
        assert_eq!(relative_name(root, Path::new("/logs/run1")), "run1");
        assert_eq!(relative_name(root, Path::new("/logs/a/b")), "a/b");
    }

    #[test]
    fn normal_components_refuse_escapes() {
        assert_eq!(
            normal_components("0/thumbnail/3.jpeg"),
            Some(vec!["0".to_string(), "thumbnail".to_string(), "3.jpeg".to_string()])
        );
        assert_eq!(normal_components("../etc/passwd"), None);
        assert_eq!(normal_components("0/../../x"), None);
        assert_eq!(normal_components("/etc/passwd"), None);
        assert_eq!(normal_components(""), None);
    }
}
