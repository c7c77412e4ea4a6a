//! Heuristic discovery of log roots.
//!
//! Parsing every directory under the root folder would be expensive, so a
//! directory is only judged a candidate root when its numbered
//! subdirectories are exactly `0/, 1/, ..., k-1/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::util::{is_dense_sequence, numbered_entries, EntryKind};

pub const DEFAULT_SCAN_DEPTH: usize = 2;
pub const DEFAULT_MAX_SCAN_DIRS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Levels below the root folder to descend into.
    pub max_depth: usize,
    /// Stop after visiting this many directories.
    pub max_dirs: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_SCAN_DEPTH,
            max_dirs: DEFAULT_MAX_SCAN_DIRS,
        }
    }
}

/// Candidate roots at or below `root_folder`, in discovery order.
pub fn find_candidate_roots(root_folder: &Path, max_depth: usize) -> Vec<PathBuf> {
    scan_candidate_roots(
        root_folder,
        ScanOptions {
            max_depth,
            ..ScanOptions::default()
        },
    )
}

/// Like [`find_candidate_roots`] with an explicit directory budget.
///
/// A missing or non-directory `root_folder` has no candidates. Every
/// subdirectory is descended into, candidate or not, since candidate roots
/// may nest. A relative `root_folder` is resolved against the current
/// directory, so returned paths are absolute.
pub fn scan_candidate_roots(root_folder: &Path, options: ScanOptions) -> Vec<PathBuf> {
    let root_folder = std::path::absolute(root_folder).unwrap_or_else(|_| root_folder.to_path_buf());
    let root_folder = root_folder.as_path();
    let mut scan = Scan {
        options,
        visited: 0,
        exhausted: false,
        found: Vec::new(),
    };
    if root_folder.is_dir() {
        scan.visit(root_folder, options.max_depth);
    }
    if scan.exhausted {
        warn!(
            root = %root_folder.display(),
            max_dirs = options.max_dirs,
            "Directory scan budget exhausted, results may be incomplete"
        );
    }
    scan.found
}

/// True when the numbered subdirectories of `dir` are exactly `0..k-1`, `k >= 1`.
pub fn is_candidate_root(dir: &Path) -> bool {
    match numbered_entries(dir, "", EntryKind::Dir) {
        Ok(entries) => {
            let numbers: Vec<u64> = entries.iter().map(|e| e.number).collect();
            let dense = is_dense_sequence(&numbers);
            if !dense && !numbers.is_empty() {
                debug!(dir = %dir.display(), ?numbers, "Numbered subfolders are not consecutive");
            }
            dense
        }
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            false
        }
    }
}

struct Scan {
    options: ScanOptions,
    visited: usize,
    exhausted: bool,
    found: Vec<PathBuf>,
}

impl Scan {
    fn visit(&mut self, dir: &Path, depth: usize) {
        if self.visited >= self.options.max_dirs {
            self.exhausted = true;
            return;
        }
        self.visited += 1;

        if is_candidate_root(dir) {
            debug!(dir = %dir.display(), "Found candidate root");
            self.found.push(dir.to_path_buf());
        }

        if depth == 0 {
            return;
        }

        for child in subdirectories(dir) {
            self.visit(&child, depth - 1);
        }
    }
}

/// Immediate subdirectories, sorted by name so discovery order is stable.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();
    children
}
