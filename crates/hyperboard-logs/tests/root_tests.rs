use std::fs;
use std::path::{Path, PathBuf};

use hyperboard_logs::{
    build_series, find_candidate_roots, process_root, scan_candidate_roots, DashboardState,
    LogStore, PlotPoint, ScanOptions,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn mkdirs(root: &Path, names: &[&str]) {
    for name in names {
        fs::create_dir_all(root.join(name)).unwrap();
    }
}

fn write_json(path: &Path, value: Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, value.to_string()).unwrap();
}

/// Helper: a session with `images` images, one per 100ms, optionally ended.
fn write_session(root: &Path, index: u64, images: u64, ended: bool) -> PathBuf {
    let dir = root.join(index.to_string());
    write_json(&dir.join("pred.hyperfindsearch"), json!({"predicateName": "RGB Histogram"}));
    write_json(&dir.join("start_info.json"), json!({"start_time(ms)": 0}));
    for i in 0..images {
        let t = (i as i64 + 1) * 100;
        write_json(
            &dir.join("attributes").join(format!("{}.json", i)),
            json!({"arrival_time(ms)": t}),
        );
        write_json(
            &dir.join("stats").join(format!("{}.json", i)),
            json!({"Searched": t, "Passed": t / 10}),
        );
        fs::create_dir_all(dir.join("thumbnail")).unwrap();
        fs::write(dir.join("thumbnail").join(format!("{}.jpeg", i)), b"jpeg").unwrap();
    }
    fs::write(
        dir.join("feedback.csv"),
        "id,feedback_label,absolute time(ms)\nhit,Positive,150\n",
    )
    .unwrap();
    if ended {
        let end = (images as i64 + 1) * 100;
        write_json(&dir.join("end_info.json"), json!({"end_time(ms)": end}));
        write_json(&dir.join("end_stats.json"), json!({"Searched": end, "Passed": end / 10}));
    }
    dir
}

// ============================================================
// Path scanner tests
// ============================================================

#[test]
fn test_dense_numbered_subfolders_make_a_candidate() {
    let dir = TempDir::new().unwrap();
    mkdirs(dir.path(), &["0", "1", "2", "notes"]);

    let roots = find_candidate_roots(dir.path(), 2);

    assert_eq!(roots, vec![dir.path().to_path_buf()]);
}

#[test]
fn test_gaps_and_missing_zero_are_not_candidates() {
    let dir = TempDir::new().unwrap();
    mkdirs(dir.path(), &["gap/0", "gap/2", "nozero/1", "nozero/2", "words/a", "words/b"]);

    assert!(find_candidate_roots(dir.path(), 2).is_empty());
}

#[test]
fn test_numbered_files_are_not_sessions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0"), "file").unwrap();
    fs::write(dir.path().join("1"), "file").unwrap();

    assert!(find_candidate_roots(dir.path(), 2).is_empty());

    mkdirs(dir.path(), &["run/0"]);
    fs::write(dir.path().join("run").join("1"), "file").unwrap();

    assert_eq!(
        find_candidate_roots(dir.path(), 2),
        vec![dir.path().join("run")]
    );
}

#[test]
fn test_nested_candidates_are_all_reported() {
    let dir = TempDir::new().unwrap();
    mkdirs(
        dir.path(),
        &["0/0", "0/1", "1", "b_run/0", "a_run/0", "a_run/1"],
    );

    let roots = find_candidate_roots(dir.path(), 2);

    assert_eq!(
        roots,
        vec![
            dir.path().to_path_buf(),
            dir.path().join("0"),
            dir.path().join("a_run"),
            dir.path().join("b_run"),
        ]
    );
}

#[test]
fn test_scan_depth_limits_descent() {
    let dir = TempDir::new().unwrap();
    mkdirs(dir.path(), &["a/b/c/0", "a/b/0"]);

    assert!(find_candidate_roots(dir.path(), 0).is_empty());
    assert!(find_candidate_roots(dir.path(), 1).is_empty());
    assert_eq!(find_candidate_roots(dir.path(), 2), vec![dir.path().join("a/b")]);
    assert_eq!(
        find_candidate_roots(dir.path(), 3),
        vec![dir.path().join("a/b"), dir.path().join("a/b/c")]
    );
}

#[test]
fn test_relative_root_folder_yields_absolute_paths() {
    let dir = TempDir::new_in(".").unwrap();
    assert!(dir.path().is_relative());
    mkdirs(dir.path(), &["run/0", "run/1"]);

    let roots = find_candidate_roots(dir.path(), 2);

    let expected = std::env::current_dir()
        .unwrap()
        .join(dir.path().file_name().unwrap())
        .join("run");
    assert_eq!(roots, vec![expected]);

    let store = LogStore::new(dir.path().to_path_buf());
    let candidates = store.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "run");
    assert!(candidates[0].path.is_absolute());
}

#[test]
fn test_missing_root_has_no_candidates() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file");
    fs::write(&file, "x").unwrap();

    assert!(find_candidate_roots(&dir.path().join("missing"), 2).is_empty());
    assert!(find_candidate_roots(&file, 2).is_empty());
}

#[test]
fn test_scan_budget_stops_early() {
    let dir = TempDir::new().unwrap();
    mkdirs(dir.path(), &["a/0", "b/0", "c/0"]);

    let options = ScanOptions {
        max_depth: 2,
        max_dirs: 2,
    };
    let roots = scan_candidate_roots(dir.path(), options);

    assert_eq!(roots, vec![dir.path().join("a")]);
}

// ============================================================
// Plot series tests
// ============================================================

#[test]
fn test_series_inserts_end_and_reset_per_ended_session() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 3, true);
    write_session(dir.path(), 1, 2, true);

    let data = process_root(dir.path()).unwrap();
    let series = build_series(&data.sessions);

    assert_eq!(series.len(), 3 + 2 + 2 * 2);
    assert!(matches!(series[3], PlotPoint::SessionEnd { session: 0, .. }));
    assert!(series[4].is_reset());
    assert_eq!(series[4].arrival_time_ms(), series[3].arrival_time_ms());
    assert!(matches!(series[5], PlotPoint::Image { session: 1, index: 0, .. }));
    assert!(series[8].is_reset());

    for point in series.iter().filter(|p| p.is_reset()) {
        assert!(point.derived_stats().is_zero());
    }
    assert!(series
        .iter()
        .filter(|p| !p.is_reset())
        .all(|p| p.derived_stats().items_processed > 0));
}

#[test]
fn test_series_skips_markers_for_running_sessions() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 2, true);
    write_session(dir.path(), 1, 2, false);
    write_session(dir.path(), 2, 0, false);

    let data = process_root(dir.path()).unwrap();
    let series = build_series(&data.sessions);

    assert_eq!(series.len(), 2 + 2 + 2);
    assert!(!series.last().unwrap().is_reset());
    assert_eq!(series.last().unwrap().session(), 1);
}

#[test]
fn test_series_serializes_with_kind_tag() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 1, true);

    let data = process_root(dir.path()).unwrap();
    let value = serde_json::to_value(build_series(&data.sessions)).unwrap();

    assert_eq!(value[0]["kind"], json!("image"));
    assert_eq!(value[0]["img_path"], json!("0/thumbnail/0.jpeg"));
    assert_eq!(value[1]["kind"], json!("session_end"));
    assert_eq!(value[2]["kind"], json!("reset"));
    assert_eq!(value[2]["derived_stats"]["pass_rate(%)"], json!(0.0));
}

// ============================================================
// Store tests
// ============================================================

#[test]
fn test_dashboard_invalid_root() {
    let dir = TempDir::new().unwrap();
    let store = LogStore::new(dir.path().join("missing"));

    let view = store.dashboard(None);

    assert_eq!(view.state, DashboardState::InvalidRoot);
    assert!(view.candidates.is_empty());
    assert!(store.plot(None).is_empty());
}

#[test]
fn test_dashboard_no_candidates() {
    let dir = TempDir::new().unwrap();
    mkdirs(dir.path(), &["docs", "tmp/5"]);
    let store = LogStore::new(dir.path().to_path_buf());

    let view = store.dashboard(None);

    assert_eq!(view.state, DashboardState::NoCandidates);
    assert!(view.selected.is_none());
}

#[test]
fn test_dashboard_ready_and_selection() {
    let dir = TempDir::new().unwrap();
    write_session(&dir.path().join("first"), 0, 2, true);
    write_session(&dir.path().join("second"), 0, 1, false);
    write_session(&dir.path().join("second"), 1, 0, false);
    let store = LogStore::new(dir.path().to_path_buf());

    let names: Vec<String> = store.candidates().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["first", "second"]);

    let view = store.dashboard(Some("second"));
    assert_eq!(view.state, DashboardState::Ready);
    assert_eq!(view.selected.unwrap().name, "second");
    assert_eq!(view.sessions.len(), 2);
    assert_eq!(view.stat_keys.unwrap().len(), 7);

    let fallback = store.dashboard(Some("nope"));
    assert_eq!(fallback.selected.unwrap().name, "first");
    assert_eq!(store.plot(Some("first")).len(), 4);
}

#[test]
fn test_dashboard_no_images_yet() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 0, false);
    let store = LogStore::new(dir.path().to_path_buf());

    let view = store.dashboard(None);

    assert_eq!(view.state, DashboardState::NoImages);
    assert_eq!(view.sessions.len(), 1);
    assert!(view.stat_keys.is_none());
}

#[test]
fn test_dashboard_malformed_root_shows_nothing() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 2, true);
    let broken = write_session(dir.path(), 1, 2, false);
    fs::write(broken.join("feedback.csv"), "id,feedback_label,absolute time(ms)\na,Positive,9\nb,Positive,3\n").unwrap();
    let store = LogStore::new(dir.path().to_path_buf());

    let view = store.dashboard(None);

    assert_eq!(view.state, DashboardState::Malformed);
    assert!(view.sessions.is_empty());
    assert_eq!(view.candidates.len(), 1);
    assert!(store.plot(None).is_empty());
    assert!(store.sessions(None).is_none());
    assert!(store.replay(None, 0).is_none());
}

#[test]
fn test_replay_returns_images_and_labels() {
    let dir = TempDir::new().unwrap();
    write_session(dir.path(), 0, 3, false);
    let store = LogStore::new(dir.path().to_path_buf());

    let replay = store.replay(None, 0).unwrap();

    assert_eq!(replay.session, 0);
    assert_eq!(replay.per_img.len(), 3);
    assert!(replay.positive_ids.contains("hit"));
    assert!(store.replay(None, 7).is_none());
}

#[test]
fn test_file_lookups_stay_inside_the_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("logs");
    write_session(&root, 0, 1, false);
    fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    let store = LogStore::new(root.clone());

    assert_eq!(
        store.thumbnail_path(None, "0/thumbnail/0.jpeg"),
        Some(root.join("0/thumbnail/0.jpeg"))
    );
    assert!(store.thumbnail_path(None, "0/thumbnail/9.jpeg").is_none());
    assert!(store.thumbnail_path(None, "0/start_info.json").is_none());
    assert!(store.thumbnail_path(None, "../secret.txt").is_none());
    assert!(store.thumbnail_path(None, "0/thumbnail/../../../secret.txt").is_none());

    assert_eq!(
        store.predicate_path(None, 0),
        Some(root.join("0").join("pred.hyperfindsearch"))
    );
    assert!(store.predicate_path(None, 3).is_none());
}
