//! Parsing of one session directory.
//!
//! Expected layout of `<root>/<session>/`:
//!
//! ```text
//! pred.hyperfindsearch          predicate descriptor (required)
//! start_info.json               requires start_time(ms)
//! end_info.json + end_stats.json  only once the session has ended
//! feedback.csv                  id, feedback_label, absolute time(ms)
//! attributes/<i>.json           requires arrival_time(ms)
//! stats/<i>.json                requires Searched, Passed
//! thumbnail/<i>.jpeg
//! ```

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::feedback::{load_feedback, FeedbackReplayer};
use crate::predicate::summarize_predicates;
use crate::types::{DerivedInfo, DerivedStats, EndRecord, ImageRecord, JsonMap, SessionRecord};
use crate::util::{format_local_ms, int_field, numbered_entries, read_json, read_json_object, EntryKind};

pub const PREDICATE_FILE: &str = "pred.hyperfindsearch";
pub const START_INFO_FILE: &str = "start_info.json";
pub const END_INFO_FILE: &str = "end_info.json";
pub const END_STATS_FILE: &str = "end_stats.json";
pub const FEEDBACK_FILE: &str = "feedback.csv";
pub const ATTRIBUTES_DIR: &str = "attributes";
pub const STATS_DIR: &str = "stats";
pub const THUMBNAIL_DIR: &str = "thumbnail";

pub const START_TIME_KEY: &str = "start_time(ms)";
pub const END_TIME_KEY: &str = "end_time(ms)";
pub const ARRIVAL_TIME_KEY: &str = "arrival_time(ms)";
pub const SEARCHED_KEY: &str = "Searched";
pub const PASSED_KEY: &str = "Passed";

/// Parse one session directory into a [`SessionRecord`].
///
/// Image records are derived in image order, with the feedback ledger
/// replayed up to each image's arrival time before its stats are computed.
/// If the session has ended, feedback up to the end time is applied and a
/// final end record is synthesized from `end_stats.json`; feedback recorded
/// after the end is dropped.
pub fn parse_session(session_dir: &Path, session_index: u64) -> Result<SessionRecord> {
    debug!(session = session_index, dir = %session_dir.display(), "Parsing session");

    let predicate_path = session_dir.join(PREDICATE_FILE);
    let predicates = read_json(&predicate_path)?;
    let predicate_summaries = summarize_predicates(&predicates);

    let start_info_path = session_dir.join(START_INFO_FILE);
    let start_info = read_json_object(&start_info_path)?;
    let start_time_ms = int_field(&start_info, START_TIME_KEY, &start_info_path)?;
    let mut derived_info = DerivedInfo {
        start_time: local_time(start_time_ms, START_TIME_KEY, &start_info_path)?,
        end_time: None,
    };

    let ledger = load_feedback(&session_dir.join(FEEDBACK_FILE))?;
    let mut replayer = FeedbackReplayer::new(ledger);

    let per_img = parse_images(session_dir, session_index, start_time_ms, &mut replayer)?;

    let end_info_path = session_dir.join(END_INFO_FILE);
    let end_stats_path = session_dir.join(END_STATS_FILE);
    let (end_info, end_stats) = if end_info_path.is_file() && end_stats_path.is_file() {
        let end_info = read_json_object(&end_info_path)?;
        let end_time_ms = int_field(&end_info, END_TIME_KEY, &end_info_path)?;
        derived_info.end_time = Some(local_time(end_time_ms, END_TIME_KEY, &end_info_path)?);

        let stats = read_json_object(&end_stats_path)?;
        replayer.advance_to(end_time_ms);
        let derived_stats = derive_stats(
            &stats,
            &end_stats_path,
            replayer.new_hits(),
            elapsed_since(start_time_ms, end_time_ms, END_TIME_KEY, &end_info_path)?,
        )?;

        let ignored = replayer.remaining().len();
        if ignored > 0 {
            warn!(
                session = session_index,
                ignored, "Ignoring feedback recorded after the session ended"
            );
        }

        let end_record = EndRecord {
            arrival_time_ms: end_time_ms,
            stats,
            derived_stats,
        };
        (Some(end_info), Some(end_record))
    } else {
        if end_info_path.is_file() != end_stats_path.is_file() {
            debug!(
                session = session_index,
                "Only one of end_info.json and end_stats.json exists, treating session as running"
            );
        }
        if !replayer.remaining().is_empty() {
            debug!(
                session = session_index,
                pending = replayer.remaining().len(),
                "Feedback newer than the last image is deferred until the session ends"
            );
        }
        (None, None)
    };

    let (positive_ids, negative_ids) = replayer.into_sets();

    Ok(SessionRecord {
        index: session_index,
        predicate_path,
        predicates,
        predicate_summaries,
        start_info,
        start_time_ms,
        derived_info,
        end_info,
        end_stats,
        per_img,
        positive_ids,
        negative_ids,
    })
}

/// `None` when the stats directory does not exist yet (no image arrived).
fn parse_images(
    session_dir: &Path,
    session_index: u64,
    start_time_ms: i64,
    replayer: &mut FeedbackReplayer,
) -> Result<Option<Vec<ImageRecord>>> {
    let stats_dir = session_dir.join(STATS_DIR);
    if !stats_dir.is_dir() {
        return Ok(None);
    }
    let attributes_dir = session_dir.join(ATTRIBUTES_DIR);

    let entries =
        numbered_entries(&stats_dir, ".json", EntryKind::File).map_err(|e| LogError::io(&stats_dir, e))?;

    let mut images = Vec::with_capacity(entries.len());
    for entry in entries {
        let index = entry.number;

        let attributes_path = attributes_dir.join(format!("{}.json", index));
        let attributes = read_json_object(&attributes_path)?;

        let stats_path = stats_dir.join(&entry.name);
        let stats = read_json_object(&stats_path)?;

        let arrival_time_ms = int_field(&attributes, ARRIVAL_TIME_KEY, &attributes_path)?;
        replayer.advance_to(arrival_time_ms);
        let derived_stats = derive_stats(
            &stats,
            &stats_path,
            replayer.new_hits(),
            elapsed_since(start_time_ms, arrival_time_ms, ARRIVAL_TIME_KEY, &attributes_path)?,
        )?;

        images.push(ImageRecord {
            index,
            attributes,
            stats,
            img_path: format!("{}/{}/{}.jpeg", session_index, THUMBNAIL_DIR, index),
            arrival_time_ms,
            derived_stats,
        });
    }

    debug!(session = session_index, images = images.len(), "Parsed images");
    Ok(Some(images))
}

fn derive_stats(stats: &JsonMap, path: &Path, new_hits: usize, elapsed_ms: i64) -> Result<DerivedStats> {
    let items_processed = int_field(stats, SEARCHED_KEY, path)?;
    let items_shown = int_field(stats, PASSED_KEY, path)?;
    Ok(DerivedStats::compute(items_processed, items_shown, new_hits, elapsed_ms))
}

/// Milliseconds from `start_ms` to `time_ms`; a gap that does not fit in
/// an `i64` marks the timestamp as invalid.
fn elapsed_since(start_ms: i64, time_ms: i64, key: &str, path: &Path) -> Result<i64> {
    time_ms
        .checked_sub(start_ms)
        .ok_or_else(|| LogError::InvalidValue {
            path: path.to_path_buf(),
            key: key.to_string(),
            value: time_ms.to_string(),
        })
}

fn local_time(ms: i64, key: &str, path: &Path) -> Result<String> {
    format_local_ms(ms).ok_or_else(|| LogError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: ms.to_string(),
    })
}
