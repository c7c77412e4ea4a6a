//! The per-session feedback ledger and its replay.
//!
//! `feedback.csv` records every label the user gave, one row per event,
//! with the wall-clock time it was given. Statistics for an image may only
//! count feedback given before that image arrived, so the ledger is replayed
//! forward as the session timeline is walked.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FeedbackError, LogError, Result};

pub const ID_COLUMN: &str = "id";
pub const LABEL_COLUMN: &str = "feedback_label";
pub const TIME_COLUMN: &str = "absolute time(ms)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLabel {
    Positive,
    Negative,
    Ignore,
}

impl FromStr for FeedbackLabel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Positive" => Ok(FeedbackLabel::Positive),
            "Negative" => Ok(FeedbackLabel::Negative),
            "Ignore" => Ok(FeedbackLabel::Ignore),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FeedbackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackLabel::Positive => write!(f, "Positive"),
            FeedbackLabel::Negative => write!(f, "Negative"),
            FeedbackLabel::Ignore => write!(f, "Ignore"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub timestamp_ms: i64,
    pub item_id: String,
    pub label: FeedbackLabel,
}

/// Feedback events in strictly increasing time order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackLedger {
    events: Vec<FeedbackEvent>,
}

impl FeedbackLedger {
    /// Build a ledger, rejecting any timestamp that does not increase.
    pub fn from_events(events: Vec<FeedbackEvent>) -> std::result::Result<Self, FeedbackError> {
        for (i, pair) in events.windows(2).enumerate() {
            if pair[1].timestamp_ms <= pair[0].timestamp_ms {
                return Err(FeedbackError::NonMonotonic {
                    line: i + 3,
                    previous: pair[0].timestamp_ms,
                    current: pair[1].timestamp_ms,
                });
            }
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Load `feedback.csv`. A missing file is an empty ledger: sessions without
/// any feedback yet are normal.
pub fn load_feedback(path: &Path) -> Result<FeedbackLedger> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FeedbackLedger::default()),
        Err(e) => return Err(LogError::io(path, e)),
    };

    parse_feedback(&content).map_err(|source| LogError::Feedback {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse ledger CSV text. Columns are located by header name, so their order
/// does not matter and extra columns are ignored. Quoted fields may span
/// lines; errors report the line a record starts on.
pub fn parse_feedback(content: &str) -> std::result::Result<FeedbackLedger, FeedbackError> {
    let mut lines = split_lines(content)
        .into_iter()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Ok(FeedbackLedger::default());
    };
    let header = split_record(header.trim_start_matches('\u{feff}'));

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| FeedbackError::MissingColumn(name.to_string()))
    };
    let id_col = column(ID_COLUMN)?;
    let label_col = column(LABEL_COLUMN)?;
    let time_col = column(TIME_COLUMN)?;
    let needed = id_col.max(label_col).max(time_col) + 1;

    let mut events: Vec<FeedbackEvent> = Vec::new();
    for (line, text) in lines {
        let fields = split_record(&text);
        if fields.len() < needed {
            return Err(FeedbackError::ShortRow {
                line,
                expected: needed,
                found: fields.len(),
            });
        }

        let raw_time = fields[time_col].trim();
        let timestamp_ms = parse_timestamp(raw_time).ok_or_else(|| FeedbackError::InvalidTimestamp {
            line,
            value: raw_time.to_string(),
        })?;

        let raw_label = fields[label_col].trim();
        let label = raw_label
            .parse::<FeedbackLabel>()
            .map_err(|_| FeedbackError::UnknownLabel {
                line,
                label: raw_label.to_string(),
            })?;

        if let Some(previous) = events.last() {
            if timestamp_ms <= previous.timestamp_ms {
                return Err(FeedbackError::NonMonotonic {
                    line,
                    previous: previous.timestamp_ms,
                    current: timestamp_ms,
                });
            }
        }

        events.push(FeedbackEvent {
            timestamp_ms,
            item_id: fields[id_col].trim().to_string(),
            label,
        });
    }

    Ok(FeedbackLedger { events })
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

/// Break text into records with their starting line numbers. A newline
/// inside a quoted field belongs to the record.
fn split_lines(content: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut record = String::new();
    let mut line = 1;
    let mut start = 1;
    let mut in_quotes = false;

    for c in content.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                record.push(c);
            }
            '\n' if !in_quotes => {
                records.push((start, record.trim_end_matches('\r').to_string()));
                record.clear();
                line += 1;
                start = line;
            }
            '\n' => {
                record.push(c);
                line += 1;
            }
            c => record.push(c),
        }
    }
    if !record.is_empty() {
        records.push((start, record.trim_end_matches('\r').to_string()));
    }
    records
}

/// Split one CSV record. Quoted fields may contain commas and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Replays a ledger forward in time, tracking which items are currently
/// labeled positive and negative. The cursor only moves forward, so asking
/// for the same time twice applies nothing the second time.
#[derive(Debug, Clone, Default)]
pub struct FeedbackReplayer {
    events: Vec<FeedbackEvent>,
    cursor: usize,
    positive_ids: BTreeSet<String>,
    negative_ids: BTreeSet<String>,
}

impl FeedbackReplayer {
    pub fn new(ledger: FeedbackLedger) -> Self {
        Self {
            events: ledger.events,
            ..Default::default()
        }
    }

    /// Apply every pending event with `timestamp_ms <= time_ms`.
    /// Returns how many events were applied.
    pub fn advance_to(&mut self, time_ms: i64) -> usize {
        let start = self.cursor;
        while let Some(event) = self.events.get(self.cursor) {
            if event.timestamp_ms > time_ms {
                break;
            }
            let id = event.item_id.clone();
            match event.label {
                FeedbackLabel::Positive => {
                    self.negative_ids.remove(&id);
                    self.positive_ids.insert(id);
                }
                FeedbackLabel::Negative => {
                    self.positive_ids.remove(&id);
                    self.negative_ids.insert(id);
                }
                FeedbackLabel::Ignore => {
                    self.positive_ids.remove(&id);
                    self.negative_ids.remove(&id);
                }
            }
            self.cursor += 1;
        }
        self.cursor - start
    }

    /// Number of items currently labeled positive.
    pub fn new_hits(&self) -> usize {
        self.positive_ids.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Events not applied yet.
    pub fn remaining(&self) -> &[FeedbackEvent] {
        &self.events[self.cursor..]
    }

    pub fn positive_ids(&self) -> &BTreeSet<String> {
        &self.positive_ids
    }

    pub fn negative_ids(&self) -> &BTreeSet<String> {
        &self.negative_ids
    }

    pub fn into_sets(self) -> (BTreeSet<String>, BTreeSet<String>) {
        (self.positive_ids, self.negative_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp_ms: i64, id: &str, label: FeedbackLabel) -> FeedbackEvent {
        FeedbackEvent {
            timestamp_ms,
            item_id: id.to_string(),
            label,
        }
    }

    #[test]
    fn split_plain_and_quoted() {
        assert_eq!(split_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_record("a,,c"), vec!["a", "", "c"]);
        assert_eq!(split_record(r#""x,y",Positive,10"#), vec!["x,y", "Positive", "10"]);
        assert_eq!(split_record(r#""say ""hi""",b"#), vec![r#"say "hi""#, "b"]);
    }

    #[test]
    fn quoted_ids_may_span_lines() {
        let csv = "id,feedback_label,absolute time(ms)\n\"two\nlines\",Positive,10\nb,Maybe,20\n";
        assert_eq!(
            parse_feedback(csv).unwrap_err(),
            FeedbackError::UnknownLabel {
                line: 4,
                label: "Maybe".to_string()
            }
        );

        let csv = "id,feedback_label,absolute time(ms)\r\n\"two\nlines\",Positive,10\r\nb,Negative,20\r\n";
        let ledger = parse_feedback(csv).unwrap();
        assert_eq!(
            ledger.events(),
            &[
                event(10, "two\nlines", FeedbackLabel::Positive),
                event(20, "b", FeedbackLabel::Negative)
            ]
        );
    }

    #[test]
    fn parse_in_any_column_order() {
        let csv = "absolute time(ms),extra,feedback_label,id\n10,x,Positive,a\n20,y,Ignore,b\n";
        let ledger = parse_feedback(csv).unwrap();
        assert_eq!(
            ledger.events(),
            &[
                event(10, "a", FeedbackLabel::Positive),
                event(20, "b", FeedbackLabel::Ignore)
            ]
        );
    }

    #[test]
    fn parse_empty_and_header_only() {
        assert!(parse_feedback("").unwrap().is_empty());
        assert!(parse_feedback("id,feedback_label,absolute time(ms)\n").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_bad_rows() {
        assert_eq!(
            parse_feedback("id,absolute time(ms)\na,1\n"),
            Err(FeedbackError::MissingColumn(LABEL_COLUMN.to_string()))
        );
        assert!(matches!(
            parse_feedback("id,feedback_label,absolute time(ms)\na,Maybe,1\n"),
            Err(FeedbackError::UnknownLabel { line: 2, .. })
        ));
        assert!(matches!(
            parse_feedback("id,feedback_label,absolute time(ms)\na,Positive,soon\n"),
            Err(FeedbackError::InvalidTimestamp { line: 2, .. })
        ));
        assert!(matches!(
            parse_feedback("id,feedback_label,absolute time(ms)\na,Positive\n"),
            Err(FeedbackError::ShortRow { line: 2, .. })
        ));
    }

    #[test]
    fn from_events_checks_order() {
        let ok = FeedbackLedger::from_events(vec![
            event(1, "a", FeedbackLabel::Positive),
            event(2, "a", FeedbackLabel::Negative),
        ]);
        assert!(ok.is_ok());

        let dup = FeedbackLedger::from_events(vec![
            event(5, "a", FeedbackLabel::Positive),
            event(5, "b", FeedbackLabel::Positive),
        ]);
        assert!(matches!(dup, Err(FeedbackError::NonMonotonic { .. })));
    }

    #[test]
    fn replay_moves_items_between_sets() {
        let ledger = FeedbackLedger::from_events(vec![
            event(10, "a", FeedbackLabel::Negative),
            event(20, "a", FeedbackLabel::Positive),
            event(30, "b", FeedbackLabel::Positive),
            event(40, "b", FeedbackLabel::Ignore),
        ])
        .unwrap();
        let mut replayer = FeedbackReplayer::new(ledger);

        assert_eq!(replayer.advance_to(10), 1);
        assert!(replayer.negative_ids().contains("a"));
        assert_eq!(replayer.new_hits(), 0);

        assert_eq!(replayer.advance_to(30), 2);
        assert!(!replayer.negative_ids().contains("a"));
        assert_eq!(replayer.new_hits(), 2);

        assert_eq!(replayer.advance_to(45), 1);
        assert_eq!(replayer.new_hits(), 1);
        assert!(replayer.positive_ids().contains("a"));
        assert!(replayer.negative_ids().is_empty());
        assert!(replayer.remaining().is_empty());
    }

    #[test]
    fn replaying_to_the_same_time_twice_changes_nothing() {
        let ledger = FeedbackLedger::from_events(vec![
            event(10, "a", FeedbackLabel::Positive),
            event(20, "b", FeedbackLabel::Positive),
            event(50, "c", FeedbackLabel::Positive),
        ])
        .unwrap();
        let mut replayer = FeedbackReplayer::new(ledger);

        assert_eq!(replayer.advance_to(20), 2);
        let first = (replayer.positive_ids().clone(), replayer.negative_ids().clone());

        assert_eq!(replayer.advance_to(20), 0);
        assert_eq!(replayer.advance_to(5), 0);
        assert_eq!(
            (replayer.positive_ids().clone(), replayer.negative_ids().clone()),
            first
        );
        assert_eq!(replayer.remaining().len(), 1);
    }
}
