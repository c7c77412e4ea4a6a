use std::fs;
use std::io;
use std::path::Path;

use chrono::{Local, TimeZone};
use serde_json::Value;

use crate::error::{LogError, Result};
use crate::types::JsonMap;

/// Division that treats a zero denominator as "no rate yet".
pub fn float_div(num: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Dir,
    File,
}

/// An entry named `<digits><ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumberedEntry {
    pub number: u64,
    pub name: String,
}

/// List entries of `dir` whose names are a decimal integer followed by `ext`,
/// sorted by that integer. Entries of the wrong kind are skipped.
pub(crate) fn numbered_entries(dir: &Path, ext: &str, kind: EntryKind) -> io::Result<Vec<NumberedEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(number) = parse_numbered_name(&name, ext) else {
            continue;
        };

        let path = entry.path();
        let matches_kind = match kind {
            EntryKind::Dir => path.is_dir(),
            EntryKind::File => path.is_file(),
        };
        if matches_kind {
            entries.push(NumberedEntry { number, name });
        }
    }

    entries.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// `"12.json"` with ext `".json"` gives `Some(12)`; signs, spaces and empty stems do not parse.
pub(crate) fn parse_numbered_name(name: &str, ext: &str) -> Option<u64> {
    let stem = name.strip_suffix(ext)?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// True when the sorted numbers are exactly `0, 1, ..., k-1` with `k >= 1`.
pub(crate) fn is_dense_sequence(numbers: &[u64]) -> bool {
    !numbers.is_empty()
        && numbers
            .iter()
            .enumerate()
            .all(|(expected, &n)| n == expected as u64)
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| LogError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| LogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json_object(path: &Path) -> Result<JsonMap> {
    match read_json(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(LogError::NotAnObject(path.to_path_buf())),
    }
}

/// Read an integer field. The producer is loosely typed, so floats are
/// truncated and numeric strings are accepted.
pub(crate) fn int_field(map: &JsonMap, key: &str, path: &Path) -> Result<i64> {
    let value = map.get(key).ok_or_else(|| LogError::MissingKey {
        path: path.to_path_buf(),
        key: key.to_string(),
    })?;

    value_as_int(value).ok_or_else(|| LogError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Format a millisecond epoch timestamp as local `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn format_local_ms(ms: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(ms)
        .earliest()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Render a JSON value the way a person would type it: strings unquoted.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
