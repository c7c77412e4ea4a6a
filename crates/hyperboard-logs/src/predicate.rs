//! Short human-readable descriptions of search predicates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::display_value;

const NO_DESCRIPTION: &str = "no available description";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSummary {
    pub name: String,
    pub description: String,
}

/// Summaries for every predicate in a `pred.hyperfindsearch` document, which
/// holds either one predicate object, an array of them, or an object with a
/// `predicates` array.
pub fn summarize_predicates(document: &Value) -> Vec<PredicateSummary> {
    let predicates: Vec<&Value> = match document {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("predicates") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![document],
        },
        _ => Vec::new(),
    };

    predicates
        .into_iter()
        .filter(|p| p.is_object())
        .map(|p| PredicateSummary {
            name: p
                .get("predicateName")
                .map(display_value)
                .unwrap_or_else(|| "unknown".to_string()),
            description: describe_predicate(p),
        })
        .collect()
}

/// Describe one predicate by the options that matter for its kind.
pub fn describe_predicate(pred: &Value) -> String {
    let option = |key: &str| pred.get("optionMap").and_then(|m| m.get(key));

    let description = match pred.get("predicateName").and_then(Value::as_str) {
        Some("DNN + JIT SVM") => pred
            .get("dataZipState")
            .and_then(|s| s.get("folderCount"))
            .and_then(Value::as_object)
            .map(|counts| {
                counts
                    .iter()
                    .map(|(name, count)| format!(" {}: {},", name, display_value(count)))
                    .collect::<String>()
            }),
        Some("Face/Body") => match (option("minface"), option("maxface")) {
            (Some(min), Some(max)) => Some(format!(
                "min={}, max={}",
                display_value(min),
                display_value(max)
            )),
            _ => None,
        },
        Some("DOG Texture") => pred
            .get("examples")
            .and_then(Value::as_array)
            .map(|examples| format!("num examples: {}", examples.len())),
        Some("DNN ImageNet Classify") => {
            option("targets").map(|targets| format!("targets: {}", display_value(targets)))
        }
        _ => None,
    };

    description.unwrap_or_else(|| NO_DESCRIPTION.to_string())
}
