use serde::{Deserialize, Serialize};

use crate::types::{DerivedStats, SessionRecord};

/// One entry of the flattened chart series.
///
/// Sessions are independent experiments, so after each ended session a
/// [`PlotPoint::Reset`] brings every line back to zero before the next
/// session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotPoint {
    Image {
        session: u64,
        index: u64,
        img_path: String,
        arrival_time_ms: i64,
        derived_stats: DerivedStats,
    },
    SessionEnd {
        session: u64,
        arrival_time_ms: i64,
        derived_stats: DerivedStats,
    },
    Reset {
        session: u64,
        arrival_time_ms: i64,
        derived_stats: DerivedStats,
    },
}

impl PlotPoint {
    pub fn session(&self) -> u64 {
        match self {
            PlotPoint::Image { session, .. }
            | PlotPoint::SessionEnd { session, .. }
            | PlotPoint::Reset { session, .. } => *session,
        }
    }

    pub fn arrival_time_ms(&self) -> i64 {
        match self {
            PlotPoint::Image { arrival_time_ms, .. }
            | PlotPoint::SessionEnd { arrival_time_ms, .. }
            | PlotPoint::Reset { arrival_time_ms, .. } => *arrival_time_ms,
        }
    }

    pub fn derived_stats(&self) -> &DerivedStats {
        match self {
            PlotPoint::Image { derived_stats, .. }
            | PlotPoint::SessionEnd { derived_stats, .. }
            | PlotPoint::Reset { derived_stats, .. } => derived_stats,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, PlotPoint::Reset { .. })
    }
}

/// Flatten sessions into one series: each session's images, then for ended
/// sessions the end point followed by a reset point at the same time.
pub fn build_series(sessions: &[SessionRecord]) -> Vec<PlotPoint> {
    let mut series = Vec::new();

    for session in sessions {
        series.extend(session.images().iter().map(|img| PlotPoint::Image {
            session: session.index,
            index: img.index,
            img_path: img.img_path.clone(),
            arrival_time_ms: img.arrival_time_ms,
            derived_stats: img.derived_stats,
        }));

        if let Some(end) = &session.end_stats {
            series.push(PlotPoint::SessionEnd {
                session: session.index,
                arrival_time_ms: end.arrival_time_ms,
                derived_stats: end.derived_stats,
            });
            series.push(PlotPoint::Reset {
                session: session.index,
                arrival_time_ms: end.arrival_time_ms,
                derived_stats: DerivedStats::zero(),
            });
        }
    }

    series
}
