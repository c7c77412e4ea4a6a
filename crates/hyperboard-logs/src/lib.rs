//! # hyperboard-logs
//!
//! Discovery and derivation engine for hyperfind session logs.
//!
//! A hyperfind run writes one integer-named directory per search session
//! under a log root. This crate finds those roots, parses every session in
//! a root, replays user feedback against image arrivals and derives the
//! statistics the dashboard plots.
//!
//! ## Key Types
//!
//! - [`LogStore`] - Entry point used by the server and CLI
//! - [`RootData`] - All sessions of one candidate root
//! - [`SessionRecord`] / [`ImageRecord`] - Parsed session and image logs
//! - [`DerivedStats`] - Pass rate, precision and productivity per point
//! - [`FeedbackReplayer`] - Stepwise replay of the feedback ledger
//! - [`PlotPoint`] - One entry of the flattened chart series
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hyperboard_logs::{build_series, find_candidate_roots, process_root};
//!
//! for root in find_candidate_roots(Path::new("/data/logs"), 2) {
//!     let data = process_root(&root)?;
//!     let series = build_series(&data.sessions);
//!     println!("{}: {} sessions, {} points", root.display(), data.sessions.len(), series.len());
//! }
//! ```

pub mod error;
pub mod feedback;
pub mod plot;
pub mod predicate;
pub mod root;
pub mod scanner;
pub mod session;
pub mod store;
pub mod types;
mod util;
pub mod watcher;

pub use error::{FeedbackError, LogError, Result};
pub use feedback::{load_feedback, FeedbackEvent, FeedbackLabel, FeedbackLedger, FeedbackReplayer};
pub use plot::{build_series, PlotPoint};
pub use predicate::{describe_predicate, summarize_predicates, PredicateSummary};
pub use root::process_root;
pub use scanner::{find_candidate_roots, scan_candidate_roots, ScanOptions};
pub use session::parse_session;
pub use store::{CandidateRoot, DashboardState, DashboardView, LogStore, ReplayView};
pub use types::{DerivedInfo, DerivedStats, EndRecord, ImageRecord, JsonMap, RootData, SessionRecord};
pub use util::float_div;
pub use watcher::{TreeEvent, TreeWatcher};
