use anyhow::{Context, Result};
use colored::Colorize;

use hyperboard_logs::{build_series, CandidateRoot, LogStore, RootData, SessionRecord};

pub fn list_roots(store: &LogStore, json: bool) -> Result<()> {
    if !store.root_is_valid() {
        anyhow::bail!("{} is not a readable directory", store.root_folder().display());
    }

    let candidates = store.candidates();

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("{}", "No log roots found.".dimmed());
    } else {
        println!("{:<30} {}", "NAME".dimmed(), "PATH".dimmed());
        for c in &candidates {
            println!("{:<30} {}", c.name.bright_cyan(), c.path.display());
        }
    }

    Ok(())
}

pub fn show_sessions(store: &LogStore, root: Option<&str>, json: bool) -> Result<()> {
    let (candidate, data) = load_selected(store, root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_root(&candidate, &data);
    }

    Ok(())
}

pub fn print_plot(store: &LogStore, root: Option<&str>) -> Result<()> {
    let (_, data) = load_selected(store, root)?;
    let series = build_series(&data.sessions);
    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

/// Unlike the server, the CLI reports why a root is malformed.
fn load_selected(store: &LogStore, root: Option<&str>) -> Result<(CandidateRoot, RootData)> {
    if !store.root_is_valid() {
        anyhow::bail!("{} is not a readable directory", store.root_folder().display());
    }

    let candidate = store.select(root).with_context(|| {
        format!("No log roots found under {}", store.root_folder().display())
    })?;

    if let Some(wanted) = root {
        if candidate.name != wanted && candidate.path.to_str() != Some(wanted) {
            anyhow::bail!("No log root named {:?}. Run `hyperboard roots` to list them.", wanted);
        }
    }

    let data = store
        .load(&candidate)
        .with_context(|| format!("Log root {} is malformed", candidate.path.display()))?;

    Ok((candidate, data))
}

fn print_root(candidate: &CandidateRoot, data: &RootData) {
    println!(
        "{}  {}",
        "=== Log Root ===".bright_blue().bold(),
        candidate.path.display()
    );

    if data.sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
        return;
    }

    println!(
        "{:<8} {:<20} {:<20} {:<7} {:<6} {:<10} {:<10} {}",
        "SESSION".dimmed(),
        "STARTED".dimmed(),
        "ENDED".dimmed(),
        "IMAGES".dimmed(),
        "HITS".dimmed(),
        "PASS".dimmed(),
        "PRECISION".dimmed(),
        "PREDICATES".dimmed(),
    );

    for s in &data.sessions {
        print_session_row(s);
    }
}

fn print_session_row(s: &SessionRecord) {
    let ended = match &s.derived_info.end_time {
        Some(end) => end.clone(),
        None => "running".bright_cyan().to_string(),
    };
    let (pass_rate, precision) = s
        .latest_stats()
        .map(|d| {
            (
                format!("{:.1}%", d.pass_rate),
                format!("{:.1}%", d.precision),
            )
        })
        .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
    let predicates = s
        .predicate_summaries
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        "{:<8} {:<20} {:<20} {:<7} {:<6} {:<10} {:<10} {}",
        s.index,
        s.derived_info.start_time,
        ended,
        s.images().len(),
        s.positive_ids.len().to_string().bright_green(),
        pass_rate,
        precision,
        predicates
    );
}
