//! Console display logic for the ditto CLI.
//!
//! Result lines keep the classic `domain (ascii) : status` layout so output
//! can still be grepped. Colors come from `console` and are dropped
//! automatically when stdout is not a terminal. The progress bar writes to
//! stderr.

use console::style;
use ditto_lib::{address_fields, registration_fields, Candidate, ScanSummary, Target};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

// ── Header ───────────────────────────────────────────────────────────────────

pub fn header_line(count: usize, target: &Target) -> String {
    format!(
        "checking {} variations for '{}', please wait ...",
        count, target
    )
}

pub fn print_header(count: usize, target: &Target) {
    println!("{}\n", header_line(count, target));
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Progress bar for `total` candidates, drawn on stderr unless `hidden`.
pub fn create_progress_bar(total: usize, hidden: bool) -> ProgressBar {
    let progress_bar = ProgressBar::new(total as u64);
    if hidden {
        progress_bar.set_draw_target(ProgressDrawTarget::hidden());
        return progress_bar;
    }

    progress_bar.enable_steady_tick(Duration::from_millis(100));
    if let Ok(bar_style) = ProgressStyle::with_template(
        "{spinner:.cyan} {elapsed_precise} {bar:40.cyan/blue} {pos:>5}/{len:5} {per_sec}",
    ) {
        progress_bar.set_style(bar_style.progress_chars("■■□"));
    }
    progress_bar
}

// ── Result lines ─────────────────────────────────────────────────────────────

/// The main line for one candidate, without trailing newline.
pub fn candidate_line(candidate: &Candidate) -> String {
    if candidate.available {
        return format!(
            "{} ({}) : {}",
            candidate.domain,
            candidate.ascii,
            style("available").green()
        );
    }

    let mut line = format!(
        "{} ({}) {}",
        candidate.domain,
        candidate.ascii,
        style("registered").red()
    );

    let fields = address_fields(candidate);
    if !fields.is_empty() {
        line.push_str(" : ");
        line.push_str(&fields.join(" "));
    }
    line
}

/// Indented registration detail lines, only with `whois_info`.
pub fn detail_lines(candidate: &Candidate, whois_info: bool) -> Vec<String> {
    if !whois_info || candidate.available {
        return Vec::new();
    }
    registration_fields(candidate)
        .into_iter()
        .map(|field| format!("  {}", field))
        .collect()
}

pub fn print_candidate(candidate: &Candidate, whois_info: bool) {
    println!("{}", candidate_line(candidate));
    for line in detail_lines(candidate, whois_info) {
        println!("{}", line);
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

pub fn summary_line(summary: &ScanSummary, duration: Duration) -> String {
    format!(
        "{} variation{} in {:.1}s  {}  {}  {}  {}  {}",
        style(summary.total).bold(),
        if summary.total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} registered", summary.registered)).red(),
        style(format!("({} live)", summary.live)).yellow(),
    )
}

pub fn print_summary(summary: &ScanSummary, duration: Duration) {
    println!();
    println!("{}", summary_line(summary, duration));
}

// ── Tests ────────────────────────────────────────────────────────────────────
