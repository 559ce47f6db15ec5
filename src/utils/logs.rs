use console::{measure_text_width, Style};

use crate::monitor::{BatchOutcome, FlaggedComment};
use crate::scoring::{AnalysisResult, CategoryTable, LoadError, MatchPolicy, Verdict};

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 25;
const PREVIEW_CHARS: usize = 60;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn magenta() -> Style {
    Style::new().magenta()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn monitor_prefix() -> String {
    magenta().apply_to("[MONITOR]").to_string()
}

fn error_prefix() -> String {
    red().apply_to("[ERROR]").to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn preview(text: &str) -> String {
    let preview = if text.chars().count() > PREVIEW_CHARS {
        format!(
            "{}...",
            text.chars().take(PREVIEW_CHARS - 3).collect::<String>()
        )
    } else {
        text.to_string()
    };
    preview.replace('\n', " ")
}

pub fn log_keywords_loaded(source: &str, table: &CategoryTable, policy: MatchPolicy) {
    eprintln!(
        "{} loaded {} categories, {} phrases from {} ({} matching)",
        init_prefix(),
        bold().apply_to(table.len()),
        bold().apply_to(table.phrase_count()),
        cyan().apply_to(source),
        dim().apply_to(policy),
    );
}

pub fn log_load_error(error: &LoadError) {
    eprintln!("{} {}", error_prefix(), error);
}

pub fn log_usage_error(error: &str, usage: &str) {
    eprintln!("{} {}", error_prefix(), error);
    eprintln!();
    eprintln!("{}", usage);
}

pub fn log_generic_error(context: &str, error: &str) {
    eprintln!("{} {}: {}", error_prefix(), context, dim().apply_to(error));
}

pub fn log_prompt() {
    eprint!("{} ", cyan().apply_to(">"));
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Flagged => red().bold(),
        Verdict::Clean => green().bold(),
    }
}

/// Tree-formatted analysis lines, shared by the CLI and the monitor.
fn analysis_lines(result: &AnalysisResult, verdict: Verdict) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("verdict", 1),
        verdict_style(verdict).apply_to(verdict.to_string().to_uppercase())
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("score", 1),
        bold().apply_to(result.score)
    ));

    if result.category_hits.is_empty() {
        lines.push(format!(
            "{}{} {}",
            tree_end(),
            pad_label("categories", 1),
            dim().apply_to("none")
        ));
        return lines;
    }

    lines.push(format!("{}{}", tree_end(), pad_label("categories", 1)));
    let count = result.category_hits.len();
    for (i, (category, phrases)) in result.category_hits.iter().enumerate() {
        let branch = if i == count - 1 {
            tree_end()
        } else {
            tree_branch()
        };
        let phrases = phrases
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "    {}{} {}",
            branch,
            yellow().apply_to(category),
            dim().apply_to(phrases)
        ));
    }

    lines
}

pub fn render_analysis(message: &str, result: &AnalysisResult, threshold: u32) -> String {
    let verdict = result.verdict(threshold);
    let mut lines = vec![format!(
        "{} \"{}\"",
        magenta().apply_to(bold().apply_to("[ANALYSIS]")),
        dim().apply_to(preview(message))
    )];
    lines.extend(analysis_lines(result, verdict));
    lines.join("\n")
}

pub fn render_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

pub fn log_monitor_start(subreddits: &str, interval_secs: u64, skip_existing: bool) {
    println!(
        "{} watching {} every {}s...",
        monitor_prefix(),
        cyan().apply_to(format!("r/{subreddits}")),
        bold().apply_to(interval_secs),
    );
    println!(
        "{} existing comments are {}.",
        monitor_prefix(),
        if skip_existing {
            yellow().apply_to("skipped")
        } else {
            green().apply_to("scanned")
        }
    );
}

pub fn log_monitor_stopped() {
    println!("{} stopped by user.", monitor_prefix());
}

pub fn log_fetch_error(error: &str, retry_in_secs: u64) {
    println!(
        "{} {} {} (retrying in {}s)",
        monitor_prefix(),
        red().apply_to("fetch failed:"),
        dim().apply_to(error),
        bold().apply_to(retry_in_secs)
    );
}

pub fn log_batch(outcome: &BatchOutcome) {
    if outcome.scanned > 0 {
        tracing::debug!(
            scanned = outcome.scanned,
            skipped = outcome.skipped,
            flagged = outcome.flagged.len(),
            "processed comment batch"
        );
    }
}

pub fn log_flagged_comment(flagged: &FlaggedComment, threshold: u32) {
    let comment = &flagged.comment;
    let mut lines = vec![format!(
        "{} {}",
        red().apply_to(bold().apply_to("[FLAGGED]")),
        dim().apply_to(comment.created.format("%Y-%m-%d %H:%M:%S UTC"))
    )];

    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("author", 1),
        bold().apply_to(format!("u/{}", comment.author))
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("subreddit", 1),
        cyan().apply_to(format!("r/{}", comment.subreddit))
    ));
    lines.push(format!(
        "{}{} \"{}\"",
        tree_branch(),
        pad_label("comment", 1),
        preview(&comment.body)
    ));
    lines.push(format!(
        "{}{} {}",
        tree_branch(),
        pad_label("link", 1),
        dim().apply_to(comment.permalink_url())
    ));
    lines.push(format!("{}{}", tree_end(), pad_label("analysis", 1)));
    for line in analysis_lines(&flagged.result, flagged.result.verdict(threshold)) {
        lines.push(format!("    {}", line));
    }

    println!("{}\n", lines.join("\n"));
}
