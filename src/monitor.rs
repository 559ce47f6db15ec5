use anyhow::Result;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::scoring::{AnalysisResult, CategoryTable, Scorer, Verdict};
use crate::settings;
use crate::utils::reddit::{Comment, RedditClient};
use crate::utils::{log_batch, log_fetch_error, log_flagged_comment, log_monitor_stopped};

/// Bounded memory of comment ids already handled, oldest evicted first.
#[derive(Debug, Clone)]
pub struct SeenIds {
    capacity: usize,
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SeenIds {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.ids.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FlaggedComment {
    pub comment: Comment,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub scanned: usize,
    pub skipped: usize,
    pub flagged: Vec<FlaggedComment>,
}

pub struct CommentMonitor {
    table: CategoryTable,
    scorer: Scorer,
    threshold: u32,
    seen: SeenIds,
    skip_existing: bool,
    primed: bool,
}

impl CommentMonitor {
    pub fn new(
        table: CategoryTable,
        scorer: Scorer,
        threshold: u32,
        config: &settings::Monitor,
    ) -> Self {
        Self {
            table,
            scorer,
            threshold,
            seen: SeenIds::new(config.seen_capacity),
            skip_existing: config.skip_existing,
            primed: false,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn process_batch(&mut self, comments: Vec<Comment>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let backlog = self.skip_existing && !self.primed;
        self.primed = true;

        for comment in comments {
            if !self.seen.insert(&comment.id) {
                continue;
            }
            if backlog || comment.is_deleted() {
                outcome.skipped += 1;
                continue;
            }

            outcome.scanned += 1;
            let result = self.scorer.analyze(&comment.body, &self.table);
            if result.verdict(self.threshold) == Verdict::Flagged {
                outcome.flagged.push(FlaggedComment { comment, result });
            }
        }

        outcome
    }
}

/// Delay before the next poll after `failures` consecutive fetch errors.
pub fn backoff_delay(poll_interval: Duration, max_backoff: Duration, failures: u32) -> Duration {
    if failures == 0 {
        return poll_interval;
    }
    let factor = 2u32.saturating_pow(failures.min(16));
    poll_interval.saturating_mul(factor).min(max_backoff.max(poll_interval))
}

fn with_jitter(delay: Duration, jitter_ms: u64) -> Duration {
    if jitter_ms == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
}

/// Polls the listing until Ctrl-C, printing every flagged comment.
pub async fn run(
    mut client: RedditClient,
    mut monitor: CommentMonitor,
    config: &settings::Monitor,
) -> Result<()> {
    let subreddits = config.subreddit_path();
    anyhow::ensure!(!subreddits.is_empty(), "no subreddits configured");

    let poll_interval = Duration::from_secs(config.poll_interval_secs.max(1));
    let max_backoff = Duration::from_secs(config.max_backoff_secs);
    let mut failures: u32 = 0;

    loop {
        match client.fetch_comments(&subreddits, config.fetch_limit).await {
            Ok(comments) => {
                failures = 0;
                let outcome = monitor.process_batch(comments);
                log_batch(&outcome);
                for flagged in &outcome.flagged {
                    log_flagged_comment(flagged, monitor.threshold());
                }
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                tracing::warn!(error = %e, failures, "comment fetch failed");
                let retry = backoff_delay(poll_interval, max_backoff, failures);
                log_fetch_error(&e, retry.as_secs());
            }
        }

        let delay = with_jitter(
            backoff_delay(poll_interval, max_backoff, failures),
            config.jitter_ms,
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                log_monitor_stopped();
                return Ok(());
            }
        }
    }
}
