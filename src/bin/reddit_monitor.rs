use anyhow::{anyhow, Context, Result};
use chatguard::cli::{load_table, CliArgs};
use chatguard::monitor::{self, CommentMonitor};
use chatguard::scoring::Scorer;
use chatguard::settings::settings;
use chatguard::utils::reddit::{Credentials, RedditClient};
use chatguard::utils::{init_tracing, log_keywords_loaded, log_monitor_start};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let debug = std::env::args().any(|a| a == "--debug");
    init_tracing(debug)?;

    let s = settings();
    let loaded = load_table(&CliArgs::default(), s).context("loading keywords")?;
    let table = loaded.table;

    let scorer = Scorer::from_settings();
    log_keywords_loaded(&loaded.source, &table, scorer.policy());

    let credentials = Credentials::from_env().map_err(|e| anyhow!(e))?;
    let mut client = RedditClient::new(credentials).map_err(|e| anyhow!(e))?;
    client
        .authenticate()
        .await
        .map_err(|e| anyhow!(e))
        .context("authenticating with Reddit")?;

    log_monitor_start(
        &s.monitor.subreddit_path(),
        s.monitor.poll_interval_secs,
        s.monitor.skip_existing,
    );

    let watcher = CommentMonitor::new(table, scorer, s.scoring.flag_threshold, &s.monitor);
    monitor::run(client, watcher, &s.monitor).await
}
