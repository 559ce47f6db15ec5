use crate::scoring::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub const DEFAULT_SETTINGS_PATH: &str = "settings.default.ron";
pub const OVERRIDE_SETTINGS_PATH: &str = "settings.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub keywords: Keywords,
    pub scoring: Scoring,
    pub monitor: Monitor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keywords {
    /// Keyword file merged into the built-in table at startup.
    pub path: Option<String>,
    /// Use the keyword file on its own instead of merging it.
    #[serde(default)]
    pub replace_builtin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    pub policy: MatchPolicy,
    pub flag_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub subreddits: Vec<String>,
    pub poll_interval_secs: u64,
    pub fetch_limit: u32,
    pub skip_existing: bool,
    pub seen_capacity: usize,
    pub max_backoff_secs: u64,
    pub jitter_ms: u64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::Substring,
            flag_threshold: 1,
        }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            subreddits: vec![
                "teenagers".into(),
                "AskTeenGirls".into(),
                "AskTeenBoys".into(),
            ],
            poll_interval_secs: 15,
            fetch_limit: 100,
            skip_existing: true,
            seen_capacity: 5000,
            max_backoff_secs: 300,
            jitter_ms: 750,
        }
    }
}

impl Monitor {
    /// Subreddits joined the way the listing endpoint expects (`a+b+c`).
    pub fn subreddit_path(&self) -> String {
        self.subreddits
            .iter()
            .map(|s| s.trim().trim_start_matches("r/"))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(|| {
            Self::load_from_files(
                Path::new(DEFAULT_SETTINGS_PATH),
                Path::new(OVERRIDE_SETTINGS_PATH),
            )
        })
    }

    pub fn load_from_files(default_path: &Path, override_path: &Path) -> Settings {
        let mut settings = Self::read_file(default_path).unwrap_or_default();

        if let Some(overrides) = Self::read_file(override_path) {
            settings = overrides;
        }

        settings
    }

    fn read_file(path: &Path) -> Option<Settings> {
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings file");
                return None;
            }
        };

        match ron::from_str::<Settings>(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
                None
            }
        }
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}
