use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::scoring::{CategoryTable, LoadError, MatchPolicy};
use crate::settings::Settings;

pub const QUIT_COMMANDS: &[&str] = &["quit", "exit", ":q"];
pub const BUILTIN_SOURCE: &str = "built-in list";

pub const EXIT_LOAD_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unknown match policy '{0}' (expected substring or word-boundary)")]
    UnknownPolicy(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

impl UsageError {
    pub fn exit_code(&self) -> u8 {
        EXIT_USAGE
    }
}

impl LoadError {
    pub fn exit_code(&self) -> u8 {
        EXIT_LOAD_FAILURE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub keywords: Option<PathBuf>,
    pub replace_builtin: bool,
    pub policy: Option<MatchPolicy>,
    pub format: OutputFormat,
    pub debug: bool,
    pub help: bool,
    /// Joined free-text arguments. `None` starts the interactive prompt.
    pub text: Option<String>,
}

impl CliArgs {
    /// Parses arguments without the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut words: Vec<String> = Vec::new();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--json" => parsed.format = OutputFormat::Json,
                "--debug" => parsed.debug = true,
                "--replace-builtin" => parsed.replace_builtin = true,
                "--kw" | "--keywords" => {
                    let path = args.next().ok_or(UsageError::MissingValue(arg.clone()))?;
                    parsed.keywords = Some(PathBuf::from(path));
                }
                "--policy" => {
                    let value = args.next().ok_or(UsageError::MissingValue(arg.clone()))?;
                    let policy = MatchPolicy::from_str(&value)
                        .map_err(|_| UsageError::UnknownPolicy(value.clone()))?;
                    parsed.policy = Some(policy);
                }
                "--" => {
                    words.extend(args.by_ref());
                }
                flag if flag.starts_with("--") => {
                    return Err(UsageError::UnknownOption(flag.to_string()));
                }
                other => words.push(other.to_string()),
            }
        }

        if !words.is_empty() {
            parsed.text = Some(words.join(" "));
        }

        Ok(parsed)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: CategoryTable,
    /// Where the keywords came from, for the startup log line.
    pub source: String,
}

/// Builds the keyword table for a run.
///
/// `--kw` wins over `keywords.path` from settings. The file is merged into
/// the built-in table unless either the flag or the setting asks to replace it.
pub fn load_table(args: &CliArgs, settings: &Settings) -> Result<LoadedTable, LoadError> {
    let path = args
        .keywords
        .clone()
        .or_else(|| settings.keywords.path.clone().map(PathBuf::from));
    let replace = args.replace_builtin || settings.keywords.replace_builtin;

    let Some(path) = path else {
        return Ok(LoadedTable {
            table: CategoryTable::builtin()?,
            source: BUILTIN_SOURCE.to_string(),
        });
    };

    let custom = CategoryTable::load(&path)?;
    if replace {
        return Ok(LoadedTable {
            table: custom,
            source: path.display().to_string(),
        });
    }

    Ok(LoadedTable {
        table: CategoryTable::builtin()?.merged(&custom),
        source: format!("{} + {}", BUILTIN_SOURCE, path.display()),
    })
}

pub fn is_quit_command(line: &str) -> bool {
    let line = line.trim();
    QUIT_COMMANDS.iter().any(|q| line.eq_ignore_ascii_case(q))
}

pub fn usage() -> &'static str {
    "Usage: chatguard [OPTIONS] [TEXT...]

Scores TEXT for grooming, exploitation and bullying language. Without TEXT,
reads one message per line until end-of-input or `quit`.

Options:
  --kw <FILE>         Keyword file (JSON object of category -> phrases),
                      merged into the built-in list
  --replace-builtin   Use the --kw file instead of the built-in list
  --policy <POLICY>   substring (default) or word-boundary
  --json              Print the analysis as JSON
  --debug             Log per-category matches
  -h, --help          Show this help"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn keyword_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn settings_with_path(path: Option<&str>) -> Settings {
        let mut settings = Settings::default();
        settings.keywords.path = path.map(str::to_string);
        settings
    }

    #[test]
    fn test_parse_text_and_flags() {
        let args = CliArgs::parse(["--json", "send", "me", "a", "pic"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.text.as_deref(), Some("send me a pic"));
        assert!(!args.debug);
    }

    #[test]
    fn test_parse_no_text_is_interactive() {
        let args = CliArgs::parse(Vec::<String>::new()).unwrap();
        assert!(args.text.is_none());
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_keyword_file_and_policy() {
        let args =
            CliArgs::parse(["--kw", "custom.json", "--policy", "word-boundary", "hello"]).unwrap();
        assert_eq!(args.keywords, Some(PathBuf::from("custom.json")));
        assert_eq!(args.policy, Some(MatchPolicy::WordBoundary));
        assert_eq!(args.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            CliArgs::parse(["--kw"]).unwrap_err(),
            UsageError::MissingValue("--kw".into())
        );
        assert_eq!(
            CliArgs::parse(["--policy", "fuzzy"]).unwrap_err(),
            UsageError::UnknownPolicy("fuzzy".into())
        );
        assert_eq!(
            CliArgs::parse(["--verbose"]).unwrap_err(),
            UsageError::UnknownOption("--verbose".into())
        );
    }

    #[test]
    fn test_double_dash_keeps_flag_like_text() {
        let args = CliArgs::parse(["--", "--json", "is", "text"]).unwrap();
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.text.as_deref(), Some("--json is text"));
    }

    #[test]
    fn test_quit_commands() {
        assert!(is_quit_command(" QUIT "));
        assert!(is_quit_command("exit"));
        assert!(!is_quit_command("quitting time"));
    }

    #[test]
    fn test_load_table_defaults_to_builtin() {
        let args = CliArgs::parse(Vec::<String>::new()).unwrap();
        let loaded = load_table(&args, &Settings::default()).unwrap();
        assert_eq!(loaded.table, CategoryTable::builtin().unwrap());
        assert_eq!(loaded.source, BUILTIN_SOURCE);
    }

    #[test]
    fn test_missing_keyword_file_fails_with_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let args = CliArgs::parse(["--kw".to_string(), missing.display().to_string()]).unwrap();

        let err = load_table(&args, &Settings::default()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { ref path } if *path == missing));
        assert_eq!(err.exit_code(), EXIT_LOAD_FAILURE);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_missing_settings_keyword_file_fails() {
        let args = CliArgs::parse(Vec::<String>::new()).unwrap();
        let settings = settings_with_path(Some("/nonexistent/chatguard/keywords.json"));
        let err = load_table(&args, &settings).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_kw_flag_wins_over_settings_path() {
        let file = keyword_file(r#"{"Custom": ["meet me alone"]}"#);
        let args = CliArgs::parse([
            "--kw".to_string(),
            file.path().display().to_string(),
        ])
        .unwrap();
        let settings = settings_with_path(Some("/nonexistent/chatguard/keywords.json"));

        let loaded = load_table(&args, &settings).unwrap();
        assert!(loaded.table.get("Custom").is_some());
        assert!(loaded.source.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_kw_file_merges_into_builtin() {
        let file = keyword_file(r#"{"Custom": ["meet me alone"], "Threat Terms": ["stalker"]}"#);
        let args = CliArgs::parse(["--kw".to_string(), file.path().display().to_string()]).unwrap();

        let loaded = load_table(&args, &Settings::default()).unwrap();
        let builtin = CategoryTable::builtin().unwrap();
        assert_eq!(loaded.table.len(), builtin.len() + 1);
        assert_eq!(loaded.table.phrase_count(), builtin.phrase_count() + 2);
        assert!(loaded.table.get("Requests for Personal Information").is_some());
    }

    #[test]
    fn test_replace_builtin_uses_file_alone() {
        let file = keyword_file(r#"{"Custom": ["meet me alone"]}"#);
        let args = CliArgs::parse([
            "--replace-builtin".to_string(),
            "--kw".to_string(),
            file.path().display().to_string(),
        ])
        .unwrap();
        assert!(args.replace_builtin);

        let loaded = load_table(&args, &Settings::default()).unwrap();
        assert_eq!(loaded.table.len(), 1);
        assert_eq!(loaded.table.phrase_count(), 1);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = CliArgs::parse(["--kw"]).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
