use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Per-entity time series from the Italian civil-protection COVID-19 datasets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "covid-series",
    about = "Per-entity time series from the Italian civil-protection COVID-19 datasets",
    version
)]
pub struct Settings {
    /// Local checkout of the published dataset repository
    #[arg(long, env = "COVID_SERIES_DATA")]
    pub data_path: Option<PathBuf>,

    /// Report to print
    #[arg(long, default_value = "leaderboard", value_parser = ["leaderboard", "series", "provinces", "notes"])]
    pub view: String,

    /// Dataset granularity
    #[arg(long, default_value = "region", value_parser = ["nation", "region", "province"])]
    pub granularity: String,

    /// Region or province name (or numeric code) for series / provinces / notes views
    #[arg(long)]
    pub entity: Option<String>,

    /// Metric to rank or plot (published key or snake_case name)
    #[arg(long, default_value = "totale_casi")]
    pub metric: String,

    /// Number of entities in the leaderboard
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=200))]
    pub top: u32,

    /// First day (YYYY-MM-DD) to include in a series
    #[arg(long)]
    pub since: Option<String>,

    /// Keep running and reprint the report every refresh
    #[arg(long)]
    pub watch: bool,

    /// Refresh rate in seconds for --watch (10-86400)
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u32).range(10..=86400))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.covid-series/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.covid-series/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".covid-series").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. `entity` and `since` are per-invocation and never
        // persisted.
        if !is_arg_explicitly_set(&matches, "data_path") && settings.data_path.is_none() {
            settings.data_path = last.data_path;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "granularity") {
            if let Some(v) = last.granularity {
                settings.granularity = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "metric") {
            if let Some(v) = last.metric {
                settings.metric = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top") {
            if let Some(v) = last.top {
                settings.top = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "could not persist last-used settings");
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_path: s.data_path.clone(),
            view: Some(s.view.clone()),
            granularity: Some(s.granularity.clone()),
            metric: Some(s.metric.clone()),
            top: Some(s.top),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
