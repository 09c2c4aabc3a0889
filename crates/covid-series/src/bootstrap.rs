use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.covid-series/` and `~/.covid-series/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let app_dir = home.join(".covid-series");
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to an [`EnvFilter`] directive. Unknown names pass
/// through unchanged so full directives like `covid_data=debug` work.
fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" | "CRITICAL" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to stderr, and additionally to `log_file` (without ANSI colours)
/// when one is given.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate a local checkout of the published datasets.
///
/// Checks, in order, and returns the first that exists:
/// 1. `~/.covid-series/COVID-19/`
/// 2. `~/COVID-19/`
pub fn discover_data_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let candidates = [
        home.join(".covid-series").join("COVID-19"),
        home.join("COVID-19"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Run `f` with `HOME` pointed at `home`, restoring it afterwards.
    fn with_home<T>(home: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", home);
        let result = f();
        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }
        result
    }

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("critical"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("covid_data=trace"), "covid_data=trace");
    }

    // Everything that touches HOME runs in one test; the test harness is
    // multi-threaded and HOME is process-wide.
    #[test]
    fn test_home_relative_paths() {
        let tmp = TempDir::new().expect("tempdir");

        with_home(tmp.path(), ensure_directories).expect("ensure_directories");
        let app_dir = tmp.path().join(".covid-series");
        assert!(app_dir.is_dir());
        assert!(app_dir.join("logs").is_dir());

        assert!(with_home(tmp.path(), discover_data_path).is_none());

        let fallback = tmp.path().join("COVID-19");
        std::fs::create_dir_all(&fallback).unwrap();
        assert_eq!(with_home(tmp.path(), discover_data_path), Some(fallback));

        let preferred = app_dir.join("COVID-19");
        std::fs::create_dir_all(&preferred).unwrap();
        assert_eq!(with_home(tmp.path(), discover_data_path), Some(preferred));
    }
}
