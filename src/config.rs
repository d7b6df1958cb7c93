use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

const LOG_FILE_NAME: &str = "sttlayout.log";
const MIN_TICK_MS: u64 = 16;

pub struct Config {
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub tick_rate: Duration,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            output_dir: cli.output_dir.clone(),
            log_file: cli.log_file.clone().unwrap_or_else(Self::default_log_path),
            tick_rate: Duration::from_millis(cli.tick_ms.max(MIN_TICK_MS)),
        }
    }

    fn default_log_path() -> PathBuf {
        // Store next to the executable
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join(LOG_FILE_NAME);
            }
        }
        PathBuf::from(LOG_FILE_NAME)
    }

    /// Log locations in order of preference: the configured file, then the
    /// working directory.
    pub fn log_candidates(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.log_file.clone()];
        let fallback = PathBuf::from(LOG_FILE_NAME);
        if self.log_file != fallback {
            paths.push(fallback);
        }
        paths
    }
}

/// Opens the first candidate that can be appended to.
pub fn open_log_file(candidates: impl IntoIterator<Item = PathBuf>) -> Option<(File, PathBuf)> {
    candidates.into_iter().find_map(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
            .map(|file| (file, path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["sttlayout"]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.tick_rate, Duration::from_millis(250));
        assert!(config.log_file.ends_with(LOG_FILE_NAME));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_log_falls_back_past_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/x.log");
        let usable = dir.path().join("fallback.log");

        let (_, path) = open_log_file([missing.clone(), usable.clone()]).unwrap();
        assert_eq!(path, usable);
        assert!(usable.exists());
        assert!(open_log_file([missing.clone()]).is_none());

        let cli = Cli::parse_from(["sttlayout", "--log-file", missing.to_str().unwrap()]);
        let candidates = Config::from_cli(&cli).log_candidates();
        assert_eq!(candidates, vec![missing, PathBuf::from(LOG_FILE_NAME)]);
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::parse_from([
            "sttlayout",
            "--output-dir",
            "/tmp/stt",
            "--tick-ms",
            "1",
            "--log-file",
            "/tmp/x.log",
            "edit",
            "line3.stt",
        ]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/stt"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/x.log"));
        assert_eq!(config.tick_rate, Duration::from_millis(MIN_TICK_MS));
        assert!(matches!(
            cli.command,
            Some(crate::cli::Commands::Edit { file: Some(_) })
        ));
    }
}
