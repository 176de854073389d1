//! Configuration management

use crate::types::{PathPolicy, Root, SyncError};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of concurrent file operations
const DEFAULT_THREADS: usize = 4;

/// Command-line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "treemirror",
    version,
    about = "Mirror a source directory onto a replica on a fixed interval"
)]
pub struct Cli {
    /// Seconds between synchronization passes (at least 1)
    pub interval: Option<u64>,

    /// Directory to mirror from
    pub source: Option<PathBuf>,

    /// Directory to mirror onto
    pub replica: Option<PathBuf>,

    /// Append-only log file
    pub log_file: Option<PathBuf>,

    /// TOML file providing defaults for any of these settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only mirror files whose name matches this glob
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Only mirror the top level of the source
    #[arg(long)]
    pub no_recursive: bool,

    /// Maximum concurrent file operations
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Path comparison policy (defaults to the platform's)
    #[arg(long, value_enum)]
    pub case: Option<PathPolicy>,

    /// Log the operations without changing the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Write to the log file only
    #[arg(short, long)]
    pub quiet: bool,
}

/// Settings read from a `--config` TOML file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub interval: Option<u64>,
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub pattern: Option<String>,
    pub recursive: Option<bool>,
    pub threads: Option<usize>,
    pub case: Option<PathPolicy>,
    pub dry_run: Option<bool>,
}

impl FileConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            SyncError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Validated configuration for treemirror
#[derive(Debug, Clone)]
pub struct Config {
    /// Time between the end of one pass and the start of the next
    pub interval: Duration,

    /// Canonical source root
    pub source: Root,

    /// Canonical replica root
    pub replica: Root,

    /// Log file (parent created on open)
    pub log_file: PathBuf,

    /// File-name glob handed to the walker
    pub pattern: String,

    /// Walk below the top level?
    pub recursive: bool,

    /// Concurrent file operations
    pub threads: usize,

    /// Path comparison policy for both snapshots
    pub policy: PathPolicy,

    /// Log only, no replica changes
    pub dry_run: bool,

    /// Single pass, then exit
    pub once: bool,

    /// Suppress console echo
    pub quiet: bool,
}

impl Config {
    /// Minimal configuration around two existing roots
    pub fn new(
        interval: Duration,
        source: Root,
        replica: Root,
        log_file: PathBuf,
    ) -> Result<Self, SyncError> {
        let config = Self {
            interval,
            source,
            replica,
            log_file,
            pattern: "*".to_string(),
            recursive: true,
            threads: DEFAULT_THREADS,
            policy: PathPolicy::platform(),
            dry_run: false,
            once: false,
            quiet: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate relationships between settings
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.interval < Duration::from_secs(1) {
            return Err(SyncError::Config(
                "Synchronization interval must be at least 1 second".to_string(),
            ));
        }

        if self.source == self.replica {
            return Err(SyncError::Config(
                "Source and replica cannot be the same directory".to_string(),
            ));
        }

        if self.replica.contains(self.source.path()) || self.source.contains(self.replica.path()) {
            return Err(SyncError::Config(format!(
                "Source and replica must not be nested: {} / {}",
                self.source, self.replica
            )));
        }

        // The log would be deleted as extraneous on every pass
        let log_file = absolutize(&self.log_file);
        if self.replica.contains(&log_file) {
            return Err(SyncError::Config(format!(
                "Log file must not live inside the replica: {}",
                self.log_file.display()
            )));
        }

        if self.threads == 0 {
            return Err(SyncError::Config("Thread count must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let interval = cli
            .interval
            .or(file.interval)
            .ok_or_else(|| missing("interval"))?;
        if interval < 1 {
            return Err(SyncError::Config(
                "Synchronization interval must be at least 1 second".to_string(),
            ));
        }

        let source = Root::resolve(cli.source.or(file.source).ok_or_else(|| missing("source"))?)?;
        let replica =
            Root::resolve(cli.replica.or(file.replica).ok_or_else(|| missing("replica"))?)?;
        let log_file = cli
            .log_file
            .or(file.log_file)
            .ok_or_else(|| missing("log file"))?;

        let config = Config {
            interval: Duration::from_secs(interval),
            source,
            replica,
            log_file,
            pattern: cli.pattern.or(file.pattern).unwrap_or_else(|| "*".to_string()),
            recursive: !cli.no_recursive && file.recursive.unwrap_or(true),
            threads: cli.threads.or(file.threads).unwrap_or(DEFAULT_THREADS),
            policy: cli.case.or(file.case).unwrap_or_else(PathPolicy::platform),
            dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
            once: cli.once,
            quiet: cli.quiet,
        };

        config.validate()?;
        Ok(config)
    }
}

fn missing(what: &str) -> SyncError {
    SyncError::Config(format!("Missing required setting: {}", what))
}

/// Best-effort absolute form of a path that may not exist yet
fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            absolutize(parent).join(name)
        }
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Dirs {
        src: TempDir,
        dst: TempDir,
        logs: TempDir,
    }

    fn dirs() -> Dirs {
        Dirs {
            src: TempDir::new().expect("create src"),
            dst: TempDir::new().expect("create dst"),
            logs: TempDir::new().expect("create logs"),
        }
    }

    fn cli_for(d: &Dirs, interval: u64) -> Cli {
        Cli {
            interval: Some(interval),
            source: Some(d.src.path().to_path_buf()),
            replica: Some(d.dst.path().to_path_buf()),
            log_file: Some(d.logs.path().join("sync.log")),
            ..Cli::default()
        }
    }

    #[test]
    fn test_parse_positional_arguments() {
        let cli = Cli::try_parse_from(["treemirror", "10", "/src", "/dst", "/tmp/log.txt"])
            .expect("parse");
        assert_eq!(cli.interval, Some(10));
        assert_eq!(cli.source, Some(PathBuf::from("/src")));
        assert_eq!(cli.replica, Some(PathBuf::from("/dst")));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/log.txt")));
        assert!(!cli.once);
    }

    #[test]
    fn test_parse_rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["treemirror", "soon", "/src", "/dst", "/log"]).is_err());
    }

    #[test]
    fn test_parse_options() {
        let cli = Cli::try_parse_from([
            "treemirror",
            "--pattern",
            "*.txt",
            "--threads",
            "8",
            "--case",
            "insensitive",
            "--dry-run",
            "--once",
            "--no-recursive",
            "-q",
        ])
        .expect("parse");
        assert_eq!(cli.pattern.as_deref(), Some("*.txt"));
        assert_eq!(cli.threads, Some(8));
        assert_eq!(cli.case, Some(PathPolicy::Insensitive));
        assert!(cli.dry_run && cli.once && cli.no_recursive && cli.quiet);
    }

    #[test]
    fn test_valid_config() {
        let d = dirs();
        let config = Config::try_from(cli_for(&d, 5)).expect("valid config");

        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.source.path().is_absolute());
        assert_eq!(config.pattern, "*");
        assert!(config.recursive);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.policy, PathPolicy::platform());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let d = dirs();
        let err = Config::try_from(cli_for(&d, 0)).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_missing_source_rejected() {
        let d = dirs();
        let mut cli = cli_for(&d, 5);
        cli.source = Some(d.src.path().join("does-not-exist"));
        assert!(Config::try_from(cli).unwrap_err().is_config_error());
    }

    #[test]
    fn test_missing_argument_rejected() {
        let d = dirs();
        let mut cli = cli_for(&d, 5);
        cli.log_file = None;
        let err = Config::try_from(cli).unwrap_err();
        assert!(err.to_string().contains("log file"));
    }

    #[test]
    fn test_same_root_rejected() {
        let d = dirs();
        let mut cli = cli_for(&d, 5);
        cli.replica = cli.source.clone();
        assert!(Config::try_from(cli).unwrap_err().is_config_error());
    }

    #[test]
    fn test_nested_roots_rejected() {
        let d = dirs();
        let inner = d.src.path().join("replica");
        fs::create_dir(&inner).unwrap();
        let mut cli = cli_for(&d, 5);
        cli.replica = Some(inner);

        let err = Config::try_from(cli).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_log_inside_replica_rejected() {
        let d = dirs();
        let mut cli = cli_for(&d, 5);
        cli.log_file = Some(d.dst.path().join("logs/sync.log"));

        let err = Config::try_from(cli).unwrap_err();
        assert!(err.to_string().contains("Log file"));
    }

    #[test]
    fn test_config_file_supplies_defaults() {
        let d = dirs();
        let toml_path = d.logs.path().join("mirror.toml");
        fs::write(
            &toml_path,
            format!(
                "interval = 30\nsource = {:?}\nreplica = {:?}\nlog_file = {:?}\n\
                 pattern = \"*.md\"\nthreads = 2\ncase = \"insensitive\"\nrecursive = false\n",
                d.src.path(),
                d.dst.path(),
                d.logs.path().join("file.log")
            ),
        )
        .unwrap();

        let cli = Cli {
            config: Some(toml_path),
            threads: Some(6),
            ..Cli::default()
        };
        let config = Config::try_from(cli).expect("config from file");

        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.pattern, "*.md");
        assert_eq!(config.threads, 6); // command line wins
        assert_eq!(config.policy, PathPolicy::Insensitive);
        assert!(!config.recursive);
        assert_eq!(config.log_file, d.logs.path().join("file.log"));
    }

    #[test]
    fn test_config_file_unknown_key_rejected() {
        let d = dirs();
        let toml_path = d.logs.path().join("bad.toml");
        fs::write(&toml_path, "intervall = 3\n").unwrap();

        let err = FileConfig::load(&toml_path).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_config_new_validates() {
        let d = dirs();
        let src = Root::resolve(d.src.path()).unwrap();
        let dst = Root::resolve(d.dst.path()).unwrap();

        assert!(Config::new(
            Duration::from_millis(10),
            src.clone(),
            dst.clone(),
            d.logs.path().join("a.log")
        )
        .is_err());
        assert!(Config::new(Duration::from_secs(1), src, dst, d.logs.path().join("a.log")).is_ok());
    }
}
