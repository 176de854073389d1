//! Synchronization driver and interval loop

use crate::diff::{compute_diff, DiffResult};
use crate::executor::{ApplyCallback, ApplyEngine, ApplyStats};
use crate::logging::Logger;
use crate::scanner::{build_snapshot, TreeWalker};
use crate::types::{PathPolicy, Root, Snapshot, SyncError};
use crate::Config;
use indicatif::HumanBytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Result of one full snapshot → diff → apply pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub diff: DiffResult,
    pub stats: ApplyStats,
    pub duration: Duration,
}

impl PassReport {
    /// Did the pass change (or, in dry-run, plan to change) anything?
    pub fn changed_anything(&self) -> bool {
        self.stats.mutations() > 0
    }
}

/// One source → replica mirroring relationship
pub struct Synchronizer {
    source: Root,
    replica: Root,
    walker: TreeWalker,
    policy: PathPolicy,
    logger: Logger,
    engine: ApplyEngine,
}

impl Synchronizer {
    /// Build a synchronizer with default walker, platform policy and
    /// four concurrent file operations.
    pub fn new(source: Root, replica: Root, logger: Logger) -> Self {
        let engine = ApplyEngine::new(source.clone(), replica.clone(), logger.clone());
        Self {
            source,
            replica,
            walker: TreeWalker::match_all(),
            policy: PathPolicy::platform(),
            logger,
            engine,
        }
    }

    /// Build from validated configuration
    pub fn from_config(config: &Config, logger: Logger) -> Result<Self, SyncError> {
        let walker = TreeWalker::new(&config.pattern, config.recursive)?;
        Ok(Self::new(config.source.clone(), config.replica.clone(), logger)
            .with_walker(walker)
            .with_policy(config.policy)
            .with_concurrency(config.threads)
            .with_dry_run(config.dry_run))
    }

    pub fn with_walker(mut self, walker: TreeWalker) -> Self {
        self.walker = walker;
        self
    }

    pub fn with_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.engine = self.engine.with_concurrency(concurrency);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.engine = self.engine.with_dry_run(dry_run);
        self
    }

    pub fn with_observer(mut self, observer: Arc<ApplyCallback>) -> Self {
        self.engine = self.engine.with_observer(observer);
        self
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Run one complete pass.
    ///
    /// Per-item failures are logged and counted in the report. An `Err` means
    /// a worker task died, which is not expected to happen.
    pub async fn run_pass(&self) -> Result<PassReport, SyncError> {
        let started = Instant::now();
        self.logger.info("Synchronization started");

        let (source, replica) = tokio::try_join!(
            self.snapshot(self.source.clone()),
            self.snapshot(self.replica.clone())
        )?;

        let diff = compute_diff(&source, &replica);
        let stats = self.engine.apply(&diff).await?;
        let duration = started.elapsed();

        self.logger.info(format!(
            "Synchronization finished in {:.2?}: {} dir(s) created, {} copied, {} updated, \
             {} deleted, {} dir(s) deleted, {} unchanged, {} failed, {} transferred",
            duration,
            stats.dirs_created,
            stats.files_copied,
            stats.files_updated,
            stats.files_deleted,
            stats.dirs_deleted,
            stats.files_unchanged,
            stats.failures,
            HumanBytes(stats.bytes_copied)
        ));

        Ok(PassReport {
            diff,
            stats,
            duration,
        })
    }

    async fn snapshot(&self, root: Root) -> Result<Snapshot, SyncError> {
        let walker = self.walker.clone();
        let policy = self.policy;
        let logger = self.logger.clone();
        let snapshot =
            tokio::task::spawn_blocking(move || build_snapshot(&root, &walker, policy, &logger))
                .await?;
        Ok(snapshot)
    }
}

/// Run passes back to back, `interval` apart, until `shutdown` turns true.
///
/// The first pass starts immediately. Shutdown is only observed between
/// passes: a pass in flight always runs to completion.
pub async fn run_loop(
    sync: &Synchronizer,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<usize, SyncError> {
    let mut passes = 0usize;

    loop {
        if *shutdown.borrow() {
            break;
        }

        sync.run_pass().await?;
        passes += 1;

        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                // A dropped sender cannot cancel any more; keep the pacing.
                if changed.is_err() {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    sync.logger().info(format!("Stopped after {} pass(es)", passes));
    Ok(passes)
}

/// Run the mirror described by `config` until interrupted.
pub async fn run(config: Config) -> Result<(), SyncError> {
    let logger = Logger::open(&config.log_file, !config.quiet)?;
    let sync = Synchronizer::from_config(&config, logger.clone())?;

    logger.info(format!(
        "treemirror {} mirroring {} -> {} every {}s{}",
        crate::VERSION,
        config.source,
        config.replica,
        config.interval.as_secs(),
        if config.dry_run { " (dry-run)" } else { "" }
    ));

    let result = if config.once {
        sync.run_pass().await.map(|_| ())
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let signal_logger = logger.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_logger.info("Shutdown requested, finishing current pass");
            let _ = shutdown_tx.send(true);
        });

        run_loop(&sync, config.interval, shutdown_rx).await.map(|_| ())
    };

    log_abort(&logger, result)
}

/// Record a fatal driver error in the log before it reaches `main`
fn log_abort<T>(logger: &Logger, result: Result<T, SyncError>) -> Result<T, SyncError> {
    if let Err(e) = &result {
        logger.error(format!("Synchronization aborted: {}", e));
    }
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
