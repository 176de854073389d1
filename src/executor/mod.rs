//! Apply engine: executes a diff against the replica
//!
//! Phases run in a fixed order, each completing before the next starts:
//! create directories (shallowest first), copy new files, update changed
//! files, delete stale files, delete directories (deepest first). File
//! phases run on blocking tasks with bounded concurrency; directory phases
//! run strictly one item at a time.
//!
//! Every item is isolated: a failure is logged with its operation and
//! relative path and the remaining items still run.

pub mod copy;

use crate::diff::{
    detect_change, sort_deepest_first, sort_shallowest_first, ChangeCheck, DiffResult,
};
use crate::logging::Logger;
use crate::types::{Operation, Root, SyncError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub use copy::{copy_file_atomic, copy_mtime};

/// Counters for one apply run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub dirs_created: usize,
    pub files_copied: usize,
    pub files_updated: usize,
    /// Content matched, only the replica timestamp was realigned
    pub timestamps_refreshed: usize,
    /// Update candidates left alone (unchanged or vanished)
    pub files_unchanged: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    /// Items whose operation failed (logged, not raised)
    pub failures: usize,
    /// Update candidates that needed the strong check
    pub files_hashed: usize,
    pub bytes_copied: u64,
}

impl ApplyStats {
    /// Number of replica mutations performed (or planned, in dry-run)
    pub fn mutations(&self) -> usize {
        self.dirs_created
            + self.files_copied
            + self.files_updated
            + self.timestamps_refreshed
            + self.files_deleted
            + self.dirs_deleted
    }

    fn record(&mut self, op: Operation, outcome: &ItemOutcome) {
        match *outcome {
            ItemOutcome::Applied { bytes, hashed } => {
                self.bytes_copied += bytes;
                if hashed {
                    self.files_hashed += 1;
                }
                match op {
                    Operation::CreateDirectory => self.dirs_created += 1,
                    Operation::CopyFile => self.files_copied += 1,
                    Operation::UpdateFile => self.files_updated += 1,
                    Operation::DeleteFile => self.files_deleted += 1,
                    Operation::DeleteDirectory => self.dirs_deleted += 1,
                }
            }
            ItemOutcome::TimestampRefreshed => {
                self.files_hashed += 1;
                self.timestamps_refreshed += 1;
            }
            ItemOutcome::Unchanged { hashed } => {
                if hashed {
                    self.files_hashed += 1;
                }
                self.files_unchanged += 1;
            }
            ItemOutcome::Failed => self.failures += 1,
        }
    }
}

/// Per-item notification delivered to an observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyEvent {
    /// Operation performed (or, in dry-run, planned)
    Applied { op: Operation, path: PathBuf },
    /// Content matched; only the timestamp was aligned
    TimestampRefreshed { path: PathBuf },
    /// Nothing to do for this item
    Unchanged { op: Operation, path: PathBuf },
    /// Operation failed; processing continued
    Failed {
        op: Operation,
        path: PathBuf,
        error: String,
    },
}

/// Observer callback used to receive apply events.
pub type ApplyCallback = dyn Fn(&ApplyEvent) + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Applied { bytes: u64, hashed: bool },
    TimestampRefreshed,
    Unchanged { hashed: bool },
    Failed,
}

/// Executes diff results against one source/replica pair
#[derive(Clone)]
pub struct ApplyEngine {
    source: Root,
    replica: Root,
    logger: Logger,
    concurrency: usize,
    dry_run: bool,
    observer: Option<Arc<ApplyCallback>>,
}

impl ApplyEngine {
    pub fn new(source: Root, replica: Root, logger: Logger) -> Self {
        Self {
            source,
            replica,
            logger,
            concurrency: 4,
            dry_run: false,
            observer: None,
        }
    }

    /// Maximum number of file operations in flight (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Log what would happen without touching the replica
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_observer(mut self, observer: Arc<ApplyCallback>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Apply all five phases of `diff`.
    ///
    /// Per-item failures are logged and counted, never returned. The only
    /// error is a worker task that panicked or was cancelled.
    pub async fn apply(&self, diff: &DiffResult) -> Result<ApplyStats, SyncError> {
        let mut stats = ApplyStats::default();

        let mut dirs_to_create = diff.dirs_to_create.clone();
        sort_shallowest_first(&mut dirs_to_create);
        self.run_ordered(Operation::CreateDirectory, dirs_to_create, &mut stats)
            .await?;

        self.run_bounded(Operation::CopyFile, diff.files_to_copy.clone(), &mut stats)
            .await?;
        self.run_bounded(Operation::UpdateFile, diff.files_to_check.clone(), &mut stats)
            .await?;
        self.run_bounded(Operation::DeleteFile, diff.files_to_delete.clone(), &mut stats)
            .await?;

        let mut dirs_to_delete = diff.dirs_to_delete.clone();
        sort_deepest_first(&mut dirs_to_delete);
        self.run_ordered(Operation::DeleteDirectory, dirs_to_delete, &mut stats)
            .await?;

        Ok(stats)
    }

    /// Run items one after another, in the given order, on one blocking task
    async fn run_ordered(
        &self,
        op: Operation,
        paths: Vec<PathBuf>,
        stats: &mut ApplyStats,
    ) -> Result<(), SyncError> {
        if paths.is_empty() {
            return Ok(());
        }

        let engine = self.clone();
        let outcomes = tokio::task::spawn_blocking(move || {
            paths
                .iter()
                .map(|path| engine.run_item(op, path))
                .collect::<Vec<_>>()
        })
        .await?;

        for outcome in &outcomes {
            stats.record(op, outcome);
        }
        Ok(())
    }

    /// Run items concurrently, at most `concurrency` at a time, and wait for all
    async fn run_bounded(
        &self,
        op: Operation,
        paths: Vec<PathBuf>,
        stats: &mut ApplyStats,
    ) -> Result<(), SyncError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for path in paths {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| SyncError::Task(e.to_string()))?;
            let engine = self.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                engine.run_item(op, &path)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            stats.record(op, &joined?);
        }
        Ok(())
    }

    /// Execute one item, converting failure into a log line and an event
    fn run_item(&self, op: Operation, relative: &Path) -> ItemOutcome {
        match self.execute(op, relative) {
            Ok(outcome) => {
                let event = match outcome {
                    ItemOutcome::Applied { .. } => ApplyEvent::Applied {
                        op,
                        path: relative.to_path_buf(),
                    },
                    ItemOutcome::TimestampRefreshed => ApplyEvent::TimestampRefreshed {
                        path: relative.to_path_buf(),
                    },
                    _ => ApplyEvent::Unchanged {
                        op,
                        path: relative.to_path_buf(),
                    },
                };
                self.emit(&event);
                outcome
            }
            Err(err) => {
                self.logger
                    .error(format!("{}: {}. {}", op, relative.display(), err));
                self.emit(&ApplyEvent::Failed {
                    op,
                    path: relative.to_path_buf(),
                    error: err.to_string(),
                });
                ItemOutcome::Failed
            }
        }
    }

    fn execute(&self, op: Operation, relative: &Path) -> Result<ItemOutcome, SyncError> {
        let src = self.source.join(relative);
        let dst = self.replica.join(relative);

        match op {
            Operation::CreateDirectory => {
                if !self.dry_run {
                    fs::create_dir_all(&dst).map_err(|e| SyncError::operation(op, &dst, e))?;
                }
                self.note(format!("Directory created: {}", dst.display()));
                Ok(ItemOutcome::Applied {
                    bytes: 0,
                    hashed: false,
                })
            }
            Operation::CopyFile => {
                let bytes = if self.dry_run {
                    fs::metadata(&src).map(|m| m.len()).unwrap_or(0)
                } else {
                    copy_file_atomic(&src, &dst)?
                };
                self.note(format!("File copied: {} -> {}", src.display(), dst.display()));
                Ok(ItemOutcome::Applied {
                    bytes,
                    hashed: false,
                })
            }
            Operation::UpdateFile => self.update(&src, &dst),
            Operation::DeleteFile => {
                if self.dry_run {
                    if !dst.exists() {
                        return Ok(ItemOutcome::Unchanged { hashed: false });
                    }
                } else {
                    match fs::remove_file(&dst) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {
                            return Ok(ItemOutcome::Unchanged { hashed: false })
                        }
                        Err(e) => return Err(SyncError::operation(op, &dst, e)),
                    }
                }
                self.note(format!("File removed: {}", dst.display()));
                Ok(ItemOutcome::Applied {
                    bytes: 0,
                    hashed: false,
                })
            }
            Operation::DeleteDirectory => {
                if self.dry_run {
                    if !dst.exists() {
                        return Ok(ItemOutcome::Unchanged { hashed: false });
                    }
                } else {
                    // Non-recursive: a directory that still has content fails
                    match fs::remove_dir(&dst) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {
                            return Ok(ItemOutcome::Unchanged { hashed: false })
                        }
                        Err(e) => return Err(SyncError::operation(op, &dst, e)),
                    }
                }
                self.note(format!("Directory deleted: {}", dst.display()));
                Ok(ItemOutcome::Applied {
                    bytes: 0,
                    hashed: false,
                })
            }
        }
    }

    fn update(&self, src: &Path, dst: &Path) -> Result<ItemOutcome, SyncError> {
        let check = detect_change(src, dst)?;
        let hashed = check.was_hashed();

        if check.needs_copy() {
            let bytes = if self.dry_run {
                0
            } else {
                // Also stamps the source's timestamp on the replica
                copy_file_atomic(src, dst)?
            };
            self.note(format!("File updated: {} -> {}", src.display(), dst.display()));
            return Ok(ItemOutcome::Applied { bytes, hashed });
        }

        if check == ChangeCheck::ContentMatches {
            if !self.dry_run {
                copy_mtime(src, dst)?;
            }
            self.note(format!("Timestamp refreshed: {}", dst.display()));
            return Ok(ItemOutcome::TimestampRefreshed);
        }

        Ok(ItemOutcome::Unchanged { hashed })
    }

    fn note(&self, message: String) {
        if self.dry_run {
            self.logger.info(format!("[dry-run] {}", message));
        } else {
            self.logger.info(message);
        }
    }

    fn emit(&self, event: &ApplyEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}
