//! Migration engine
//!
//! Orchestrates a run: computes the delta between the recorded current
//! version and the target version, then drives the up- or down-scripts
//! through the store one at a time. Execution is strictly sequential; each
//! migration's bookkeeping write completes before the next script starts,
//! and the first failure aborts the run.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{LadderError, LadderResult};
use crate::repository::MigrationRepository;
use crate::store::VersionStore;

/// The resolved action for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPlan {
    /// Target is ahead of the current version: apply up-scripts ascending
    Upgrade { current: i64, target: i64 },
    /// Target is behind the current version: apply down-scripts descending
    Downgrade { current: i64, target: i64 },
    /// Already at the target: nothing to do
    NoOp { version: i64 },
}

/// Outcome of a completed run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Version recorded before the run
    pub from_version: i64,
    /// Version recorded after the run
    pub to_version: i64,
    /// Version the run aimed for
    pub target_version: i64,
    /// Filenames executed, in execution order
    pub applied: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Applied/pending state of one available up-migration
#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: String,
    pub filename: String,
    pub applied: bool,
}

/// Drives migration runs against a [`VersionStore`]
pub struct MigrationEngine<S> {
    repository: MigrationRepository,
    store: S,
}

impl<S: VersionStore> MigrationEngine<S> {
    pub fn new(repository: MigrationRepository, store: S) -> Self {
        Self { repository, store }
    }

    pub fn repository(&self) -> &MigrationRepository {
        &self.repository
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the action for a run without executing anything.
    ///
    /// A missing target defaults to the highest available up-migration
    /// version (full upgrade). Ensures the version table exists so the
    /// current version can be read on a fresh database.
    pub async fn plan(&self, target: Option<i64>) -> LadderResult<MigrationPlan> {
        self.store.ensure_schema().await?;

        let current = self.store.current_version().await?;
        let target = match target {
            Some(t) => t,
            None => self.repository.latest_version()?,
        };
        if target < 0 {
            return Err(LadderError::Precondition(format!(
                "target version must not be negative, got {}",
                target
            )));
        }

        Ok(match target.cmp(&current) {
            Ordering::Greater => MigrationPlan::Upgrade { current, target },
            Ordering::Less => MigrationPlan::Downgrade { current, target },
            Ordering::Equal => MigrationPlan::NoOp { version: current },
        })
    }

    /// Bring the database to the target version.
    pub async fn run(&self, target: Option<i64>) -> LadderResult<RunSummary> {
        let start_time = std::time::Instant::now();
        let plan = self.plan(target).await?;
        let mut applied = Vec::new();

        let (from_version, target_version) = match plan {
            MigrationPlan::Upgrade { current, target } => {
                for file in self.repository.list_up()? {
                    if file.version <= current {
                        continue;
                    }
                    if file.version > target {
                        break;
                    }
                    tracing::info!("Applying migration: {}", file.filename());
                    let sql = file.read_sql()?;
                    self.store.apply_up(file.version, &sql).await?;
                    applied.push(file.filename());
                }
                (current, target)
            }
            MigrationPlan::Downgrade { current, target } => {
                for file in self.repository.list_down()? {
                    if file.version > current {
                        continue;
                    }
                    if file.version <= target {
                        break;
                    }
                    tracing::info!("Reverting migration: {}", file.filename());
                    let sql = file.read_sql()?;
                    self.store.revert_down(file.version, &sql).await?;
                    applied.push(file.filename());
                }
                (current, target)
            }
            MigrationPlan::NoOp { version } => {
                tracing::info!("Already at version {}, nothing to do", version);
                (version, version)
            }
        };

        let to_version = self.store.current_version().await?;
        if to_version != target_version {
            tracing::warn!(
                "Run finished at version {} but the target was {}; check for gaps in the migration files",
                to_version,
                target_version
            );
        }

        Ok(RunSummary {
            from_version,
            to_version,
            target_version,
            applied,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Applied/pending state of every available up-migration.
    pub async fn status(&self) -> LadderResult<Vec<MigrationStatus>> {
        self.store.ensure_schema().await?;
        let current = self.store.current_version().await?;

        Ok(self
            .repository
            .list_up()?
            .into_iter()
            .map(|file| MigrationStatus {
                version: file.version,
                name: file.name.clone(),
                filename: file.filename(),
                applied: file.version <= current,
            })
            .collect())
    }
}
