//! Migration file discovery
//!
//! Scans a directory of `<version>_<description>.<up|down>.sql` scripts and
//! hands the engine ordered sequences of [`MigrationFile`]s. Files are
//! discovered fresh at the start of every run and never persisted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{LadderError, LadderResult};
use crate::version::{classify, description_of, parse_version, Direction};

/// A migration script discovered on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Numeric version parsed from the filename prefix
    pub version: i64,
    /// Up or down script
    pub direction: Direction,
    /// Description part of the filename (after the version prefix)
    pub name: String,
    /// Location of the script content
    pub path: PathBuf,
}

impl MigrationFile {
    /// Filename of the script
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Load the script content from disk
    pub fn read_sql(&self) -> LadderResult<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

/// Lists available migration scripts, grouped by direction and sorted by
/// numeric version
pub struct MigrationRepository {
    dir: PathBuf,
}

impl MigrationRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The migration directory this repository reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Up-migrations sorted ascending by version
    pub fn list_up(&self) -> LadderResult<Vec<MigrationFile>> {
        let mut files = self.scan(Direction::Up)?;
        files.sort_by_key(|f| f.version);
        Ok(files)
    }

    /// Down-migrations sorted descending by version
    pub fn list_down(&self) -> LadderResult<Vec<MigrationFile>> {
        let mut files = self.scan(Direction::Down)?;
        files.sort_by_key(|f| std::cmp::Reverse(f.version));
        Ok(files)
    }

    /// Highest version among available up-migrations. The run cannot
    /// proceed without a target, so an empty directory is fatal.
    pub fn latest_version(&self) -> LadderResult<i64> {
        let files = self.list_up()?;
        files
            .last()
            .map(|f| f.version)
            .ok_or_else(|| {
                LadderError::Precondition(format!(
                    "no up-migrations found in {}",
                    self.dir.display()
                ))
            })
    }

    fn scan(&self, direction: Direction) -> LadderResult<Vec<MigrationFile>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            LadderError::Precondition(format!(
                "cannot read migration directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let filename = match path.file_name().and_then(|f| f.to_str()) {
                Some(f) => f.to_string(),
                None => continue,
            };

            let (stem, dir) = match classify(&filename) {
                Some(parts) => parts,
                None => {
                    tracing::debug!("Skipping non-migration file: {}", filename);
                    continue;
                }
            };
            if dir != direction {
                continue;
            }

            let version = parse_version(stem)?;
            files.push(MigrationFile {
                version,
                direction: dir,
                name: description_of(stem).to_string(),
                path,
            });
        }

        Ok(files)
    }

    /// Create a new up/down migration pair with the next sequential version.
    ///
    /// Returns the two filenames that were written. The version is the
    /// highest existing up-migration plus one (1 for an empty directory),
    /// zero-padded to four digits.
    pub fn create_migration(&self, name: &str) -> LadderResult<(String, String)> {
        fs::create_dir_all(&self.dir)?;

        let next = match self.list_up()?.last() {
            Some(f) => f.version + 1,
            None => 1,
        };

        let slug = name.trim().replace(' ', "_").to_lowercase();
        if slug.is_empty() {
            return Err(LadderError::Precondition(
                "migration name must not be empty".to_string(),
            ));
        }

        let created = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let up_name = format!("{:04}_{}.up.sql", next, slug);
        let down_name = format!("{:04}_{}.down.sql", next, slug);

        let up_template = format!(
            "-- Migration: {} (version {})\n-- Created: {}\n\n",
            slug, next, created
        );
        let down_template = format!(
            "-- Revert: {} (version {})\n-- Created: {}\n\n",
            slug, next, created
        );

        fs::write(self.dir.join(&up_name), up_template)?;
        fs::write(self.dir.join(&down_name), down_template)?;

        Ok((up_name, down_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_migration(dir: &Path, name: &str, sql: &str) {
        fs::write(dir.join(name), sql).unwrap();
    }

    #[test]
    fn lists_up_migrations_ascending() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0002_b.up.sql", "CREATE TABLE b;");
        write_migration(temp.path(), "0001_a.up.sql", "CREATE TABLE a;");
        write_migration(temp.path(), "0003_c.up.sql", "CREATE TABLE c;");

        let repo = MigrationRepository::new(temp.path());
        let ups = repo.list_up().unwrap();
        let versions: Vec<i64> = ups.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(ups[0].name, "a");
    }

    #[test]
    fn lists_down_migrations_descending() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0001_a.down.sql", "DROP TABLE a;");
        write_migration(temp.path(), "0002_b.down.sql", "DROP TABLE b;");

        let repo = MigrationRepository::new(temp.path());
        let downs = repo.list_down().unwrap();
        let versions: Vec<i64> = downs.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![2, 1]);
    }

    #[test]
    fn sorts_numerically_not_lexicographically() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "2_second.up.sql", "");
        write_migration(temp.path(), "0010_tenth.up.sql", "");
        write_migration(temp.path(), "001_first.up.sql", "");

        let repo = MigrationRepository::new(temp.path());
        let versions: Vec<i64> = repo.list_up().unwrap().iter().map(|f| f.version).collect();
        // Lexicographic order would give [1, 10, 2]
        assert_eq!(versions, vec![1, 2, 10]);
    }

    #[test]
    fn latest_version_is_max_up_version() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0001_a.up.sql", "");
        write_migration(temp.path(), "0007_g.up.sql", "");
        write_migration(temp.path(), "0009_i.down.sql", "");

        let repo = MigrationRepository::new(temp.path());
        assert_eq!(repo.latest_version().unwrap(), 7);
    }

    #[test]
    fn empty_directory_is_fatal_for_latest_version() {
        let temp = TempDir::new().unwrap();
        let repo = MigrationRepository::new(temp.path());
        assert!(matches!(
            repo.latest_version(),
            Err(LadderError::Precondition(_))
        ));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let repo = MigrationRepository::new("/nonexistent/migrations");
        assert!(matches!(repo.list_up(), Err(LadderError::Precondition(_))));
    }

    #[test]
    fn ignores_unrelated_files() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0001_a.up.sql", "");
        write_migration(temp.path(), "README.md", "docs");
        write_migration(temp.path(), "schema.sql", "");

        let repo = MigrationRepository::new(temp.path());
        assert_eq!(repo.list_up().unwrap().len(), 1);
    }

    #[test]
    fn malformed_prefix_is_fatal() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "first_one.up.sql", "");

        let repo = MigrationRepository::new(temp.path());
        assert!(matches!(repo.list_up(), Err(LadderError::Precondition(_))));
    }

    #[test]
    fn reads_script_content() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0001_a.up.sql", "CREATE TABLE a (id INT);");

        let repo = MigrationRepository::new(temp.path());
        let file = repo.list_up().unwrap().remove(0);
        assert_eq!(file.read_sql().unwrap(), "CREATE TABLE a (id INT);");
        assert_eq!(file.filename(), "0001_a.up.sql");
    }

    #[test]
    fn scaffolds_sequential_migration_pair() {
        let temp = TempDir::new().unwrap();
        write_migration(temp.path(), "0003_c.up.sql", "");

        let repo = MigrationRepository::new(temp.path());
        let (up, down) = repo.create_migration("add users table").unwrap();
        assert_eq!(up, "0004_add_users_table.up.sql");
        assert_eq!(down, "0004_add_users_table.down.sql");

        let content = fs::read_to_string(temp.path().join(&up)).unwrap();
        assert!(content.contains("add_users_table"));
        assert!(content.contains("version 4"));
    }

    #[test]
    fn scaffolds_version_one_in_empty_directory() {
        let temp = TempDir::new().unwrap();
        let repo = MigrationRepository::new(temp.path().join("migrations"));
        let (up, _) = repo.create_migration("init").unwrap();
        assert_eq!(up, "0001_init.up.sql");
    }
}
