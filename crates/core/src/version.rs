//! Filename codec for versioned migration scripts
//!
//! Migration files are named `<version>_<description>.<up|down>.sql`, e.g.
//! `0001_create_users.up.sql`. The version prefix is compared numerically,
//! never as a string, so padding widths may differ between files.

use serde::{Deserialize, Serialize};

use crate::error::{LadderError, LadderResult};

/// Direction of a migration script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Advances the schema to a higher version
    Up,
    /// Reverts the schema to the prior version
    Down,
}

impl Direction {
    /// Filename suffix for this direction (`up` / `down`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Parse the numeric version prefix of a migration filename.
///
/// The prefix runs up to the first underscore; leading zeros are stripped
/// (`"0007_init.up.sql"` -> 7). A missing or non-numeric prefix is a fatal
/// precondition error: callers are expected to guarantee well-formed names.
pub fn parse_version(filename: &str) -> LadderResult<i64> {
    let prefix = filename.split('_').next().unwrap_or("");
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(LadderError::Precondition(format!(
            "migration filename '{}' has no numeric version prefix",
            filename
        )));
    }
    prefix.parse::<i64>().map_err(|e| {
        LadderError::Precondition(format!(
            "migration filename '{}' has an invalid version prefix: {}",
            filename, e
        ))
    })
}

/// Classify a filename into a direction by its `.up.sql` / `.down.sql`
/// suffix. Returns `None` for files that are not migration scripts.
pub fn classify(filename: &str) -> Option<(&str, Direction)> {
    if let Some(stem) = filename.strip_suffix(".up.sql") {
        Some((stem, Direction::Up))
    } else {
        filename
            .strip_suffix(".down.sql")
            .map(|stem| (stem, Direction::Down))
    }
}

/// Description part of a classified stem: everything after the first `_`.
pub fn description_of(stem: &str) -> &str {
    match stem.split_once('_') {
        Some((_, rest)) => rest,
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zero_padded_prefix() {
        assert_eq!(parse_version("0007_init.up.sql").unwrap(), 7);
        assert_eq!(parse_version("0001_create_users.up.sql").unwrap(), 1);
        assert_eq!(parse_version("0042_add_index.down.sql").unwrap(), 42);
    }

    #[test]
    fn parses_unpadded_prefix() {
        assert_eq!(parse_version("2_second.up.sql").unwrap(), 2);
        assert_eq!(parse_version("10_tenth.up.sql").unwrap(), 10);
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(parse_version("create_users.up.sql").is_err());
        assert!(parse_version("_underscore_first.up.sql").is_err());
        assert!(parse_version("v1_tagged.up.sql").is_err());
    }

    #[test]
    fn classifies_direction_suffix() {
        let (stem, dir) = classify("0001_create_users.up.sql").unwrap();
        assert_eq!(stem, "0001_create_users");
        assert_eq!(dir, Direction::Up);

        let (stem, dir) = classify("0001_create_users.down.sql").unwrap();
        assert_eq!(stem, "0001_create_users");
        assert_eq!(dir, Direction::Down);
    }

    #[test]
    fn ignores_non_migration_files() {
        assert!(classify("README.md").is_none());
        assert!(classify("0001_create_users.sql").is_none());
        assert!(classify("notes.txt").is_none());
    }

    #[test]
    fn extracts_description() {
        assert_eq!(description_of("0001_create_users"), "create_users");
        assert_eq!(description_of("0001"), "0001");
    }
}
