//! Versioned schema migrations
//!
//! Migration files live in a flat directory and are named
//! `<version>_<name>.sql`, where `<version>` has at least three digits.
//! Files are applied in ascending numeric version order, each at most once;
//! the `schema_migrations` ledger records what has been applied.

use super::{Database, SqlValue, StorageError};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static MIGRATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3,})_.+\.sql$").expect("migration filename pattern is valid")
});

/// SQL to create the migration ledger
pub const CREATE_LEDGER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TEXT NOT NULL
)
"#;

/// A migration file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: i64,
    pub name: String,
    pub path: PathBuf,
}

/// A row of the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Extract the version from a migration filename, `None` if it doesn't match.
///
/// A name that matches but whose version does not fit in an `i64` is an error
/// rather than a skipped file.
pub fn parse_version(file_name: &str) -> Result<Option<i64>, StorageError> {
    let Some(caps) = MIGRATION_PATTERN.captures(file_name) else {
        return Ok(None);
    };
    caps[1].parse().map(Some).map_err(|e| {
        StorageError::MigrationFailed(format!(
            "Migration '{}' has an invalid version: {}",
            file_name, e
        ))
    })
}

/// List the migration files in `dir`, sorted by numeric version.
///
/// A missing directory yields no migrations. Two files with the same version
/// are rejected, since only one of them could ever be recorded.
pub fn discover_migrations(dir: &Path) -> Result<Vec<MigrationFile>, StorageError> {
    if !dir.is_dir() {
        tracing::warn!("Schema directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        StorageError::MigrationFailed(format!(
            "Cannot read schema directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        match parse_version(&name)? {
            Some(version) => files.push(MigrationFile {
                version,
                name,
                path: entry.path(),
            }),
            None => tracing::debug!("Ignoring non-migration file {}", name),
        }
    }

    files.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));

    if let Some(pair) = files.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(StorageError::MigrationFailed(format!(
            "Duplicate migration version {}: '{}' and '{}'",
            pair[0].version, pair[0].name, pair[1].name
        )));
    }

    Ok(files)
}

impl Database {
    /// Apply every migration in `schema_dir` that the ledger doesn't know yet.
    ///
    /// Stops at the first failing file with `MigrationFailed`; later files are
    /// not attempted. Returns the migrations applied by this call.
    pub fn run_migrations(
        &self,
        schema_dir: impl AsRef<Path>,
    ) -> Result<Vec<MigrationFile>, StorageError> {
        self.execute(CREATE_LEDGER_TABLE)?;
        let applied = self.applied_versions()?;

        let mut newly_applied = Vec::new();
        for file in discover_migrations(schema_dir.as_ref())? {
            if applied.contains(&file.version) {
                continue;
            }
            self.apply_migration(&file)?;
            newly_applied.push(file);
        }
        Ok(newly_applied)
    }

    /// Migration files in `schema_dir` not yet recorded in the ledger.
    /// Read-only: a database without a ledger has every file pending.
    pub fn pending_migrations(
        &self,
        schema_dir: impl AsRef<Path>,
    ) -> Result<Vec<MigrationFile>, StorageError> {
        let applied = self.applied_versions()?;

        Ok(discover_migrations(schema_dir.as_ref())?
            .into_iter()
            .filter(|file| !applied.contains(&file.version))
            .collect())
    }

    /// Ledger contents ordered by version, empty when no ledger exists yet
    pub fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, StorageError> {
        if !self.has_ledger()? {
            return Ok(Vec::new());
        }
        let rows = self.query(
            "SELECT version, name, applied_at FROM schema_migrations ORDER BY version",
            &[],
        )?;

        rows.iter()
            .map(|row| {
                Ok(AppliedMigration {
                    version: row.integer(0)?,
                    name: row.text(1)?.to_string(),
                    applied_at: row.timestamp(2)?,
                })
            })
            .collect()
    }

    fn has_ledger(&self) -> Result<bool, StorageError> {
        let rows = self.query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            &[],
        )?;
        Ok(!rows.is_empty())
    }

    fn applied_versions(&self) -> Result<HashSet<i64>, StorageError> {
        if !self.has_ledger()? {
            return Ok(HashSet::new());
        }
        let rows = self.query("SELECT version FROM schema_migrations", &[])?;
        rows.iter().map(|row| row.integer(0)).collect()
    }

    fn apply_migration(&self, file: &MigrationFile) -> Result<(), StorageError> {
        let sql = std::fs::read_to_string(&file.path).map_err(|e| {
            StorageError::MigrationFailed(format!(
                "Cannot read migration file '{}': {}",
                file.name, e
            ))
        })?;

        if let Err(e) = self.execute(&sql) {
            self.abandon_open_transaction();
            let detail = match e {
                StorageError::WriteFailed { message, .. } => message,
                other => other.to_string(),
            };
            return Err(StorageError::MigrationFailed(format!(
                "Migration '{}' failed: {}",
                file.name, detail
            )));
        }

        // Not in one transaction with the body: a ledger failure leaves the DDL applied.
        self.run(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            &[
                SqlValue::from(file.version),
                SqlValue::from(file.name.as_str()),
                SqlValue::from(Utc::now()),
            ],
        )?;

        tracing::info!("Applied migration {}", file.name);
        Ok(())
    }

    /// A script that failed after its own BEGIN leaves the connection inside
    /// that transaction.
    fn abandon_open_transaction(&self) {
        if !self.autocommit() {
            if let Err(e) = self.execute("ROLLBACK") {
                tracing::warn!("Rollback after failed migration failed: {}", e);
            }
        }
    }
}
