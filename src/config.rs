use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "data/books.db";
pub const DEFAULT_SCHEMA_DIR: &str = "schema";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BookshelfConfig {
    pub database: Option<String>,
    pub schema_dir: Option<String>,
}

/// Paths a command runs against after flags, config file and defaults are merged
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: PathBuf,
    pub schema_dir: PathBuf,
}

impl Settings {
    /// Flags win over the config file, the config file wins over defaults
    pub fn resolve(
        config: Option<&BookshelfConfig>,
        database: Option<PathBuf>,
        schema_dir: Option<PathBuf>,
    ) -> Self {
        let file = config.cloned().unwrap_or_default();

        Self {
            database: database
                .or_else(|| file.database.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            schema_dir: schema_dir
                .or_else(|| file.schema_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_DIR)),
        }
    }

    pub fn to_config(&self) -> BookshelfConfig {
        BookshelfConfig {
            database: Some(self.database.display().to_string()),
            schema_dir: Some(self.schema_dir.display().to_string()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("bookshelf.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BookshelfConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BookshelfConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BookshelfConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
