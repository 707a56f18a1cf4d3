use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_TYPE_STORAGE: &str = "LODGEBOOK_TYPE_STORAGE";
pub const ENV_FILE_PATH: &str = "LODGEBOOK_FILE_PATH";
pub const ENV_DB_USER: &str = "LODGEBOOK_DB_USER";
pub const ENV_DB_PWD: &str = "LODGEBOOK_DB_PWD";
pub const ENV_DB_HOST: &str = "LODGEBOOK_DB_HOST";
pub const ENV_DB_NAME: &str = "LODGEBOOK_DB_NAME";
pub const ENV_MODE: &str = "LODGEBOOK_ENV";

/// Which backend the process runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    #[serde(alias = "db")]
    Relational,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" | "filestorage" => Ok(BackendKind::File),
            "db" | "relational" | "sqlite" => Ok(BackendKind::Relational),
            other => Err(Error::Configuration(format!(
                "Unknown storage type '{}' (expected 'file' or 'db')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default, rename = "type_storage")]
    pub backend: BackendKind,
    pub file_path: Option<PathBuf>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_host: Option<PathBuf>,
    pub db_name: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
}

impl StorageConfig {
    /// Path of the file store
    pub fn file_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(default_file_path)
    }

    /// Connection parameters for the relational backend
    pub fn relational(&self) -> Result<RelationalConfig> {
        let database = self
            .db_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!("{} is required for the db storage type", ENV_DB_NAME))
            })?;

        Ok(RelationalConfig {
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            host: self.db_host.clone(),
            database,
            test_mode: self.test_mode,
        })
    }

    /// Apply `LODGEBOOK_*` overrides from the process environment
    pub fn from_env(base: StorageConfig) -> Result<Self> {
        Self::from_lookup(base, |name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup. Set values win over `base`.
    pub fn from_lookup<F>(base: StorageConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base;

        if let Some(kind) = lookup(ENV_TYPE_STORAGE) {
            config.backend = kind.parse()?;
        }
        if let Some(path) = lookup(ENV_FILE_PATH) {
            config.file_path = Some(PathBuf::from(path));
        }
        if let Some(user) = lookup(ENV_DB_USER) {
            config.db_user = Some(user);
        }
        if let Some(password) = lookup(ENV_DB_PWD) {
            config.db_password = Some(password);
        }
        if let Some(host) = lookup(ENV_DB_HOST) {
            config.db_host = Some(PathBuf::from(host));
        }
        if let Some(name) = lookup(ENV_DB_NAME) {
            config.db_name = Some(name);
        }
        if let Some(mode) = lookup(ENV_MODE) {
            config.test_mode = mode.trim().eq_ignore_ascii_case("test");
        }

        Ok(config)
    }
}

/// Resolved relational connection parameters.
///
/// SQLite reads `host` as the directory holding the database and
/// `database` as its file name. `user` and `password` are carried for
/// parity with server engines; SQLite does not check them.
#[derive(Debug, Clone)]
pub struct RelationalConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<PathBuf>,
    pub database: String,
    pub test_mode: bool,
}

impl RelationalConfig {
    pub fn in_memory() -> Self {
        Self {
            user: None,
            password: None,
            host: None,
            database: ":memory:".to_string(),
            test_mode: false,
        }
    }

    /// On-disk location of the database, `None` for an in-memory one
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.database == ":memory:" {
            return None;
        }

        let mut file = PathBuf::from(&self.database);
        if file.extension().is_none() {
            file.set_extension("db");
        }
        Some(match &self.host {
            Some(host) => host.join(file),
            None => file,
        })
    }

    /// Connection description safe for logs
    pub fn describe(&self) -> String {
        let location = self
            .database_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        let user = self.user.as_deref().unwrap_or("-");
        let password = if self.password.is_some() { "***" } else { "-" };
        let mode = if self.test_mode { " (test)" } else { "" };
        format!("sqlite {} as {}:{}{}", location, user, password, mode)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("lodgebook.toml")
}

pub fn default_file_path() -> PathBuf {
    PathBuf::from("file.json")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<StorageConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StorageConfig = toml::from_str(&contents)
        .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Load `lodgebook.toml` (if any) and apply environment overrides
pub fn resolve(path: Option<&Path>) -> Result<StorageConfig> {
    let base = load_config(path)?.unwrap_or_default();
    StorageConfig::from_env(base)
}

pub fn ensure_store_dir(store_path: &Path) -> Result<()> {
    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
