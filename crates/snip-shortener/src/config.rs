use clap::{Args, ValueEnum};
use snip_storage::{BackendConfig, PostgresSettings};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const HEALTH_TIMEOUT_ENV: &str = "SNIP_HEALTH_TIMEOUT_MS";
pub const MAX_CONNECTIONS_ENV: &str = "SNIP_DATABASE_MAX_CONNECTIONS";

pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{backend} storage requires --{flag} (or {env})")]
    Missing {
        backend: StorageBackendArg,
        flag: &'static str,
        env: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "volatile")]
    Volatile,
    #[value(name = "file")]
    File,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Volatile => write!(f, "volatile"),
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

/// Storage flags shared by every binary that opens a [`LinkStore`](crate::LinkStore).
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Backend to use. Inferred when omitted: a database DSN selects
    /// postgres, otherwise a file path selects file, otherwise volatile.
    #[arg(long, env = STORAGE_BACKEND_ENV, value_enum, global = true)]
    pub storage: Option<StorageBackendArg>,

    /// JSON snapshot path for the file backend.
    #[arg(long, env = FILE_STORAGE_PATH_ENV, global = true)]
    pub file_storage_path: Option<PathBuf>,

    /// Connection string for the postgres backend.
    #[arg(long, env = DATABASE_DSN_ENV, global = true)]
    pub database_dsn: Option<String>,

    #[arg(long, env = MAX_CONNECTIONS_ENV, default_value_t = DEFAULT_MAX_CONNECTIONS, global = true)]
    pub max_connections: u32,

    /// Upper bound for a database health probe, in milliseconds.
    #[arg(long, env = HEALTH_TIMEOUT_ENV, default_value_t = DEFAULT_HEALTH_TIMEOUT_MS, global = true)]
    pub health_timeout_ms: u64,
}

impl StoreArgs {
    fn file_path(&self) -> Option<&PathBuf> {
        self.file_storage_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    fn dsn(&self) -> Option<&str> {
        self.database_dsn.as_deref().filter(|dsn| !dsn.is_empty())
    }

    /// The backend that will be opened, explicit or inferred.
    pub fn backend_kind(&self) -> StorageBackendArg {
        match self.storage {
            Some(kind) => kind,
            None if self.dsn().is_some() => StorageBackendArg::Postgres,
            None if self.file_path().is_some() => StorageBackendArg::File,
            None => StorageBackendArg::Volatile,
        }
    }

    /// Builds the backend configuration from the parsed flags.
    pub fn backend_config(&self) -> Result<BackendConfig, ConfigError> {
        let kind = self.backend_kind();

        match kind {
            StorageBackendArg::Volatile => Ok(BackendConfig::Volatile),
            StorageBackendArg::File => {
                let path = self.file_path().ok_or(ConfigError::Missing {
                    backend: kind,
                    flag: "file-storage-path",
                    env: FILE_STORAGE_PATH_ENV,
                })?;
                Ok(BackendConfig::File { path: path.clone() })
            }
            StorageBackendArg::Postgres => {
                let dsn = self.dsn().ok_or(ConfigError::Missing {
                    backend: kind,
                    flag: "database-dsn",
                    env: DATABASE_DSN_ENV,
                })?;
                let settings = PostgresSettings::builder()
                    .dsn(dsn)
                    .max_connections(self.max_connections)
                    .health_timeout(Duration::from_millis(self.health_timeout_ms))
                    .build();
                Ok(BackendConfig::Postgres(settings))
            }
        }
    }
}
