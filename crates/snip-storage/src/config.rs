use crate::file::FileBackend;
use crate::memory::VolatileBackend;
use crate::postgres::{PostgresBackend, PostgresSettings};
use snip_core::error::Result;
use snip_core::Backend;
use std::path::PathBuf;

/// Which backend a store mirrors its relation to, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Keep everything in memory.
    Volatile,
    /// Rewrite a JSON snapshot at `path` on every change.
    File { path: PathBuf },
    /// Write every change to a PostgreSQL table.
    Postgres(PostgresSettings),
}

impl BackendConfig {
    /// Short backend name, matching [`Backend::name`].
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Volatile => "volatile",
            BackendConfig::File { .. } => "file",
            BackendConfig::Postgres(_) => "postgres",
        }
    }
}

/// Opens the configured backend.
///
/// For PostgreSQL this connects and creates the table if needed; the other
/// backends do no I/O until they are loaded.
pub async fn open_backend(config: &BackendConfig) -> Result<Box<dyn Backend>> {
    let backend: Box<dyn Backend> = match config {
        BackendConfig::Volatile => Box::new(VolatileBackend::new()),
        BackendConfig::File { path } => Box::new(FileBackend::new(path.clone())),
        BackendConfig::Postgres(settings) => Box::new(PostgresBackend::connect(settings).await?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_volatile() {
        let backend = open_backend(&BackendConfig::Volatile).await.unwrap();
        assert_eq!(backend.name(), "volatile");
    }

    #[tokio::test]
    async fn opens_file_without_touching_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("links.json");
        let config = BackendConfig::File { path: path.clone() };

        let backend = open_backend(&config).await.unwrap();

        assert_eq!(backend.name(), config.name());
        assert!(!path.exists());
    }

    #[test]
    fn postgres_settings_defaults() {
        let settings = PostgresSettings::builder().dsn("postgres://localhost/snip").build();
        let config = BackendConfig::Postgres(settings.clone());

        assert_eq!(config.name(), "postgres");
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.health_timeout, std::time::Duration::from_secs(1));
    }
}
