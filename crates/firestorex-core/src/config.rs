//! Configuration module
//!
//! Configuration is read from the environment (and a `.env` file when present).
//! It selects the object storage and relational backends and names the remote tables.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{ACTIVITY_LOG_TABLE, DEFAULT_BUCKET, FILES_TABLE, PROFILES_TABLE};
use crate::validation::validate_identifier;

const DB_MAX_CONNECTIONS: u32 = 5;
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Object storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Hosted storage API
    Remote,
    /// Local filesystem (development)
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "supabase" => Ok(StorageBackend::Remote),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Remote => write!(f, "remote"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Relational store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Hosted REST API over the database
    Rest,
    /// Direct Postgres connection
    Postgres,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rest" | "postgrest" => Ok(DatabaseBackend::Rest),
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

impl Display for DatabaseBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DatabaseBackend::Rest => write!(f, "rest"),
            DatabaseBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Hosted backend connection settings
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub http_timeout_secs: u64,
}

/// Names of the remote tables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableNames {
    pub files: String,
    pub activity_logs: String,
    pub profiles: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            files: FILES_TABLE.to_string(),
            activity_logs: ACTIVITY_LOG_TABLE.to_string(),
            profiles: PROFILES_TABLE.to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub environment: String,
    pub backend: BackendConfig,
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub default_bucket: String,
    pub database_backend: DatabaseBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub tables: TableNames,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("APP_ENV")
            .or_else(|_| env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());

        let backend = BackendConfig {
            url: env::var("SUPABASE_URL")
                .or_else(|_| env::var("FIRESTOREX_BACKEND_URL"))
                .ok()
                .map(|u| u.trim_end_matches('/').to_string()),
            anon_key: env::var("SUPABASE_ANON_KEY")
                .or_else(|_| env::var("FIRESTOREX_API_KEY"))
                .ok(),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => StorageBackend::Remote,
        };

        let database_backend = match env::var("DATABASE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => DatabaseBackend::Rest,
        };

        let defaults = TableNames::default();
        let tables = TableNames {
            files: env::var("FILES_TABLE").unwrap_or(defaults.files),
            activity_logs: env::var("ACTIVITY_LOG_TABLE").unwrap_or(defaults.activity_logs),
            profiles: env::var("PROFILES_TABLE").unwrap_or(defaults.profiles),
        };

        let config = Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "FirestoreX".to_string()),
            environment,
            backend,
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            default_bucket: env::var("DEFAULT_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            database_backend,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DB_MAX_CONNECTIONS),
            tables,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks: each selected backend must have what it needs.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let needs_remote = self.storage_backend == StorageBackend::Remote
            || self.database_backend == DatabaseBackend::Rest;

        if needs_remote && self.backend.url.is_none() {
            return Err(anyhow::anyhow!(
                "SUPABASE_URL must be set when using the remote storage or REST database backend"
            ));
        }
        if needs_remote && self.backend.anon_key.is_none() {
            return Err(anyhow::anyhow!(
                "SUPABASE_ANON_KEY must be set when using the remote storage or REST database backend"
            ));
        }
        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
            ));
        }
        if self.database_backend == DatabaseBackend::Postgres && self.database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be set when DATABASE_BACKEND=postgres"
            ));
        }

        for table in [
            &self.tables.files,
            &self.tables.activity_logs,
            &self.tables.profiles,
        ] {
            validate_identifier(table)?;
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            app_name: "FirestoreX".to_string(),
            environment: "development".to_string(),
            backend: BackendConfig {
                url: None,
                anon_key: None,
                http_timeout_secs: HTTP_TIMEOUT_SECS,
            },
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/firestorex".to_string()),
            default_bucket: DEFAULT_BUCKET.to_string(),
            database_backend: DatabaseBackend::Postgres,
            database_url: Some("postgres://localhost/firestorex".to_string()),
            db_max_connections: DB_MAX_CONNECTIONS,
            tables: TableNames::default(),
        }
    }

    #[test]
    fn local_postgres_config_needs_no_backend_url() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn rest_backend_requires_url_and_key() {
        let mut config = local_config();
        config.database_backend = DatabaseBackend::Rest;
        assert!(config.validate().is_err());

        config.backend.url = Some("https://example.supabase.co".to_string());
        assert!(config.validate().is_err());

        config.backend.anon_key = Some("anon".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn local_storage_requires_path() {
        let mut config = local_config();
        config.local_storage_path = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn table_names_are_identifiers() {
        let mut config = local_config();
        config.tables.files = "files; drop".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn backend_parsing() {
        assert_eq!("LOCAL".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!("supabase".parse::<StorageBackend>().unwrap(), StorageBackend::Remote);
        assert_eq!("postgres".parse::<DatabaseBackend>().unwrap(), DatabaseBackend::Postgres);
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn production_detection() {
        let mut config = local_config();
        assert!(!config.is_production());
        config.environment = "Prod".to_string();
        assert!(config.is_production());
    }
}
