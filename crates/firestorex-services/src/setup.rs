//! Backend selection and service wiring from [`Config`].

use std::sync::Arc;

use firestorex_client::{AuthBackend, BackendClient, HostedAuth, RemoteStorage, RestStore, TokenSession};
use firestorex_core::{ActorId, AppError, Config, DatabaseBackend, SessionProvider, StaticSession, StorageBackend};
#[cfg(feature = "postgres")]
use firestorex_db::PgStore;
use firestorex_db::{ActivityLogRepository, FileMetadataRepository, ProfileRepository, RelationalStore};
#[cfg(feature = "storage-local")]
use firestorex_storage::LocalStorage;
use firestorex_storage::ObjectStore;

use crate::account::AccountService;
use crate::audit::SecurityAuditor;
use crate::upload::FileUploadService;

/// Hosted backend client, when a backend URL and key are configured.
pub fn create_backend_client(config: &Config) -> Result<Option<BackendClient>, AppError> {
    if config.backend.url.is_none() || config.backend.anon_key.is_none() {
        return Ok(None);
    }
    Ok(Some(BackendClient::from_config(&config.backend)?))
}

/// Create the object store selected by `STORAGE_BACKEND`.
pub async fn create_storage(
    config: &Config,
    client: Option<&BackendClient>,
) -> Result<Arc<dyn ObjectStore>, AppError> {
    match config.storage_backend {
        StorageBackend::Remote => {
            let client = client.ok_or_else(|| {
                AppError::Config("remote storage requires SUPABASE_URL and SUPABASE_ANON_KEY".to_string())
            })?;
            Ok(Arc::new(RemoteStorage::new(client.clone())))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.as_deref().ok_or_else(|| {
                AppError::Config("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let storage = LocalStorage::new(base_path)
                .await
                .map_err(|e| AppError::Config(e.to_string()))?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(AppError::Config(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the relational store selected by `DATABASE_BACKEND`.
pub async fn create_relational_store(
    config: &Config,
    client: Option<&BackendClient>,
) -> Result<Arc<dyn RelationalStore>, AppError> {
    match config.database_backend {
        DatabaseBackend::Rest => {
            let client = client.ok_or_else(|| {
                AppError::Config("REST database requires SUPABASE_URL and SUPABASE_ANON_KEY".to_string())
            })?;
            Ok(Arc::new(RestStore::new(client.clone())))
        }

        #[cfg(feature = "postgres")]
        DatabaseBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Config("DATABASE_URL not configured".to_string()))?;
            let store = PgStore::connect(url, config.db_max_connections)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            store
                .migrate()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "postgres"))]
        DatabaseBackend::Postgres => Err(AppError::Config(
            "Postgres backend not available (postgres feature not enabled)".to_string(),
        )),
    }
}

/// Fully wired services for one caller.
#[derive(Clone)]
pub struct Services {
    pub config: Config,
    pub auth: Option<Arc<dyn AuthBackend>>,
    pub auditor: SecurityAuditor,
    pub uploads: FileUploadService,
    pub accounts: Option<AccountService>,
}

impl Services {
    /// Build services from configuration. When `access_token` is given, hosted
    /// storage and table requests are made as that user.
    pub async fn from_config(config: Config, access_token: Option<&str>) -> Result<Self, AppError> {
        let client = create_backend_client(&config)?;
        let user_client = match (&client, access_token) {
            (Some(client), Some(token)) => Some(client.with_access_token(token)),
            (client, _) => client.clone(),
        };

        let storage = create_storage(&config, user_client.as_ref()).await?;
        let store = create_relational_store(&config, user_client.as_ref()).await?;

        let auditor = SecurityAuditor::new(ActivityLogRepository::new(
            store.clone(),
            config.tables.activity_logs.clone(),
        ));
        let uploads = FileUploadService::new(
            storage,
            FileMetadataRepository::new(store.clone(), config.tables.files.clone()),
            auditor.clone(),
        );

        let auth: Option<Arc<dyn AuthBackend>> =
            client.map(|c| Arc::new(HostedAuth::new(c)) as Arc<dyn AuthBackend>);
        let accounts = auth.as_ref().map(|auth| {
            AccountService::new(
                auth.clone(),
                ProfileRepository::new(store.clone(), config.tables.profiles.clone()),
                auditor.clone(),
            )
        });

        tracing::info!(
            app = %config.app_name,
            storage_backend = %config.storage_backend,
            database_backend = %config.database_backend,
            hosted_auth = auth.is_some(),
            "Services initialized"
        );

        Ok(Self {
            config,
            auth,
            auditor,
            uploads,
            accounts,
        })
    }

    /// Session for a caller: a fixed actor when given (local development),
    /// otherwise the access token resolved through hosted auth, otherwise anonymous.
    pub fn session(
        &self,
        actor: Option<ActorId>,
        access_token: Option<String>,
    ) -> Arc<dyn SessionProvider> {
        match (actor, &self.auth) {
            (Some(actor), _) => Arc::new(StaticSession::authenticated(actor)),
            (None, Some(auth)) => Arc::new(TokenSession::new(auth.clone(), access_token)),
            (None, None) => Arc::new(StaticSession::anonymous()),
        }
    }
}
