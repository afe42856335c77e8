//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::{InMemoryRateLimitStore, RateLimitStore};
use crate::services::email::Mailer;
use crate::services::storage::{StorageClient, StorageError};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("mailer: {0}")]
    Mailer(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, collaborator clients, and the
/// checkout rate limiter.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    limiter: Arc<dyn RateLimitStore>,
    storage: StorageClient,
    mailer: Mailer,
}

impl AppState {
    /// Create a new application state with the default in-memory rate
    /// limiter.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage client or SMTP mailer cannot be
    /// constructed from the configuration.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let limiter = Arc::new(InMemoryRateLimitStore::default());
        Self::with_limiter(config, pool, limiter)
    }

    /// Create application state with an injected rate-limit store (a shared
    /// counter service for multi-instance deployments, a stub in tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage client or SMTP mailer cannot be
    /// constructed from the configuration.
    pub fn with_limiter(
        config: ServerConfig,
        pool: PgPool,
        limiter: Arc<dyn RateLimitStore>,
    ) -> Result<Self, StateError> {
        let storage = StorageClient::new(&config.storage)?;
        let mailer = Mailer::new(&config.email)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                limiter,
                storage,
                mailer,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the checkout rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &dyn RateLimitStore {
        self.inner.limiter.as_ref()
    }

    /// Get a reference to the object-storage signing client.
    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    /// Get a reference to the transactional mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }
}
