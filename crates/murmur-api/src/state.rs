//! Application state wiring all services together.
//!
//! Services are generic over the store, token, and hasher ports; AppState
//! pins them to the concrete infra implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use murmur_core::chat::{ChatAggregator, ChatService};
use murmur_core::clock::{Clock, SystemClock};
use murmur_core::contact::ContactResolver;
use murmur_core::session::SessionManager;
use murmur_core::store::MemoryDocumentStore;
use murmur_core::user::UserService;
use murmur_infra::crypto::password::Argon2PasswordHasher;
use murmur_infra::crypto::token::OsRngTokenGenerator;
use murmur_infra::sqlite::document::SqliteDocumentStore;
use murmur_infra::sqlite::pool::{DatabasePool, default_database_url};
use murmur_infra::store::DocumentBackend;
use murmur_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteSessionManager = SessionManager<DocumentBackend, OsRngTokenGenerator>;
pub type ConcreteUserService = UserService<DocumentBackend, Argon2PasswordHasher>;
pub type ConcreteChatService = ChatService<DocumentBackend>;
pub type ConcreteChatAggregator = ChatAggregator<DocumentBackend>;
pub type ConcreteContactResolver = ContactResolver<DocumentBackend>;

/// Shared application state. Cloned per request; everything inside is
/// either immutable or internally synchronized.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<ConcreteSessionManager>,
    pub users: Arc<ConcreteUserService>,
    pub chats: Arc<ConcreteChatService>,
    pub aggregator: Arc<ConcreteChatAggregator>,
    pub contacts: Arc<ConcreteContactResolver>,
    pub backend: &'static str,
}

impl AppState {
    /// Open the configured store and wire services.
    pub async fn init(config: AppConfig, data_dir: &Path, in_memory: bool) -> anyhow::Result<Self> {
        let store = if in_memory {
            DocumentBackend::Memory(MemoryDocumentStore::new())
        } else {
            tokio::fs::create_dir_all(data_dir).await?;
            let db_url = config
                .database_url
                .clone()
                .unwrap_or_else(|| default_database_url(data_dir));
            let pool = DatabasePool::new(&db_url).await?;
            DocumentBackend::Sqlite(SqliteDocumentStore::new(
                pool,
                Duration::from_secs(config.store_timeout_secs),
            ))
        };

        Ok(Self::from_store(store, config))
    }

    /// Wire services around an already-open store.
    pub fn from_store(store: DocumentBackend, config: AppConfig) -> Self {
        let backend = store.name();
        let store = Arc::new(store);
        let config = Arc::new(config);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let sessions = SessionManager::new(
            Arc::clone(&store),
            OsRngTokenGenerator,
            Arc::clone(&clock),
            config.session_ttl_days,
        );
        let users = UserService::new(
            Arc::clone(&store),
            Argon2PasswordHasher::new(),
            Arc::clone(&clock),
            Arc::clone(&config),
        );
        let chats = ChatService::new(Arc::clone(&store), Arc::clone(&clock));
        let aggregator = ChatAggregator::new(Arc::clone(&store), Arc::clone(&clock));
        let contacts = ContactResolver::new(store);

        Self {
            config,
            sessions: Arc::new(sessions),
            users: Arc::new(users),
            chats: Arc::new(chats),
            aggregator: Arc::new(aggregator),
            contacts: Arc::new(contacts),
            backend,
        }
    }

    /// In-memory state for handler tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::from_store(
            DocumentBackend::Memory(MemoryDocumentStore::new()),
            AppConfig::default(),
        )
    }
}
