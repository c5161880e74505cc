use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::GatewayArc;
use crate::domain::models::StorageArc;
use crate::domain::models::StorageName;
use crate::domain::services::navigation::Router;
use crate::domain::services::SessionStore;
use crate::domain::services::TodoStore;
use crate::infrastructure::gateway::http::HttpGateway;
use crate::infrastructure::storage::StorageManager;

/// Everything a front end needs, wired together once and handed around by
/// reference.
pub struct AppContext {
    pub storage: StorageArc,
    pub gateway: GatewayArc,
    pub session: Arc<SessionStore>,
    pub todos: Arc<TodoStore>,
    pub router: Router,
}

impl AppContext {
    pub fn new(storage: StorageArc, gateway: GatewayArc) -> AppContext {
        let session = Arc::new(SessionStore::new(gateway.clone(), storage.clone()));
        session.init_auth();

        let todos = Arc::new(TodoStore::new(gateway.clone(), session.clone()));

        return AppContext {
            storage,
            gateway,
            session,
            todos,
            router: Router::default(),
        };
    }

    pub fn from_config() -> Result<AppContext> {
        let storage_name = Config::get(ConfigKey::Storage);
        let storage = StorageManager::get(
            StorageName::parse(storage_name.to_string())
                .ok_or_else(|| return anyhow!("Unknown storage '{storage_name}'"))?,
        )?;

        let gateway = Arc::new(HttpGateway::new(
            &Config::get(ConfigKey::ApiUrl),
            storage.clone(),
        ));

        return Ok(AppContext::new(storage, gateway));
    }
}
