use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{AuthApi, HttpTaskGateway, TaskGateway, ToolsApi};
use crate::config::Config;
use crate::http::{ApiClient, TokenSource};
use crate::session::SessionManager;
use crate::storage::{KeyValueStore, SqliteStore};

/// Everything a command or the TUI needs, wired together once.
pub struct ToolNest {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub auth: AuthApi,
    pub tools: ToolsApi,
    pub tasks: Arc<dyn TaskGateway>,
}

impl ToolNest {
    pub fn open(config: Config) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path())
            .with_context(|| format!("Failed to open session store at {}", config.db_path().display()))?;
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(SessionManager::new(store));
        let tokens: Arc<dyn TokenSource> = session.clone();
        let client = ApiClient::new(config.api_url.clone(), Some(tokens), config.request_timeout)
            .context("Failed to build HTTP client")?;

        Ok(ToolNest {
            auth: AuthApi::new(client.clone()),
            tools: ToolsApi::new(client.clone()),
            tasks: Arc::new(HttpTaskGateway::new(client)),
            session,
            config,
        })
    }
}
