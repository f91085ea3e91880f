use std::sync::Arc;

use invchat_agent::{ChatRuntime, OpenAiClient, PromptBuilder};
use invchat_core::config::{AppConfig, ConfigError, LoadOptions};
use invchat_core::intents::CatalogError;
use invchat_core::{InMemorySessionStore, IntentCatalog, IntentMatcher, ProviderError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<ChatRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("intent catalog failed to load: {0}")]
    Catalog(#[from] CatalogError),
    #[error("model client could not be created: {0}")]
    ModelClient(#[source] ProviderError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        "starting application bootstrap"
    );

    let catalog = IntentCatalog::builtin()?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        intents = catalog.len(),
        "intent catalog loaded"
    );

    let llm = OpenAiClient::new(&config.llm).map_err(BootstrapError::ModelClient)?;
    info!(
        event_name = "system.bootstrap.model_client_ready",
        correlation_id = "bootstrap",
        endpoint = llm.endpoint(),
        timeout_secs = config.llm.timeout_secs,
        "model client initialized"
    );

    let runtime = ChatRuntime::new(
        IntentMatcher::new(Arc::new(catalog)),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(llm),
        PromptBuilder::new(config.chat.history_turns),
        config.llm.model.clone(),
    );

    Ok(Application { config, runtime: Arc::new(runtime) })
}
