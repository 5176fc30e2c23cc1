use crate::command::CommandStrategy;
use parley_config::{AnthropicConfig, Config};
use parley_conversation::{ConversationConfig, ConversationManager, FileSlot, StagingArea};
use parley_core::{CompletionProvider, SessionStore};
use parley_providers::AnthropicProvider;
use parley_session::SessionManager;
use parley_telegram::TelegramBot;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Input for Telegram bot command.
pub struct TelegramInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
    pub config: Config,
}

/// Strategy for running Telegram bot.
pub struct TelegramStrategy;

fn build_provider(config: &AnthropicConfig) -> anyhow::Result<AnthropicProvider> {
    let mut provider = AnthropicProvider::new(config.api_key.clone())
        .with_model(config.model.clone())
        .with_max_tokens_to_sample(config.max_tokens_to_sample);
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    if let Some(secs) = config.timeout_secs {
        provider = provider.with_timeout(Duration::from_secs(secs))?;
    }
    Ok(provider)
}

fn resolve_token(cli_token: Option<String>, config: &Config) -> anyhow::Result<String> {
    match cli_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok(token),
        None if !config.telegram.token.trim().is_empty() => Ok(config.telegram.token.clone()),
        None => {
            anyhow::bail!("Telegram bot token not configured. Set \"telegram.token\" in config")
        }
    }
}

impl CommandStrategy for TelegramStrategy {
    type Input = TelegramInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let TelegramInput { token, config } = input;
        let token = resolve_token(token, &config)?;

        info!("Starting Telegram bot...");

        let provider: Arc<dyn CompletionProvider> =
            Arc::new(build_provider(&config.providers.anthropic)?);

        if let Some(parent) = config.database.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        info!("Database path: {}", config.database.path.display());
        let store: Arc<dyn SessionStore> =
            Arc::new(SessionManager::new(&config.database.url()).await?);

        tokio::fs::create_dir_all(&config.storage.staging_dir).await?;
        let conversation = ConversationManager::new(
            provider,
            store,
            StagingArea::new(&config.storage.staging_dir),
            FileSlot::new(),
            ConversationConfig::default().with_per_user_lock(config.conversation.per_user_lock),
        );

        let bot = TelegramBot::new(&token, Arc::new(conversation), &config)?;

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
