use crate::{Command, Error, Result};
use parley_config::Config;
use parley_conversation::ConversationManager;
use parley_core::UserId;
use std::{path::PathBuf, sync::Arc, time::Duration};
use teloxide::prelude::*;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Telegram front end for the conversation engine
#[derive(Clone)]
pub struct TelegramBot {
    /// Teloxide bot instance
    pub bot: Bot,
    pub conversation: Arc<ConversationManager>,
    super_admin_ids: Arc<[UserId]>,
    /// Operational log tailed by `/log`
    pub log_file: PathBuf,
}

impl TelegramBot {
    pub fn new(token: &str, conversation: Arc<ConversationManager>, config: &Config) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("telegram token is empty".into()));
        }

        Ok(Self {
            bot: Bot::new(token),
            conversation,
            super_admin_ids: config.telegram.super_admin_ids.clone().into(),
            log_file: config.storage.log_file.clone(),
        })
    }

    #[must_use]
    pub fn is_super_admin(&self, user_id: UserId) -> bool {
        self.super_admin_ids.contains(&user_id)
    }

    /// Test connection to Telegram API with linear backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    async fn test_connection(&self) -> Result<()> {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(me) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        me.user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        me.user.id
                    );
                    return Ok(());
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);
                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    if attempt == 1 {
                        warn!("Check the bot token and that api.telegram.org is reachable");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot until interrupted
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::Update;

        self.test_connection().await?;

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {e}");
        }

        let bot = self.bot.clone();

        let schema = dptree::entry().branch(Update::filter_message().endpoint({
            let this = self.clone();
            move |msg: Message| {
                let this = this.clone();
                async move {
                    match crate::handler::handle_message(&this, &msg).await {
                        Ok(()) => {}
                        Err(Error::Unauthorized(user_id)) => {
                            warn!("Ignored admin command from user {user_id}");
                        }
                        Err(e) => error!("Error in handle_message: {e}"),
                    }
                    Ok::<(), Error>(())
                }
            }
        }));

        info!("Bot is running");
        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot stopped");
        Ok(())
    }
}
