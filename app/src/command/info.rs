use parley_config::Config;
use parley_core::SessionStore;
use parley_session::SessionManager;
use tracing::info;

/// Strategy for displaying configuration information.
///
/// Secrets are masked; the database is opened once to report its status
/// and how many users are on the allow-list.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let anthropic = &config.providers.anthropic;

        println!("=== parley Configuration ===\n");

        println!("Anthropic:");
        println!("  API Key: {}", mask_secret(&anthropic.api_key));
        println!("  Model: {}", anthropic.model);
        println!("  Max Tokens To Sample: {}", anthropic.max_tokens_to_sample);
        if let Some(ref base_url) = anthropic.base_url {
            println!("  Base URL: {base_url}");
        }
        match anthropic.timeout_secs {
            Some(secs) => println!("  Timeout: {secs}s"),
            None => println!("  Timeout: (none)"),
        }
        println!();

        println!("Database:");
        println!("  Path: {}", config.database.path.display());
        info!("Testing database connection");
        if config.database.path.exists() {
            match SessionManager::new(&config.database.url()).await {
                Ok(store) => {
                    println!("  Status: Connected");
                    match store.list_all().await {
                        Ok(users) => println!("  Users: {}", users.len()),
                        Err(e) => println!("  Users: unavailable ({e})"),
                    }
                }
                Err(e) => {
                    println!("  Status: Connection failed");
                    println!("  Error: {e}");
                }
            }
        } else {
            println!("  Status: Not created yet");
        }
        println!();

        println!("Storage:");
        println!("  Staging Dir: {}", config.storage.staging_dir.display());
        println!("  Log File: {}", config.storage.log_file.display());
        println!();

        println!("Conversation:");
        println!("  Per-User Lock: {}", config.conversation.per_user_lock);
        println!();

        println!("Telegram:");
        println!("  Token: {}", mask_token(&config.telegram.token));
        if config.telegram.super_admin_ids.is_empty() {
            println!("  Super Admins: (none)");
        } else {
            let ids: Vec<String> = config
                .telegram
                .super_admin_ids
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("  Super Admins: {}", ids.join(", "));
        }

        Ok(())
    }
}

/// Keeps the first and last four characters of long secrets.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "(not set)".to_string();
    }
    // Bot tokens are "<bot id>:<secret>"; the id is not sensitive.
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{bot_id}:***"),
        None => "***".to_string(),
    }
}
