use parley_core::UserId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_DIR_NAME: &str = "parley";
const CONFIG_FILE_NAME: &str = "config.json";

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub conversation: ConversationSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    /// Users allowed to run the administrative commands.
    #[serde(default)]
    pub super_admin_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "AnthropicConfig::default_model")]
    pub model: String,
    #[serde(default = "AnthropicConfig::default_max_tokens_to_sample")]
    pub max_tokens_to_sample: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout. Unset means wait as long as the server does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AnthropicConfig {
    fn default_model() -> String {
        "claude-2.1".to_string()
    }

    const fn default_max_tokens_to_sample() -> u32 {
        200_000
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl DatabaseConfig {
    fn default_path() -> PathBuf {
        base_dir().join("user_data.db")
    }

    /// `sqlx` URL for the database file, created on first connect.
    #[must_use]
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Where uploaded documents and large replies are staged.
    #[serde(default = "StorageConfig::default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "StorageConfig::default_log_file")]
    pub log_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            staging_dir: Self::default_staging_dir(),
            log_file: Self::default_log_file(),
        }
    }
}

impl StorageConfig {
    fn default_staging_dir() -> PathBuf {
        base_dir().join("staging")
    }

    fn default_log_file() -> PathBuf {
        base_dir().join("bot.log")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConversationSettings {
    /// Serialize turns from the same user instead of letting them race.
    #[serde(default)]
    pub per_user_lock: bool,
}

impl Config {
    #[must_use]
    pub fn config_path() -> PathBuf {
        base_dir().join(CONFIG_FILE_NAME)
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'parley init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = base_dir();
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = Self::write_template(&config_dir)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set telegram.token to your bot token from @BotFather");
        println!("   2. Add your own user id to telegram.super_admin_ids");
        println!("   3. Set providers.anthropic.api_key");
        println!("   4. Run 'parley telegram' and '/add <id>' each user who may chat");
        println!();
        Ok(())
    }

    /// Writes the default template into `dir`, refusing to overwrite.
    pub fn write_template(dir: &Path) -> anyhow::Result<PathBuf> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        Ok(config_path)
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "telegram": {
    "token": "your-telegram-bot-token-here",
    "super_admin_ids": []
  },
  "providers": {
    "anthropic": {
      "api_key": "your-anthropic-api-key-here",
      "model": "claude-2.1",
      "max_tokens_to_sample": 200000
    }
  },
  "conversation": {
    "per_user_lock": false
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_with_defaults() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.providers.anthropic.model, "claude-2.1");
        assert_eq!(config.providers.anthropic.max_tokens_to_sample, 200_000);
        assert!(config.providers.anthropic.timeout_secs.is_none());
        assert!(config.telegram.super_admin_ids.is_empty());
        assert!(!config.conversation.per_user_lock);
        assert!(config.database.path.ends_with("user_data.db"));
        assert!(config.storage.log_file.ends_with("bot.log"));
    }

    #[test]
    fn write_template_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::write_template(dir.path()).unwrap();
        assert!(path.exists());
        assert!(Config::write_template(dir.path()).is_err());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.telegram.token, "your-telegram-bot-token-here");
    }

    #[test]
    fn database_url_creates_file() {
        let db = DatabaseConfig {
            path: PathBuf::from("/tmp/x.db"),
        };
        assert_eq!(db.url(), "sqlite:/tmp/x.db?mode=rwc");
    }
}
