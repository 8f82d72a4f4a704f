//! Configuration module for feedbot.
//!
//! Typed configuration is read from `~/.feedbot/config.json` when that file
//! exists, then overridden by environment variables. The two secrets
//! (`TELEGRAM_BOT_TOKEN`, `FINNHUB_API_KEY`) normally come from the
//! environment only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::commands::{UnknownCommandMode, UnknownCommandPolicy};
use crate::feeds::finnhub::FINNHUB_API_BASE;
use crate::feeds::leetcode::LEETCODE_GRAPHQL_URL;
use crate::feeds::DEFAULT_TIMEOUT;
use crate::format::LEETCODE_SITE_URL;

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_FINNHUB_KEY: &str = "FINNHUB_API_KEY";
pub const ENV_PORT: &str = "PORT";
pub const ENV_UNKNOWN_REPLY: &str = "FEEDBOT_UNKNOWN_COMMAND_REPLY";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub feeds: FeedsConfig,
    pub bot: BotConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Config::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a specific path, without env overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".feedbot")
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = token;
        }
        if let Some(key) = get(ENV_FINNHUB_KEY) {
            self.feeds.finnhub.api_key = key;
        }
        if let Some(port) = get(ENV_PORT) {
            self.gateway.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got {:?}", ENV_PORT, port))?;
        }
        if let Some(reply) = get(ENV_UNKNOWN_REPLY) {
            self.bot.unknown_command = UnknownCommandMode::Reply;
            self.bot.unknown_command_reply = reply;
        }
        Ok(())
    }

    /// Every problem that prevents the bot from starting.
    ///
    /// A missing Finnhub key is not listed: quotes then fail per request.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.telegram.token.trim().is_empty() {
            errors.push(format!(
                "telegram.token is empty (set {} or add it to config.json)",
                ENV_TELEGRAM_TOKEN
            ));
        }
        errors.extend(self.feed_errors());
        if self.bot.unknown_command == UnknownCommandMode::Reply
            && self.bot.unknown_command_reply.trim().is_empty()
        {
            errors.push("bot.unknownCommandReply is required when bot.unknownCommand is \"reply\"".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Problems with the `feeds` section alone, for commands that query the
    /// feeds without starting the bot.
    pub fn validate_feeds(&self) -> Result<(), Vec<String>> {
        let errors = self.feed_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn feed_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.feeds.timeout_seconds == 0 {
            errors.push("feeds.timeoutSeconds must be greater than zero".into());
        }
        for (field, url) in [
            ("feeds.leetcode.graphqlUrl", &self.feeds.leetcode.graphql_url),
            ("feeds.leetcode.siteUrl", &self.feeds.leetcode.site_url),
            ("feeds.finnhub.apiBase", &self.feeds.finnhub.api_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("{} must be an http(s) URL, got {:?}", field, url));
            }
        }
        errors
    }

    pub fn has_finnhub_key(&self) -> bool {
        !self.feeds.finnhub.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.feeds.timeout_seconds)
    }

    pub fn unknown_command_policy(&self) -> UnknownCommandPolicy {
        match self.bot.unknown_command {
            UnknownCommandMode::Silent => UnknownCommandPolicy::Silent,
            UnknownCommandMode::Reply => {
                UnknownCommandPolicy::Reply(self.bot.unknown_command_reply.clone())
            }
        }
    }

    /// Write a starter config. Secrets are left to the environment.
    pub fn write_default_template() -> anyhow::Result<PathBuf> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = serde_json::json!({
            "telegram": {
                "allowFrom": []
            },
            "feeds": {
                "timeoutSeconds": 10
            },
            "bot": {
                "unknownCommand": "silent",
                "unknownCommandReply": "Unknown command. Use /help to see what I can do."
            },
            "gateway": {
                "host": "0.0.0.0",
                "port": 5000
            }
        });

        std::fs::write(&path, serde_json::to_string_pretty(&template)?)?;
        Ok(path)
    }
}

// ── Telegram ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelegramConfig {
    pub token: String,
    /// User ids allowed to use the bot. Empty means everyone.
    pub allow_from: Vec<String>,
}

// ── Feeds ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedsConfig {
    pub timeout_seconds: u64,
    pub leetcode: LeetCodeConfig,
    pub finnhub: FinnhubConfig,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            leetcode: LeetCodeConfig::default(),
            finnhub: FinnhubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeetCodeConfig {
    pub graphql_url: String,
    /// Base of the problem links in replies.
    pub site_url: String,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            graphql_url: LEETCODE_GRAPHQL_URL.into(),
            site_url: LEETCODE_SITE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinnhubConfig {
    pub api_key: String,
    pub api_base: String,
}

impl Default for FinnhubConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: FINNHUB_API_BASE.into(),
        }
    }
}

// ── Bot behaviour ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotConfig {
    pub unknown_command: UnknownCommandMode,
    pub unknown_command_reply: String,
}

// ── Gateway (health endpoint) ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}
