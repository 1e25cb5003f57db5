use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::util::{env_flag, env_override_usize, is_local_endpoint_url};

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 50;
pub const DEFAULT_MAX_CONTEXT_FILES: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub max_history_messages: usize,
    pub max_context_files: usize,
    pub skip_staging: bool,
    pub working_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url =
            std::env::var("DEEPSEEK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("DEEPSEEK_API_KEY").ok().and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v)
            }
        });
        let model = std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = env_override_usize(
            "SEEK_MAX_TOKENS",
            DEFAULT_MAX_TOKENS as usize,
            256,
            32_768,
        ) as u32;

        Ok(Self {
            api_key,
            model,
            api_url,
            max_tokens,
            max_history_messages: env_override_usize(
                "SEEK_MAX_HISTORY_MESSAGES",
                DEFAULT_MAX_HISTORY_MESSAGES,
                8,
                400,
            ),
            max_context_files: env_override_usize(
                "SEEK_MAX_CONTEXT_FILES",
                DEFAULT_MAX_CONTEXT_FILES,
                1,
                50,
            ),
            skip_staging: env_flag("SEEK_SKIP_STAGING", false),
            working_dir: std::env::current_dir()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid DEEPSEEK_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.api_key.is_none() {
            bail!(
                "DEEPSEEK_API_KEY must be set for non-local endpoints (url: '{}')",
                self.api_url
            );
        }

        if self.model.trim().is_empty() {
            bail!("Model name must not be empty");
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_defaults_and_overrides() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::remove_var("DEEPSEEK_API_URL");
        std::env::remove_var("DEEPSEEK_MODEL");
        std::env::set_var("DEEPSEEK_API_KEY", "   ");
        std::env::set_var("SEEK_MAX_HISTORY_MESSAGES", "2");
        std::env::set_var("SEEK_SKIP_STAGING", "yes");

        let config = Config::load().expect("config should load");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none(), "blank key must count as unset");
        assert_eq!(config.max_history_messages, 8);
        assert_eq!(config.max_context_files, DEFAULT_MAX_CONTEXT_FILES);
        assert!(config.skip_staging);

        std::env::remove_var("DEEPSEEK_API_KEY");
        std::env::remove_var("SEEK_MAX_HISTORY_MESSAGES");
        std::env::remove_var("SEEK_SKIP_STAGING");
    }
}
