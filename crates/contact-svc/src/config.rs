//! Configuration management for the contact service.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use contact_common::constants::{
    DEFAULT_CHALLENGE_TTL_SECS, DEFAULT_LISTEN_ADDR, DEFAULT_RATE_LIMIT, DEFAULT_RATE_PERIOD_SECS,
    DEFAULT_REQUEST_DELAY_MS, DEFAULT_SUBJECT, DEFAULT_TOKEN_TTL_SECS, SENDGRID_API_URL,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Signing secret (ephemeral if unset)
    #[serde(default)]
    pub secret: Option<String>,

    /// Artificial delay before each protocol request is handled
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Token validity windows
    #[serde(default)]
    pub token: TokenConfig,

    /// Quiz challenge configuration
    #[serde(default)]
    pub challenge: ChallengeConfig,

    /// Mail delivery configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Token validity windows
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Verified token validity in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Challenge token validity in seconds
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
            challenge_ttl_secs: default_challenge_ttl(),
        }
    }
}

/// Quiz challenge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Ask a question before issuing a verified token
    #[serde(default)]
    pub enabled: bool,

    /// JSON question file
    #[serde(default = "default_questions_path")]
    pub questions_path: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            questions_path: default_questions_path(),
        }
    }
}

/// Mail delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Actually send mail (otherwise submissions are only logged)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_email")]
    pub from: String,

    #[serde(default = "default_email")]
    pub to: String,

    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: default_email(),
            to: default_email(),
            subject: default_subject(),
            sendgrid_api_key: String::new(),
            api_url: default_api_url(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed per operation per period, across all clients
    #[serde(default = "default_rate_limit")]
    pub limit: u32,

    /// Period length in seconds
    #[serde(default = "default_rate_period")]
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            period_secs: default_rate_period(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_delay_ms() -> u64 { DEFAULT_REQUEST_DELAY_MS }
fn default_token_ttl() -> u64 { DEFAULT_TOKEN_TTL_SECS }
fn default_challenge_ttl() -> u64 { DEFAULT_CHALLENGE_TTL_SECS }
fn default_questions_path() -> String { "config/questions.json".to_string() }
fn default_email() -> String { "test@example.com".to_string() }
fn default_subject() -> String { DEFAULT_SUBJECT.to_string() }
fn default_api_url() -> String { SENDGRID_API_URL.to_string() }
fn default_rate_limit() -> u32 { DEFAULT_RATE_LIMIT }
fn default_rate_period() -> u64 { DEFAULT_RATE_PERIOD_SECS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    fn from_file(config_path: &str) -> Result<Self> {
        if !Path::new(config_path).exists() {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .build()
            .context("Failed to load config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }

    fn apply_overrides(&mut self, args: &super::Args) {
        if let Some(ref listen) = args.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(ref secret) = args.verification_secret {
            self.secret = Some(secret.trim().to_string());
        }
        if let Some(ref key) = args.sendgrid_api_key {
            self.mail.sendgrid_api_key = key.clone();
        }
        if let Some(ref from) = args.from_email {
            self.mail.from = from.clone();
        }
        if let Some(ref to) = args.to_email {
            self.mail.to = to.clone();
        }
        if let Some(ref subject) = args.subject {
            self.mail.subject = subject.clone();
        }
        if let Some(ref questions) = args.questions {
            self.challenge.questions_path = questions.clone();
        }
        if args.enable_send {
            self.mail.enabled = true;
        }
        if args.enable_quiz {
            self.challenge.enabled = true;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.mail.enabled && self.mail.sendgrid_api_key.is_empty() {
            anyhow::bail!("Mail sending is enabled but no SendGrid API key is configured");
        }
        if self.rate_limit.limit == 0 {
            anyhow::bail!("rate_limit.limit must be positive");
        }
        if self.rate_limit.period_secs == 0 {
            anyhow::bail!("rate_limit.period_secs must be positive");
        }
        Ok(())
    }

    /// Configured secret, ignoring blank values
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.trim().is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            secret: None,
            request_delay_ms: default_request_delay_ms(),
            token: TokenConfig::default(),
            challenge: ChallengeConfig::default(),
            mail: MailConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}
