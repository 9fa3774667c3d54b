//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::challenge::QuestionBank;
use crate::config::AppConfig;
use crate::flow::{ContactFlow, Envelope};
use crate::mail::SendGridMailer;
use crate::ratelimit::GlobalRateLimiter;
use crate::signing::{ExpiryCodec, Signer, SystemClock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Verification protocol
    pub flow: Arc<ContactFlow>,
}

impl AppState {
    /// Build the protocol services from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let signer = match config.secret() {
            Some(secret) => Signer::new(secret),
            None => {
                tracing::warn!("No verification secret configured, using an ephemeral one");
                Signer::ephemeral()
            }
        };

        let limiter = Arc::new(GlobalRateLimiter::new(
            config.rate_limit.limit,
            Duration::from_secs(config.rate_limit.period_secs),
        ));

        let mut flow = ContactFlow::new(signer, ExpiryCodec::new(Arc::new(SystemClock)), limiter)
            .with_windows(config.token.token_ttl_secs, config.token.challenge_ttl_secs)
            .with_delay(Duration::from_millis(config.request_delay_ms));

        if config.challenge.enabled {
            let bank = QuestionBank::load(&config.challenge.questions_path)
                .context("Failed to load challenge questions")?;
            tracing::info!(
                questions = bank.len(),
                path = %config.challenge.questions_path,
                "Quiz challenge enabled"
            );
            flow = flow.with_challenges(bank);
        }

        if config.mail.enabled {
            let mailer = SendGridMailer::new(&config.mail.api_url, &config.mail.sendgrid_api_key)?;
            let envelope = Envelope {
                from: config.mail.from.clone(),
                to: config.mail.to.clone(),
                subject: config.mail.subject.clone(),
            };
            tracing::info!(to = %envelope.to, "Mail delivery enabled");
            flow = flow.with_mailer(Arc::new(mailer), envelope);
        } else {
            tracing::warn!("Mail delivery disabled, submissions will only be logged");
        }

        Ok(Self::with_flow(config, flow))
    }

    pub fn with_flow(config: AppConfig, flow: ContactFlow) -> Self {
        Self {
            config,
            flow: Arc::new(flow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_defaults() {
        let state = AppState::new(AppConfig::default()).unwrap();
        assert!(!state.flow.challenge_enabled());
        assert!(!state.flow.delivery_enabled());
    }

    #[test]
    fn test_missing_question_file_is_fatal() {
        let mut config = AppConfig::default();
        config.challenge.enabled = true;
        config.challenge.questions_path = "/nonexistent/questions.json".into();
        assert!(AppState::new(config).is_err());
    }

    #[test]
    fn test_challenge_and_mail_enabled() {
        let mut config = AppConfig::default();
        config.challenge.enabled = true;
        config.challenge.questions_path =
            concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/questions.json").into();
        config.mail.enabled = true;
        config.mail.sendgrid_api_key = "SG.test".into();

        let state = AppState::new(config).unwrap();
        assert!(state.flow.challenge_enabled());
        assert!(state.flow.delivery_enabled());
    }
}
