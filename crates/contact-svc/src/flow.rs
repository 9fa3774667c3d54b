//! Verification protocol: verify → (respond) → submit.
//!
//! Protocol state lives entirely inside the tokens the client echoes back:
//!
//! ```text
//! quiz on:   UNVERIFIED → CHALLENGE_PENDING → VERIFIED → SUBMITTED
//! quiz off:  UNVERIFIED → VERIFIED → SUBMITTED
//! ```
//!
//! Every signature covers each field the server relied on when issuing it:
//! `expiry:email:answer` for challenges, `expiry:email` for verified tokens.
//! Emails may not contain the `:` delimiter, so the two payload shapes can
//! never collide.

use std::sync::Arc;
use std::time::Duration;

use contact_common::constants::{
    DEFAULT_CHALLENGE_TTL_SECS, DEFAULT_REQUEST_DELAY_MS, DEFAULT_TOKEN_TTL_SECS,
    PAYLOAD_DELIMITER, operations,
};
use contact_common::{
    ChallengeResponse, ChallengeToken, ContactError, Submission, VerifiedToken, VerifyOutcome,
    VerifyRequest,
};

use crate::challenge::QuestionBank;
use crate::mail::{Email, Mailer, render_notice};
use crate::ratelimit::RateLimiter;
use crate::signing::{ExpiryCodec, Signer, payload};

/// Sender, recipient, and subject of notification mail
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
}

/// The protocol orchestrator
pub struct ContactFlow {
    signer: Signer,
    expiry: ExpiryCodec,
    limiter: Arc<dyn RateLimiter>,
    /// Present iff quiz mode is on
    questions: Option<QuestionBank>,
    /// Present iff delivery is enabled
    mailer: Option<(Arc<dyn Mailer>, Envelope)>,
    token_ttl_secs: u64,
    challenge_ttl_secs: u64,
    delay: Duration,
}

impl ContactFlow {
    pub fn new(signer: Signer, expiry: ExpiryCodec, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            signer,
            expiry,
            limiter,
            questions: None,
            mailer: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            challenge_ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
            delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
        }
    }

    /// Require a quiz answer before issuing verified tokens
    pub fn with_challenges(mut self, questions: QuestionBank) -> Self {
        self.questions = Some(questions);
        self
    }

    /// Deliver submissions through `mailer`
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>, envelope: Envelope) -> Self {
        self.mailer = Some((mailer, envelope));
        self
    }

    pub fn with_windows(mut self, token_ttl_secs: u64, challenge_ttl_secs: u64) -> Self {
        self.token_ttl_secs = token_ttl_secs;
        self.challenge_ttl_secs = challenge_ttl_secs;
        self
    }

    /// Artificial delay before every operation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn challenge_enabled(&self) -> bool {
        self.questions.is_some()
    }

    pub fn delivery_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Entry point: issue a challenge or, with the quiz off, a verified token
    pub async fn verify(&self, req: VerifyRequest) -> Result<VerifyOutcome, ContactError> {
        self.throttle().await;
        self.limiter.check(operations::VERIFY)?;
        check_email(&req.email)?;

        let Some(bank) = &self.questions else {
            tracing::info!(email = %req.email, "Verification complete");
            return Ok(VerifyOutcome::Verified(self.mint_verified(req.email)));
        };

        let challenge = bank.pick();
        let expiry = self.expiry.issue(self.challenge_ttl_secs);
        let signature = self
            .signer
            .sign(&payload(&[&expiry, &req.email, &challenge.correct]));

        tracing::info!(
            email = %req.email,
            question = %challenge.question,
            "Issued challenge"
        );

        Ok(VerifyOutcome::Challenge(ChallengeToken {
            question: challenge.question,
            answers: challenge.answers,
            email: req.email,
            expiry,
            signature: signature.to_string(),
        }))
    }

    /// Check a challenge answer and exchange it for a verified token
    pub async fn respond(&self, req: ChallengeResponse) -> Result<VerifiedToken, ContactError> {
        self.throttle().await;
        self.limiter.check(operations::RESPONSE)?;
        check_email(&req.email)?;

        if !self.expiry.check(&req.expiry) {
            tracing::debug!(email = %req.email, "Challenge token expired");
            return Err(ContactError::Gone);
        }

        let data = payload(&[&req.expiry, &req.email, &req.response]);
        if !self.signer.verify_encoded(&req.signature, &data) {
            tracing::info!(email = %req.email, "Challenge response rejected");
            return Err(ContactError::Unauthorized);
        }

        tracing::info!(email = %req.email, "Challenge passed");
        Ok(self.mint_verified(req.email))
    }

    /// Accept a contact submission carrying a verified token
    pub async fn submit(&self, req: Submission) -> Result<(), ContactError> {
        self.throttle().await;
        self.limiter.check(operations::SUBMIT)?;
        check_email(&req.email)?;
        if req.name.trim().is_empty() {
            return Err(ContactError::BadRequest("name is empty".into()));
        }
        if req.message.trim().is_empty() {
            return Err(ContactError::BadRequest("message is empty".into()));
        }

        if !self.expiry.check(&req.expiry) {
            tracing::debug!(email = %req.email, "Verified token expired");
            return Err(ContactError::Gone);
        }
        if !self
            .signer
            .verify_encoded(&req.signature, &payload(&[&req.expiry, &req.email]))
        {
            tracing::info!(email = %req.email, "Submission token rejected");
            return Err(ContactError::Unauthorized);
        }

        let html = render_notice(&req.name, &req.email, &req.message);
        tracing::info!(email = %req.email, name = %req.name, "Contact submission accepted");
        tracing::debug!(html = %html, "Rendered notice");

        let Some((mailer, envelope)) = &self.mailer else {
            tracing::warn!("Mail sending is not enabled, submission not delivered");
            return Ok(());
        };

        let email = Email {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            subject: envelope.subject.clone(),
            html,
        };
        mailer.send(&email).await.map_err(|e| {
            tracing::error!(error = %e, "Mail delivery failed");
            ContactError::Internal("mail delivery failed".into())
        })?;

        tracing::info!(to = %envelope.to, "Submission delivered");
        Ok(())
    }

    /// Liveness probe
    pub async fn status(&self) {
        self.throttle().await;
    }

    fn mint_verified(&self, email: String) -> VerifiedToken {
        let expiry = self.expiry.issue(self.token_ttl_secs);
        let signature = self.signer.sign(&payload(&[&expiry, &email]));
        VerifiedToken {
            email,
            expiry,
            signature: signature.to_string(),
        }
    }

    /// Sleep for the configured artificial delay
    pub async fn throttle(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn check_email(email: &str) -> Result<(), ContactError> {
    if email.trim().is_empty() {
        return Err(ContactError::BadRequest("email is empty".into()));
    }
    if !email.contains('@') {
        return Err(ContactError::BadRequest("email has no @".into()));
    }
    if email.contains(PAYLOAD_DELIMITER) {
        return Err(ContactError::BadRequest("email contains delimiter".into()));
    }
    Ok(())
}
