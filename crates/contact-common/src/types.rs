//! Wire types for the verification protocol.
//!
//! Every token is echoed back by the client unmodified. The server keeps no
//! copy; validity is a function of the token contents and the server secret.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
}

/// Body of `POST /api/response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub email: String,
    /// The answer the user picked
    pub response: String,
    pub expiry: String,
    pub signature: String,
}

/// Body of `POST /api/submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub email: String,
    pub name: String,
    pub message: String,
    pub expiry: String,
    pub signature: String,
}

/// Proof that `email` passed verification, valid until `expiry`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedToken {
    pub email: String,
    /// Unix seconds, decimal
    pub expiry: String,
    /// `salt:digest` over `expiry:email`
    pub signature: String,
}

/// A quiz question plus the token binding its correct answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeToken {
    pub question: String,
    /// Candidate answers, shuffled per issuance
    pub answers: Vec<String>,
    pub email: String,
    pub expiry: String,
    /// `salt:digest` over `expiry:email:correct_answer`
    pub signature: String,
}

/// Result of the verify step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Quiz enabled: the client must answer before it can submit
    Challenge(ChallengeToken),
    /// Quiz disabled: the client may submit straight away
    Verified(VerifiedToken),
}

impl VerifyOutcome {
    /// Returns true if the client must answer a challenge first
    pub fn requires_action(&self) -> bool {
        matches!(self, Self::Challenge(_))
    }
}

/// JSON error body returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
