//! Keyed signing over text payloads.
//!
//! Construction: `digest = hex(SHA-256(salt ":" payload ":" secret))`.
//! On the wire a signature travels as `salt:digest`.

use contact_common::constants::{PAYLOAD_DELIMITER, SALT_ALPHABET, SALT_LENGTH};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// Join payload fields with the fixed delimiter
pub fn payload<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(PAYLOAD_DELIMITER);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Salt and digest pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub salt: String,
    pub digest: String,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.salt, PAYLOAD_DELIMITER, self.digest)
    }
}

/// A string that is not `salt:digest`
#[derive(Debug, thiserror::Error)]
#[error("malformed signature")]
pub struct MalformedSignature;

impl FromStr for Signature {
    type Err = MalformedSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (salt, digest) = s.split_once(PAYLOAD_DELIMITER).ok_or(MalformedSignature)?;
        if salt.is_empty() || digest.is_empty() {
            return Err(MalformedSignature);
        }
        Ok(Self {
            salt: salt.to_string(),
            digest: digest.to_string(),
        })
    }
}

/// Signs and checks payloads with the process-wide secret
pub struct Signer {
    secret: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Random secret for deployments that did not configure one.
    ///
    /// Tokens stop verifying after a restart and across instances.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);
        Self::new(hex::encode(bytes))
    }

    /// Sign a payload under a fresh salt
    pub fn sign(&self, payload: &str) -> Signature {
        let salt = generate_salt();
        let digest = self.digest(&salt, payload);
        Signature { salt, digest }
    }

    /// Check a signature against a payload
    pub fn verify(&self, signature: &Signature, payload: &str) -> bool {
        let expected = self.digest(&signature.salt, payload);
        expected.as_bytes().ct_eq(signature.digest.as_bytes()).into()
    }

    /// Check a wire-form signature; anything unparseable is invalid
    pub fn verify_encoded(&self, signature: &str, payload: &str) -> bool {
        match signature.parse::<Signature>() {
            Ok(sig) => self.verify(&sig, payload),
            Err(_) => false,
        }
    }

    fn digest(&self, salt: &str, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update([PAYLOAD_DELIMITER as u8]);
        hasher.update(payload.as_bytes());
        hasher.update([PAYLOAD_DELIMITER as u8]);
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn generate_salt() -> String {
    let mut rng = rand::rng();
    (0..SALT_LENGTH)
        .map(|_| SALT_ALPHABET[rng.random_range(0..SALT_ALPHABET.len())] as char)
        .collect()
}
