//! Shared constants for contact service components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Delimiter joining the fields of a signed payload
pub const PAYLOAD_DELIMITER: char = ':';

/// Number of characters in a signature salt
pub const SALT_LENGTH: usize = 6;

/// Alphabet salts are drawn from
pub const SALT_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Verified token validity (10 minutes)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 600;

/// Challenge token validity (5 minutes)
pub const DEFAULT_CHALLENGE_TTL_SECS: u64 = 300;

/// Artificial delay at the start of every protocol handler
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;

/// Calls allowed per operation within one rate-limit period
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Rate-limit period in seconds
pub const DEFAULT_RATE_PERIOD_SECS: u64 = 60;

/// Default subject line of the notification email
pub const DEFAULT_SUBJECT: &str = "New contact";

/// SendGrid v3 mail endpoint
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Rate-limited operation names
pub mod operations {
    /// Token issuance for an email address
    pub const VERIFY: &str = "verify";

    /// Challenge answer check
    pub const RESPONSE: &str = "response";

    /// Contact submission
    pub const SUBMIT: &str = "submit";
}
