//! Token signing and expiry.
//!
//! Tokens are stateless: a signature over `expiry:email[:answer]` keyed with
//! the server secret. The expiry sits inside the signed payload so a client
//! cannot extend it.

mod expiry;
mod signer;

pub use expiry::{ExpiryCodec, SystemClock};
pub use signer::{Signer, payload};

#[cfg(test)]
pub use expiry::ManualClock;
