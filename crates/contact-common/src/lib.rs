//! # Contact Common
//!
//! Shared types and utilities used by the contact service and its clients.
//!
//! ## Modules
//! - `types` - Wire structures for the verify/response/submit protocol
//! - `error` - Error taxonomy with HTTP status mapping
//! - `constants` - Shared defaults and payload delimiter

pub mod constants;
pub mod error;
pub mod types;

pub use error::ContactError;
pub use types::*;
