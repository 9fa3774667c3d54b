//! Multiple-choice quiz challenges.
//!
//! The correct answer is never stored server-side between requests. It is
//! bound into the challenge token's signature and re-derived from the
//! client's response.

mod bank;

pub use bank::QuestionBank;

#[cfg(test)]
pub use bank::Question;
