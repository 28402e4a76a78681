//! sshvanity Core Engine
//!
//! Batched Ed25519 SSH key search. [`SearchSession`] is the single-worker engine:
//! callers drive it one batch at a time and may stop between batches.
//! [`VanitySearch`] runs one session per thread and aggregates their counters.

mod error;
mod search;
mod session;
mod stats;

pub use error::SearchError;
pub use search::{SearchConfig, SearchResult, VanitySearch};
pub use session::{SearchSession, SessionState};
pub use stats::{SearchStats, StatsSnapshot};

// Re-exports for convenience
pub use sshvanity_crypto::{
    encode_public_key, fingerprint, EncodedPublicKey, KeyError, KeyPair, Zeroizing,
};
pub use sshvanity_pattern::{
    calculate_difficulty, estimate_time_50pct, format_difficulty, format_duration, Pattern,
    PatternError, PatternMatcher, PatternType,
};
