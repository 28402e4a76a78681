//! sshvanity Pattern Matching Engine
//!
//! Pattern types: contains (default), prefix, suffix, regex. All of them are applied to
//! the full `ssh-ed25519 <base64>` line.

mod matcher;
mod difficulty;

pub use matcher::{Pattern, PatternError, PatternMatcher, PatternType, MAX_PATTERN_LEN, VALID_CHARS};
pub use difficulty::{calculate_difficulty, estimate_time_50pct, format_difficulty, format_duration};
