//! Single-worker search session

use rand_core::{CryptoRng, OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sshvanity_crypto::KeyPair;
use sshvanity_pattern::{Pattern, PatternMatcher};

use crate::error::SearchError;

/// Lifecycle of a [`SearchSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No match yet; more batches may be run
    Ready,
    /// The last batch returned a match. Further batches keep searching.
    Found,
    /// The random source failed; every further batch fails
    Failed,
}

/// Owns a validated pattern set, an attempt counter and a random source.
///
/// Attempts only advance inside [`run_batch`](Self::run_batch). Cancellation is
/// cooperative: the caller stops calling `run_batch`; a running batch is never
/// interrupted mid-candidate.
pub struct SearchSession<R = OsRng> {
    matcher: PatternMatcher,
    attempts: u64,
    state: SessionState,
    failure: Option<String>,
    rng: R,
}

impl SearchSession<OsRng> {
    /// Case-sensitive substring search for any of `patterns`
    pub fn new<I, S>(patterns: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_patterns(patterns.into_iter().map(Pattern::contains).collect())
    }

    pub fn from_patterns(patterns: Vec<Pattern>) -> Result<Self, SearchError> {
        Self::with_rng(patterns, OsRng)
    }
}

impl<R> SearchSession<R>
where
    R: RngCore + CryptoRng,
{
    /// Build a session drawing keys from `rng`.
    ///
    /// Every pattern is validated, not just the first.
    pub fn with_rng(patterns: Vec<Pattern>, rng: R) -> Result<Self, SearchError> {
        let matcher = PatternMatcher::new(patterns)?;
        debug!(patterns = matcher.patterns().len(), "search session created");

        Ok(Self {
            matcher,
            attempts: 0,
            state: SessionState::Ready,
            failure: None,
            rng,
        })
    }

    /// Try up to `batch_size` fresh keypairs.
    ///
    /// Returns the first keypair whose encoded public key matches any pattern,
    /// leaving the rest of the batch unrun, or `None` once the batch is exhausted.
    /// Non-matching candidates are dropped as soon as they are tested, which
    /// wipes their secret key.
    pub fn run_batch(&mut self, batch_size: u32) -> Result<Option<KeyPair>, SearchError> {
        if batch_size == 0 {
            return Err(SearchError::InvalidBatchSize);
        }
        if let Some(reason) = &self.failure {
            return Err(SearchError::EntropyUnavailable(reason.clone()));
        }

        for _ in 0..batch_size {
            let keypair = match KeyPair::generate_with(&mut self.rng) {
                Ok(keypair) => keypair,
                Err(e) => return Err(self.fail(e.to_string())),
            };
            self.attempts = self.attempts.saturating_add(1);

            let encoded = keypair.public_key_openssh();
            if self.matcher.matches(encoded.as_str()).is_some() {
                self.state = SessionState::Found;
                info!(
                    attempts = self.attempts,
                    fingerprint = %keypair.fingerprint(),
                    "matching key found"
                );
                return Ok(Some(keypair));
            }
        }

        Ok(None)
    }

    fn fail(&mut self, reason: String) -> SearchError {
        warn!(attempts = self.attempts, %reason, "random source failed, session unusable");
        self.state = SessionState::Failed;
        self.failure = Some(reason.clone());
        SearchError::EntropyUnavailable(reason)
    }
}

impl<R> SearchSession<R> {
    /// Total candidates generated so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// False once the random source has failed
    pub fn is_usable(&self) -> bool {
        self.state != SessionState::Failed
    }

    pub fn patterns(&self) -> &[Pattern] {
        self.matcher.patterns()
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }
}
