//! Multi-threaded vanity search driver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sshvanity_crypto::KeyPair;
use sshvanity_pattern::{Pattern, PatternMatcher};

use crate::error::SearchError;
use crate::session::SearchSession;
use crate::stats::SearchStats;

/// How often the coordinating thread reports progress
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of threads (0 = auto)
    pub threads: usize,
    /// Candidates per batch; bounds how long a stop request takes to land
    pub batch_size: u32,
    /// Maximum attempts (0 = unlimited)
    pub max_attempts: u64,
    /// Maximum time in seconds (0 = unlimited)
    pub max_time_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size: 1000,
            max_attempts: 0,
            max_time_secs: 0,
        }
    }
}

impl SearchConfig {
    /// Resolved worker count
    pub fn thread_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.batch_size == 0 {
            return Err(SearchError::InvalidBatchSize);
        }
        Ok(())
    }

    fn limits_reached(&self, stats: &SearchStats) -> bool {
        (self.max_attempts > 0 && stats.total_keys() >= self.max_attempts)
            || (self.max_time_secs > 0 && stats.elapsed().as_secs() >= self.max_time_secs)
    }
}

/// Search result
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matching keypair
    pub keypair: KeyPair,
    /// Pattern that was matched
    pub pattern: Pattern,
    /// Total keys tested across all workers
    pub keys_tested: u64,
    /// Time taken in seconds
    pub time_secs: f64,
    /// Keys per second achieved
    pub keys_per_second: f64,
}

/// Parallel vanity search.
///
/// Each worker owns an independent [`SearchSession`]; the only shared state is the
/// statistics counter and the stop flag. The first match delivered to the
/// coordinating thread wins.
pub struct VanitySearch {
    matcher: PatternMatcher,
    config: SearchConfig,
    difficulty: f64,
    stop_flag: Arc<AtomicBool>,
}

impl VanitySearch {
    /// Create a new vanity search, validating patterns and config up front
    pub fn new(patterns: Vec<Pattern>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let matcher = PatternMatcher::new(patterns)?;

        // Any pattern may match: the per-key success chances add up. A regex has
        // no estimate, which leaves the whole set unknown (NaN).
        let rate: f64 = matcher.patterns().iter().map(|p| 1.0 / p.difficulty()).sum();
        let difficulty = if rate.is_nan() {
            f64::NAN
        } else if rate > 0.0 {
            1.0 / rate
        } else {
            f64::INFINITY
        };

        Ok(Self {
            matcher,
            config,
            difficulty,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Expected attempts to find a match for any pattern
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn patterns(&self) -> &[Pattern] {
        self.matcher.patterns()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Flag that stops the search at the next batch boundary when set
    /// (e.g. from a Ctrl-C handler)
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Run the search (blocking until found, stopped, or limits reached)
    pub fn run(&self) -> Result<Option<SearchResult>, SearchError> {
        self.run_with_callback(|_| {})
    }

    /// Run the search, calling `callback` with live statistics roughly every 100ms
    pub fn run_with_callback<F>(&self, mut callback: F) -> Result<Option<SearchResult>, SearchError>
    where
        F: FnMut(&SearchStats),
    {
        let stats = SearchStats::new();
        let (tx, rx) = bounded::<Result<KeyPair, SearchError>>(1);

        let num_threads = self.config.thread_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("sshvanity-worker-{}", i))
            .build()
            .map_err(|e| SearchError::WorkerPool(e.to_string()))?;

        info!(
            threads = num_threads,
            batch_size = self.config.batch_size,
            patterns = self.matcher.patterns().len(),
            "starting search"
        );

        let patterns = self.matcher.patterns().to_vec();
        let config = self.config.clone();
        let stats_for_search = stats.clone();
        let stop_flag = self.stop_flag.clone();

        let search_handle = thread::spawn(move || {
            pool.install(|| {
                (0..num_threads).into_par_iter().for_each(|worker| {
                    run_worker(worker, &patterns, &config, &stats_for_search, &stop_flag, &tx);
                });
            });
        });

        // Ends when a worker reports, or every worker has exited and dropped `tx`
        let outcome = loop {
            match rx.recv_timeout(PROGRESS_INTERVAL) {
                Ok(outcome) => break Some(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    if self.stop_flag.load(Ordering::Relaxed) {
                        stats.stop();
                    }
                    callback(&stats);
                }
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        stats.stop();
        if search_handle.join().is_err() {
            warn!("search thread panicked");
        }
        callback(&stats);

        match outcome {
            Some(Ok(keypair)) => Ok(Some(self.build_result(keypair, &stats))),
            Some(Err(e)) => Err(e),
            None => {
                info!(keys_tested = stats.total_keys(), "search ended without a match");
                Ok(None)
            }
        }
    }

    fn build_result(&self, keypair: KeyPair, stats: &SearchStats) -> SearchResult {
        // Workers only send keys that matched, so a pattern is always found here
        let index = self
            .matcher
            .matches(keypair.public_key_openssh().as_str())
            .unwrap_or(0);

        SearchResult {
            pattern: self.matcher.patterns()[index].clone(),
            keypair,
            keys_tested: stats.total_keys(),
            time_secs: stats.elapsed().as_secs_f64(),
            keys_per_second: stats.keys_per_second(),
        }
    }
}

/// One worker: run batches on a private session until a match, an error, a stop
/// request, or a configured limit.
fn run_worker(
    worker: usize,
    patterns: &[Pattern],
    config: &SearchConfig,
    stats: &SearchStats,
    stop_flag: &AtomicBool,
    tx: &Sender<Result<KeyPair, SearchError>>,
) {
    let mut session = match SearchSession::from_patterns(patterns.to_vec()) {
        Ok(session) => session,
        Err(e) => {
            let _ = tx.try_send(Err(e));
            stats.stop();
            return;
        }
    };

    while stats.is_running() && !stop_flag.load(Ordering::Relaxed) {
        if config.limits_reached(stats) {
            debug!(worker, "search limit reached");
            stats.stop();
            break;
        }

        let before = session.attempts();
        let outcome = session.run_batch(config.batch_size);
        stats.add_keys(session.attempts() - before);

        match outcome {
            Ok(None) => {}
            Ok(Some(keypair)) => {
                // Only the first match is delivered; later ones are dropped
                if tx.try_send(Ok(keypair)).is_ok() {
                    debug!(worker, "match delivered");
                    stats.mark_found();
                }
                return;
            }
            Err(e) => {
                warn!(worker, error = %e, "worker stopped");
                let _ = tx.try_send(Err(e));
                stats.stop();
                return;
            }
        }
    }
}
