//! Tournament elimination over a candidate vocabulary
//!
//! The judge only ever sees one bounded chunk at a time. Each round chunks the
//! current pool, asks the judge for one champion per chunk (concurrently), and
//! the surviving champions form the next pool. A round of `n` candidates yields
//! at most `ceil(n / chunk_size)` survivors, so a pool larger than the chunk
//! size always shrinks and a pool that fits one chunk finishes in that round.

use futures::future::join_all;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{JudgeSettings, TournamentSettings};
use crate::core::chunker::{chunk, ChunkSize};
use crate::core::error::{ConfigurationError, MatchError};
use crate::core::templates::{PromptStyle, PromptTemplate};
use crate::models::Category;
use crate::services::{parse_judgment, Judge, JudgeCall, JudgeError, Verdict};

/// Engine limits: chunking, retries, per-call timeout and the round cap
#[derive(Debug, Clone)]
pub struct TournamentPolicy {
    pub chunk_size: ChunkSize,
    /// Total attempts per judge call for transient failures (1 = no retry)
    pub max_attempts: u32,
    pub call_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Rounds after which the first remaining survivor wins outright
    pub max_rounds: usize,
}

impl Default for TournamentPolicy {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            max_attempts: 3,
            call_timeout: Duration::from_secs(120),
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(5),
            max_rounds: 16,
        }
    }
}

impl TournamentPolicy {
    pub fn from_settings(
        tournament: &TournamentSettings,
        judge: &JudgeSettings,
    ) -> Result<Self, ConfigurationError> {
        if tournament.max_attempts == 0 {
            return Err(ConfigurationError::ZeroAttempts);
        }
        if tournament.max_rounds == 0 {
            return Err(ConfigurationError::ZeroRounds);
        }

        Ok(Self {
            chunk_size: ChunkSize::new(tournament.chunk_size)?,
            max_attempts: tournament.max_attempts,
            call_timeout: Duration::from_secs(judge.call_timeout_secs),
            backoff_base: Duration::from_millis(tournament.backoff_base_ms),
            backoff_max: Duration::from_millis(tournament.backoff_max_ms),
            max_rounds: tournament.max_rounds,
        })
    }

    /// Capped exponential backoff with jitter in `[d/2, d]`
    fn backoff(&self, retry: u32) -> Duration {
        let exp = self
            .backoff_base
            .saturating_mul(1u32 << retry.saturating_sub(1).min(16));
        let capped_ms = exp.min(self.backoff_max).as_millis() as u64;
        if capped_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(capped_ms / 2..=capped_ms))
    }
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub round: usize,
    pub pool_size: usize,
    pub chunk_sizes: Vec<usize>,
    pub survivors: usize,
    /// Chunks whose judge calls failed after all attempts
    pub failed_chunks: usize,
    /// Chunks whose answers stayed malformed after the strict re-ask
    pub malformed_chunks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentOutcome {
    pub winner: Option<String>,
    pub rounds: Vec<RoundReport>,
}

impl TournamentOutcome {
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

#[derive(Debug)]
enum ChunkVerdict {
    Champion(String),
    NoMatch,
    Malformed,
    Failed(JudgeError),
}

/// Runs elimination tournaments against a shared judge
#[derive(Clone)]
pub struct TournamentEngine {
    judge: Arc<dyn Judge>,
    policy: TournamentPolicy,
}

impl TournamentEngine {
    pub fn new(judge: Arc<dyn Judge>, policy: TournamentPolicy) -> Self {
        Self { judge, policy }
    }

    pub fn policy(&self) -> &TournamentPolicy {
        &self.policy
    }

    pub fn judge(&self) -> &Arc<dyn Judge> {
        &self.judge
    }

    /// Pick the best candidate for `term`, or `None` if nothing was judged acceptable
    ///
    /// A single candidate still goes through one judge call. Fails only when
    /// every chunk of some round exhausted its judge attempts, i.e. the round
    /// could establish neither a champion nor a legitimate "no match".
    pub async fn resolve(
        &self,
        term: &str,
        candidates: &[String],
        template: &PromptTemplate,
    ) -> Result<TournamentOutcome, MatchError> {
        let category = template.category();
        let mut outcome = TournamentOutcome::default();

        if candidates.is_empty() {
            debug!(category = %category, "No candidates, nothing to judge");
            return Ok(outcome);
        }

        let mut pool = candidates.to_vec();
        loop {
            let round = outcome.rounds.len() + 1;
            let (report, mut survivors, failure) = self.play_round(term, &pool, template, round).await;

            info!(
                category = %category,
                round,
                pool_size = report.pool_size,
                chunks = report.chunk_sizes.len(),
                survivors = report.survivors,
                failed = report.failed_chunks,
                malformed = report.malformed_chunks,
                "Tournament round complete"
            );

            let all_failed = report.failed_chunks == report.chunk_sizes.len();
            outcome.rounds.push(report);

            if all_failed {
                if let Some(source) = failure {
                    return Err(MatchError::JudgeExhausted { category, round, source });
                }
            }

            match survivors.len() {
                0 => return Ok(outcome),
                1 => {
                    outcome.winner = survivors.pop();
                    return Ok(outcome);
                }
                n if round >= self.policy.max_rounds => {
                    warn!(
                        category = %category,
                        round,
                        survivors = n,
                        "Round limit reached, taking first survivor"
                    );
                    outcome.winner = survivors.into_iter().next();
                    return Ok(outcome);
                }
                _ => pool = survivors,
            }
        }
    }

    /// Judge every chunk of `pool` concurrently; champions are de-duplicated in chunk order
    async fn play_round(
        &self,
        term: &str,
        pool: &[String],
        template: &PromptTemplate,
        round: usize,
    ) -> (RoundReport, Vec<String>, Option<JudgeError>) {
        let chunks = chunk(pool, self.policy.chunk_size);
        let verdicts = join_all(
            chunks
                .iter()
                .enumerate()
                .map(|(index, c)| self.judge_chunk(term, c, template, round, index)),
        )
        .await;

        let mut report = RoundReport {
            round,
            pool_size: pool.len(),
            chunk_sizes: chunks.iter().map(|c| c.len()).collect(),
            survivors: 0,
            failed_chunks: 0,
            malformed_chunks: 0,
        };
        let mut seen = HashSet::new();
        let mut survivors = Vec::new();
        let mut failure = None;

        for verdict in verdicts {
            match verdict {
                ChunkVerdict::Champion(champion) => {
                    if seen.insert(champion.clone()) {
                        survivors.push(champion);
                    }
                }
                ChunkVerdict::NoMatch => {}
                ChunkVerdict::Malformed => report.malformed_chunks += 1,
                ChunkVerdict::Failed(e) => {
                    report.failed_chunks += 1;
                    failure = Some(e);
                }
            }
        }
        report.survivors = survivors.len();

        (report, survivors, failure)
    }

    async fn judge_chunk(
        &self,
        term: &str,
        candidates: &[String],
        template: &PromptTemplate,
        round: usize,
        index: usize,
    ) -> ChunkVerdict {
        let category = template.category();
        let mut attempt = 0;

        for style in [PromptStyle::Standard, PromptStyle::Strict] {
            let instruction = template.render(term, candidates, style);
            let raw = match self.call_with_retry(category, term, candidates, &instruction, &mut attempt).await {
                Ok(raw) => raw,
                // The judge already answered once; a failed re-ask leaves the chunk without a champion
                Err(_) if style == PromptStyle::Strict => return ChunkVerdict::Malformed,
                Err(e) => {
                    warn!(category = %category, round, chunk = index, error = %e, "Judge call failed");
                    return ChunkVerdict::Failed(e);
                }
            };

            match parse_judgment(&raw, candidates, category.actual_key()) {
                Ok(Verdict::Pick(i)) => {
                    if let Some(champion) = candidates.get(i) {
                        debug!(category = %category, round, chunk = index, champion = %champion, "Chunk champion");
                        return ChunkVerdict::Champion(champion.clone());
                    }
                    return ChunkVerdict::Malformed;
                }
                Ok(Verdict::NoMatch) => {
                    debug!(category = %category, round, chunk = index, "No acceptable match in chunk");
                    return ChunkVerdict::NoMatch;
                }
                Err(e) => {
                    warn!(
                        category = %category,
                        round,
                        chunk = index,
                        attempt,
                        error = %e,
                        "Malformed judgment, discarding"
                    );
                }
            }
        }

        ChunkVerdict::Malformed
    }

    async fn call_with_retry(
        &self,
        category: Category,
        term: &str,
        candidates: &[String],
        instruction: &str,
        attempt: &mut u32,
    ) -> Result<String, JudgeError> {
        let mut tries = 0;

        loop {
            tries += 1;
            *attempt += 1;

            let call = JudgeCall {
                category,
                term,
                chunk: candidates,
                instruction,
                attempt: *attempt,
            };

            let result = match tokio::time::timeout(self.policy.call_timeout, self.judge.judge(&call)).await {
                Ok(result) => result,
                Err(_) => Err(JudgeError::Timeout(self.policy.call_timeout)),
            };

            match result {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_transient() && tries < self.policy.max_attempts => {
                    let backoff = self.policy.backoff(tries);
                    warn!(
                        category = %category,
                        error = %e,
                        retry = tries,
                        max_attempts = self.policy.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying judge call"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
