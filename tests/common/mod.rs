// Shared stub judges for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use game_matcher::core::{ChunkSize, Matcher, TemplateRegistry, TournamentEngine, TournamentPolicy};
use game_matcher::models::Category;
use game_matcher::services::{Judge, JudgeCall, JudgeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded judge invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub category: Category,
    pub term: String,
    pub chunk: Vec<String>,
    pub instruction: String,
    pub attempt: u32,
}

type Answer = dyn Fn(&JudgeCall<'_>) -> Result<String, JudgeError> + Send + Sync;

/// Deterministic judge driven by a closure, recording every call
pub struct StubJudge {
    answer: Box<Answer>,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubJudge {
    pub fn new<F>(answer: F) -> Arc<Self>
    where
        F: Fn(&JudgeCall<'_>) -> Result<String, JudgeError> + Send + Sync + 'static,
    {
        Self::with_delay(answer, Duration::ZERO)
    }

    pub fn with_delay<F>(answer: F, delay: Duration) -> Arc<Self>
    where
        F: Fn(&JudgeCall<'_>) -> Result<String, JudgeError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            answer: Box::new(answer),
            delay,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Always answers the given raw text
    pub fn constant(raw: &str) -> Arc<Self> {
        let raw = raw.to_string();
        Self::new(move |_: &JudgeCall<'_>| Ok(raw.clone()))
    }

    /// Picks the first candidate of every chunk
    pub fn first_pick() -> Arc<Self> {
        Self::new(|call: &JudgeCall<'_>| Ok(keyed(call.category, &call.chunk[0])))
    }

    /// Answers from a term -> vocabulary-entry table, `NULL` when the entry is not in the chunk
    pub fn knowledge(table: &[(&str, &str)]) -> Arc<Self> {
        let table: HashMap<String, String> = table
            .iter()
            .map(|(term, answer)| (term.to_string(), answer.to_string()))
            .collect();
        Self::new(move |call: &JudgeCall<'_>| {
            let answer = table
                .get(call.term)
                .filter(|answer| call.chunk.contains(answer))
                .map(String::as_str)
                .unwrap_or("NULL");
            Ok(keyed(call.category, answer))
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for StubJudge {
    async fn judge(&self, call: &JudgeCall<'_>) -> Result<String, JudgeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            category: call.category,
            term: call.term.to_string(),
            chunk: call.chunk.to_vec(),
            instruction: call.instruction.to_string(),
            attempt: call.attempt,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.answer)(call)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Judge output in the format the templates request
pub fn keyed(category: Category, answer: &str) -> String {
    serde_json::json!({ category.actual_key(): answer }).to_string()
}

pub fn test_policy(chunk_size: usize) -> TournamentPolicy {
    TournamentPolicy {
        chunk_size: ChunkSize::new(chunk_size).unwrap(),
        max_attempts: 3,
        call_timeout: Duration::from_secs(5),
        backoff_base: Duration::ZERO,
        backoff_max: Duration::ZERO,
        max_rounds: 16,
    }
}

pub fn matcher_with(judge: Arc<StubJudge>, chunk_size: usize) -> Matcher {
    let engine = TournamentEngine::new(judge, test_policy(chunk_size));
    Matcher::new(engine, Arc::new(TemplateRegistry::standard()))
}

pub fn vocabulary(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}-{:04}", prefix, i)).collect()
}
