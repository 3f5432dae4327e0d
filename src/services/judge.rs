//! Judge interface: the opaque language-model capability that picks one
//! candidate out of a bounded chunk, or none.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::Category;

/// Errors raised by a judge backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    #[error("judge call timed out after {0:?}")]
    Timeout(Duration),

    #[error("judge unavailable: {0}")]
    Unavailable(String),

    #[error("judge rejected the call with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid judge response: {0}")]
    InvalidResponse(String),
}

impl JudgeError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            JudgeError::Timeout(_) | JudgeError::Unavailable(_) | JudgeError::InvalidResponse(_) => true,
            JudgeError::Rejected { .. } => false,
        }
    }
}

/// One judge invocation: a term, a bounded chunk and the rendered instruction
#[derive(Debug, Clone)]
pub struct JudgeCall<'a> {
    pub category: Category,
    pub term: &'a str,
    pub chunk: &'a [String],
    pub instruction: &'a str,
    /// 1-based attempt number for this chunk, across transient and malformed retries
    pub attempt: u32,
}

/// Semantic matching capability consulted once per chunk
///
/// Implementations return the model's raw answer; interpretation against the
/// chunk happens in [`parse_judgment`].
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, call: &JudgeCall<'_>) -> Result<String, JudgeError>;

    fn name(&self) -> &str;

    async fn health_check(&self) -> bool {
        true
    }
}

/// Interpreted judge answer for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Index into the chunk of the selected candidate
    Pick(usize),
    NoMatch,
}

/// A judge answer that is neither a chunk entry nor an explicit "none"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedJudgment {
    #[error("answer '{0}' is not one of the offered candidates")]
    NotInChunk(String),

    #[error("answer could not be parsed: {0}")]
    Unparseable(String),
}

const NONE_LITERALS: [&str; 2] = ["null", "none"];

/// Interpret a raw judge answer against the chunk it was given
///
/// Accepts the `{"<category>_actual": "..."}` object the templates ask for, an
/// object with a single string value, a bare JSON string, or plain text. Only an
/// exact chunk entry can win.
pub fn parse_judgment(raw: &str, chunk: &[String], actual_key: &str) -> Result<Verdict, MalformedJudgment> {
    let text = strip_code_fence(raw.trim());

    let answer = match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => return Ok(Verdict::NoMatch),
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => {
            let keyed = map.get(actual_key).cloned();
            let value = match keyed {
                Some(v) => v,
                None if map.len() == 1 => map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
                None => return Err(MalformedJudgment::Unparseable(truncate(text))),
            };
            match value {
                Value::String(s) => s,
                Value::Null => return Ok(Verdict::NoMatch),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(MalformedJudgment::Unparseable(truncate(text))),
            }
        }
        // Bare scalars such as `42` may still be literal candidates
        Ok(Value::Number(_) | Value::Bool(_)) => text.to_string(),
        Ok(_) => return Err(MalformedJudgment::Unparseable(truncate(text))),
        Err(_) if text.starts_with('{') || text.starts_with('[') => {
            return Err(MalformedJudgment::Unparseable(truncate(text)));
        }
        Err(_) => text.trim_matches(|c| c == '"' || c == '\'').to_string(),
    };

    resolve_answer(answer.trim(), chunk)
}

fn resolve_answer(answer: &str, chunk: &[String]) -> Result<Verdict, MalformedJudgment> {
    if let Some(index) = chunk.iter().position(|c| c == answer) {
        return Ok(Verdict::Pick(index));
    }
    if answer.is_empty() || NONE_LITERALS.iter().any(|lit| answer.eq_ignore_ascii_case(lit)) {
        return Ok(Verdict::NoMatch);
    }
    Err(MalformedJudgment::NotInChunk(truncate(answer)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
