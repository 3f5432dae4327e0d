// Service exports
pub mod judge;
pub mod ollama;

pub use judge::{parse_judgment, Judge, JudgeCall, JudgeError, MalformedJudgment, Verdict};
pub use ollama::OllamaJudge;
