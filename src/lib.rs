//! GAME Matcher - LLM-judged matching of biological descriptors
//!
//! This library resolves free-text cell type, species and binding molecule
//! descriptors to the best entry of a caller-supplied vocabulary. A language
//! model judges small chunks of candidates; a tournament of elimination rounds
//! turns those bounded judgments into a single winner per category.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchError, TemplateRegistry, TournamentEngine, TournamentPolicy, ValidationError};
pub use models::{Category, MatchRequest, MatchResponse, MATCHER_VERSION};
pub use services::{Judge, JudgeCall, JudgeError, OllamaJudge};
