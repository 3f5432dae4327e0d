// Core algorithm exports
pub mod assembler;
pub mod chunker;
pub mod error;
pub mod matcher;
pub mod templates;
pub mod tournament;
pub mod validation;

pub use assembler::assemble;
pub use chunker::{chunk, chunk_count, ChunkSize, DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
pub use error::{ConfigurationError, MatchError, ValidationError};
pub use matcher::Matcher;
pub use templates::{PromptStyle, PromptTemplate, TemplateRegistry};
pub use tournament::{RoundReport, TournamentEngine, TournamentOutcome, TournamentPolicy};
pub use validation::validate_request;
