// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Category, CategoryMatch, CategoryQuery, MATCHER_VERSION};
pub use requests::MatchRequest;
pub use responses::{ErrorResponse, HealthResponse, MatchResponse};
