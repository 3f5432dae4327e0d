use futures::future::try_join_all;
use std::sync::Arc;

use crate::core::{
    assembler::assemble,
    error::MatchError,
    templates::TemplateRegistry,
    tournament::TournamentEngine,
    validation::validate_request,
};
use crate::models::{CategoryMatch, CategoryQuery, MatchRequest, MatchResponse, MATCHER_VERSION};

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Request validation
/// 2. One tournament per requested category, run concurrently
/// 3. Response assembly
///
/// The registry and engine are built once at startup and shared read-only; a
/// request's pools live only inside its own future, so dropping that future
/// abandons all of its outstanding judge calls.
#[derive(Clone)]
pub struct Matcher {
    engine: TournamentEngine,
    registry: Arc<TemplateRegistry>,
}

impl Matcher {
    pub fn new(engine: TournamentEngine, registry: Arc<TemplateRegistry>) -> Self {
        Self { engine, registry }
    }

    pub fn engine(&self) -> &TournamentEngine {
        &self.engine
    }

    /// Resolve every category in the request and build the response
    pub async fn match_request(&self, request: &MatchRequest) -> Result<MatchResponse, MatchError> {
        let queries = validate_request(request)?;
        let results = self.resolve_all(&queries).await?;
        Ok(assemble(results, MATCHER_VERSION))
    }

    /// Run one tournament per query; categories share nothing and run side by side
    pub async fn resolve_all(&self, queries: &[CategoryQuery]) -> Result<Vec<CategoryMatch>, MatchError> {
        try_join_all(queries.iter().map(|query| self.resolve_one(query))).await
    }

    async fn resolve_one(&self, query: &CategoryQuery) -> Result<CategoryMatch, MatchError> {
        let template = self.registry.template_for(query.category);

        tracing::info!(
            category = %query.category,
            requested = %query.requested,
            candidates = query.candidates.len(),
            "Resolving category"
        );

        let outcome = self
            .engine
            .resolve(&query.requested, &query.candidates, template)
            .await?;

        tracing::info!(
            category = %query.category,
            rounds = outcome.round_count(),
            winner = ?outcome.winner,
            "Category resolved"
        );

        Ok(CategoryMatch {
            category: query.category,
            winner: outcome.winner,
        })
    }
}
