use crate::models::{CategoryMatch, MatchResponse};

/// Build the outward response from per-category results
///
/// Only categories that were resolved get an `_actual` key; a `None` winner is
/// kept as an explicit `null`.
pub fn assemble<I>(results: I, matcher_version: &str) -> MatchResponse
where
    I: IntoIterator<Item = CategoryMatch>,
{
    let mut response = MatchResponse::new(matcher_version);
    for result in results {
        response.set_actual(result.category, result.winner);
    }
    response
}
