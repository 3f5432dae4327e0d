use validator::{Validate, ValidationErrors};

use crate::core::error::ValidationError;
use crate::models::{Category, CategoryQuery, MatchRequest};

/// Check pairing and non-emptiness, returning the categories to resolve in order
///
/// A category is either fully present (term and non-empty list of non-empty
/// strings) or fully absent, and at least one must be present. Fields that look
/// like a category pair but name an unknown category are rejected.
pub fn validate_request(request: &MatchRequest) -> Result<Vec<CategoryQuery>, ValidationError> {
    if let Some(key) = request.extra.keys().find(|k| is_category_field(k)) {
        return Err(ValidationError::UnknownCategory { key: key.clone() });
    }

    if let Err(errors) = request.validate() {
        if let Some(err) = first_field_error(&errors) {
            return Err(err);
        }
    }

    let mut queries = Vec::new();
    for category in Category::ALL {
        match request.pair(category) {
            (None, None) => continue,
            (Some(_), None) => return Err(ValidationError::MissingCandidates { category }),
            (None, Some(_)) => return Err(ValidationError::MissingRequested { category }),
            (Some(term), Some(candidates)) => {
                let term = term.trim();
                if term.is_empty() {
                    return Err(ValidationError::EmptyRequested { category });
                }
                if candidates.is_empty() {
                    return Err(ValidationError::EmptyCandidates { category });
                }
                if let Some(index) = candidates.iter().position(|c| c.trim().is_empty()) {
                    return Err(ValidationError::BlankCandidate { category, index });
                }

                queries.push(CategoryQuery {
                    category,
                    requested: term.to_string(),
                    candidates: candidates.to_vec(),
                });
            }
        }
    }

    if queries.is_empty() {
        return Err(ValidationError::NoCategories);
    }

    Ok(queries)
}

fn is_category_field(key: &str) -> bool {
    key.ends_with("_requested") || key.ends_with("_list")
}

/// Map the derive-level length failures onto the category they belong to
fn first_field_error(errors: &ValidationErrors) -> Option<ValidationError> {
    let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
    fields.sort_by_key(|field| Category::from_field(field).map(Category::index));

    fields.iter().find_map(|field| {
        let category = Category::from_field(field)?;
        Some(if field.ends_with("_list") {
            ValidationError::EmptyCandidates { category }
        } else {
            ValidationError::EmptyRequested { category }
        })
    })
}
