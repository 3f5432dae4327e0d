use serde::{Deserialize, Deserializer, Serialize};

use crate::models::domain::Category;

/// Response for the match endpoint
///
/// The outer `Option` records whether the category was requested at all (the
/// key is omitted when it was not); the inner one is the winner or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cell_type_actual: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub species_actual: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub binding_molecule_actual: Option<Option<String>>,
    pub matcher_version: String,
}

/// A key that is present (even as `null`) deserializes to `Some(_)`
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl MatchResponse {
    pub fn new(matcher_version: impl Into<String>) -> Self {
        Self {
            matcher_version: matcher_version.into(),
            ..Self::default()
        }
    }

    /// `None` if the category was not part of the request
    pub fn actual(&self, category: Category) -> Option<Option<&str>> {
        self.slot(category).as_ref().map(|winner| winner.as_deref())
    }

    pub fn set_actual(&mut self, category: Category, winner: Option<String>) {
        *self.slot_mut(category) = Some(winner);
    }

    fn slot(&self, category: Category) -> &Option<Option<String>> {
        match category {
            Category::CellType => &self.cell_type_actual,
            Category::Species => &self.species_actual,
            Category::BindingMolecule => &self.binding_molecule_actual,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut Option<Option<String>> {
        match category {
            Category::CellType => &mut self.cell_type_actual,
            Category::Species => &mut self.species_actual,
            Category::BindingMolecule => &mut self.binding_molecule_actual,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub matcher_version: String,
    pub judge: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}
