use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

use crate::models::domain::Category;

/// Request to match free-text descriptors against candidate vocabularies
///
/// Each category is a `<category>_requested` / `<category>_list` pair. Pairing
/// and the "at least one category" rule are enforced by
/// [`crate::core::validation::validate_request`]; the field-level length rules
/// live here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_type_requested: Option<String>,
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_type_list: Option<Vec<String>>,

    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_requested: Option<String>,
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_list: Option<Vec<String>>,

    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_molecule_requested: Option<String>,
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_molecule_list: Option<Vec<String>>,

    /// Keys outside the known pairs, kept so unknown categories can be rejected
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MatchRequest {
    /// Build a request carrying a single category pair
    pub fn single(category: Category, requested: impl Into<String>, candidates: Vec<String>) -> Self {
        let mut request = Self::default();
        request.set_pair(category, Some(requested.into()), Some(candidates));
        request
    }

    pub fn with_pair(mut self, category: Category, requested: impl Into<String>, candidates: Vec<String>) -> Self {
        self.set_pair(category, Some(requested.into()), Some(candidates));
        self
    }

    /// Raw (term, list) fields for a category, as received
    pub fn pair(&self, category: Category) -> (Option<&str>, Option<&[String]>) {
        let (requested, list) = match category {
            Category::CellType => (&self.cell_type_requested, &self.cell_type_list),
            Category::Species => (&self.species_requested, &self.species_list),
            Category::BindingMolecule => (&self.binding_molecule_requested, &self.binding_molecule_list),
        };
        (requested.as_deref(), list.as_deref())
    }

    fn set_pair(&mut self, category: Category, requested: Option<String>, candidates: Option<Vec<String>>) {
        match category {
            Category::CellType => {
                self.cell_type_requested = requested;
                self.cell_type_list = candidates;
            }
            Category::Species => {
                self.species_requested = requested;
                self.species_list = candidates;
            }
            Category::BindingMolecule => {
                self.binding_molecule_requested = requested;
                self.binding_molecule_list = candidates;
            }
        }
    }
}
