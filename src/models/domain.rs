use serde::{Deserialize, Serialize};
use std::fmt;

/// Version tag attached to every match response
pub const MATCHER_VERSION: &str = "2.0";

/// Matching domain a requested term belongs to
///
/// The set is closed: every category owns exactly one prompt template and one
/// `<category>_requested` / `<category>_list` / `<category>_actual` key triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CellType,
    Species,
    BindingMolecule,
}

impl Category {
    /// All categories in processing order
    pub const ALL: [Category; 3] = [Category::CellType, Category::Species, Category::BindingMolecule];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::CellType => "cell_type",
            Category::Species => "species",
            Category::BindingMolecule => "binding_molecule",
        }
    }

    /// Position in [`Category::ALL`]
    pub fn index(self) -> usize {
        match self {
            Category::CellType => 0,
            Category::Species => 1,
            Category::BindingMolecule => 2,
        }
    }

    pub fn requested_key(self) -> &'static str {
        match self {
            Category::CellType => "cell_type_requested",
            Category::Species => "species_requested",
            Category::BindingMolecule => "binding_molecule_requested",
        }
    }

    pub fn list_key(self) -> &'static str {
        match self {
            Category::CellType => "cell_type_list",
            Category::Species => "species_list",
            Category::BindingMolecule => "binding_molecule_list",
        }
    }

    pub fn actual_key(self) -> &'static str {
        match self {
            Category::CellType => "cell_type_actual",
            Category::Species => "species_actual",
            Category::BindingMolecule => "binding_molecule_actual",
        }
    }

    /// Resolve a request field name (`species_list`, `cell_type_requested`) to its category
    pub fn from_field(field: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.requested_key() == field || c.list_key() == field)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated category of a request: the term and the vocabulary to match it against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuery {
    pub category: Category,
    pub requested: String,
    pub candidates: Vec<String>,
}

/// Per-category tournament result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub category: Category,
    pub winner: Option<String>,
}
