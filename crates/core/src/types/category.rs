//! Catalog category with its subcategories.

use serde::{Deserialize, Serialize};

use super::id::CategoryId;

/// A top-level catalog category shown in the filter sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "Id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[serde(default)]
    pub product_count: u32,
}

impl Category {
    /// Whether the category expands into a subcategory list.
    #[must_use]
    pub fn has_subcategories(&self) -> bool {
        !self.subcategories.is_empty()
    }
}
