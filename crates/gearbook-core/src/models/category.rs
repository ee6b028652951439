use serde::{Deserialize, Serialize};

/// Top-level asset category with its embedded subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<SubCategory>,
}

/// A subcategory; `category` is the parent's id when the server includes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<i64>,
}
