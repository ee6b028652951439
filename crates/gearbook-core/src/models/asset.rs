use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Category, Location, SubCategory};

/// Availability as computed by the server from the asset's flag and its
/// current bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Available,
    Pending,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetStatus::Available => "Available",
            AssetStatus::Pending => "Pending",
            AssetStatus::OutOfStock => "Out of Stock",
        };
        f.write_str(label)
    }
}

/// A bookable physical asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub subcategory: Option<SubCategory>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    status: Option<AssetStatus>,
}

impl Asset {
    /// Effective status; falls back to the `available` flag for servers
    /// that omit the computed `status` field.
    pub fn status(&self) -> AssetStatus {
        self.status.unwrap_or(if self.available {
            AssetStatus::Available
        } else {
            AssetStatus::OutOfStock
        })
    }
}

/// Client-side list filter over the asset inventory.
///
/// Selecting a category matches assets assigned to it directly as well as
/// assets whose subcategory belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetFilter {
    #[default]
    All,
    Category(i64),
    Subcategory {
        id: i64,
        category: i64,
    },
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        match *self {
            AssetFilter::All => true,
            AssetFilter::Category(id) => {
                asset.category.as_ref().is_some_and(|c| c.id == id)
                    || asset
                        .subcategory
                        .as_ref()
                        .and_then(|s| s.category)
                        .is_some_and(|parent| parent == id)
            }
            AssetFilter::Subcategory { id, .. } => {
                asset.subcategory.as_ref().is_some_and(|s| s.id == id)
            }
        }
    }

    /// Display label for an active filter, resolved against the category
    /// tree; `None` when nothing is filtered or the id is unknown.
    pub fn label(&self, categories: &[Category]) -> Option<String> {
        match *self {
            AssetFilter::All => None,
            AssetFilter::Category(id) => categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| format!("All {}", c.name)),
            AssetFilter::Subcategory { id, category } => {
                let parent = categories.iter().find(|c| c.id == category)?;
                let sub = parent.subcategories.iter().find(|s| s.id == id)?;
                Some(format!("{} > {}", parent.name, sub.name))
            }
        }
    }
}

/// Apply a filter to a fetched asset list.
pub fn filter_assets<'a>(assets: &'a [Asset], filter: AssetFilter) -> Vec<&'a Asset> {
    assets.iter().filter(|a| filter.matches(a)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: i64, category: Option<i64>, subcategory: Option<(i64, Option<i64>)>) -> Asset {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("asset-{id}"),
            "available": true,
            "category": category.map(|c| serde_json::json!({"id": c, "name": format!("cat-{c}")})),
            "subcategory": subcategory
                .map(|(s, parent)| serde_json::json!({"id": s, "name": format!("sub-{s}"), "category": parent})),
        }))
        .unwrap()
    }

    #[test]
    fn parses_full_asset_payload() {
        let json = r#"{
            "id": 7,
            "name": "Sony A7 IV",
            "description": "Full-frame body",
            "details": "33MP, dual card slots",
            "serial_number": "SN-0042",
            "location": {"id": 3, "name": "Media Lab", "description": ""},
            "category": {"id": 1, "name": "Cameras", "subcategories": []},
            "subcategory": {"id": 11, "name": "Mirrorless", "category": 1},
            "available": true,
            "image_url": "https://cdn.example.org/a7iv.jpg",
            "status": "Out of Stock"
        }"#;

        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.status(), AssetStatus::OutOfStock);
        assert_eq!(asset.location.as_ref().unwrap().name, "Media Lab");
        assert_eq!(asset.subcategory.as_ref().unwrap().category, Some(1));
    }

    #[test]
    fn status_falls_back_to_available_flag() {
        let available: Asset =
            serde_json::from_value(serde_json::json!({"id": 1, "name": "x", "available": true}))
                .unwrap();
        let gone: Asset =
            serde_json::from_value(serde_json::json!({"id": 2, "name": "y", "available": false}))
                .unwrap();

        assert_eq!(available.status(), AssetStatus::Available);
        assert_eq!(gone.status(), AssetStatus::OutOfStock);
    }

    #[test]
    fn category_filter_matches_direct_and_via_subcategory_parent() {
        let assets = vec![
            asset(1, Some(1), None),
            asset(2, None, Some((10, Some(1)))),
            asset(3, Some(2), None),
            asset(4, None, None),
        ];

        let matched = filter_assets(&assets, AssetFilter::Category(1));
        let ids: Vec<i64> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn subcategory_filter_matches_only_that_subcategory() {
        let assets = vec![
            asset(1, Some(1), Some((10, Some(1)))),
            asset(2, Some(1), Some((11, Some(1)))),
        ];

        let matched = filter_assets(
            &assets,
            AssetFilter::Subcategory {
                id: 11,
                category: 1,
            },
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 2);
    }

    #[test]
    fn filter_labels_resolve_against_category_tree() {
        let categories: Vec<Category> = serde_json::from_value(serde_json::json!([
            {"id": 1, "name": "Cameras", "subcategories": [
                {"id": 11, "name": "Mirrorless", "category": 1}
            ]}
        ]))
        .unwrap();

        assert_eq!(AssetFilter::All.label(&categories), None);
        assert_eq!(
            AssetFilter::Category(1).label(&categories).as_deref(),
            Some("All Cameras")
        );
        assert_eq!(
            AssetFilter::Subcategory {
                id: 11,
                category: 1
            }
            .label(&categories)
            .as_deref(),
            Some("Cameras > Mirrorless")
        );
        assert_eq!(AssetFilter::Category(99).label(&categories), None);
    }
}
