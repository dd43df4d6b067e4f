//! Normalized item records.

use serde::{Deserialize, Serialize};

/// A single vendor price for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceOffer {
    pub price: i64,
    pub currency: Option<String>,
    pub vendor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredItem {
    pub name: String,
    pub count: f64,
}

/// First barter that yields an item, summarized for table display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarterSummary {
    pub trader_name: Option<String>,
    #[serde(default)]
    pub required: Vec<RequiredItem>,
}

/// Flattened item row served by the list endpoint and consumed by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub base_price: Option<i64>,
    #[serde(default, rename = "avg24hPrice")]
    pub avg24h_price: Option<i64>,
    #[serde(default)]
    pub flea_market_fee: Option<i64>,
    #[serde(default)]
    pub icon_link: Option<String>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub cheapest_buy: Option<PriceOffer>,
    #[serde(default)]
    pub first_barter: Option<BarterSummary>,
}

impl ItemRecord {
    /// Slot footprint; zero unless both dimensions are known.
    pub fn size(&self) -> i64 {
        match (self.width, self.height) {
            (Some(width), Some(height)) => width * height,
            _ => 0,
        }
    }

    /// Lowercased text the free-text search runs against.
    pub fn search_haystack(&self) -> String {
        let mut haystack = String::with_capacity(self.name.len() * 2 + 32);
        haystack.push_str(&self.name);
        for part in [self.short_name.as_deref(), self.wiki_link.as_deref()]
            .into_iter()
            .flatten()
        {
            haystack.push(' ');
            haystack.push_str(part);
        }
        haystack.push(' ');
        haystack.push_str(&self.types.join(" "));
        haystack.to_lowercase()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.types
            .iter()
            .any(|value| value.to_lowercase() == category)
    }

    /// Category label used for sorting: the space-joined type list.
    pub fn category_label(&self) -> String {
        self.types.join(" ").to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub icon_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuantity {
    pub item: ItemRef,
    pub count: f64,
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub trader_name: Option<String>,
}

/// Full item document served by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_price: Option<i64>,
    #[serde(default)]
    pub flea_market_fee: Option<i64>,
    #[serde(default)]
    pub icon_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: Vec<String>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub sell_for: Vec<PriceOffer>,
    #[serde(default)]
    pub buy_for: Vec<PriceOffer>,
    #[serde(default)]
    pub cheapest_buy: Option<PriceOffer>,
    #[serde(default)]
    pub contains_items: Vec<ItemQuantity>,
    #[serde(default)]
    pub used_in_tasks: Vec<TaskRef>,
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
