//! Normalized trader records.

use serde::{Deserialize, Serialize};

use crate::domain::items::{ItemQuantity, ItemRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderLevel {
    pub level: i32,
    #[serde(default)]
    pub required_player_level: Option<i32>,
    #[serde(default)]
    pub required_reputation: Option<f64>,
    #[serde(default)]
    pub required_commerce: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderBarter {
    pub id: String,
    pub level: i32,
    #[serde(default)]
    pub required_items: Vec<ItemQuantity>,
    #[serde(default)]
    pub reward_items: Vec<ItemQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOffer {
    pub item: ItemRef,
    #[serde(default)]
    pub min_trader_level: Option<i32>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub levels: Vec<TraderLevel>,
    #[serde(default)]
    pub barters: Vec<TraderBarter>,
    #[serde(default)]
    pub cash_offers: Vec<CashOffer>,
}
