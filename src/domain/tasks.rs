//! Normalized task (quest) records.

use serde::{Deserialize, Serialize};

use crate::domain::items::ItemQuantity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderRequirement {
    pub trader_name: String,
    #[serde(default)]
    pub requirement_type: Option<String>,
    #[serde(default)]
    pub compare_method: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskObjective {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maps: Vec<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingReward {
    pub trader_name: String,
    pub standing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferUnlock {
    pub trader_name: String,
    pub level: i32,
    #[serde(default)]
    pub item_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRewards {
    #[serde(default)]
    pub items: Vec<ItemQuantity>,
    #[serde(default)]
    pub trader_standing: Vec<StandingReward>,
    #[serde(default)]
    pub offer_unlocks: Vec<OfferUnlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub trader_name: Option<String>,
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub min_player_level: Option<i32>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default)]
    pub task_image_link: Option<String>,
    /// Names of tasks that must be completed first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub trader_requirements: Vec<TraderRequirement>,
    #[serde(default)]
    pub objectives: Vec<TaskObjective>,
    #[serde(default)]
    pub start_rewards: TaskRewards,
    #[serde(default)]
    pub finish_rewards: TaskRewards,
}
