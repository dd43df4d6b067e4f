//! Raw upstream response shapes and their normalization into domain records.

use serde::Deserialize;

use crate::domain::{
    items::{
        BarterSummary, ItemDetail, ItemQuantity, ItemRecord, ItemRef, PriceOffer, RequiredItem,
        TaskRef, null_as_empty,
    },
    tasks::{
        OfferUnlock, StandingReward, TaskObjective, TaskRecord, TaskRewards, TraderRequirement,
    },
    traders::{CashOffer, TraderBarter, TraderLevel, TraderRecord},
};

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlErrorMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemsData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemData {
    pub item: Option<RawItemDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TradersData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub traders: Vec<RawTrader>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TasksData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<RawTask>,
}

#[derive(Debug, Default, Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

fn name_of(named: Option<Named>) -> Option<String> {
    named.and_then(|named| named.name)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffer {
    #[serde(default)]
    price: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    vendor: Option<Named>,
}

impl RawOffer {
    fn into_offer(self) -> Option<PriceOffer> {
        Some(PriceOffer {
            price: self.price?,
            currency: self.currency,
            vendor_name: name_of(self.vendor),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequirement {
    #[serde(default)]
    item: Option<Named>,
    #[serde(default)]
    count: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBarterSummary {
    #[serde(default)]
    trader: Option<Named>,
    #[serde(default, deserialize_with = "null_as_empty")]
    required_items: Vec<RawRequirement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawItem {
    id: String,
    name: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    base_price: Option<i64>,
    #[serde(default, rename = "avg24hPrice")]
    avg24h_price: Option<i64>,
    #[serde(default)]
    flea_market_fee: Option<i64>,
    #[serde(default)]
    icon_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    types: Vec<String>,
    #[serde(default)]
    wiki_link: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    height: Option<i64>,
    #[serde(default)]
    category: Option<Named>,
    #[serde(default, deserialize_with = "null_as_empty")]
    buy_for: Vec<RawOffer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    barters_for: Vec<RawBarterSummary>,
}

/// Lowest priced offer; the earliest offer wins ties.
fn cheapest(offers: impl IntoIterator<Item = PriceOffer>) -> Option<PriceOffer> {
    offers.into_iter().fold(None, |best, offer| match best {
        Some(current) if current.price <= offer.price => Some(current),
        _ => Some(offer),
    })
}

impl From<RawItem> for ItemRecord {
    fn from(raw: RawItem) -> Self {
        let cheapest_buy = cheapest(raw.buy_for.into_iter().filter_map(RawOffer::into_offer));
        let first_barter = raw.barters_for.into_iter().next().map(|barter| BarterSummary {
            trader_name: name_of(barter.trader),
            required: barter
                .required_items
                .into_iter()
                .map(|required| RequiredItem {
                    name: name_of(required.item).unwrap_or_default(),
                    count: required.count.unwrap_or(0.0),
                })
                .collect(),
        });

        ItemRecord {
            id: raw.id,
            name: raw.name,
            short_name: raw.short_name,
            base_price: raw.base_price,
            avg24h_price: raw.avg24h_price,
            flea_market_fee: raw.flea_market_fee,
            icon_link: raw.icon_link,
            wiki_link: raw.wiki_link,
            types: raw.types,
            weight: raw.weight,
            width: raw.width,
            height: raw.height,
            category_name: name_of(raw.category),
            cheapest_buy,
            first_barter,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItemRef {
    id: String,
    name: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    icon_link: Option<String>,
}

impl From<RawItemRef> for ItemRef {
    fn from(raw: RawItemRef) -> Self {
        ItemRef {
            id: raw.id,
            name: raw.name,
            short_name: raw.short_name,
            icon_link: raw.icon_link,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItemQuantity {
    #[serde(default)]
    item: Option<RawItemRef>,
    #[serde(default)]
    count: Option<f64>,
    #[serde(default)]
    quantity: Option<f64>,
}

fn quantities(raw: Vec<RawItemQuantity>) -> Vec<ItemQuantity> {
    raw.into_iter()
        .filter_map(|entry| {
            Some(ItemQuantity {
                item: entry.item?.into(),
                count: entry.count.unwrap_or(0.0),
                quantity: entry.quantity,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskRef {
    id: String,
    name: String,
    #[serde(default)]
    trader: Option<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawItemDetail {
    id: String,
    name: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    base_price: Option<i64>,
    #[serde(default)]
    flea_market_fee: Option<i64>,
    #[serde(default)]
    icon_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    types: Vec<String>,
    #[serde(default)]
    wiki_link: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    height: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    sell_for: Vec<RawOffer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    buy_for: Vec<RawOffer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    contains_items: Vec<RawItemQuantity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    used_in_tasks: Vec<Option<RawTaskRef>>,
}

impl From<RawItemDetail> for ItemDetail {
    fn from(raw: RawItemDetail) -> Self {
        let sell_for: Vec<PriceOffer> = raw
            .sell_for
            .into_iter()
            .filter_map(RawOffer::into_offer)
            .collect();
        let buy_for: Vec<PriceOffer> = raw
            .buy_for
            .into_iter()
            .filter_map(RawOffer::into_offer)
            .collect();
        let cheapest_buy = cheapest(buy_for.iter().cloned());

        ItemDetail {
            id: raw.id,
            name: raw.name,
            short_name: raw.short_name,
            description: raw.description,
            base_price: raw.base_price,
            flea_market_fee: raw.flea_market_fee,
            icon_link: raw.icon_link,
            types: raw.types,
            wiki_link: raw.wiki_link,
            weight: raw.weight,
            width: raw.width,
            height: raw.height,
            sell_for,
            buy_for,
            cheapest_buy,
            contains_items: quantities(raw.contains_items),
            used_in_tasks: raw
                .used_in_tasks
                .into_iter()
                .flatten()
                .map(|task| TaskRef {
                    id: task.id,
                    name: task.name,
                    trader_name: name_of(task.trader),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTraderLevel {
    level: i32,
    #[serde(default)]
    required_player_level: Option<i32>,
    #[serde(default)]
    required_reputation: Option<f64>,
    #[serde(default)]
    required_commerce: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTraderBarter {
    id: String,
    level: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    required_items: Vec<RawItemQuantity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    reward_items: Vec<RawItemQuantity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCashOffer {
    #[serde(default)]
    item: Option<RawItemRef>,
    #[serde(default)]
    min_trader_level: Option<i32>,
    #[serde(default)]
    price: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawTrader {
    id: String,
    name: String,
    #[serde(default)]
    image_link: Option<String>,
    #[serde(default)]
    currency: Option<Named>,
    #[serde(default, deserialize_with = "null_as_empty")]
    levels: Vec<RawTraderLevel>,
    #[serde(default, deserialize_with = "null_as_empty")]
    barters: Vec<RawTraderBarter>,
    #[serde(default, deserialize_with = "null_as_empty")]
    cash_offers: Vec<RawCashOffer>,
}

impl From<RawTrader> for TraderRecord {
    fn from(raw: RawTrader) -> Self {
        TraderRecord {
            id: raw.id,
            name: raw.name,
            image_link: raw.image_link,
            currency: name_of(raw.currency),
            levels: raw
                .levels
                .into_iter()
                .map(|level| TraderLevel {
                    level: level.level,
                    required_player_level: level.required_player_level,
                    required_reputation: level.required_reputation,
                    required_commerce: level.required_commerce,
                })
                .collect(),
            barters: raw
                .barters
                .into_iter()
                .map(|barter| TraderBarter {
                    id: barter.id,
                    level: barter.level,
                    required_items: quantities(barter.required_items),
                    reward_items: quantities(barter.reward_items),
                })
                .collect(),
            cash_offers: raw
                .cash_offers
                .into_iter()
                .filter_map(|offer| {
                    Some(CashOffer {
                        item: offer.item?.into(),
                        min_trader_level: offer.min_trader_level,
                        price: offer.price,
                        currency: offer.currency,
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTaskRequirement {
    #[serde(default)]
    task: Option<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTraderRequirement {
    #[serde(default)]
    trader: Option<Named>,
    #[serde(default)]
    requirement_type: Option<String>,
    #[serde(default)]
    compare_method: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawObjective {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    maps: Vec<Named>,
    #[serde(default)]
    optional: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawStanding {
    #[serde(default)]
    trader: Option<Named>,
    #[serde(default)]
    standing: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawOfferUnlock {
    #[serde(default)]
    trader: Option<Named>,
    #[serde(default)]
    level: Option<i32>,
    #[serde(default)]
    item: Option<Named>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRewards {
    #[serde(default, deserialize_with = "null_as_empty")]
    items: Vec<RawItemQuantity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    trader_standing: Vec<RawStanding>,
    #[serde(default, deserialize_with = "null_as_empty")]
    offer_unlock: Vec<RawOfferUnlock>,
}

impl From<RawRewards> for TaskRewards {
    fn from(raw: RawRewards) -> Self {
        TaskRewards {
            items: quantities(raw.items),
            trader_standing: raw
                .trader_standing
                .into_iter()
                .filter_map(|reward| {
                    Some(StandingReward {
                        trader_name: name_of(reward.trader)?,
                        standing: reward.standing.unwrap_or(0.0),
                    })
                })
                .collect(),
            offer_unlocks: raw
                .offer_unlock
                .into_iter()
                .filter_map(|unlock| {
                    Some(OfferUnlock {
                        trader_name: name_of(unlock.trader)?,
                        level: unlock.level.unwrap_or(1),
                        item_name: name_of(unlock.item),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawTask {
    id: String,
    name: String,
    #[serde(default)]
    trader: Option<Named>,
    #[serde(default)]
    map: Option<Named>,
    #[serde(default)]
    experience: Option<i64>,
    #[serde(default)]
    min_player_level: Option<i32>,
    #[serde(default)]
    wiki_link: Option<String>,
    #[serde(default)]
    task_image_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    task_requirements: Vec<RawTaskRequirement>,
    #[serde(default, deserialize_with = "null_as_empty")]
    trader_requirements: Vec<RawTraderRequirement>,
    #[serde(default, deserialize_with = "null_as_empty")]
    objectives: Vec<RawObjective>,
    #[serde(default)]
    start_rewards: Option<RawRewards>,
    #[serde(default)]
    finish_rewards: Option<RawRewards>,
}

impl From<RawTask> for TaskRecord {
    fn from(raw: RawTask) -> Self {
        TaskRecord {
            id: raw.id,
            name: raw.name,
            trader_name: name_of(raw.trader),
            map_name: name_of(raw.map),
            experience: raw.experience.unwrap_or(0),
            min_player_level: raw.min_player_level,
            wiki_link: raw.wiki_link,
            task_image_link: raw.task_image_link,
            prerequisites: raw
                .task_requirements
                .into_iter()
                .filter_map(|requirement| name_of(requirement.task))
                .collect(),
            trader_requirements: raw
                .trader_requirements
                .into_iter()
                .filter_map(|requirement| {
                    Some(TraderRequirement {
                        trader_name: name_of(requirement.trader)?,
                        requirement_type: requirement.requirement_type,
                        compare_method: requirement.compare_method,
                        value: requirement.value,
                    })
                })
                .collect(),
            objectives: raw
                .objectives
                .into_iter()
                .map(|objective| TaskObjective {
                    kind: objective.kind,
                    description: objective.description,
                    maps: objective
                        .maps
                        .into_iter()
                        .filter_map(|map| map.name)
                        .collect(),
                    optional: objective.optional.unwrap_or(false),
                })
                .collect(),
            start_rewards: raw.start_rewards.unwrap_or_default().into(),
            finish_rewards: raw.finish_rewards.unwrap_or_default().into(),
        }
    }
}
