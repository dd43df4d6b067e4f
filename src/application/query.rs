//! In-memory search, filter, sort and pagination over cached item lists.
//!
//! The stages always run in the same order: text search, category filter,
//! sort, then the page slice. `total` is counted after filtering and before
//! slicing.

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::items::ItemRecord;

pub const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    BasePrice,
    Avg24hPrice,
    Weight,
    Size,
    Category,
}

impl SortKey {
    /// Unknown keys fall back to sorting by name.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "baseprice" => SortKey::BasePrice,
            "avg24hprice" => SortKey::Avg24hPrice,
            "weight" => SortKey::Weight,
            "size" => SortKey::Size,
            "category" | "types" => SortKey::Category,
            _ => SortKey::Name,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::BasePrice => "baseprice",
            SortKey::Avg24hPrice => "avg24hprice",
            SortKey::Weight => "weight",
            SortKey::Size => "size",
            SortKey::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMode {
    #[default]
    Or,
    And,
}

impl CategoryMode {
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("and") {
            CategoryMode::And
        } else {
            CategoryMode::Or
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryMode::Or => "or",
            CategoryMode::And => "and",
        }
    }
}

/// Window applied after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Every filtered record is returned.
    Unbounded,
    Window { offset: usize, limit: usize },
}

impl Pagination {
    /// `page` is 1-based and coerced to at least 1; a non-positive size disables paging.
    pub fn from_page(page: i64, page_size: i64) -> Self {
        if page_size <= 0 {
            return Pagination::Unbounded;
        }
        let page = page.max(1) as u64;
        let size = page_size as u64;
        let offset = (page - 1).saturating_mul(size);
        Pagination::Window {
            offset: usize::try_from(offset).unwrap_or(usize::MAX),
            limit: usize::try_from(size).unwrap_or(usize::MAX),
        }
    }

    /// Raw offset/limit form; a non-positive limit disables paging.
    pub fn from_offset(offset: i64, limit: i64) -> Self {
        if limit <= 0 {
            return Pagination::Unbounded;
        }
        Pagination::Window {
            offset: usize::try_from(offset.max(0)).unwrap_or(usize::MAX),
            limit: usize::try_from(limit).unwrap_or(usize::MAX),
        }
    }

    pub fn offset(self) -> usize {
        match self {
            Pagination::Unbounded => 0,
            Pagination::Window { offset, .. } => offset,
        }
    }

    /// `None` when paging is disabled.
    pub fn limit(self) -> Option<usize> {
        match self {
            Pagination::Unbounded => None,
            Pagination::Window { limit, .. } => Some(limit),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::from_page(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemQuery {
    /// Free-text needle; matched case-insensitively.
    pub text: String,
    /// Lowercased category identifiers.
    pub categories: Vec<String>,
    pub mode: CategoryMode,
    pub sort: SortKey,
    pub order: SortOrder,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<T> {
    pub records: Vec<T>,
    /// Filtered count before slicing.
    pub total: usize,
}

pub fn run(records: Vec<ItemRecord>, query: &ItemQuery) -> QueryPage<ItemRecord> {
    let needle = query.text.trim().to_lowercase();
    let filtered: Vec<ItemRecord> = records
        .into_iter()
        .filter(|record| matches_text(record, &needle))
        .filter(|record| matches_categories(record, &query.categories, query.mode))
        .collect();

    let sorted = sort_records(filtered, query.sort, query.order);
    let total = sorted.len();
    QueryPage {
        records: paginate(sorted, query.pagination),
        total,
    }
}

/// `needle` must already be lowercased.
pub fn matches_text(record: &ItemRecord, needle: &str) -> bool {
    needle.is_empty() || record.search_haystack().contains(needle)
}

pub fn matches_categories(record: &ItemRecord, categories: &[String], mode: CategoryMode) -> bool {
    if categories.is_empty() {
        return true;
    }
    match mode {
        CategoryMode::Or => categories.iter().any(|category| record.has_category(category)),
        CategoryMode::And => categories.iter().all(|category| record.has_category(category)),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    fn extract(record: &ItemRecord, key: SortKey) -> Self {
        match key {
            SortKey::Name => SortValue::Text(record.name.to_lowercase()),
            SortKey::Category => SortValue::Text(record.category_label()),
            SortKey::BasePrice => SortValue::Number(record.base_price.unwrap_or(0) as f64),
            SortKey::Avg24hPrice => SortValue::Number(record.avg24h_price.unwrap_or(0) as f64),
            SortKey::Weight => SortValue::Number(record.weight.unwrap_or(0.0)),
            SortKey::Size => SortValue::Number(record.size() as f64),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(left), SortValue::Number(right)) => left.total_cmp(right),
            (SortValue::Text(left), SortValue::Text(right)) => left.cmp(right),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort_records(records: Vec<ItemRecord>, key: SortKey, order: SortOrder) -> Vec<ItemRecord> {
    let mut keyed: Vec<(SortValue, ItemRecord)> = records
        .into_iter()
        .map(|record| (SortValue::extract(&record, key), record))
        .collect();

    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = left.compare(right);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, record)| record).collect()
}

pub fn paginate<T>(records: Vec<T>, pagination: Pagination) -> Vec<T> {
    match pagination {
        Pagination::Unbounded => records,
        Pagination::Window { offset, limit } => {
            records.into_iter().skip(offset).take(limit).collect()
        }
    }
}

/// Distinct category labels across `records`, sorted case-insensitively.
pub fn collect_categories(records: &[ItemRecord]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for category in records.iter().flat_map(|record| record.types.iter()) {
        if !categories.iter().any(|known| known == category) {
            categories.push(category.clone());
        }
    }
    categories.sort_by(|left, right| {
        left.to_lowercase()
            .cmp(&right.to_lowercase())
            .then_with(|| left.cmp(right))
    });
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, types: &[&str], base_price: Option<i64>) -> ItemRecord {
        ItemRecord {
            id: id.to_string(),
            name: name.to_string(),
            short_name: None,
            base_price,
            avg24h_price: None,
            flea_market_fee: None,
            icon_link: None,
            wiki_link: None,
            types: types.iter().map(|value| value.to_string()).collect(),
            weight: None,
            width: None,
            height: None,
            category_name: None,
            cheapest_buy: None,
            first_barter: None,
        }
    }

    fn sample() -> Vec<ItemRecord> {
        vec![
            item("1", "Bandage", &["medical"], Some(100)),
            item("2", "AK-74", &["weapon"], Some(5000)),
        ]
    }

    fn ids(records: &[ItemRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn text_search_is_case_insensitive_substring() {
        let query = ItemQuery {
            text: "ak".into(),
            ..ItemQuery::default()
        };
        let page = run(sample(), &query);
        assert_eq!(ids(&page.records), vec!["2"]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn and_mode_requires_every_category() {
        let query = ItemQuery {
            categories: vec!["medical".into(), "weapon".into()],
            mode: CategoryMode::And,
            ..ItemQuery::default()
        };
        let page = run(sample(), &query);
        assert!(page.records.is_empty());
        assert_eq!(page.total, 0);

        let either = ItemQuery {
            categories: vec!["medical".into(), "weapon".into()],
            mode: CategoryMode::Or,
            ..ItemQuery::default()
        };
        assert_eq!(run(sample(), &either).total, 2);
    }

    #[test]
    fn category_filters_hold_for_every_requested_subset() {
        let records = vec![
            item("1", "Bandage", &["medical"], None),
            item("2", "AK-74", &["weapon", "gun"], None),
            item("3", "Key", &[], None),
            item("4", "Grizzly", &["medical", "barter"], None),
            item("5", "Bolts", &["barter"], None),
        ];
        let universe = ["medical", "weapon", "gun", "barter", "keys"];

        for mask in 0u32..(1 << universe.len()) {
            let requested: Vec<String> = universe
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, name)| name.to_string())
                .collect();

            for mode in [CategoryMode::And, CategoryMode::Or] {
                let query = ItemQuery {
                    categories: requested.clone(),
                    mode,
                    pagination: Pagination::Unbounded,
                    ..ItemQuery::default()
                };
                let page = run(records.clone(), &query);
                assert_eq!(page.total, page.records.len());

                if requested.is_empty() {
                    assert_eq!(page.total, records.len());
                    continue;
                }
                for record in &page.records {
                    assert!(records.contains(record));
                    match mode {
                        CategoryMode::And => {
                            assert!(requested.iter().all(|c| record.has_category(c)))
                        }
                        CategoryMode::Or => {
                            assert!(requested.iter().any(|c| record.has_category(c)))
                        }
                    }
                }
                let expected = records
                    .iter()
                    .filter(|record| match mode {
                        CategoryMode::And => requested.iter().all(|c| record.has_category(c)),
                        CategoryMode::Or => requested.iter().any(|c| record.has_category(c)),
                    })
                    .count();
                assert_eq!(page.total, expected, "mask {mask:#07b} mode {mode:?}");
            }
        }
    }

    #[test]
    fn category_sort_compares_space_joined_types() {
        let records = vec![
            item("1", "Pack", &["ammo(pack)"], None),
            item("2", "Box", &["ammo", "box"], None),
        ];
        let query = ItemQuery {
            sort: SortKey::Category,
            pagination: Pagination::Unbounded,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&run(records, &query).records), vec!["2", "1"]);
    }

    #[test]
    fn category_matching_ignores_stored_case() {
        let records = vec![
            item("1", "Salewa", &["Meds", "barter"], None),
            item("2", "Grizzly", &["meds"], None),
            item("3", "Bolts", &["barter"], None),
        ];
        let query = ItemQuery {
            categories: vec!["meds".into(), "barter".into()],
            mode: CategoryMode::And,
            ..ItemQuery::default()
        };
        let page = run(records, &query);
        assert_eq!(ids(&page.records), vec!["1"]);
    }

    #[test]
    fn descending_price_then_first_page() {
        let query = ItemQuery {
            sort: SortKey::BasePrice,
            order: SortOrder::Desc,
            pagination: Pagination::from_page(1, 1),
            ..ItemQuery::default()
        };
        let page = run(sample(), &query);
        assert_eq!(ids(&page.records), vec!["2"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn equal_keys_preserve_input_order_in_both_directions() {
        let records: Vec<ItemRecord> = (0..6)
            .map(|index| item(&index.to_string(), "Same", &[], Some(10)))
            .collect();

        let asc = sort_records(records.clone(), SortKey::BasePrice, SortOrder::Asc);
        let desc = sort_records(records, SortKey::Name, SortOrder::Desc);

        assert_eq!(ids(&asc), vec!["0", "1", "2", "3", "4", "5"]);
        assert_eq!(ids(&desc), vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn missing_numbers_sort_as_zero() {
        let mut heavy = item("heavy", "Heavy", &[], None);
        heavy.weight = Some(12.5);
        let unknown = item("unknown", "Unknown", &[], None);
        let mut light = item("light", "Light", &[], None);
        light.weight = Some(0.1);

        let sorted = sort_records(vec![heavy, unknown, light], SortKey::Weight, SortOrder::Asc);
        assert_eq!(ids(&sorted), vec!["unknown", "light", "heavy"]);
    }

    #[test]
    fn size_needs_both_dimensions() {
        let mut wide = item("wide", "Wide", &[], None);
        wide.width = Some(5);
        let mut square = item("square", "Square", &[], None);
        square.width = Some(2);
        square.height = Some(2);

        let sorted = sort_records(vec![square, wide], SortKey::Size, SortOrder::Asc);
        assert_eq!(ids(&sorted), vec!["wide", "square"]);
    }

    #[test]
    fn pages_past_the_end_are_empty() {
        let query = ItemQuery {
            pagination: Pagination::from_page(9, 1),
            ..ItemQuery::default()
        };
        let page = run(sample(), &query);
        assert!(page.records.is_empty());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn non_positive_page_size_disables_paging() {
        assert_eq!(Pagination::from_page(3, 0), Pagination::Unbounded);
        assert_eq!(
            Pagination::from_page(-4, 10),
            Pagination::Window {
                offset: 0,
                limit: 10
            }
        );
        assert_eq!(
            Pagination::from_page(3, 25),
            Pagination::Window {
                offset: 50,
                limit: 25
            }
        );
    }

    #[test]
    fn filtering_runs_before_paging() {
        let records: Vec<ItemRecord> = (0..10)
            .map(|index| {
                let kind = if index % 2 == 0 { "ammo" } else { "key" };
                item(&index.to_string(), &format!("Item {index}"), &[kind], None)
            })
            .collect();
        let query = ItemQuery {
            categories: vec!["key".into()],
            pagination: Pagination::from_page(2, 2),
            ..ItemQuery::default()
        };

        let page = run(records, &query);
        assert_eq!(page.total, 5);
        assert_eq!(ids(&page.records), vec!["5", "7"]);
    }

    #[test]
    fn lenient_parsers_default_unknown_values() {
        assert_eq!(SortKey::parse_lenient("TYPES"), SortKey::Category);
        assert_eq!(SortKey::parse_lenient("rarity"), SortKey::Name);
        assert_eq!(SortOrder::parse_lenient("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("sideways"), SortOrder::Asc);
        assert_eq!(CategoryMode::parse_lenient("And"), CategoryMode::And);
        assert_eq!(CategoryMode::parse_lenient("xor"), CategoryMode::Or);
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let records = vec![
            item("1", "a", &["weapon", "Barter"], None),
            item("2", "b", &["ammo", "weapon"], None),
        ];
        assert_eq!(collect_categories(&records), vec!["ammo", "Barter", "weapon"]);
    }
}
