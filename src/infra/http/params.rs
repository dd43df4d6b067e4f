//! Query-string parsing for the item list endpoint.
//!
//! Unknown or malformed enum values fall back to defaults; only numbers that
//! cannot be parsed at all are rejected.

use crate::{
    application::query::{CategoryMode, ItemQuery, Pagination, SortKey, SortOrder},
    domain::error::DomainError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ItemListParams {
    pub lang: Option<String>,
    pub query: ItemQuery,
}

impl ItemListParams {
    pub fn parse(raw: &str, default_page_size: u32) -> Result<Self, DomainError> {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let mut categories = split_categories(&pairs, "category");
        categories.extend(split_categories(&pairs, "types"));

        let mode = first("categoryMode")
            .or_else(|| first("typesMode"))
            .map(CategoryMode::parse_lenient)
            .unwrap_or_default();

        let page = parse_number("page", first("page"))?;
        let page_size = parse_number("pageSize", first("pageSize"))?;
        let limit = parse_number("limit", first("limit"))?;
        let offset = parse_number("offset", first("offset"))?;
        let default_size = i64::from(default_page_size);

        let pagination = if page.is_some() || page_size.is_some() {
            Pagination::from_page(page.unwrap_or(1), page_size.unwrap_or(default_size))
        } else if limit.is_some() || offset.is_some() {
            Pagination::from_offset(offset.unwrap_or(0), limit.unwrap_or(default_size))
        } else {
            Pagination::from_page(1, default_size)
        };

        Ok(Self {
            lang: first("lang").map(str::to_string),
            query: ItemQuery {
                text: first("q").map(str::trim).unwrap_or_default().to_string(),
                categories,
                mode,
                sort: first("sort").map(SortKey::parse_lenient).unwrap_or_default(),
                order: first("order")
                    .map(SortOrder::parse_lenient)
                    .unwrap_or_default(),
                pagination,
            },
        })
    }
}

/// Every occurrence of `name`, comma-split, trimmed and lowercased.
fn split_categories(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(key, _)| key == name)
        .flat_map(|(_, value)| value.split(','))
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<i64>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| DomainError::validation(field, format!("`{value}` is not a number"))),
    }
}
