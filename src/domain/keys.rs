//! Persisted cache key layout.
//!
//! Every key follows `cache:{resource}:{list|detail}:{lang}:...:v1` so that a
//! language-scoped purge is a plain prefix delete.

use std::fmt;

use crate::domain::types::{Language, ResourceKind};

pub const KEY_NAMESPACE: &str = "cache";
pub const KEY_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn list(kind: ResourceKind, lang: &Language) -> Self {
        Self(format!(
            "{}{}",
            Self::language_prefix(kind, lang),
            KEY_VERSION
        ))
    }

    pub fn item_detail(id: &str, lang: &Language) -> Self {
        Self(format!(
            "{}{id}:{}",
            Self::language_prefix(ResourceKind::Item, lang),
            KEY_VERSION
        ))
    }

    /// Prefix shared by every persisted row of `kind` in `lang`.
    pub fn language_prefix(kind: ResourceKind, lang: &Language) -> String {
        let shape = if kind.is_detail() { "detail" } else { "list" };
        format!("{KEY_NAMESPACE}:{}:{shape}:{lang}:", kind.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> Language {
        Language::parse(code).expect("language")
    }

    #[test]
    fn list_keys_are_scoped_by_resource_and_language() {
        assert_eq!(
            StoreKey::list(ResourceKind::Items, &lang("ja")).as_str(),
            "cache:items:list:ja:v1"
        );
        assert_eq!(
            StoreKey::list(ResourceKind::Traders, &lang("en")).as_str(),
            "cache:traders:list:en:v1"
        );
    }

    #[test]
    fn prefixes_cover_their_keys_without_crossing_languages() {
        let en = lang("en");
        let detail = StoreKey::item_detail("5449016a4bdc2d6f028b456f", &en);
        assert!(
            detail
                .as_str()
                .starts_with(&StoreKey::language_prefix(ResourceKind::Item, &en))
        );
        assert!(
            !detail
                .as_str()
                .starts_with(&StoreKey::language_prefix(ResourceKind::Item, &lang("ja")))
        );
        assert!(
            !StoreKey::list(ResourceKind::Items, &en)
                .as_str()
                .starts_with(&StoreKey::language_prefix(ResourceKind::Item, &en))
        );
    }
}
