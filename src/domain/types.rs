//! Shared domain enumerations and value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Upstream data families that are cached and tagged independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Items,
    Item,
    Traders,
    Tasks,
    /// Map pages are tagged for revalidation but have no upstream fetch.
    Maps,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Items,
        ResourceKind::Item,
        ResourceKind::Traders,
        ResourceKind::Tasks,
        ResourceKind::Maps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Items => "items",
            ResourceKind::Item => "item",
            ResourceKind::Traders => "traders",
            ResourceKind::Tasks => "tasks",
            ResourceKind::Maps => "maps",
        }
    }

    /// Single-document resources are keyed by id, everything else is a list.
    pub fn is_detail(self) -> bool {
        matches!(self, ResourceKind::Item)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DomainError::validation("resource", format!("unknown resource `{value}`")))
    }
}

/// A normalized language code such as `ja` or `en`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim().to_ascii_lowercase();
        let valid = (2..=8).contains(&code.len())
            && code.chars().all(|ch| ch.is_ascii_lowercase() || ch == '-');
        if !valid {
            return Err(DomainError::validation(
                "language",
                format!("`{raw}` is not a language code"),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Language {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Language::parse(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

/// The configured set of languages plus the fallback used for anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePolicy {
    default: Language,
    supported: Vec<Language>,
}

impl LanguagePolicy {
    pub fn new(default: Language, mut supported: Vec<Language>) -> Self {
        if !supported.contains(&default) {
            supported.insert(0, default.clone());
        }
        Self { default, supported }
    }

    pub fn default_language(&self) -> &Language {
        &self.default
    }

    pub fn supported(&self) -> &[Language] {
        &self.supported
    }

    /// Coerces a requested language to a supported one.
    pub fn resolve(&self, requested: Option<&str>) -> Language {
        let Some(raw) = requested.filter(|value| !value.trim().is_empty()) else {
            return self.default.clone();
        };

        match Language::parse(raw) {
            Ok(lang) if self.supported.contains(&lang) => lang,
            _ => {
                tracing::debug!(
                    target: "tarkov_wiki::domain::language",
                    requested = raw,
                    fallback = %self.default,
                    "unsupported language coerced to default"
                );
                self.default.clone()
            }
        }
    }
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self::new(
            Language("ja".to_string()),
            vec![Language("ja".to_string()), Language("en".to_string())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_lowercased_and_trimmed() {
        let lang = Language::parse(" EN ").expect("valid code");
        assert_eq!(lang.as_str(), "en");
        assert!(Language::parse("e").is_err());
        assert!(Language::parse("ja;drop").is_err());
    }

    #[test]
    fn policy_coerces_unknown_languages_to_default() {
        let policy = LanguagePolicy::default();
        assert_eq!(policy.resolve(Some("en")).as_str(), "en");
        assert_eq!(policy.resolve(Some("de")).as_str(), "ja");
        assert_eq!(policy.resolve(Some("")).as_str(), "ja");
        assert_eq!(policy.resolve(None).as_str(), "ja");
    }

    #[test]
    fn resource_kind_parses_known_names_only() {
        assert_eq!("traders".parse::<ResourceKind>().ok(), Some(ResourceKind::Traders));
        assert!("quests".parse::<ResourceKind>().is_err());
        assert!(ResourceKind::Item.is_detail());
        assert!(!ResourceKind::Items.is_detail());
    }
}
