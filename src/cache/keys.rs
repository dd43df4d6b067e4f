//! Revalidation tags and response keys.

use std::fmt;

use crate::domain::{
    error::DomainError,
    types::{Language, ResourceKind},
};

const MAX_TAG_LEN: usize = 128;

/// Invalidation scope, `{resource}:{lang}` for tags this service derives itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevalidationTag(String);

impl RevalidationTag {
    pub fn for_resource(kind: ResourceKind, lang: &Language) -> Self {
        Self(format!("{}:{lang}", kind.as_str()))
    }

    /// Accepts caller-supplied tags; only the character set and length are checked.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let tag = raw.trim();
        if tag.is_empty() {
            return Err(DomainError::validation("tag", "tag must not be empty"));
        }
        if tag.len() > MAX_TAG_LEN {
            return Err(DomainError::validation(
                "tag",
                format!("tag exceeds {MAX_TAG_LEN} characters"),
            ));
        }
        if let Some(bad) = tag
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '.' | '-')))
        {
            return Err(DomainError::validation(
                "tag",
                format!("tag contains unsupported character `{bad}`"),
            ));
        }
        Ok(Self(tag.to_string()))
    }

    /// The resource named by the first segment, when it is a known one.
    pub fn resource(&self) -> Option<ResourceKind> {
        self.0.split(':').next()?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevalidationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one stored response: route path plus the exact query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub path: String,
    pub query: String,
}

impl ResponseKey {
    pub fn new(path: &str, query: &str) -> Self {
        Self {
            path: path.to_string(),
            query: query.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_tags_name_resource_and_language() {
        let tag = RevalidationTag::for_resource(
            ResourceKind::Items,
            &Language::parse("ja").expect("language"),
        );
        assert_eq!(tag.as_str(), "items:ja");
        assert_eq!(tag.resource(), Some(ResourceKind::Items));
    }

    #[test]
    fn parse_rejects_empty_long_and_odd_tags() {
        assert!(RevalidationTag::parse("  ").is_err());
        assert!(RevalidationTag::parse(&"a".repeat(129)).is_err());
        assert!(RevalidationTag::parse("items:ja;drop").is_err());

        let custom = RevalidationTag::parse("homepage").expect("free-form tag");
        assert_eq!(custom.resource(), None);
    }

    #[test]
    fn response_keys_differ_by_query() {
        assert_eq!(
            ResponseKey::new("/cache/items", "page=2"),
            ResponseKey::new("/cache/items", "page=2")
        );
        assert_ne!(
            ResponseKey::new("/cache/items", "page=1"),
            ResponseKey::new("/cache/items", "page=2")
        );
        assert_eq!(
            ResponseKey::new("/cache/items", "lang=ja&page=2").query,
            "lang=ja&page=2"
        );
    }
}
