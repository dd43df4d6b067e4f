//! Tag and prefix invalidation across both cache tiers.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::repos::{CacheStore, RepoError},
    cache::{RevalidationTag, TagTier},
    domain::{error::DomainError, keys::StoreKey, types::Language},
};

const TARGET: &str = "tarkov_wiki::invalidation";

#[derive(Debug, Error)]
pub enum InvalidationError {
    #[error(transparent)]
    InvalidTag(#[from] DomainError),
    #[error("tag `{tag}` does not name a cached resource")]
    UnscopedTag { tag: String },
    #[error("persisted rows for `{tag}` could not be purged")]
    Store {
        tag: String,
        #[source]
        source: RepoError,
    },
}

/// Outcome of one successful invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInvalidation {
    pub tag: String,
    pub purged_responses: usize,
    /// Present when persisted rows were purged as well.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged_rows: Option<u64>,
}

/// Per-tag entry of a batch invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagOutcome {
    pub tag: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged_responses: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct InvalidationService {
    tier: Option<Arc<TagTier>>,
    store: Arc<dyn CacheStore>,
}

impl InvalidationService {
    pub fn new(tier: Option<Arc<TagTier>>, store: Arc<dyn CacheStore>) -> Self {
        Self { tier, store }
    }

    /// Drops rendered responses for `tag`. Absent tags are a no-op.
    pub fn invalidate_tag(&self, tag: &RevalidationTag) -> usize {
        let purged = self
            .tier
            .as_ref()
            .map(|tier| tier.invalidate_tag(tag))
            .unwrap_or(0);
        info!(target: TARGET, tag = %tag, purged, "revalidation tag invalidated");
        purged
    }

    /// Invalidates one caller-supplied tag, and with `language` also the
    /// persisted rows of the tag's resource in that language.
    pub async fn invalidate(
        &self,
        raw_tag: &str,
        language: Option<&Language>,
    ) -> Result<TagInvalidation, InvalidationError> {
        let tag = RevalidationTag::parse(raw_tag)?;

        let purged_rows = match language {
            Some(lang) => {
                let kind = tag.resource().ok_or_else(|| InvalidationError::UnscopedTag {
                    tag: tag.to_string(),
                })?;
                let prefix = StoreKey::language_prefix(kind, lang);
                let purged = self.store.delete_by_prefix(&prefix).await.map_err(|source| {
                    InvalidationError::Store {
                        tag: tag.to_string(),
                        source,
                    }
                })?;
                info!(target: TARGET, tag = %tag, prefix, purged, "persisted rows purged");
                Some(purged)
            }
            None => None,
        };

        let purged_responses = self.invalidate_tag(&tag);
        Ok(TagInvalidation {
            tag: tag.to_string(),
            purged_responses,
            purged_rows,
        })
    }

    /// Invalidates each tag independently; one bad tag never blocks the rest.
    pub fn invalidate_many(&self, raw_tags: &[String]) -> Vec<TagOutcome> {
        raw_tags
            .iter()
            .map(|raw| match RevalidationTag::parse(raw) {
                Ok(tag) => TagOutcome {
                    tag: tag.to_string(),
                    success: true,
                    purged_responses: Some(self.invalidate_tag(&tag)),
                    error: None,
                },
                Err(err) => {
                    warn!(target: TARGET, tag = raw.as_str(), error = %err, "tag rejected in batch");
                    TagOutcome {
                        tag: raw.clone(),
                        success: false,
                        purged_responses: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect()
    }
}
