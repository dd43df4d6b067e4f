//! Port for the remote GraphQL data provider.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    items::{ItemDetail, ItemRecord},
    tasks::TaskRecord,
    traders::TraderRecord,
    types::Language,
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream responded with HTTP {status}")]
    Status { status: u16, detail: String },
    #[error("upstream reported errors: {detail}")]
    Graphql { detail: String },
    #[error("upstream did not answer within {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout { .. })
    }
}

/// One request per resource kind, already normalized into storage records.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch_items(&self, lang: &Language) -> Result<Vec<ItemRecord>, UpstreamError>;

    /// `Ok(None)` when the provider has no item with this id.
    async fn fetch_item(
        &self,
        id: &str,
        lang: &Language,
    ) -> Result<Option<ItemDetail>, UpstreamError>;

    async fn fetch_traders(&self, lang: &Language) -> Result<Vec<TraderRecord>, UpstreamError>;

    async fn fetch_tasks(&self, lang: &Language) -> Result<Vec<TaskRecord>, UpstreamError>;
}
