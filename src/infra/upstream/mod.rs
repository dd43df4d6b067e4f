//! GraphQL client for the upstream tarkov data provider.

mod payload;
mod queries;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::{
    application::upstream::{UpstreamError, UpstreamSource},
    config::UpstreamSettings,
    domain::{
        items::{ItemDetail, ItemRecord},
        tasks::TaskRecord,
        traders::TraderRecord,
        types::Language,
    },
};

use self::payload::{Envelope, ItemData, ItemsData, TasksData, TradersData};

use super::error::InfraError;

const ERROR_DETAIL_LIMIT: usize = 512;

#[derive(Clone, Debug)]
pub struct GraphqlClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl GraphqlClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::UpstreamClient(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            timeout: settings.timeout,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tarkov-wiki/", env!("CARGO_PKG_VERSION"))
    }

    #[instrument(skip(self, query, variables), fields(endpoint = %self.endpoint))]
    async fn request<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<T, UpstreamError> {
        let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|err| transport_error(err, after_ms))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_error(err, after_ms))?;

        if status != StatusCode::OK {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                detail: truncate(&String::from_utf8_lossy(&bytes)),
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|err| UpstreamError::Decode(format!("{operation}: {err}")))?;

        if !envelope.errors.is_empty() {
            let detail = envelope
                .errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(UpstreamError::Graphql {
                detail: truncate(&detail),
            });
        }

        debug!(operation, bytes = bytes.len(), "upstream answered");
        envelope
            .data
            .ok_or_else(|| UpstreamError::Decode(format!("{operation}: response carried no data")))
    }
}

fn transport_error(err: reqwest::Error, after_ms: u64) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout { after_ms }
    } else {
        UpstreamError::Transport(err.to_string())
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(ERROR_DETAIL_LIMIT) {
        Some((index, _)) => format!("{}…", &text[..index]),
        None => text.to_string(),
    }
}

#[async_trait]
impl UpstreamSource for GraphqlClient {
    async fn fetch_items(&self, lang: &Language) -> Result<Vec<ItemRecord>, UpstreamError> {
        let data: ItemsData = self
            .request("items", queries::ITEMS, json!({ "lang": lang.as_str() }))
            .await?;
        Ok(data.items.into_iter().map(ItemRecord::from).collect())
    }

    async fn fetch_item(
        &self,
        id: &str,
        lang: &Language,
    ) -> Result<Option<ItemDetail>, UpstreamError> {
        let data: ItemData = self
            .request(
                "item",
                queries::ITEM,
                json!({ "id": id, "lang": lang.as_str() }),
            )
            .await?;
        Ok(data.item.map(ItemDetail::from))
    }

    async fn fetch_traders(&self, lang: &Language) -> Result<Vec<TraderRecord>, UpstreamError> {
        let data: TradersData = self
            .request("traders", queries::TRADERS, json!({ "lang": lang.as_str() }))
            .await?;
        Ok(data.traders.into_iter().map(TraderRecord::from).collect())
    }

    async fn fetch_tasks(&self, lang: &Language) -> Result<Vec<TaskRecord>, UpstreamError> {
        let data: TasksData = self
            .request("tasks", queries::TASKS, json!({ "lang": lang.as_str() }))
            .await?;
        Ok(data.tasks.into_iter().map(TaskRecord::from).collect())
    }
}
