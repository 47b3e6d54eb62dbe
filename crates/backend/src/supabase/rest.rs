//! PostgREST rows.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::instrument;

use super::{Api, SupabaseClient, check, parse_content_range};
use crate::auth::AccessToken;
use crate::error::BackendError;
use crate::events::TableChange;
use crate::gateway::Database;
use crate::query::{Filter, Select, Table};

impl SupabaseClient {
    fn rest_path(table: Table) -> String {
        format!("rest/v1/{}", table.as_str())
    }

    fn schema(&self) -> &str {
        &self.inner.config.schema
    }
}

#[async_trait]
impl Database for SupabaseClient {
    #[instrument(skip(self, query), fields(table = %query.table()))]
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let url = self.url(&Self::rest_path(query.table()), &query.to_query_pairs())?;
        let request = self
            .inner
            .client
            .get(url)
            .header("Accept-Profile", self.schema());
        let response = self.authorized(request, None).send().await?;
        let response = check(response, Api::Rest).await?;

        let text = response.text().await?;
        let rows: Vec<Value> = serde_json::from_str(&text)?;
        tracing::debug!(rows = rows.len(), "select complete");
        Ok(rows)
    }

    #[instrument(skip(self, filters, auth), fields(table = %table))]
    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        auth: Option<&AccessToken>,
    ) -> Result<u64, BackendError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(filters.iter().map(Filter::to_param));
        let url = self.url(&Self::rest_path(table), &pairs)?;

        let request = self
            .inner
            .client
            .head(url)
            .header("Accept-Profile", self.schema())
            .header("Prefer", "count=exact");
        let response = self.authorized(request, auth).send().await?;
        let response = check(response, Api::Rest).await?;

        response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| BackendError::Status {
                status: response.status().as_u16(),
                message: "missing Content-Range total".to_string(),
            })
    }

    #[instrument(skip(self, row, auth), fields(table = %table))]
    async fn insert(
        &self,
        table: Table,
        row: Value,
        auth: Option<&AccessToken>,
    ) -> Result<Value, BackendError> {
        let url = self.url(&Self::rest_path(table), &[])?;
        let request = self
            .inner
            .client
            .post(url)
            .header("Content-Profile", self.schema())
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.authorized(request, auth).send().await?;
        let response = check(response, Api::Rest).await?;

        let text = response.text().await?;
        let mut rows: Vec<Value> = serde_json::from_str(&text)?;
        if rows.is_empty() {
            return Err(BackendError::Status {
                status: 201,
                message: format!("insert into {table} returned no row"),
            });
        }
        let inserted = rows.swap_remove(0);

        tracing::info!("row inserted");
        self.publish_change(TableChange::insert(table));
        Ok(inserted)
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<TableChange> {
        self.inner.changes.subscribe()
    }
}
