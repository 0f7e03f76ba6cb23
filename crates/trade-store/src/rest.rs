use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::error::{StoreError, StoreResult};
use crate::store::{compare_field_values, TradeStore};

/// REST client for a Firebase-style document store.
///
/// Documents live at `{base}/{collection}/{id}.json`; a collection read at
/// `{base}/{collection}.json` returns an object keyed by document id. The
/// wire format does not preserve order, so ordered queries are sorted
/// client-side after the fetch. Every request carries the client's bounded
/// timeout, so a wedged store turns into a `StoreError` instead of a hung
/// request.
pub struct RestStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, collection, id)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.base_url, collection)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn fetch_json(&self, request: RequestBuilder) -> StoreResult<Value> {
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<Value>().await?;
        Ok(body)
    }
}

#[async_trait]
impl TradeStore for RestStore {
    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool> {
        // shallow=true avoids pulling the document body just to probe it.
        let request = self
            .authorized(self.client.get(self.document_url(collection, id)))
            .query(&[("shallow", "true")]);

        let body = self.fetch_json(request).await?;
        Ok(!body.is_null())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let request = self.authorized(self.client.get(self.document_url(collection, id)));

        let body = self.fetch_json(request).await?;
        Ok(if body.is_null() { None } else { Some(body) })
    }

    async fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()> {
        let request = self
            .authorized(self.client.put(self.document_url(collection, id)))
            .json(record);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn query_desc(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> StoreResult<Vec<Value>> {
        // limitToLast keeps the `limit` largest values of the order field,
        // which is exactly the most-recent window for a timestamp field.
        let request = self
            .authorized(self.client.get(self.collection_url(collection)))
            .query(&[
                ("orderBy", format!("\"{order_field}\"")),
                ("limitToLast", limit.to_string()),
            ]);

        let body = self.fetch_json(request).await?;

        let documents = match body {
            Value::Null => return Ok(Vec::new()),
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidResponse(format!(
                    "expected a collection object, got {other}"
                )))
            }
        };

        let mut records: Vec<Value> = documents.into_iter().map(|(_, doc)| doc).collect();
        records.sort_by(|a, b| {
            compare_field_values(&b[order_field], &a[order_field])
        });
        records.truncate(limit);

        Ok(records)
    }

    fn server_timestamp(&self) -> Value {
        // Server-value sentinel; the store resolves it to its own clock at
        // write time.
        json!({ ".sv": "timestamp" })
    }
}
