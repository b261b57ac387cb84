use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{Error, Result, Service};
use crate::model::Block;
use crate::notion::model::{BlockRef, ListResponse, Page, RetrieveDatabaseResp};

pub mod model;

const NOTION_API_BASE: &str = "https://api.notion.com/";
const PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// The slice of the Notion REST API the polling jobs rely on.
#[async_trait]
pub trait NotionService: Send + Sync {
    /// All pages of a database matching `filter`, following pagination.
    async fn query_database(&self, database_id: &str, filter: &Value) -> Result<Vec<Page>>;

    async fn update_page(&self, page_id: &str, properties: &Map<String, Value>) -> Result<()>;

    /// Append one request's worth of children to a block or page.
    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()>;

    /// Ids of all direct children of a block or page.
    async fn list_children(&self, block_id: &str) -> Result<Vec<String>>;

    async fn delete_block(&self, block_id: &str) -> Result<()>;
}

impl NotionClient {
    pub fn new(token: String, version: String) -> anyhow::Result<Self> {
        let base_url = Url::parse(NOTION_API_BASE).context("invalid default Notion URL")?;
        Self::with_base_url(token, version, base_url)
    }

    pub fn with_base_url(token: String, version: String, base_url: Url) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent("notion-scriptbot/0.1")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            base_url,
            token,
            version,
        })
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|e| Error::Unexpected(format!("invalid Notion URL for {path}: {e}")))?;
        let mut builder = self
            .http
            .request(method, endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version);
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .json(body);
        }
        builder.build().map_err(|source| Error::Transport {
            service: Service::Notion,
            source,
        })
    }

    async fn execute(&self, request: reqwest::Request) -> Result<String> {
        debug!(method=%request.method(), url=%request.url(), "sending notion request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|source| Error::Transport {
                service: Service::Notion,
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by Notion: {}", body);
            }
            return Err(Error::Status {
                service: Service::Notion,
                status,
                body,
            });
        }

        res.text().await.map_err(|source| Error::Transport {
            service: Service::Notion,
            source,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        if let Some(body) = body {
            debug!(payload=%body, "notion request payload");
        }
        let request = self.build_request(method, path, body)?;
        let text = self.execute(request).await?;
        serde_json::from_str(&text).map_err(|source| Error::Decode {
            service: Service::Notion,
            source,
        })
    }

    pub async fn retrieve_database(&self, database_id: &str) -> Result<RetrieveDatabaseResp> {
        self.call(Method::GET, &format!("v1/databases/{}", database_id), None)
            .await
    }
}

#[async_trait]
impl NotionService for NotionClient {
    async fn query_database(&self, database_id: &str, filter: &Value) -> Result<Vec<Page>> {
        let path = format!("v1/databases/{}/query", database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let body = build_query_request(filter, cursor.as_deref());
            let batch: ListResponse<Page> = self.call(Method::POST, &path, Some(&body)).await?;
            pages.extend(batch.results);
            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(pages)
    }

    async fn update_page(&self, page_id: &str, properties: &Map<String, Value>) -> Result<()> {
        let body = json!({ "properties": properties });
        let _: Value = self
            .call(Method::PATCH, &format!("v1/pages/{}", page_id), Some(&body))
            .await?;
        Ok(())
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        let body = build_append_request(children);
        let _: Value = self
            .call(
                Method::PATCH,
                &format!("v1/blocks/{}/children", block_id),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut path = format!("v1/blocks/{}/children?page_size={}", block_id, PAGE_SIZE);
            if let Some(c) = cursor.as_deref() {
                path.push_str("&start_cursor=");
                path.push_str(c);
            }
            let batch: ListResponse<BlockRef> = self.call(Method::GET, &path, None).await?;
            ids.extend(batch.results.into_iter().map(|b| b.id));
            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(ids)
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        let _: Value = self
            .call(Method::DELETE, &format!("v1/blocks/{}", block_id), None)
            .await?;
        Ok(())
    }
}

pub fn build_query_request(filter: &Value, start_cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    if !filter.is_null() {
        body.insert("filter".into(), filter.clone());
    }
    body.insert("page_size".into(), json!(PAGE_SIZE));
    if let Some(cursor) = start_cursor {
        body.insert("start_cursor".into(), json!(cursor));
    }
    Value::Object(body)
}

pub fn build_append_request(children: &[Block]) -> Value {
    let children: Vec<Value> = children.iter().map(Block::to_json).collect();
    json!({ "children": children })
}

/// `status == value` on a select property.
pub fn status_filter(property: &str, value: &str) -> Value {
    json!({
        "property": property,
        "select": { "equals": value }
    })
}

/// Rows whose URL text is filled in and whose thumbnail text is still empty.
pub fn missing_thumbnail_filter(url_property: &str, thumbnail_property: &str) -> Value {
    json!({
        "and": [
            {
                "property": url_property,
                "rich_text": { "is_not_empty": true }
            },
            {
                "property": thumbnail_property,
                "rich_text": { "is_empty": true }
            }
        ]
    })
}
