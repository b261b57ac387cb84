#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use notion_scriptbot::error::{Error, Result, Service};
use notion_scriptbot::model::Block;
use notion_scriptbot::notion::model::Page;
use notion_scriptbot::notion::NotionService;
use notion_scriptbot::openai::ScriptWriter;
use notion_scriptbot::thumbnail::ImageProbe;

pub fn notion_error() -> Error {
    Error::Status {
        service: Service::Notion,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".into(),
    }
}

pub fn script_page(id: &str, title: &str, description: &str) -> Page {
    serde_json::from_value(json!({
        "id": id,
        "properties": {
            "Video Title": { "type": "title", "title": [{ "plain_text": title }] },
            "Video Description": { "type": "rich_text", "rich_text": [{ "plain_text": description }] },
            "Status": { "type": "select", "select": { "name": "Scripting" } }
        }
    }))
    .unwrap()
}

pub fn video_page(id: &str, title: &str, url: &str) -> Page {
    serde_json::from_value(json!({
        "id": id,
        "properties": {
            "Video Title": { "type": "title", "title": [{ "plain_text": title }] },
            "URL": { "type": "url", "url": url }
        }
    }))
    .unwrap()
}

/// Notion double that records every call and replays queued results.
#[derive(Clone, Default)]
pub struct RecordingNotion {
    query_responses: Arc<Mutex<VecDeque<Result<Vec<Page>>>>>,
    update_responses: Arc<Mutex<VecDeque<Result<()>>>>,
    append_responses: Arc<Mutex<VecDeque<Result<()>>>>,
    children: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<(String, Value)>>>,
    updates: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
    appends: Arc<Mutex<Vec<(String, Vec<Block>)>>>,
    deletes: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotion {
    pub async fn push_query(&self, result: Result<Vec<Page>>) {
        self.query_responses.lock().await.push_back(result);
    }

    pub async fn push_update(&self, result: Result<()>) {
        self.update_responses.lock().await.push_back(result);
    }

    pub async fn push_append(&self, result: Result<()>) {
        self.append_responses.lock().await.push_back(result);
    }

    pub async fn set_children(&self, ids: &[&str]) {
        *self.children.lock().await = ids.iter().map(|s| s.to_string()).collect();
    }

    pub async fn queries(&self) -> Vec<(String, Value)> {
        self.queries.lock().await.clone()
    }

    pub async fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.updates.lock().await.clone()
    }

    pub async fn appends(&self) -> Vec<(String, Vec<Block>)> {
        self.appends.lock().await.clone()
    }

    pub async fn deletes(&self) -> Vec<String> {
        self.deletes.lock().await.clone()
    }
}

#[async_trait]
impl NotionService for RecordingNotion {
    async fn query_database(&self, database_id: &str, filter: &Value) -> Result<Vec<Page>> {
        self.queries
            .lock()
            .await
            .push((database_id.to_string(), filter.clone()));
        self.query_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn update_page(&self, page_id: &str, properties: &Map<String, Value>) -> Result<()> {
        self.updates
            .lock()
            .await
            .push((page_id.to_string(), properties.clone()));
        self.update_responses.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        self.appends
            .lock()
            .await
            .push((block_id.to_string(), children.to_vec()));
        self.append_responses.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn list_children(&self, _block_id: &str) -> Result<Vec<String>> {
        Ok(self.children.lock().await.clone())
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.deletes.lock().await.push(block_id.to_string());
        Ok(())
    }
}

/// Script writer that replays queued results; an empty queue yields a fixed script.
#[derive(Clone, Default)]
pub struct ScriptedWriter {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedWriter {
    pub fn with_responses(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ScriptWriter for ScriptedWriter {
    async fn write_script(&self, title: &str, description: &str) -> Result<String> {
        self.calls
            .lock()
            .await
            .push((title.to_string(), description.to_string()));
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(format!("# {}\n\nHello there.", title)))
    }
}

/// Probe answering from a fixed set of existing URLs.
#[derive(Clone, Default)]
pub struct SetProbe {
    hits: Arc<HashSet<String>>,
    probed: Arc<Mutex<Vec<String>>>,
}

impl SetProbe {
    pub fn with_hits(hits: &[&str]) -> Self {
        Self {
            hits: Arc::new(hits.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub async fn probed(&self) -> Vec<String> {
        self.probed.lock().await.clone()
    }
}

#[async_trait]
impl ImageProbe for SetProbe {
    async fn exists(&self, url: &str) -> bool {
        self.probed.lock().await.push(url.to_string());
        self.hits.contains(url)
    }
}
