//! Script generation pass: `Scripting` records get a generated script and move
//! on to review.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

use crate::config::{Properties, Scripting};
use crate::error::{Error, Result};
use crate::markdown;
use crate::notion::model::Page;
use crate::notion::NotionService;
use crate::openai::{fallback_script, ScriptWriter};
use crate::scheduler::{PassReport, PollJob};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub page_id: String,
    pub title: String,
    pub description: String,
}

/// Pull the fields the generator needs out of a page.
pub fn script_record(page: &Page, properties: &Properties) -> Result<ScriptRecord> {
    let title = page
        .text_of(&properties.title)
        .ok_or_else(|| Error::content(&page.id, "no title property"))?;
    if title.trim().is_empty() {
        return Err(Error::content(&page.id, "title is empty"));
    }
    let description = page
        .text_of(std::slice::from_ref(&properties.description))
        .unwrap_or_default();
    Ok(ScriptRecord {
        page_id: page.id.clone(),
        title,
        description,
    })
}

/// Process every record currently waiting for a script. Records already in
/// `handled` are skipped; successfully written records are added to it.
#[instrument(skip_all)]
pub async fn run_pass<N, W>(
    store: &RecordStore<N>,
    writer: &W,
    workflow: &Scripting,
    handled: &mut HashSet<String>,
) -> Result<PassReport>
where
    N: NotionService,
    W: ScriptWriter + ?Sized,
{
    let pages = store.query_by_status(&workflow.source_status).await?;
    let mut report = PassReport {
        seen: pages.len(),
        ..Default::default()
    };

    for page in &pages {
        let record = match script_record(page, store.properties()) {
            Ok(record) => record,
            Err(err) => {
                warn!(%err, "skipping record");
                report.skipped += 1;
                continue;
            }
        };
        if handled.contains(&record.page_id) {
            report.skipped += 1;
            continue;
        }

        info!(page_id = %record.page_id, title = %record.title, "processing video");
        let script = match writer.write_script(&record.title, &record.description).await {
            Ok(script) => script,
            Err(err) => {
                warn!(%err, title = %record.title, "script generation failed; writing placeholder");
                fallback_script(&err)
            }
        };
        let blocks = markdown::convert(&script);

        // The script is still written when the status update fails.
        if let Err(err) = store
            .mark_script_ready(&record.page_id, &workflow.target_status, Utc::now())
            .await
        {
            error!(%err, page_id = %record.page_id, "failed to update page properties");
        }

        match store.append_blocks(&record.page_id, &blocks).await {
            Ok(_) => {
                info!(title = %record.title, blocks = blocks.len(), "script written");
                handled.insert(record.page_id);
                report.processed += 1;
            }
            Err(err) => {
                error!(%err, title = %record.title, "failed to write script");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Polling job owning the set of records handled by this process.
pub struct ScriptJob<N, W> {
    store: RecordStore<N>,
    writer: W,
    workflow: Scripting,
    handled: HashSet<String>,
}

impl<N: NotionService, W: ScriptWriter> ScriptJob<N, W> {
    pub fn new(store: RecordStore<N>, writer: W, workflow: Scripting) -> Self {
        Self {
            store,
            writer,
            workflow,
            handled: HashSet::new(),
        }
    }

    pub fn handled(&self) -> &HashSet<String> {
        &self.handled
    }
}

#[async_trait]
impl<N: NotionService, W: ScriptWriter> PollJob for ScriptJob<N, W> {
    fn name(&self) -> &'static str {
        "scripting"
    }

    async fn poll(&mut self) -> Result<PassReport> {
        run_pass(&self.store, &self.writer, &self.workflow, &mut self.handled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: serde_json::Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn record_with_title_and_description() {
        let p = page(json!({
            "id": "p1",
            "properties": {
                "Video Title": { "type": "title", "title": [{ "plain_text": "Async Rust" }] },
                "Video Description": { "type": "rich_text", "rich_text": [{ "plain_text": "tokio basics" }] }
            }
        }));
        let record = script_record(&p, &Properties::default()).unwrap();
        assert_eq!(record.title, "Async Rust");
        assert_eq!(record.description, "tokio basics");
    }

    #[test]
    fn fallback_title_name_and_missing_description() {
        let p = page(json!({
            "id": "p2",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Ownership" }] }
            }
        }));
        let record = script_record(&p, &Properties::default()).unwrap();
        assert_eq!(record.title, "Ownership");
        assert_eq!(record.description, "");
    }

    #[test]
    fn missing_or_blank_title_is_content_error() {
        let p = page(json!({ "id": "p3", "properties": {} }));
        let err = script_record(&p, &Properties::default()).unwrap_err();
        assert!(matches!(err, Error::Content { .. }));

        let p = page(json!({
            "id": "p4",
            "properties": { "Video Title": { "type": "title", "title": [] } }
        }));
        let err = script_record(&p, &Properties::default()).unwrap_err();
        assert_eq!(err.to_string(), "record p4: title is empty");
    }
}
