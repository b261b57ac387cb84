//! Record-level operations on the video database.
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{error, info, instrument, warn};

use crate::config::Properties;
use crate::error::Result;
use crate::model::Block;
use crate::notion::model::Page;
use crate::notion::{missing_thumbnail_filter, status_filter, NotionService};

/// Notion accepts at most this many children per append request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

pub struct RecordStore<N> {
    notion: N,
    database_id: String,
    properties: Properties,
}

impl<N: NotionService> RecordStore<N> {
    pub fn new(notion: N, database_id: impl Into<String>, properties: Properties) -> Self {
        Self {
            notion,
            database_id: database_id.into(),
            properties,
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn notion(&self) -> &N {
        &self.notion
    }

    pub async fn query_by_status(&self, status: &str) -> Result<Vec<Page>> {
        let filter = status_filter(&self.properties.status, status);
        let pages = self.notion.query_database(&self.database_id, &filter).await?;
        info!(count = pages.len(), status, "queried records by status");
        Ok(pages)
    }

    pub async fn query_url_present_thumbnail_absent(&self) -> Result<Vec<Page>> {
        let filter =
            missing_thumbnail_filter(&self.properties.url_filter, &self.properties.thumbnail_url);
        let pages = self.notion.query_database(&self.database_id, &filter).await?;
        info!(count = pages.len(), "queried records missing a thumbnail");
        Ok(pages)
    }

    pub async fn patch_properties(&self, page_id: &str, properties: Map<String, Value>) -> Result<()> {
        self.notion.update_page(page_id, &properties).await
    }

    /// Move a record to `status` and stamp the generation date.
    pub async fn mark_script_ready(
        &self,
        page_id: &str,
        status: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut properties = Map::new();
        properties.insert(
            self.properties.status.clone(),
            json!({ "select": { "name": status } }),
        );
        properties.insert(
            self.properties.script_generated.clone(),
            json!({ "date": { "start": at.to_rfc3339() } }),
        );
        self.patch_properties(page_id, properties).await
    }

    pub async fn set_thumbnail_url(&self, page_id: &str, url: &str) -> Result<()> {
        let mut properties = Map::new();
        properties.insert(
            self.properties.thumbnail_url.clone(),
            json!({ "url": url }),
        );
        self.patch_properties(page_id, properties).await
    }

    /// Append blocks in batches of [`MAX_BLOCKS_PER_REQUEST`]. Stops at the
    /// first failing batch; batches already written are left in place.
    /// Returns the number of batches written.
    #[instrument(skip(self, blocks), fields(blocks = blocks.len()))]
    pub async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<usize> {
        let mut written = 0;
        for (i, batch) in blocks.chunks(MAX_BLOCKS_PER_REQUEST).enumerate() {
            if let Err(err) = self.notion.append_children(page_id, batch).await {
                error!(?err, batch = i + 1, "failed to append block batch");
                return Err(err);
            }
            written += 1;
            info!(batch = i + 1, size = batch.len(), "appended block batch");
        }
        Ok(written)
    }

    /// Remove every child block of a page. Returns how many were deleted.
    #[instrument(skip(self))]
    pub async fn delete_all_blocks(&self, page_id: &str) -> Result<usize> {
        let children = self.notion.list_children(page_id).await?;
        let mut deleted = 0;
        for block_id in &children {
            match self.notion.delete_block(block_id).await {
                Ok(()) => deleted += 1,
                Err(err) => {
                    warn!(?err, %block_id, deleted, "failed to delete block");
                    return Err(err);
                }
            }
        }
        info!(deleted, "cleared page content");
        Ok(deleted)
    }
}
