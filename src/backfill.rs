//! Thumbnail backfill pass: records with a video URL but no thumbnail get the
//! best available YouTube thumbnail URL.
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::Properties;
use crate::error::{Error, Result};
use crate::notion::model::Page;
use crate::notion::NotionService;
use crate::scheduler::{PassReport, PollJob};
use crate::store::RecordStore;
use crate::thumbnail::{ImageProbe, ThumbnailFinder};
use crate::youtube::extract_video_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailTarget {
    pub page_id: String,
    pub title: String,
    pub video_url: String,
    pub video_id: String,
}

pub fn thumbnail_target(page: &Page, properties: &Properties) -> Result<ThumbnailTarget> {
    let video_url = page
        .text_of(&properties.url)
        .ok_or_else(|| Error::content(&page.id, "no video URL property"))?;
    let video_url = video_url.trim().to_string();
    if video_url.is_empty() {
        return Err(Error::content(&page.id, "video URL is empty"));
    }
    let video_id = extract_video_id(&video_url).ok_or_else(|| {
        Error::content(&page.id, format!("not a YouTube video URL: {}", video_url))
    })?;
    let title = page
        .text_of(&properties.title)
        .ok_or_else(|| Error::content(&page.id, "no title property"))?;
    if title.trim().is_empty() {
        return Err(Error::content(&page.id, "title is empty"));
    }
    Ok(ThumbnailTarget {
        page_id: page.id.clone(),
        title,
        video_url,
        video_id,
    })
}

/// Fill in thumbnails for every eligible record. A record joins `handled`
/// once a write was attempted; records without any thumbnail stay eligible.
#[instrument(skip_all)]
pub async fn run_pass<N, P>(
    store: &RecordStore<N>,
    finder: &ThumbnailFinder<P>,
    record_delay: Duration,
    handled: &mut HashSet<String>,
) -> Result<PassReport>
where
    N: NotionService,
    P: ImageProbe,
{
    let pages = store.query_url_present_thumbnail_absent().await?;
    let mut report = PassReport {
        seen: pages.len(),
        ..Default::default()
    };

    for page in &pages {
        let target = match thumbnail_target(page, store.properties()) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, "skipping record");
                report.skipped += 1;
                continue;
            }
        };
        if handled.contains(&target.page_id) {
            report.skipped += 1;
            continue;
        }

        info!(
            title = %target.title,
            url = %target.video_url,
            video_id = %target.video_id,
            "processing video"
        );
        let Some(best) = finder.best_thumbnail(&target.video_id).await else {
            error!(title = %target.title, video_id = %target.video_id, "no thumbnails found");
            report.skipped += 1;
            continue;
        };

        match store.set_thumbnail_url(&target.page_id, &best.url).await {
            Ok(()) => {
                info!(title = %target.title, quality = %best.quality, "thumbnail URL saved");
                report.processed += 1;
            }
            Err(err) => {
                error!(%err, title = %target.title, "failed to update thumbnail URL");
                report.failed += 1;
            }
        }
        handled.insert(target.page_id);

        if !record_delay.is_zero() {
            tokio::time::sleep(record_delay).await;
        }
    }

    Ok(report)
}

pub struct ThumbnailJob<N, P> {
    store: RecordStore<N>,
    finder: ThumbnailFinder<P>,
    record_delay: Duration,
    handled: HashSet<String>,
}

impl<N: NotionService, P: ImageProbe> ThumbnailJob<N, P> {
    pub fn new(store: RecordStore<N>, finder: ThumbnailFinder<P>, record_delay: Duration) -> Self {
        Self {
            store,
            finder,
            record_delay,
            handled: HashSet::new(),
        }
    }

    pub fn handled(&self) -> &HashSet<String> {
        &self.handled
    }
}

#[async_trait]
impl<N: NotionService, P: ImageProbe> PollJob for ThumbnailJob<N, P> {
    fn name(&self) -> &'static str {
        "thumbnails"
    }

    async fn poll(&mut self) -> Result<PassReport> {
        run_pass(&self.store, &self.finder, self.record_delay, &mut self.handled).await
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
    fn target_from_url_property() {
        let p = page(json!({
            "id": "p1",
            "properties": {
                "Video Title": { "type": "title", "title": [{ "plain_text": "Intro" }] },
                "URL": { "type": "url", "url": " https://youtu.be/dQw4w9WgXcQ " }
            }
        }));
        let target = thumbnail_target(&p, &Properties::default()).unwrap();
        assert_eq!(target.video_id, "dQw4w9WgXcQ");
        assert_eq!(target.video_url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(target.title, "Intro");
    }

    #[test]
    fn youtube_url_property_takes_precedence() {
        let p = page(json!({
            "id": "p2",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Ownership" }] },
                "YouTube URL": {
                    "type": "rich_text",
                    "rich_text": [{ "plain_text": "https://www.youtube.com/watch?v=aaaaaaaaaaa" }]
                },
                "URL": { "type": "url", "url": "https://youtu.be/bbbbbbbbbbb" }
            }
        }));
        let target = thumbnail_target(&p, &Properties::default()).unwrap();
        assert_eq!(target.video_id, "aaaaaaaaaaa");
        assert_eq!(target.title, "Ownership");
    }

    #[test]
    fn record_without_title_is_content_error() {
        let p = page(json!({
            "id": "p6",
            "properties": { "URL": { "type": "url", "url": "https://youtu.be/dQw4w9WgXcQ" } }
        }));
        let err = thumbnail_target(&p, &Properties::default()).unwrap_err();
        assert_eq!(err.to_string(), "record p6: no title property");
    }

    #[test]
    fn unusable_urls_are_content_errors() {
        let empty = page(json!({
            "id": "p3",
            "properties": { "URL": { "type": "url", "url": null } }
        }));
        assert!(matches!(
            thumbnail_target(&empty, &Properties::default()),
            Err(Error::Content { .. })
        ));

        let foreign = page(json!({
            "id": "p4",
            "properties": { "URL": { "type": "url", "url": "https://vimeo.com/123" } }
        }));
        let err = thumbnail_target(&foreign, &Properties::default()).unwrap_err();
        assert!(err.to_string().contains("not a YouTube video URL"));

        let absent = page(json!({ "id": "p5", "properties": {} }));
        assert!(thumbnail_target(&absent, &Properties::default()).is_err());
    }
}
