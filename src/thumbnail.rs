use anyhow::Context;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// Thumbnail file stems served by the image host, highest resolution first.
pub const QUALITY_TIERS: [&str; 5] = [
    "maxresdefault", // 1280x720
    "sddefault",     // 640x480
    "hqdefault",     // 480x360
    "mqdefault",     // 320x180
    "default",       // 120x90
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub quality: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCandidate {
    pub quality: String,
    pub url: String,
    pub exists: bool,
}

/// Existence check for a single image URL. Implementations never fail:
/// anything other than a definite hit counts as missing.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn exists(&self, url: &str) -> bool;
}

/// HEAD-request probe with a fixed timeout. Redirects are not followed, so a
/// moved image counts as missing.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent("notion-scriptbot/0.1")
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .context("failed to build probe client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ImageProbe for HttpProbe {
    async fn exists(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(res) => res.status() == StatusCode::OK,
            Err(err) => {
                debug!(%url, ?err, "thumbnail probe failed");
                false
            }
        }
    }
}

/// `maxresdefault` → `MAXRES`; the bare `default` tier has nothing left and
/// becomes `DEFAULT`.
pub fn quality_label(tier: &str) -> String {
    let label = tier.replace("default", "").to_uppercase();
    if label.is_empty() {
        "DEFAULT".to_string()
    } else {
        label
    }
}

/// Candidate (label, url) pairs for a video, best first.
pub fn candidate_urls(image_host: &str, video_id: &str) -> Vec<(String, String)> {
    let base = image_host.trim_end_matches('/');
    QUALITY_TIERS
        .iter()
        .map(|tier| {
            (
                quality_label(tier),
                format!("{}/{}/{}.jpg", base, video_id, tier),
            )
        })
        .collect()
}

pub struct ThumbnailFinder<P> {
    probe: P,
    image_host: String,
}

impl<P: ImageProbe> ThumbnailFinder<P> {
    pub fn new(probe: P, image_host: impl Into<String>) -> Self {
        Self {
            probe,
            image_host: image_host.into(),
        }
    }

    /// First candidate that exists, probing from the highest resolution down.
    pub async fn best_thumbnail(&self, video_id: &str) -> Option<Thumbnail> {
        for (quality, url) in candidate_urls(&self.image_host, video_id) {
            if self.probe.exists(&url).await {
                info!(video_id, %quality, "found thumbnail");
                return Some(Thumbnail { quality, url });
            }
            debug!(video_id, %quality, "thumbnail not available");
        }
        None
    }

    /// Probe every tier and report each one.
    pub async fn probe_all(&self, video_id: &str) -> Vec<ThumbnailCandidate> {
        let mut out = Vec::with_capacity(QUALITY_TIERS.len());
        for (quality, url) in candidate_urls(&self.image_host, video_id) {
            let exists = self.probe.exists(&url).await;
            out.push(ThumbnailCandidate {
                quality,
                url,
                exists,
            });
        }
        out
    }
}
