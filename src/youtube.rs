//! YouTube video id extraction.
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

static ID_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})")
            .expect("valid short/embed regex"),
        Regex::new(r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})").expect("valid watch regex"),
    ]
});

/// Extract the video id from a watch, short-link or embed URL.
/// Returns `None` for anything that is not recognisably a YouTube video URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    for pattern in ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            return Some(caps[1].to_string());
        }
    }
    from_url_parts(url).filter(|id| !id.is_empty())
}

fn from_url_parts(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    if host.contains("youtube.com") {
        if url.path() == "/watch" {
            return url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned());
        }
        if let Some(rest) = url.path().strip_prefix("/embed/") {
            return rest.split('/').next().map(str::to_string);
        }
    } else if host.contains("youtu.be") {
        return url
            .path()
            .strip_prefix('/')
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string());
    }
    None
}
