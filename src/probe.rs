//! Preview probe: ask yt-dlp for video metadata without downloading.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::VideoInfo;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not run yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("yt-dlp failed: {0}")]
    Extractor(String),
    #[error("unreadable yt-dlp payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Subset of the `-J` dump this app cares about. Everything is optional
/// because extractors differ in what they fill in.
#[derive(Debug, Deserialize)]
struct ProbePayload {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    height: Option<u32>,
}

/// Fetches title, duration, thumbnail URL and available heights. Blocking;
/// run it on a blocking task.
pub fn probe_url(binary: &Path, url: &str) -> Result<VideoInfo, Error> {
    debug!(%url, "probing video metadata");
    let output = Command::new(binary)
        .args(["-J", "--skip-download", "--no-playlist", "--no-warnings"])
        .arg(url)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.lines().last().unwrap_or("yt-dlp failed").to_string();
        return Err(Error::Extractor(message));
    }

    let payload: ProbePayload = serde_json::from_slice(&output.stdout)?;
    Ok(reduce(payload))
}

fn reduce(payload: ProbePayload) -> VideoInfo {
    let mut heights: Vec<u32> = payload
        .formats
        .iter()
        .filter_map(|format| format.height)
        .collect();
    heights.sort_unstable();
    heights.dedup();

    VideoInfo {
        title: payload.title.unwrap_or_else(|| "Unknown".to_string()),
        duration_secs: payload.duration.map(|secs| secs as u64),
        thumbnail_url: payload.thumbnail,
        heights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reduces_a_full_payload() {
        let payload: ProbePayload = serde_json::from_str(
            r#"{
                "title": "A clip",
                "duration": 125.6,
                "thumbnail": "https://i.ytimg.com/vi/x/hqdefault.jpg",
                "formats": [
                    {"height": 720},
                    {"height": 360},
                    {"height": null},
                    {"height": 720}
                ]
            }"#,
        )
        .unwrap();
        let info = reduce(payload);
        assert_eq!(info.title, "A clip");
        assert_eq!(info.duration_secs, Some(125));
        assert_eq!(info.heights, vec![360, 720]);
        assert_eq!(
            info.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/x/hqdefault.jpg")
        );
    }

    #[test]
    fn tolerates_a_sparse_payload() {
        let payload: ProbePayload = serde_json::from_str("{}").unwrap();
        let info = reduce(payload);
        assert_eq!(info.title, "Unknown");
        assert_eq!(info.duration_secs, None);
        assert!(info.heights.is_empty());
        assert!(info.thumbnail_url.is_none());
    }
}
