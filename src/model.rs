use std::path::PathBuf;

/// The fixed set of quality presets offered in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    P360,
    P480,
    P720,
    P1080,
    /// 2K
    P1440,
    /// 4K
    P2160,
    Best,
    Audio,
}

impl Quality {
    pub const ALL: [Quality; 8] = [
        Quality::P360,
        Quality::P480,
        Quality::P720,
        Quality::P1080,
        Quality::P1440,
        Quality::P2160,
        Quality::Best,
        Quality::Audio,
    ];

    /// Short token recorded in history entries.
    pub fn token(self) -> &'static str {
        match self {
            Quality::P360 => "360p",
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P1440 => "1440",
            Quality::P2160 => "2160",
            Quality::Best => "best",
            Quality::Audio => "audio",
        }
    }

    /// Label shown on the quality selector.
    pub fn label(self) -> &'static str {
        match self {
            Quality::P1440 => "2K",
            Quality::P2160 => "4K",
            Quality::Best => "Best Quality",
            Quality::Audio => "Audio Only",
            other => other.token(),
        }
    }

    fn height(self) -> Option<u32> {
        match self {
            Quality::P360 => Some(360),
            Quality::P480 => Some(480),
            Quality::P720 => Some(720),
            Quality::P1080 => Some(1080),
            Quality::P1440 => Some(1440),
            Quality::P2160 => Some(2160),
            Quality::Best | Quality::Audio => None,
        }
    }

    /// yt-dlp format selector for this preset. Format resolution itself is
    /// yt-dlp's job; these are fixed templates.
    pub fn format_selector(self) -> String {
        match self {
            Quality::Audio => "bestaudio".to_string(),
            Quality::Best => "bestvideo+bestaudio/best".to_string(),
            limited => {
                // height() is Some for every height-limited variant
                let h = limited.height().unwrap_or(720);
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
            }
        }
    }

    /// Picks a reasonable preset from the heights a video actually offers.
    pub fn suggest(heights: &[u32]) -> Quality {
        if heights.contains(&720) {
            Quality::P720
        } else if heights.contains(&480) {
            Quality::P480
        } else if heights.contains(&1080) {
            Quality::P1080
        } else {
            Quality::Best
        }
    }
}

/// One queued download: everything the worker needs to run yt-dlp.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub quality: Quality,
    pub dest_dir: PathBuf,
}

/// Messages the download worker sends back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress { fraction: f32, eta: Option<String> },
    /// Final title, reported by yt-dlp once the finished file is in place.
    Title(String),
    Finished,
    Failed(String),
    Cancelled,
}

impl WorkerEvent {
    /// Outcome to record in history: `Some(success)` for terminal events,
    /// `None` for everything else. Cancelled downloads never count as
    /// successful.
    pub fn history_outcome(&self) -> Option<bool> {
        match self {
            WorkerEvent::Finished => Some(true),
            WorkerEvent::Failed(_) | WorkerEvent::Cancelled => Some(false),
            WorkerEvent::Progress { .. } | WorkerEvent::Title(_) => None,
        }
    }
}

/// Metadata gathered by the preview probe.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    pub duration_secs: Option<u64>,
    pub thumbnail_url: Option<String>,
    /// Distinct video heights the extractor reported, ascending.
    pub heights: Vec<u32>,
}

impl VideoInfo {
    pub fn duration_text(&self) -> String {
        match self.duration_secs {
            Some(total) => {
                let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
                format!("{h}:{m:02}:{s:02}")
            }
            None => "Unknown".to_string(),
        }
    }
}
