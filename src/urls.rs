//! URL validation and video id extraction.

use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+$").unwrap()
});

/// Accepts the usual YouTube URL shapes and nothing else.
pub fn is_valid_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

/// Pulls the video id out of a watch or short-form URL, for the fallback
/// thumbnail location.
pub fn extract_video_id(url: &str) -> Option<String> {
    if let Some(id) = url
        .split("v=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
    {
        return Some(id.to_string());
    }
    // youtu.be/<id> has no query parameter
    url.split("youtu.be/")
        .nth(1)
        .and_then(|rest| rest.split(['?', '&']).next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_youtube_urls() {
        assert!(is_valid_video_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_video_url("http://youtube.com/watch?v=abc123"));
        assert!(is_valid_video_url("youtube.com/shorts/abc123"));
        assert!(is_valid_video_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_valid_video_url("www.youtube.com/playlist?list=PL0"));
    }

    #[test]
    fn rejects_arbitrary_strings() {
        assert!(!is_valid_video_url(""));
        assert!(!is_valid_video_url("not a url"));
        assert!(!is_valid_video_url("https://example.com/watch?v=abc"));
        assert!(!is_valid_video_url("ftp://youtube.com/watch?v=abc"));
        assert!(!is_valid_video_url("https://youtube.com/"));
    }

    #[test]
    fn extracts_watch_ids() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=10"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("https://youtube.com/"), None);
    }
}
