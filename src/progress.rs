//! Parsing of the `--progress-template` lines yt-dlp writes to stdout.

/// Template handed to yt-dlp; it renders to `dl|<percent>|<eta>` per line.
pub const TEMPLATE: &str = "download:dl|%(progress._percent_str)s|%(progress._eta_str)s";

const LINE_PREFIX: &str = "dl|";

/// One parsed progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Fraction of one, clamped to 0..=1.
    pub fraction: f32,
    /// ETA text as yt-dlp prints it, when it knows one.
    pub eta: Option<String>,
}

pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim().strip_prefix(LINE_PREFIX)?;
    let mut fields = rest.splitn(2, '|');
    let percent = fields.next()?.trim().strip_suffix('%')?.trim();
    let fraction = (percent.parse::<f32>().ok()? / 100.0).clamp(0.0, 1.0);
    let eta = fields
        .next()
        .map(str::trim)
        .filter(|eta| !eta.is_empty() && *eta != "Unknown" && *eta != "NA")
        .map(str::to_string);
    Some(ProgressUpdate { fraction, eta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_typical_line() {
        assert_eq!(
            parse_progress_line("dl|  42.3%|00:12"),
            Some(ProgressUpdate { fraction: 0.423, eta: Some("00:12".to_string()) })
        );
    }

    #[test]
    fn parses_completion_without_eta() {
        assert_eq!(
            parse_progress_line("dl|100.0%|NA"),
            Some(ProgressUpdate { fraction: 1.0, eta: None })
        );
        assert_eq!(
            parse_progress_line("dl| 99.9%|"),
            Some(ProgressUpdate { fraction: 0.999, eta: None })
        );
    }

    #[test]
    fn ignores_unrelated_output() {
        assert_eq!(parse_progress_line("[download] Destination: clip.mp4"), None);
        assert_eq!(parse_progress_line("dl|garbage|00:01"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn clamps_overshoot() {
        let update = parse_progress_line("dl|104.1%|00:00").unwrap();
        assert_eq!(update.fraction, 1.0);
    }
}
