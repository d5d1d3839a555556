//! Lyrics parsing module
//!
//! Provider adapters that normalize external formats into a `LyricDocument`:
//! - LRC: Standard line-level lyrics [mm:ss.xx]text
//! - ESLrc: Foobar2000 ESLyric word-level format
//! - TTML: Apple Music lyrics format (XML)
//! - Apple JSON: the lyrics service response
//!
//! Export goes the other way, to LRC or ESLrc text.

mod apple;
mod eslrc;
mod lrc;
mod ttml;

pub use apple::{LyricsResponse, WireLine, WireSyllable, sanitize_ms};
pub use eslrc::stringify_eslrc;
pub use lrc::stringify_lrc;

use super::types::{LyricDocument, LyricsFormat};

/// Errors produced while decoding a lyrics payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Xml(String),
    Json(String),
    /// The payload decoded but held no lines
    Empty,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(e) => write!(f, "XML parse error: {}", e),
            ParseError::Json(e) => write!(f, "JSON parse error: {}", e),
            ParseError::Empty => write!(f, "no lyric lines found"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Detect lyrics format from content
pub fn detect_format(content: &str) -> LyricsFormat {
    let trimmed = content.trim_start_matches('\u{feff}').trim();

    if trimmed.starts_with('{') {
        return LyricsFormat::AppleJson;
    }

    // TTML format: XML with <tt> root element
    if trimmed.starts_with("<?xml") || trimmed.starts_with("<tt") {
        return LyricsFormat::Ttml;
    }

    if trimmed.starts_with('[') {
        // ESLrc keeps timestamps after the text; LRC only has them in front
        let first_timed = trimmed
            .lines()
            .map(str::trim)
            .find(|line| lrc::parse_time(line).is_some());
        if let Some(line) = first_timed {
            let (_, rest) = lrc::split_timestamps(line);
            let has_trailing_stamp = rest
                .match_indices('[')
                .any(|(i, _)| lrc::parse_time(&rest[i..]).is_some());
            if has_trailing_stamp {
                return LyricsFormat::EsLrc;
            }
        }
        return LyricsFormat::Lrc;
    }

    LyricsFormat::Unknown
}

/// Parse lyrics from string content
pub fn parse_lyrics(content: &str) -> Result<LyricDocument, ParseError> {
    let format = detect_format(content);
    parse_lyrics_with_format(content, format)
}

/// Parse lyrics with specified format
pub fn parse_lyrics_with_format(
    content: &str,
    format: LyricsFormat,
) -> Result<LyricDocument, ParseError> {
    let lines = match format {
        LyricsFormat::Lrc => lrc::parse_lrc(content),
        LyricsFormat::EsLrc => eslrc::parse_eslrc(content),
        LyricsFormat::Ttml => ttml::parse_ttml(content.as_bytes())?,
        LyricsFormat::AppleJson => apple::parse_apple_json(content)?,
        // Try LRC as fallback
        LyricsFormat::Unknown => lrc::parse_lrc(content),
    };

    if lines.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(LyricDocument::new(lines))
}

/// Export a document as timecoded text
///
/// Word-synced documents become ESLrc, everything else LRC.
pub fn export_lyrics(document: &LyricDocument) -> (LyricsFormat, String) {
    if document.is_word_synced() {
        (LyricsFormat::EsLrc, stringify_eslrc(document.lines()))
    } else {
        (LyricsFormat::Lrc, stringify_lrc(document.lines()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_lrc() {
        let content = "[00:01.12]First line\n[00:05.00]Second line";
        assert_eq!(detect_format(content), LyricsFormat::Lrc);
        let repeated = "[ti:Song]\n[00:12.50][01:30.00]Repeated line";
        assert_eq!(detect_format(repeated), LyricsFormat::Lrc);
    }

    #[test]
    fn test_detect_eslrc() {
        let content = "[ar:Someone]\n[00:10.82]Test[00:10.97] Word[00:12.62]";
        assert_eq!(detect_format(content), LyricsFormat::EsLrc);
    }

    #[test]
    fn test_detect_other() {
        assert_eq!(detect_format("  {\"content\": []}"), LyricsFormat::AppleJson);
        assert_eq!(detect_format("<?xml version=\"1.0\"?><tt/>"), LyricsFormat::Ttml);
        assert_eq!(detect_format("plain text"), LyricsFormat::Unknown);
    }

    #[test]
    fn test_parse_lrc() {
        let content = "[00:01.12]First line\n[00:05.00]Second line";
        let doc = parse_lyrics(content).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.lines()[0].start_ms, 1120);
        assert_eq!(doc.lines()[1].end_ms, 10000);
    }

    #[test]
    fn test_empty_payload_is_error() {
        assert_eq!(parse_lyrics("no timestamps here"), Err(ParseError::Empty));
        assert_eq!(parse_lyrics("{\"content\": []}"), Err(ParseError::Empty));
    }

    #[test]
    fn test_export_picks_format() {
        let line_level = parse_lyrics("[00:01.00]Hello world\n[00:03.00]Bye").unwrap();
        let (format, text) = export_lyrics(&line_level);
        assert_eq!(format, LyricsFormat::Lrc);
        assert!(text.starts_with("[00:01.000]Hello world\n"));

        let word_level = parse_lyrics("[00:01.00]Hel[00:01.50]lo[00:02.00]").unwrap();
        let (format, text) = export_lyrics(&word_level);
        assert_eq!(format, LyricsFormat::EsLrc);
        assert_eq!(text, "[00:01.000]Hel[00:01.500]lo[00:02.000]\n");
    }
}
