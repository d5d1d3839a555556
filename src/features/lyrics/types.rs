//! Lyrics data types
//!
//! The normalized document every provider adapter produces and the engine
//! consumes. Documents are built wholesale and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Largest representable timestamp (999:99.999)
pub const MAX_TIME_MS: u64 = 60_039_999;

/// Fallback length of the last line when its end is unknown
const LAST_LINE_FALLBACK_MS: u64 = 5000;

/// Lyrics format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsFormat {
    /// Standard LRC format [mm:ss.xx]text
    Lrc,
    /// Foobar2000 ESLyric format (word-level)
    EsLrc,
    /// Apple Music TTML format
    Ttml,
    /// Apple Music lyrics service JSON response
    AppleJson,
    /// Unknown format
    Unknown,
}

/// Which side of the view a line is sung from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerAlignment {
    Start,
    End,
}

/// The finest timed unit of text within a line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Syllable {
    /// The syllable text
    pub text: String,
    /// Fragment glued to the next syllable without whitespace
    #[serde(default)]
    pub is_part: bool,
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds
    pub end_ms: u64,
}

impl Syllable {
    pub fn new(text: impl Into<String>, is_part: bool, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            is_part,
            start_ms,
            end_ms: end_ms.max(start_ms),
        }
    }

    /// Window length; zero for instantaneous or malformed syllables
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether `time_ms` lies inside `[start_ms, end_ms]`
    pub fn contains(&self, time_ms: f64) -> bool {
        time_ms >= self.start_ms as f64 && time_ms <= self.end_ms as f64
    }

    /// Check if the syllable is empty (whitespace only)
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A single displayed lyric row
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Main vocal syllables
    pub main_syllables: Vec<Syllable>,
    /// Whether this line carries background (ad-lib) vocals
    #[serde(default)]
    pub has_background: bool,
    /// Background vocal syllables
    #[serde(default)]
    pub background_syllables: Vec<Syllable>,
    /// Sung by the other duet speaker
    #[serde(default)]
    pub is_opposite_speaker: bool,
    /// Start time in milliseconds
    #[serde(default)]
    pub start_ms: u64,
    /// End time in milliseconds
    #[serde(default)]
    pub end_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_alignment: Option<SpeakerAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_word_synced: Option<bool>,
    /// Song part label such as "Verse" or "Chorus"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_section: Option<String>,
}

impl LyricLine {
    /// Whether `time_ms` lies inside the line window
    pub fn contains(&self, time_ms: f64) -> bool {
        time_ms >= self.start_ms as f64 && time_ms <= self.end_ms as f64
    }

    /// Get the main line text
    pub fn text(&self) -> String {
        join_syllables(&self.main_syllables)
    }

    /// Get the background text
    pub fn background_text(&self) -> String {
        join_syllables(&self.background_syllables)
    }

    /// Check if the line is empty
    pub fn is_empty(&self) -> bool {
        self.main_syllables.iter().all(Syllable::is_empty)
    }

    /// Distinct syllable start timestamps on the main track
    pub fn distinct_starts(&self) -> usize {
        let mut starts: Vec<u64> = self.main_syllables.iter().map(|s| s.start_ms).collect();
        starts.sort_unstable();
        starts.dedup();
        starts.len()
    }
}

/// Concatenate syllables, adding a space after every whole word but the last
pub fn join_syllables(syllables: &[Syllable]) -> String {
    let mut out = String::with_capacity(syllables.iter().map(|s| s.text.len() + 1).sum());
    for (i, syllable) in syllables.iter().enumerate() {
        out.push_str(&syllable.text);
        if !syllable.is_part && i + 1 < syllables.len() {
            out.push(' ');
        }
    }
    out
}

/// Ordered lyric lines; insertion order is playback order
///
/// Deserialized documents go through [`LyricDocument::new`] like parsed ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawDocument")]
pub struct LyricDocument {
    lines: Vec<LyricLine>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    lines: Vec<LyricLine>,
}

impl From<RawDocument> for LyricDocument {
    fn from(raw: RawDocument) -> Self {
        Self::new(raw.lines)
    }
}

impl LyricDocument {
    /// Build a document, normalizing timing on the way in
    pub fn new(mut lines: Vec<LyricLine>) -> Self {
        normalize_lines(&mut lines);
        Self { lines }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line carries syllable-level timing
    pub fn is_word_synced(&self) -> bool {
        self.lines.iter().any(|line| {
            line.is_word_synced
                .unwrap_or_else(|| line.main_syllables.len() > 1 && line.distinct_starts() > 1)
        })
    }
}

/// Normalize lyric lines: sort by time, fill missing ends and clamp values
pub fn normalize_lines(lines: &mut Vec<LyricLine>) {
    for line in lines.iter_mut() {
        if line.start_ms == 0 {
            if let Some(first) = line.main_syllables.first() {
                line.start_ms = first.start_ms;
            }
        }
    }

    // Stable, so lines sharing a start keep provider order
    lines.sort_by_key(|line| line.start_ms);

    for line in lines.iter_mut() {
        if line.end_ms == 0 {
            line.end_ms = line.main_syllables.last().map(|s| s.end_ms).unwrap_or(0);
        }
        line.start_ms = line.start_ms.min(MAX_TIME_MS);
        line.end_ms = line.end_ms.min(MAX_TIME_MS);

        for syllable in line
            .main_syllables
            .iter_mut()
            .chain(line.background_syllables.iter_mut())
        {
            syllable.start_ms = syllable.start_ms.min(MAX_TIME_MS);
            syllable.end_ms = syllable.end_ms.clamp(syllable.start_ms, MAX_TIME_MS);
        }

        line.has_background = !line.background_syllables.is_empty();
    }

    // Second pass: fix remaining 0 end times using next line's start time
    let len = lines.len();
    for i in 0..len {
        if lines[i].end_ms <= lines[i].start_ms {
            let next_start = if i + 1 < len {
                lines[i + 1].start_ms
            } else {
                lines[i].start_ms.saturating_add(LAST_LINE_FALLBACK_MS)
            };
            let end = next_start.max(lines[i].start_ms).min(MAX_TIME_MS);
            lines[i].end_ms = end;

            if let Some(syllable) = lines[i].main_syllables.last_mut() {
                if syllable.end_ms <= syllable.start_ms {
                    syllable.end_ms = end.max(syllable.start_ms);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: u64, end: u64, words: &[(&str, bool, u64, u64)]) -> LyricLine {
        LyricLine {
            main_syllables: words
                .iter()
                .map(|&(t, p, s, e)| Syllable::new(t, p, s, e))
                .collect(),
            start_ms: start,
            end_ms: end,
            ..Default::default()
        }
    }

    #[test]
    fn test_text_respects_parts() {
        let l = line(
            0,
            3000,
            &[("Hel", true, 0, 500), ("lo", false, 500, 1000), ("world", false, 1000, 3000)],
        );
        assert_eq!(l.text(), "Hello world");
    }

    #[test]
    fn test_normalize_sorts_and_fills_ends() {
        let doc = LyricDocument::new(vec![
            line(5000, 0, &[("second", false, 5000, 0)]),
            line(1000, 0, &[("first", false, 1000, 0)]),
        ]);
        assert_eq!(doc.lines()[0].start_ms, 1000);
        assert_eq!(doc.lines()[0].end_ms, 5000);
        assert_eq!(doc.lines()[0].main_syllables[0].end_ms, 5000);
        assert_eq!(doc.lines()[1].end_ms, 10000);
    }

    #[test]
    fn test_normalize_clamps_inverted_syllable() {
        let doc = LyricDocument::new(vec![LyricLine {
            main_syllables: vec![Syllable {
                text: "x".into(),
                is_part: false,
                start_ms: 2000,
                end_ms: 1000,
            }],
            start_ms: 2000,
            end_ms: 4000,
            ..Default::default()
        }]);
        let syllable = &doc.lines()[0].main_syllables[0];
        assert_eq!(syllable.duration_ms(), 0);
        assert!(syllable.end_ms >= syllable.start_ms);
    }

    #[test]
    fn test_has_background_derived() {
        let mut l = line(0, 1000, &[("a", false, 0, 1000)]);
        l.background_syllables = vec![Syllable::new("ooh", false, 0, 800)];
        let doc = LyricDocument::new(vec![l]);
        assert!(doc.lines()[0].has_background);
    }

    #[test]
    fn test_word_synced_detection() {
        let line_level = LyricDocument::new(vec![line(0, 1000, &[("whole line", false, 0, 1000)])]);
        assert!(!line_level.is_word_synced());

        let word_level = LyricDocument::new(vec![line(
            0,
            1000,
            &[("a", false, 0, 500), ("b", false, 500, 1000)],
        )]);
        assert!(word_level.is_word_synced());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let json = r#"{"lines": [
            {"mainSyllables": [{"text": "second", "startMs": 5000, "endMs": 0}], "startMs": 5000},
            {"mainSyllables": [{"text": "first", "startMs": 1000, "endMs": 0}], "startMs": 1000}
        ]}"#;
        let doc: LyricDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.lines()[0].text(), "first");
        assert_eq!(doc.lines()[0].end_ms, 5000);
        assert_eq!(doc, LyricDocument::new(doc.lines().to_vec()));
    }
}
