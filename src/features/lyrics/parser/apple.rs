//! Apple Music lyrics service JSON
//!
//! Shape: `{ "info": ..., "type": "Syllable" | "Line", "content": [line...] }`.
//! Timestamps arrive as JSON numbers and may be fractional or garbage, so
//! they are read as `f64` and sanitized before building the document.

use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::features::lyrics::types::{LyricLine, SpeakerAlignment, Syllable};

/// A syllable as returned by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireSyllable {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub part: bool,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub endtime: f64,
}

/// A line as returned by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLine {
    #[serde(default)]
    pub text: Vec<WireSyllable>,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub background_text: Vec<WireSyllable>,
    #[serde(default)]
    pub opposite_turn: bool,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub endtime: f64,
}

/// Full lyrics response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsResponse {
    /// Free-form source info; shape varies between responses
    #[serde(default)]
    pub info: serde_json::Value,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<WireLine>,
}

/// Convert a wire timestamp to whole milliseconds; anything unusable is 0
pub fn sanitize_ms(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn convert_syllable(wire: &WireSyllable) -> Syllable {
    Syllable::new(
        wire.text.clone(),
        wire.part,
        sanitize_ms(wire.timestamp),
        sanitize_ms(wire.endtime),
    )
}

impl LyricsResponse {
    /// Whether the service reported syllable-level timing
    pub fn is_syllable_timed(&self) -> bool {
        self.kind.eq_ignore_ascii_case("syllable")
    }

    /// Normalize the response into lyric lines
    pub fn into_lines(self) -> Vec<LyricLine> {
        let word_synced = self.is_syllable_timed();
        self.content
            .iter()
            .map(|wire| LyricLine {
                main_syllables: wire.text.iter().map(convert_syllable).collect(),
                has_background: wire.background,
                background_syllables: wire.background_text.iter().map(convert_syllable).collect(),
                is_opposite_speaker: wire.opposite_turn,
                start_ms: sanitize_ms(wire.timestamp),
                end_ms: sanitize_ms(wire.endtime),
                speaker_alignment: Some(if wire.opposite_turn {
                    SpeakerAlignment::End
                } else {
                    SpeakerAlignment::Start
                }),
                is_word_synced: Some(word_synced),
                song_section: None,
            })
            .collect()
    }
}

/// Parse a service response body
pub fn parse_apple_json(src: &str) -> Result<Vec<LyricLine>, ParseError> {
    let response: LyricsResponse =
        serde_json::from_str(src).map_err(|e| ParseError::Json(e.to_string()))?;
    Ok(response.into_lines())
}
