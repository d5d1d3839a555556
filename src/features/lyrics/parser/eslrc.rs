//! Foobar2000 ESLyric format parser
//!
//! ESLrc is a word-level lyrics format used by the ESLyric plugin for Foobar2000.
//! It uses standard LRC timestamps but interleaves them with words.
//! Format: [mm:ss.xx]word[mm:ss.xx]word[mm:ss.xx]...
//! Each timestamp marks the END time of the preceding word and the start of
//! the next one. Two timestamps in a row leave a silent gap.
//!
//! A word that begins with whitespace starts a new word; anything else is
//! glued to the previous syllable.

use super::lrc;
use crate::features::lyrics::types::{LyricLine, Syllable};

/// Parse a single ESLrc line
fn parse_line(src: &str) -> Option<LyricLine> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    // (raw text, start, end)
    let mut words: Vec<(String, u64, Option<u64>)> = Vec::new();
    let mut pos = 0;
    let mut current_start: Option<u64> = None;

    while pos < src.len() {
        if let Some((consumed, time)) = lrc::parse_time(&src[pos..]) {
            if let Some((_, _, end)) = words.last_mut() {
                if end.is_none() {
                    *end = Some(time);
                }
            }
            current_start = Some(time);
            pos += consumed;
            continue;
        }

        // Find the next timestamp or end of string, skipping a stray '[' here
        let skip = src[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
        let word_end = src[pos + skip..]
            .find('[')
            .map(|i| pos + skip + i)
            .unwrap_or(src.len());
        let word_text = &src[pos..word_end];

        if let Some(start) = current_start {
            if !word_text.is_empty() {
                words.push((word_text.to_string(), start, None));
            }
        }

        pos = word_end;
    }

    if words.is_empty() {
        return None;
    }

    let mut syllables: Vec<Syllable> = Vec::with_capacity(words.len());
    for (i, (raw, start, end)) in words.iter().enumerate() {
        let next_starts_word = words
            .get(i + 1)
            .map(|(next, _, _)| next.starts_with(char::is_whitespace))
            .unwrap_or(true);
        let is_part = !next_starts_word && !raw.ends_with(char::is_whitespace);
        syllables.push(Syllable::new(raw.trim(), is_part, *start, end.unwrap_or(*start)));
    }

    Some(LyricLine {
        start_ms: syllables.first().map(|s| s.start_ms).unwrap_or(0),
        end_ms: syllables.last().map(|s| s.end_ms).unwrap_or(0),
        main_syllables: syllables,
        is_word_synced: Some(true),
        ..Default::default()
    })
}

/// Parse ESLrc content into lyric lines
pub fn parse_eslrc(src: &str) -> Vec<LyricLine> {
    src.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect()
}

/// Convert lyrics to ESLrc format string
pub fn stringify_eslrc(lines: &[LyricLine]) -> String {
    let capacity: usize = lines
        .iter()
        .map(|x| {
            x.main_syllables
                .iter()
                .map(|y| y.text.len() + 14)
                .sum::<usize>()
                + 13
        })
        .sum();
    let mut result = String::with_capacity(capacity);

    for line in lines {
        let Some(first) = line.main_syllables.first() else {
            continue;
        };
        lrc::write_timestamp(&mut result, first.start_ms);

        let mut previous: Option<&Syllable> = None;
        for syllable in &line.main_syllables {
            if let Some(prev) = previous {
                if syllable.start_ms > prev.end_ms {
                    lrc::write_timestamp(&mut result, syllable.start_ms);
                }
                if !prev.is_part {
                    result.push(' ');
                }
            }
            result.push_str(&syllable.text);
            lrc::write_timestamp(&mut result, syllable.end_ms);
            previous = Some(syllable);
        }
        result.push('\n');
    }

    result
}
