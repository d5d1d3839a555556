//! Standard LRC format parser
//!
//! Supports the common [mm:ss.xx]text format with line-level synchronization.
//! A timestamp with no text ends the previous line without starting a new one.

use std::fmt::Write;

use crate::features::lyrics::types::{LyricLine, Syllable, join_syllables};

/// Parse timestamp from LRC format: [mm:ss.xx] or [mm:ss:xx]
///
/// Returns the number of bytes consumed and the time in milliseconds.
pub(super) fn parse_time(src: &str) -> Option<(usize, u64)> {
    if !src.starts_with('[') {
        return None;
    }

    let end_bracket = src.find(']')?;
    let time_str = &src[1..end_bracket];

    // Skip metadata tags like [ar:Artist], [ti:Title]
    if time_str.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return None;
    }

    let parts: Vec<&str> = time_str.split([':', '.']).collect();

    let time_ms = match parts.len() {
        2 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            clock_ms(min, sec, 0)?
        }
        3 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let ms_str = parts[2];
            let mut ms: u64 = ms_str.parse().ok()?;

            // xx (centiseconds) vs xxx (milliseconds)
            match ms_str.len() {
                1 => ms *= 100,
                2 => ms *= 10,
                3 => {}
                _ => return None,
            }

            clock_ms(min, sec, ms)?
        }
        _ => return None,
    };

    Some((end_bracket + 1, time_ms))
}

/// `None` when the value does not fit in a `u64`
fn clock_ms(min: u64, sec: u64, ms: u64) -> Option<u64> {
    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}

/// Split a raw LRC line into its leading timestamps and the remaining text
pub(super) fn split_timestamps(line: &str) -> (Vec<u64>, &str) {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        match parse_time(&line[pos..]) {
            Some((consumed, time)) => {
                timestamps.push(time);
                pos += consumed;
            }
            None => break,
        }
    }

    (timestamps, &line[pos..])
}

/// Parse LRC content into lyric lines
pub fn parse_lrc(src: &str) -> Vec<LyricLine> {
    // (time, text) for every timestamp, including empty-text terminators
    let mut entries: Vec<(u64, String)> = Vec::new();

    for raw in src.lines() {
        let (timestamps, text) = split_timestamps(raw.trim());
        let text = text.trim();
        for time in timestamps {
            entries.push((time, text.to_string()));
        }
    }

    entries.sort_by_key(|(time, _)| *time);

    let mut result = Vec::with_capacity(entries.len());
    for (i, (start_ms, text)) in entries.iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        // 0 is filled in by normalization for the last line
        let end_ms = entries.get(i + 1).map(|(t, _)| *t).unwrap_or(0);
        result.push(LyricLine {
            main_syllables: vec![Syllable {
                text: text.clone(),
                is_part: false,
                start_ms: *start_ms,
                end_ms,
            }],
            start_ms: *start_ms,
            end_ms,
            is_word_synced: Some(false),
            ..Default::default()
        });
    }

    result
}

/// Write timestamp in LRC format
pub fn write_timestamp(result: &mut String, time: u64) {
    let ms = time % 1000;
    let sec = (time / 1000) % 60;
    let min = time / 60000;
    let _ = write!(result, "[{:02}:{:02}.{:03}]", min, sec, ms);
}

/// Convert lyrics to LRC format string
///
/// Background vocals are appended in parentheses.
pub fn stringify_lrc(lines: &[LyricLine]) -> String {
    let capacity: usize = lines
        .iter()
        .map(|x| x.main_syllables.iter().map(|y| y.text.len() + 1).sum::<usize>() + 13)
        .sum();
    let mut result = String::with_capacity(capacity);

    for line in lines {
        if line.is_empty() {
            continue;
        }
        write_timestamp(&mut result, line.start_ms);
        result.push_str(&join_syllables(&line.main_syllables));
        if line.has_background {
            let _ = write!(result, " ({})", line.background_text());
        }
        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("[00:01.12]"), Some((10, 1120)));
        assert_eq!(parse_time("[00:10.254]"), Some((11, 10254)));
        assert_eq!(parse_time("[01:10.1]"), Some((9, 70100)));
        assert_eq!(parse_time("[00:00.00]"), Some((10, 0)));
        assert_eq!(parse_time("[ar:Someone]"), None);
    }

    #[test]
    fn test_oversized_timestamp_is_skipped() {
        assert_eq!(parse_time("[99999999999999999:00.00]"), None);
        assert_eq!(parse_time("[00:99999999999999999999.00]"), None);

        let lines = parse_lrc("[99999999999999999:00.00]boom\n[00:02.00]Still here");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].start_ms, 2000);
        assert_eq!(lines[0].main_syllables[0].text, "Still here");
    }

    #[test]
    fn test_parse_multiple_timestamps() {
        let lines = parse_lrc("[00:12.50][01:30.00]Repeated line");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start_ms, 12500);
        assert_eq!(lines[1].start_ms, 90000);
        assert_eq!(lines[0].end_ms, 90000);
    }

    #[test]
    fn test_parse_lrc() {
        let content = "[ti:Test Song]\n[ar:Test Artist]\n[00:00.00]First line\n[00:05.00]Second line\n[00:10.00]Third line";
        let lines = parse_lrc(content);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].main_syllables[0].text, "First line");
        assert_eq!(lines[1].main_syllables[0].text, "Second line");
        assert_eq!(lines[0].end_ms, 5000);
        assert_eq!(lines[1].is_word_synced, Some(false));
    }

    #[test]
    fn test_empty_text_terminates_line() {
        let lines = parse_lrc("[00:01.00]Sing\n[00:04.00]\n[00:20.00]Again");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end_ms, 4000);
        assert_eq!(lines[1].start_ms, 20000);
    }

    #[test]
    fn test_stringify_lrc() {
        let lines = parse_lrc("[00:01.12] test LyRiC\n[00:10.254] sssxxx");
        let output = stringify_lrc(&lines);
        assert!(output.contains("[00:01.120]test LyRiC"));
        assert!(output.contains("[00:10.254]sssxxx"));
    }
}
