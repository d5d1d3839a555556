//! TTML (Apple Music) lyrics format parser
//!
//! `<p>` elements become lines, timed `<span>`s become syllables and a
//! `ttm:role="x-bg"` span collects the line's background vocals. Adjacent
//! spans with no whitespace between them are fragments of one word.

use std::io::BufRead;

use quick_xml::events::BytesStart;
use quick_xml::{Reader, events::Event};

use super::ParseError;
use crate::features::lyrics::types::{LyricLine, SpeakerAlignment, Syllable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseStatus {
    None,
    InTtml,
    InHead,
    InMetadata,
    InBody,
    InDiv,
    InP,
    InSpan,
    InIgnoredSpan,
    InBackgroundSpan,
    InSpanInBackgroundSpan,
    InIgnoredSpanInBackgroundSpan,
}

/// Line being assembled plus the raw agent id it was tagged with
struct PendingLine {
    line: LyricLine,
    agent: Vec<u8>,
}

/// Parse TTML format lyrics
pub fn parse_ttml(data: impl BufRead) -> Result<Vec<LyricLine>, ParseError> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::with_capacity(256);
    let mut str_buf = String::with_capacity(256);
    let mut status = ParseStatus::None;
    let mut line_timing = false;
    let mut main_agent: Vec<u8> = Vec::new();
    let mut section: Option<String> = None;
    let mut current: Option<PendingLine> = None;
    let mut finished: Vec<PendingLine> = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::Xml(e.to_string()))?;

        match event {
            Event::Eof => break,
            Event::Empty(e) => {
                if e.name().as_ref() == b"ttm:agent" && status == ParseStatus::InMetadata {
                    read_agent(&e, &mut main_agent);
                }
            }
            Event::Start(e) => match e.name().as_ref() {
                b"tt" => {
                    if status == ParseStatus::None {
                        status = ParseStatus::InTtml;
                        line_timing = attribute(&e, b"itunes:timing")
                            .is_some_and(|v| v.eq_ignore_ascii_case("line"));
                    }
                }
                b"head" if status == ParseStatus::InTtml => status = ParseStatus::InHead,
                b"metadata" if status == ParseStatus::InHead => status = ParseStatus::InMetadata,
                b"ttm:agent" if status == ParseStatus::InMetadata => {
                    read_agent(&e, &mut main_agent);
                }
                b"body" if status == ParseStatus::InTtml => status = ParseStatus::InBody,
                b"div" if status == ParseStatus::InBody => {
                    status = ParseStatus::InDiv;
                    section = attribute(&e, b"itunes:song-part")
                        .or_else(|| attribute(&e, b"itunes:songPart"));
                }
                b"p" if status == ParseStatus::InDiv => {
                    status = ParseStatus::InP;
                    let mut pending = PendingLine {
                        line: LyricLine {
                            song_section: section.clone(),
                            is_word_synced: Some(!line_timing),
                            ..Default::default()
                        },
                        agent: Vec::new(),
                    };
                    configure_line(&e, &mut pending);
                    current = Some(pending);
                }
                b"span" => match status {
                    ParseStatus::InP => {
                        status = match span_role(&e).as_deref() {
                            Some(b"x-bg") => ParseStatus::InBackgroundSpan,
                            Some(b"x-translation") | Some(b"x-roman") => {
                                ParseStatus::InIgnoredSpan
                            }
                            _ => {
                                if let Some(pending) = current.as_mut() {
                                    pending.line.main_syllables.push(new_syllable(&e));
                                }
                                ParseStatus::InSpan
                            }
                        };
                        str_buf.clear();
                    }
                    ParseStatus::InBackgroundSpan => {
                        status = match span_role(&e).as_deref() {
                            Some(b"x-translation") | Some(b"x-roman") => {
                                ParseStatus::InIgnoredSpanInBackgroundSpan
                            }
                            _ => {
                                if let Some(pending) = current.as_mut() {
                                    pending.line.background_syllables.push(new_syllable(&e));
                                }
                                ParseStatus::InSpanInBackgroundSpan
                            }
                        };
                        str_buf.clear();
                    }
                    _ => {}
                },
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"tt" => status = ParseStatus::None,
                b"head" if status == ParseStatus::InHead => status = ParseStatus::InTtml,
                b"metadata" if status == ParseStatus::InMetadata => status = ParseStatus::InHead,
                b"body" if status == ParseStatus::InBody => status = ParseStatus::InTtml,
                b"div" if status == ParseStatus::InDiv => {
                    status = ParseStatus::InBody;
                    section = None;
                }
                b"p" if status == ParseStatus::InP => {
                    status = ParseStatus::InDiv;
                    if let Some(mut pending) = current.take() {
                        finish_line(&mut pending.line);
                        finished.push(pending);
                    }
                }
                b"span" => match status {
                    ParseStatus::InSpan => {
                        status = ParseStatus::InP;
                        if let Some(pending) = current.as_mut() {
                            close_syllable(&mut pending.line.main_syllables, &str_buf);
                        }
                        str_buf.clear();
                    }
                    ParseStatus::InSpanInBackgroundSpan => {
                        status = ParseStatus::InBackgroundSpan;
                        if let Some(pending) = current.as_mut() {
                            close_syllable(&mut pending.line.background_syllables, &str_buf);
                        }
                        str_buf.clear();
                    }
                    ParseStatus::InBackgroundSpan | ParseStatus::InIgnoredSpan => {
                        status = ParseStatus::InP;
                        str_buf.clear();
                    }
                    ParseStatus::InIgnoredSpanInBackgroundSpan => {
                        status = ParseStatus::InBackgroundSpan;
                        str_buf.clear();
                    }
                    _ => {}
                },
                _ => {}
            },
            Event::Text(e) => {
                let txt = e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                match status {
                    ParseStatus::InSpan | ParseStatus::InSpanInBackgroundSpan => {
                        str_buf.push_str(&txt);
                    }
                    ParseStatus::InP => {
                        if let Some(pending) = current.as_mut() {
                            loose_text(&mut pending.line, &txt);
                        }
                    }
                    ParseStatus::InBackgroundSpan => {
                        if txt.starts_with(char::is_whitespace) {
                            if let Some(pending) = current.as_mut() {
                                if let Some(last) = pending.line.background_syllables.last_mut() {
                                    last.is_part = false;
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    // Without declared agents the first tagged line defines the main singer
    if main_agent.is_empty() {
        if let Some(first) = finished.iter().find(|p| !p.agent.is_empty()) {
            main_agent = first.agent.clone();
        }
    }

    Ok(finished
        .into_iter()
        .map(|pending| {
            let mut line = pending.line;
            line.is_opposite_speaker = !pending.agent.is_empty() && pending.agent != main_agent;
            line.speaker_alignment = Some(if line.is_opposite_speaker {
                SpeakerAlignment::End
            } else {
                SpeakerAlignment::Start
            });
            line
        })
        .collect())
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn span_role(e: &BytesStart<'_>) -> Option<Vec<u8>> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"ttm:role")
        .map(|attr| attr.value.to_vec())
}

fn read_agent(e: &BytesStart<'_>, main_agent: &mut Vec<u8>) {
    if !main_agent.is_empty() {
        return;
    }
    let mut agent_type = Vec::new();
    let mut agent_id = Vec::new();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"type" => agent_type = attr.value.to_vec(),
            b"xml:id" => agent_id = attr.value.to_vec(),
            _ => {}
        }
    }
    if agent_type == b"person" {
        *main_agent = agent_id;
    }
}

fn configure_line(e: &BytesStart<'_>, pending: &mut PendingLine) {
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"ttm:agent" => pending.agent = attr.value.to_vec(),
            b"begin" => {
                if let Some(time) = parse_timestamp(&attr.value) {
                    pending.line.start_ms = time;
                }
            }
            b"end" => {
                if let Some(time) = parse_timestamp(&attr.value) {
                    pending.line.end_ms = time;
                }
            }
            _ => {}
        }
    }
}

/// Start a syllable; it stays a fragment until whitespace says otherwise
fn new_syllable(e: &BytesStart<'_>) -> Syllable {
    let mut syllable = Syllable {
        is_part: true,
        ..Default::default()
    };
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"begin" => {
                if let Some(time) = parse_timestamp(&attr.value) {
                    syllable.start_ms = time;
                }
            }
            b"end" => {
                if let Some(time) = parse_timestamp(&attr.value) {
                    syllable.end_ms = time;
                }
            }
            _ => {}
        }
    }
    syllable
}

fn close_syllable(syllables: &mut [Syllable], text: &str) {
    let len = syllables.len();
    if len == 0 {
        return;
    }
    if len >= 2 && text.starts_with(char::is_whitespace) {
        syllables[len - 2].is_part = false;
    }
    let last = &mut syllables[len - 1];
    last.text = text.trim().to_string();
    if text.ends_with(char::is_whitespace) {
        last.is_part = false;
    }
}

/// Text directly inside `<p>`: word separators, or the whole line when untimed
fn loose_text(line: &mut LyricLine, txt: &str) {
    if txt.starts_with(char::is_whitespace) {
        if let Some(last) = line.main_syllables.last_mut() {
            last.is_part = false;
        }
    }
    let trimmed = txt.trim();
    if trimmed.is_empty() {
        return;
    }
    line.main_syllables.push(Syllable {
        text: trimmed.to_string(),
        is_part: !txt.ends_with(char::is_whitespace),
        start_ms: line.start_ms,
        end_ms: line.end_ms,
    });
}

fn finish_line(line: &mut LyricLine) {
    if let Some(last) = line.main_syllables.last_mut() {
        last.is_part = false;
    }
    if let Some(last) = line.background_syllables.last_mut() {
        last.is_part = false;
    }

    // Strip parentheses from background vocals
    if let Some(first) = line.background_syllables.first_mut() {
        if let Some(stripped) = first.text.strip_prefix('(') {
            first.text = stripped.to_string();
        }
    }
    if let Some(last) = line.background_syllables.last_mut() {
        if let Some(stripped) = last.text.strip_suffix(')') {
            last.text = stripped.to_string();
        }
    }
    line.has_background = !line.background_syllables.is_empty();

    if line.main_syllables.len() <= 1 {
        line.is_word_synced = Some(false);
    }

    // Update line timing from syllables
    if line.start_ms == 0 {
        if let Some(first) = line.main_syllables.first() {
            line.start_ms = first.start_ms;
        }
    }
    if line.end_ms == 0 {
        if let Some(last) = line.main_syllables.last() {
            line.end_ms = last.end_ms;
        }
    }
}

/// Parse TTML timestamp format (HH:MM:SS.MS or MM:SS.MS or SS.MS)
fn parse_timestamp(data: &[u8]) -> Option<u64> {
    let s = std::str::from_utf8(data).ok()?;
    let s = s.trim().trim_end_matches('s');

    let parts: Vec<&str> = s.split(':').collect();

    match parts.len() {
        1 => parse_seconds_ms(parts[0]),
        2 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec_ms = parse_seconds_ms(parts[1])?;
            min.checked_mul(60_000)?.checked_add(sec_ms)
        }
        3 => {
            let hour: u64 = parts[0].parse().ok()?;
            let min: u64 = parts[1].parse().ok()?;
            let sec_ms = parse_seconds_ms(parts[2])?;
            hour.checked_mul(3_600_000)?
                .checked_add(min.checked_mul(60_000)?)?
                .checked_add(sec_ms)
        }
        _ => None,
    }
}

fn parse_seconds_ms(s: &str) -> Option<u64> {
    match s.split_once('.') {
        Some((sec, frac)) => {
            let sec: u64 = sec.parse().ok()?;
            let ms = match frac.len() {
                0 => 0,
                1 => frac.parse::<u64>().ok()? * 100,
                2 => frac.parse::<u64>().ok()? * 10,
                3 => frac.parse::<u64>().ok()?,
                _ => frac.get(..3)?.parse::<u64>().ok()?,
            };
            sec.checked_mul(1000)?.checked_add(ms)
        }
        None => {
            let sec: u64 = s.parse().ok()?;
            sec.checked_mul(1000)
        }
    }
}
