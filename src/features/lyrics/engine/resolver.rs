//! Active line and syllable lookup
//!
//! Plain linear scans; lyric documents are a few hundred lines at most.

use crate::features::lyrics::types::{LyricDocument, Syllable};

/// Every line whose `[start, end]` window contains `time_ms`, ascending
///
/// Overlapping windows (duets) yield more than one index.
pub fn find_active_lines(document: &LyricDocument, time_ms: f64) -> Vec<usize> {
    document
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(time_ms))
        .map(|(i, _)| i)
        .collect()
}

/// First syllable whose window contains `time_ms`
///
/// `None` covers before the first, after the last and between syllables.
pub fn find_active_syllable(syllables: &[Syllable], time_ms: f64) -> Option<usize> {
    syllables.iter().position(|s| s.contains(time_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::types::LyricLine;

    fn line(start: u64, end: u64, words: &[(&str, u64, u64)]) -> LyricLine {
        LyricLine {
            main_syllables: words
                .iter()
                .map(|&(t, s, e)| Syllable::new(t, false, s, e))
                .collect(),
            start_ms: start,
            end_ms: end,
            ..Default::default()
        }
    }

    fn hello() -> LyricDocument {
        LyricDocument::new(vec![line(
            1000,
            3000,
            &[("Hel", 1000, 1500), ("lo", 1500, 3000)],
        )])
    }

    #[test]
    fn test_single_line_scenario() {
        let doc = hello();
        assert_eq!(find_active_lines(&doc, 1200.0), vec![0]);
        assert_eq!(find_active_syllable(&doc.lines()[0].main_syllables, 1200.0), Some(0));
        assert_eq!(find_active_syllable(&doc.lines()[0].main_syllables, 2800.0), Some(1));
        assert!(find_active_lines(&doc, 500.0).is_empty());
        assert_eq!(find_active_syllable(&doc.lines()[0].main_syllables, 500.0), None);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let doc = hello();
        assert_eq!(find_active_lines(&doc, 1000.0), vec![0]);
        assert_eq!(find_active_lines(&doc, 3000.0), vec![0]);
        assert!(find_active_lines(&doc, 3000.5).is_empty());
    }

    #[test]
    fn test_duet_overlap_ascending() {
        let doc = LyricDocument::new(vec![
            line(1000, 2000, &[("a", 1000, 2000)]),
            line(4000, 6000, &[("me", 4000, 6000)]),
            line(4500, 5500, &[("you", 4500, 5500)]),
            line(7000, 8000, &[("b", 7000, 8000)]),
        ]);
        assert_eq!(find_active_lines(&doc, 5000.0), vec![1, 2]);
    }

    #[test]
    fn test_overlapping_syllables_first_wins() {
        let syllables = vec![
            Syllable::new("x", false, 0, 1000),
            Syllable::new("y", false, 500, 1500),
        ];
        assert_eq!(find_active_syllable(&syllables, 700.0), Some(0));
        assert_eq!(find_active_syllable(&syllables, 1200.0), Some(1));
    }

    #[test]
    fn test_between_syllables_is_none() {
        let syllables = vec![
            Syllable::new("x", false, 0, 1000),
            Syllable::new("y", false, 2000, 3000),
        ];
        assert_eq!(find_active_syllable(&syllables, 1500.0), None);
    }

    #[test]
    fn test_results_sorted_and_contain_time() {
        let doc = LyricDocument::new(vec![
            line(0, 5000, &[("a", 0, 5000)]),
            line(1000, 2000, &[("b", 1000, 2000)]),
            line(1500, 9000, &[("c", 1500, 9000)]),
            line(3000, 4000, &[("d", 3000, 4000)]),
        ]);
        for t in (0..10_000).step_by(250) {
            let time = t as f64;
            let active = find_active_lines(&doc, time);
            assert!(active.windows(2).all(|w| w[0] < w[1]));
            for i in active {
                assert!(doc.lines()[i].contains(time));
            }
        }
    }

    #[test]
    fn test_empty_document_and_nan() {
        let empty = LyricDocument::default();
        assert!(find_active_lines(&empty, 0.0).is_empty());
        assert!(find_active_lines(&hello(), f64::NAN).is_empty());
    }
}
