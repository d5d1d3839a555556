//! Line-level vs syllable-level timing
//!
//! Presentation only: the engine tracks syllables either way, but a host
//! usually draws line-timed lyrics without per-word highlighting.

use serde::{Deserialize, Serialize};

use crate::features::lyrics::types::LyricDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Line,
    Syllable,
}

/// Decides the granularity of a document
pub trait GranularityPolicy: Send + Sync {
    fn classify(&self, document: &LyricDocument) -> Granularity;
}

/// Samples the first lines and calls the document syllable-timed when enough
/// of them have more than one distinct syllable start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SampledTimingPolicy {
    pub sample_lines: usize,
    pub min_ratio: f64,
}

impl Default for SampledTimingPolicy {
    fn default() -> Self {
        Self {
            sample_lines: 5,
            min_ratio: 0.6,
        }
    }
}

impl GranularityPolicy for SampledTimingPolicy {
    fn classify(&self, document: &LyricDocument) -> Granularity {
        let sample = &document.lines()[..document.len().min(self.sample_lines)];
        if sample.is_empty() {
            return Granularity::Line;
        }
        let timed = sample.iter().filter(|l| l.distinct_starts() > 1).count();
        if timed as f64 >= self.min_ratio * sample.len() as f64 - f64::EPSILON {
            Granularity::Syllable
        } else {
            Granularity::Line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::types::{LyricLine, Syllable};

    fn doc(word_timed: &[bool]) -> LyricDocument {
        LyricDocument::new(
            word_timed
                .iter()
                .enumerate()
                .map(|(i, &timed)| {
                    let start = i as u64 * 2000;
                    let syllables = if timed {
                        vec![
                            Syllable::new("a", false, start, start + 500),
                            Syllable::new("b", false, start + 500, start + 1000),
                        ]
                    } else {
                        vec![
                            Syllable::new("a", false, start, start + 1000),
                            Syllable::new("b", false, start, start + 1000),
                        ]
                    };
                    LyricLine {
                        main_syllables: syllables,
                        start_ms: start,
                        end_ms: start + 1000,
                        ..Default::default()
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn test_ratio_boundary() {
        let policy = SampledTimingPolicy::default();
        assert_eq!(
            policy.classify(&doc(&[true, true, true, false, false])),
            Granularity::Syllable
        );
        assert_eq!(
            policy.classify(&doc(&[true, true, false, false, false])),
            Granularity::Line
        );
    }

    #[test]
    fn test_only_first_lines_sampled() {
        let policy = SampledTimingPolicy::default();
        assert_eq!(
            policy.classify(&doc(&[false, false, false, false, false, true, true, true])),
            Granularity::Line
        );
    }

    #[test]
    fn test_short_and_empty_documents() {
        let policy = SampledTimingPolicy::default();
        assert_eq!(policy.classify(&doc(&[true])), Granularity::Syllable);
        assert_eq!(policy.classify(&LyricDocument::default()), Granularity::Line);
    }
}
