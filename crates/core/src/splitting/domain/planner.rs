use std::path::{Path, PathBuf};

use crate::annotation::domain::interval::Tier;
use crate::shared::constants::FALLBACK_TIER_DIR;

/// One clip the extractor will produce, fully determined before any
/// filesystem or encoder work happens.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedSegment {
    pub tier: String,
    /// 1-based position among the labeled intervals of this tier.
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub path: PathBuf,
    /// Trimmed interval label, never empty.
    pub mark: String,
}

/// Directory name for a tier: characters outside `[A-Za-z0-9_.-]` are
/// replaced, runs collapsing to a single `_`. A name that sanitizes to
/// nothing falls back to a fixed literal.
pub fn sanitize_tier_dir(name: &str) -> String {
    let mut out = String::new();
    let mut pending_gap = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
            if pending_gap {
                out.push('_');
                pending_gap = false;
            }
            out.push(c);
        } else if !out.is_empty() {
            pending_gap = true;
        }
    }
    if out.is_empty() {
        FALLBACK_TIER_DIR.to_string()
    } else {
        out
    }
}

/// Plan every clip for the parsed tiers, deterministically.
///
/// Per tier (in file order): keep only intervals with a non-blank mark,
/// number them 1..N over that subsequence, and round boundaries outward
/// (floor the start, ceil the end) to whole milliseconds so no labeled
/// audio is truncated. Filenames embed tier, zero-padded index, and both
/// boundaries, so identical input yields identical paths on every run.
///
/// Pure computation: nothing here touches the filesystem.
pub fn plan_tiers(tiers: &[Tier], output_dir: &Path) -> Vec<PlannedSegment> {
    let mut planned = Vec::new();

    for tier in tiers {
        let labeled: Vec<_> = tier.labeled_intervals().collect();
        let tier_dir = output_dir.join(sanitize_tier_dir(&tier.name));
        let pad = digits(labeled.len());

        for (offset, interval) in labeled.iter().enumerate() {
            let index = offset as u32 + 1;
            let start_ms = (interval.min_time * 1000.0).floor() as u64;
            let end_ms = (interval.max_time * 1000.0).ceil() as u64;
            let file_name = format!(
                "{}_{:0pad$}_{}_{}.wav",
                tier.name,
                index,
                start_ms,
                end_ms,
                pad = pad
            );
            planned.push(PlannedSegment {
                tier: tier.name.clone(),
                index,
                start_ms,
                end_ms,
                path: tier_dir.join(file_name),
                mark: interval.trimmed_mark().to_string(),
            });
        }
    }

    planned
}

/// Decimal digit width of `n`, minimum 1.
fn digits(n: usize) -> usize {
    n.to_string().len().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::interval::Interval;
    use rstest::rstest;

    fn tier(name: &str, intervals: &[(f64, f64, &str)]) -> Tier {
        Tier {
            name: name.to_string(),
            intervals: intervals
                .iter()
                .map(|&(min_time, max_time, mark)| Interval {
                    min_time,
                    max_time,
                    mark: mark.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_boundary_rounding_is_outward() {
        let tiers = vec![tier("t", &[(1.2345, 2.0001, "x")])];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(planned[0].start_ms, 1234);
        assert_eq!(planned[0].end_ms, 2001);
    }

    #[test]
    fn test_blank_marks_consume_no_index() {
        let tiers = vec![tier(
            "t",
            &[
                (0.0, 1.0, ""),
                (1.0, 2.0, "  "),
                (2.0, 3.0, "hello"),
                (3.0, 4.0, "world"),
            ],
        )];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(planned.len(), 2);
        assert_eq!((planned[0].index, planned[0].mark.as_str()), (1, "hello"));
        assert_eq!((planned[1].index, planned[1].mark.as_str()), (2, "world"));
    }

    #[test]
    fn test_planning_is_deterministic() {
        let tiers = vec![
            tier("a", &[(0.0, 0.5, "x"), (0.5, 1.0, "y")]),
            tier("b", &[(0.0, 2.0, "z")]),
        ];
        let first = plan_tiers(&tiers, Path::new("/out"));
        let second = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_filename_embeds_tier_index_and_bounds() {
        let tiers = vec![tier("words", &[(1.0, 2.5, "x")])];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(
            planned[0].path,
            PathBuf::from("/out/words/words_1_1000_2500.wav")
        );
    }

    #[test]
    fn test_index_padding_follows_labeled_count() {
        let intervals: Vec<_> = (0..10)
            .map(|i| (i as f64, i as f64 + 1.0, "m"))
            .collect();
        let tiers = vec![tier("t", &intervals)];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert!(planned[0].path.ends_with("t/t_01_0_1000.wav"));
        assert!(planned[9].path.ends_with("t/t_10_9000_10000.wav"));
    }

    #[test]
    fn test_mark_is_trimmed() {
        let tiers = vec![tier("t", &[(0.0, 1.0, "  hello ")])];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(planned[0].mark, "hello");
    }

    #[test]
    fn test_tiers_keep_file_order() {
        let tiers = vec![
            tier("second_speaker", &[(0.0, 1.0, "a")]),
            tier("first_speaker", &[(0.0, 1.0, "b")]),
        ];
        let planned = plan_tiers(&tiers, Path::new("/out"));
        assert_eq!(planned[0].tier, "second_speaker");
        assert_eq!(planned[1].tier, "first_speaker");
    }

    #[rstest]
    #[case("Speaker 1/2", "Speaker_1_2")]
    #[case("words", "words")]
    #[case("a.b-c_d", "a.b-c_d")]
    #[case("  spaced  ", "spaced")]
    #[case("a   b", "a_b")]
    #[case("é", "tier")]
    #[case("", "tier")]
    #[case("///", "tier")]
    fn test_sanitize_tier_dir(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize_tier_dir(name), expected);
    }
}
