/// One time range within a tier, optionally carrying a text label.
///
/// Times are in seconds. `min_time <= max_time` is guaranteed by the
/// parser; intervals with an empty or whitespace-only mark are preserved
/// here and filtered out during planning.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub min_time: f64,
    pub max_time: f64,
    pub mark: String,
}

impl Interval {
    /// Trimmed label text.
    pub fn trimmed_mark(&self) -> &str {
        self.mark.trim()
    }

    /// Whether this interval carries a non-blank label.
    pub fn is_labeled(&self) -> bool {
        !self.trimmed_mark().is_empty()
    }
}

/// A named, ordered track of intervals (typically one per speaker).
#[derive(Clone, Debug, PartialEq)]
pub struct Tier {
    pub name: String,
    pub intervals: Vec<Interval>,
}

impl Tier {
    pub fn labeled_intervals(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter().filter(|i| i.is_labeled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(mark: &str) -> Interval {
        Interval {
            min_time: 0.0,
            max_time: 1.0,
            mark: mark.to_string(),
        }
    }

    #[test]
    fn test_blank_marks_are_unlabeled() {
        assert!(!interval("").is_labeled());
        assert!(!interval("   ").is_labeled());
        assert!(!interval("\t\n").is_labeled());
        assert!(interval("hello").is_labeled());
    }

    #[test]
    fn test_trimmed_mark_strips_whitespace() {
        assert_eq!(interval("  hello ").trimmed_mark(), "hello");
    }

    #[test]
    fn test_labeled_intervals_preserve_order() {
        let tier = Tier {
            name: "words".to_string(),
            intervals: vec![interval(""), interval("a"), interval(" "), interval("b")],
        };
        let marks: Vec<_> = tier.labeled_intervals().map(|i| i.trimmed_mark()).collect();
        assert_eq!(marks, vec!["a", "b"]);
    }
}
