use std::path::PathBuf;

use crate::splitting::domain::planner::PlannedSegment;

/// One extracted clip and its transcription state.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Owning tier name; not necessarily unique across the project.
    pub tier: String,
    /// 1-based position among the labeled intervals of the tier.
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub path: PathBuf,
    /// Original interval label, trimmed; never empty.
    pub mark: String,
    pub transcript: String,
    /// True while the current transcript was last written by ASR rather
    /// than a person.
    pub asr_generated: bool,
    /// True once a person has confirmed the transcript.
    pub verified: bool,
}

/// Derived per-segment status; ordering rank is Empty < Unverified <
/// Verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SegmentStatus {
    Empty,
    Unverified,
    Verified,
}

impl SegmentStatus {
    pub fn rank(self) -> u8 {
        match self {
            SegmentStatus::Empty => 0,
            SegmentStatus::Unverified => 1,
            SegmentStatus::Verified => 2,
        }
    }
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentStatus::Empty => write!(f, "Empty"),
            SegmentStatus::Unverified => write!(f, "Unverified"),
            SegmentStatus::Verified => write!(f, "Verified"),
        }
    }
}

impl Segment {
    /// Fresh segment from a plan entry, before any transcription.
    pub fn from_planned(planned: PlannedSegment) -> Self {
        Self {
            tier: planned.tier,
            index: planned.index,
            start_ms: planned.start_ms,
            end_ms: planned.end_ms,
            path: planned.path,
            mark: planned.mark,
            transcript: String::new(),
            asr_generated: false,
            verified: false,
        }
    }

    pub fn status(&self) -> SegmentStatus {
        if self.transcript.trim().is_empty() {
            SegmentStatus::Empty
        } else if self.verified {
            SegmentStatus::Verified
        } else {
            SegmentStatus::Unverified
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Clip filename, the key the presentation layer addresses segments by.
    pub fn clip_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Install an ASR result. Always clears `verified`: a machine rewrite
    /// of a confirmed transcript needs a fresh human pass.
    pub fn set_asr_transcript(&mut self, transcript: String) {
        self.transcript = transcript;
        self.asr_generated = true;
        self.verified = false;
    }

    pub fn set_manual_transcript(&mut self, transcript: String) {
        self.transcript = transcript;
        self.asr_generated = false;
    }
}
