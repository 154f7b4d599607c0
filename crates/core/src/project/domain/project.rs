use std::path::PathBuf;

use crate::shared::constants::{DEFAULT_ASR_MODEL, PROJECT_VERSION};

use super::segment::{Segment, SegmentStatus};

/// Aggregate root: one split session and everything needed to resume it.
///
/// Created by a completed split, mutated whenever a transcript or
/// verification flag changes, and persisted on every such mutation.
/// The segment list is exclusively owned here; views index into it by
/// position.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub version: u32,
    pub audio_path: PathBuf,
    pub textgrid_path: PathBuf,
    pub output_dir: PathBuf,
    pub batch_asr: bool,
    pub credentials_path: Option<PathBuf>,
    pub asr_model: String,
    pub segments: Vec<Segment>,
}

impl Project {
    pub fn from_split(
        audio_path: PathBuf,
        textgrid_path: PathBuf,
        output_dir: PathBuf,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            version: PROJECT_VERSION,
            audio_path,
            textgrid_path,
            output_dir,
            batch_asr: false,
            credentials_path: None,
            asr_model: DEFAULT_ASR_MODEL.to_string(),
            segments,
        }
    }

    /// `(empty, unverified, verified)` counts for the status header.
    pub fn status_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for segment in &self.segments {
            match segment.status() {
                SegmentStatus::Empty => counts.0 += 1,
                SegmentStatus::Unverified => counts.1 += 1,
                SegmentStatus::Verified => counts.2 += 1,
            }
        }
        counts
    }

    pub fn segment_by_clip_name(&mut self, clip_name: &str) -> Option<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|s| s.clip_name() == clip_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(transcript: &str, verified: bool) -> Segment {
        Segment {
            tier: "t".to_string(),
            index: 1,
            start_ms: 0,
            end_ms: 1000,
            path: PathBuf::from("/out/t/t_1_0_1000.wav"),
            mark: "m".to_string(),
            transcript: transcript.to_string(),
            asr_generated: false,
            verified,
        }
    }

    #[test]
    fn test_from_split_defaults() {
        let p = Project::from_split(
            PathBuf::from("/a.mp3"),
            PathBuf::from("/a.TextGrid"),
            PathBuf::from("/splits"),
            vec![],
        );
        assert_eq!(p.version, PROJECT_VERSION);
        assert_eq!(p.asr_model, DEFAULT_ASR_MODEL);
        assert!(!p.batch_asr);
        assert!(p.credentials_path.is_none());
    }

    #[test]
    fn test_status_counts() {
        let p = Project {
            segments: vec![
                segment("", false),
                segment("a", false),
                segment("b", true),
                segment("c", true),
            ],
            ..Project::from_split(
                PathBuf::from("/a.mp3"),
                PathBuf::from("/a.TextGrid"),
                PathBuf::from("/splits"),
                vec![],
            )
        };
        assert_eq!(p.status_counts(), (1, 1, 2));
    }

    #[test]
    fn test_segment_lookup_by_clip_name() {
        let mut p = Project::from_split(
            PathBuf::from("/a.mp3"),
            PathBuf::from("/a.TextGrid"),
            PathBuf::from("/splits"),
            vec![segment("", false)],
        );
        assert!(p.segment_by_clip_name("t_1_0_1000.wav").is_some());
        assert!(p.segment_by_clip_name("missing.wav").is_none());
    }
}
