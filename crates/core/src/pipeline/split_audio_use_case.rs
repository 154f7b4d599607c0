use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::annotation::domain::annotation_reader::{AnnotationReader, TextGridError};
use crate::project::domain::segment::Segment;
use crate::splitting::domain::clip_encoder::{ClipEncoder, EncoderError};
use crate::splitting::domain::planner::plan_tiers;

use super::batch_logger::BatchLogger;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("failed to parse annotation file: {0}")]
    Parse(#[from] TextGridError),
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("extraction failed for {segment}: {source}")]
    Extraction {
        segment: String,
        #[source]
        source: EncoderError,
    },
}

/// Splits a recording into per-interval clips according to its TextGrid.
///
/// The source audio is transcoded once to an intermediate WAV so segment
/// cuts never re-decode the original container; every labeled interval then
/// becomes one deterministic clip. Progress is reported after each clip;
/// the first encoder failure aborts the batch, leaving prior clips on disk
/// for inspection.
pub struct SplitAudioUseCase {
    reader: Box<dyn AnnotationReader>,
    encoder: Box<dyn ClipEncoder>,
}

impl SplitAudioUseCase {
    pub fn new(reader: Box<dyn AnnotationReader>, encoder: Box<dyn ClipEncoder>) -> Self {
        Self { reader, encoder }
    }

    pub fn run(
        &self,
        audio_path: &Path,
        textgrid_path: &Path,
        output_dir: &Path,
        logger: &mut dyn BatchLogger,
    ) -> Result<Vec<Segment>, SplitError> {
        let tiers = self.reader.read_tiers(textgrid_path)?;
        let planned = plan_tiers(&tiers, output_dir);
        let total = planned.len();

        fs::create_dir_all(output_dir).map_err(|source| SplitError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let intermediate = output_dir.join(format!("{stem}.wav"));

        logger.info(&format!(
            "transcoding {} to {}",
            audio_path.display(),
            intermediate.display()
        ));
        self.encoder
            .transcode_to_wav(audio_path, &intermediate)
            .map_err(|source| SplitError::Extraction {
                segment: intermediate
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                source,
            })?;

        let mut segments = Vec::with_capacity(total);
        for (completed, planned_segment) in planned.into_iter().enumerate() {
            if let Some(parent) = planned_segment.path.parent() {
                fs::create_dir_all(parent).map_err(|source| SplitError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            self.encoder
                .extract_clip(
                    &intermediate,
                    planned_segment.start_ms,
                    planned_segment.end_ms,
                    &planned_segment.path,
                )
                .map_err(|source| SplitError::Extraction {
                    segment: planned_segment
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source,
                })?;

            let segment = Segment::from_planned(planned_segment);
            logger.progress(completed + 1, total, &segment.clip_name());
            segments.push(segment);
        }

        Ok(segments)
    }
}
