use thiserror::Error;

use crate::project::domain::segment::Segment;
use crate::transcription::domain::transcriber::{ClipTranscriber, TranscribeError};

use super::batch_logger::BatchLogger;

#[derive(Error, Debug)]
#[error("transcription failed for {segment}: {source}")]
pub struct BatchTranscribeError {
    pub segment: String,
    #[source]
    pub source: TranscribeError,
}

/// Runs ASR over a project's segments, sequentially.
///
/// Already-verified segments are skipped: a human has signed off on them
/// and a machine rewrite would silently discard that work. Each success
/// installs the transcript (clearing `verified`) and invokes
/// `on_segment_done` with the segment's position so the caller can persist
/// or forward the update before the progress report goes out. The first
/// failure aborts the batch; segments transcribed so far keep their new
/// transcripts.
pub struct TranscribeBatchUseCase {
    transcriber: Box<dyn ClipTranscriber>,
}

impl TranscribeBatchUseCase {
    pub fn new(transcriber: Box<dyn ClipTranscriber>) -> Self {
        Self { transcriber }
    }

    pub fn run(
        &self,
        segments: &mut [Segment],
        logger: &mut dyn BatchLogger,
        mut on_segment_done: impl FnMut(usize, &[Segment]),
    ) -> Result<usize, BatchTranscribeError> {
        let pending: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.verified)
            .map(|(i, _)| i)
            .collect();
        let total = pending.len();

        for (completed, position) in pending.into_iter().enumerate() {
            let clip_name = segments[position].clip_name();
            let transcript = self
                .transcriber
                .transcribe(&segments[position].path)
                .map_err(|source| BatchTranscribeError {
                    segment: clip_name.clone(),
                    source,
                })?;

            segments[position].set_asr_transcript(transcript);
            on_segment_done(position, segments);
            logger.progress(completed + 1, total, &clip_name);
        }

        Ok(total)
    }
}
