use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::batch_logger::BatchLogger;
use crate::pipeline::split_audio_use_case::SplitAudioUseCase;
use crate::pipeline::transcribe_batch_use_case::TranscribeBatchUseCase;
use crate::project::domain::segment::Segment;

/// Messages sent from a batch worker thread to the control thread.
///
/// Everything crosses the channel by value; the canonical segment list is
/// only ever mutated on the consumer side in response to these.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// `(completed, total, clip name)`, strictly increasing per batch.
    Progress(usize, usize, String),
    /// Split finished; the full registry for the new project.
    SplitComplete(Vec<Segment>),
    /// One segment transcribed; `position` indexes the project's list.
    SegmentTranscribed { position: usize, transcript: String },
    TranscribeComplete { transcribed: usize },
    /// Any failure, caught at the worker boundary. Terminates the batch.
    Failed(String),
}

/// Admission guard: at most one batch of a given kind in flight.
///
/// `try_acquire` hands out a permit that releases the slot on drop;
/// a second acquisition while a permit lives returns `None`, which callers
/// surface as a status message, not an error.
#[derive(Clone, Default)]
pub struct BatchSlot {
    active: Arc<AtomicBool>,
}

impl BatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<BatchPermit> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(BatchPermit {
                active: self.active.clone(),
            })
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

pub struct BatchPermit {
    active: Arc<AtomicBool>,
}

impl Drop for BatchPermit {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Forwards use-case progress into the worker channel.
struct ChannelLogger {
    tx: Sender<WorkerMessage>,
}

impl BatchLogger for ChannelLogger {
    fn progress(&mut self, completed: usize, total: usize, name: &str) {
        let _ = self
            .tx
            .send(WorkerMessage::Progress(completed, total, name.to_string()));
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }
}

/// Run a split on a worker thread. The permit is released when the worker
/// finishes, successfully or not.
pub fn spawn_split(
    use_case: SplitAudioUseCase,
    audio_path: PathBuf,
    textgrid_path: PathBuf,
    output_dir: PathBuf,
    permit: BatchPermit,
) -> Receiver<WorkerMessage> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    thread::spawn(move || {
        let mut logger = ChannelLogger { tx: tx.clone() };
        let result = use_case.run(&audio_path, &textgrid_path, &output_dir, &mut logger);
        // Release the slot before the terminal message so a consumer that
        // sees it can immediately start the next batch.
        drop(permit);
        match result {
            Ok(segments) => {
                let _ = tx.send(WorkerMessage::SplitComplete(segments));
            }
            Err(e) => {
                let _ = tx.send(WorkerMessage::Failed(e.to_string()));
            }
        }
    });

    rx
}

/// Run a transcription batch on a worker thread over a value copy of the
/// segment list; the control thread applies `SegmentTranscribed` updates to
/// the canonical list as they arrive.
pub fn spawn_transcribe(
    use_case: TranscribeBatchUseCase,
    mut segments: Vec<Segment>,
    permit: BatchPermit,
) -> Receiver<WorkerMessage> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    thread::spawn(move || {
        let updates_tx = tx.clone();
        let mut logger = ChannelLogger { tx: tx.clone() };
        let result = use_case.run(&mut segments, &mut logger, |position, segments| {
            let _ = updates_tx.send(WorkerMessage::SegmentTranscribed {
                position,
                transcript: segments[position].transcript.clone(),
            });
        });
        drop(permit);
        match result {
            Ok(transcribed) => {
                let _ = tx.send(WorkerMessage::TranscribeComplete { transcribed });
            }
            Err(e) => {
                let _ = tx.send(WorkerMessage::Failed(e.to_string()));
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::domain::transcriber::{ClipTranscriber, TranscribeError};
    use std::path::Path;

    #[test]
    fn test_slot_admits_one_batch() {
        let slot = BatchSlot::new();
        let permit = slot.try_acquire();
        assert!(permit.is_some());
        // Starting a second batch while one is in flight is a no-op.
        assert!(slot.try_acquire().is_none());
        assert!(slot.is_active());

        drop(permit);
        assert!(!slot.is_active());
        assert!(slot.try_acquire().is_some());
    }

    struct EchoTranscriber;

    impl ClipTranscriber for EchoTranscriber {
        fn transcribe(&self, clip: &Path) -> Result<String, TranscribeError> {
            Ok(format!("text for {}", clip.display()))
        }
    }

    fn segment(name: &str) -> Segment {
        Segment {
            tier: "t".to_string(),
            index: 1,
            start_ms: 0,
            end_ms: 1000,
            path: PathBuf::from(format!("/out/t/{name}")),
            mark: "m".to_string(),
            transcript: String::new(),
            asr_generated: false,
            verified: false,
        }
    }

    #[test]
    fn test_transcribe_worker_streams_updates_then_completes() {
        let slot = BatchSlot::new();
        let permit = slot.try_acquire().unwrap();
        let use_case = TranscribeBatchUseCase::new(Box::new(EchoTranscriber));

        let rx = spawn_transcribe(use_case, vec![segment("a.wav"), segment("b.wav")], permit);
        let messages: Vec<WorkerMessage> = rx.iter().collect();

        // Per segment: an update then its progress report; then completion.
        assert_eq!(messages.len(), 5);
        assert!(matches!(
            messages[0],
            WorkerMessage::SegmentTranscribed { position: 0, .. }
        ));
        assert!(matches!(messages[1], WorkerMessage::Progress(1, 2, _)));
        assert!(matches!(
            messages[4],
            WorkerMessage::TranscribeComplete { transcribed: 2 }
        ));
        // Channel closed means the worker finished and released the slot.
        assert!(!slot.is_active());
    }

    struct FailingTranscriber;

    impl ClipTranscriber for FailingTranscriber {
        fn transcribe(&self, _: &Path) -> Result<String, TranscribeError> {
            Err(TranscribeError::Service("boom".to_string()))
        }
    }

    #[test]
    fn test_worker_failure_becomes_single_terminating_message() {
        let slot = BatchSlot::new();
        let permit = slot.try_acquire().unwrap();
        let use_case = TranscribeBatchUseCase::new(Box::new(FailingTranscriber));

        let rx = spawn_transcribe(use_case, vec![segment("a.wav")], permit);
        let messages: Vec<WorkerMessage> = rx.iter().collect();

        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], WorkerMessage::Failed(_)));
        assert!(!slot.is_active());
    }
}
