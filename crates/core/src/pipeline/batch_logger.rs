/// Cross-cutting observer for batch operations (splitting, transcription).
///
/// Decouples use cases from specific output mechanisms (stdout, worker
/// channels, log crate) so each caller can observe batch behavior without
/// changing the orchestration code. Progress is reported strictly after the
/// corresponding file or transcript is durably produced, in increasing
/// `completed` order.
pub trait BatchLogger: Send {
    /// Report per-item progress: `(completed, total, item name)`.
    fn progress(&mut self, completed: usize, total: usize, name: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);
}

/// Silent logger that discards all events. Used by tests and by callers
/// with their own channel-based progress.
pub struct NullBatchLogger;

impl BatchLogger for NullBatchLogger {
    fn progress(&mut self, _completed: usize, _total: usize, _name: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// Terminal-oriented logger for direct CLI use.
pub struct StdoutBatchLogger;

impl BatchLogger for StdoutBatchLogger {
    fn progress(&mut self, completed: usize, total: usize, name: &str) {
        println!("{completed}/{total}: {name}");
    }

    fn info(&mut self, message: &str) {
        println!("{message}");
    }
}
