//! Notification sink for events a human should see.

/// Receives alerts that matter beyond the log stream (safety violations,
/// missing protective legs). The config selects the sink; the log-backed
/// one ships in-core.
pub trait Notifier: Send {
    fn notify(&mut self, title: &str, body: &str);
}

/// Routes notifications to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        tracing::warn!(title, "{body}");
    }
}
