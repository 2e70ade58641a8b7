use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub type StatusSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Carries the status sink and the caller's cancellation signal through the
/// asset bootstrap. Cancellation only silences reporting; it never aborts
/// in-flight I/O.
#[derive(Clone)]
pub struct StatusContext {
    sink: Option<StatusSink>,
    cancelled: Arc<AtomicBool>,
}

impl StatusContext {
    pub fn silent() -> Self {
        Self {
            sink: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn to_console() -> Self {
        Self::with_sink(Arc::new(|text: &str| eprintln!("{text}")))
    }

    pub fn with_sink(sink: StatusSink) -> Self {
        Self {
            sink: Some(sink),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_status(&self, text: &str) {
        if self.is_cancelled() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink(text);
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
