//! Structured loading progress.
//!
//! Code running during startup calls [`report_progress`]; the
//! [`ProgressLayer`] picks those events out of the log stream and hands them
//! to whatever is connected to the [`ProgressFeed`] (the splash screen).

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Log target reserved for progress events.
pub const PROGRESS_TARGET: &str = "progress";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: String,
    pub text: String,
}

/// Emit a progress event through `tracing`.
pub fn report_progress(stage: &str, text: &str) {
    tracing::info!(target: PROGRESS_TARGET, stage, text, "{text}");
}

type Sink = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Connection point between the logging layer and a consumer.
///
/// Cheap to clone; all clones share the same sink.
#[derive(Clone, Default)]
pub struct ProgressFeed {
    sink: Arc<RwLock<Option<Sink>>>,
}

impl ProgressFeed {
    /// Replace the current consumer.
    pub fn connect<F>(&self, sink: F)
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(sink));
    }

    pub fn disconnect(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_connected(&self) -> bool {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns false if nobody is listening.
    pub fn deliver(&self, event: ProgressEvent) -> bool {
        let sink = self.sink.read().unwrap_or_else(PoisonError::into_inner);
        match sink.as_ref() {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ProgressFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressFeed")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// `tracing_subscriber` layer forwarding `target: "progress"` events.
pub struct ProgressLayer {
    feed: ProgressFeed,
}

impl ProgressLayer {
    pub fn new(feed: ProgressFeed) -> Self {
        Self { feed }
    }
}

impl<S: Subscriber> Layer<S> for ProgressLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != PROGRESS_TARGET {
            return;
        }

        let mut visitor = ProgressVisitor::default();
        event.record(&mut visitor);
        // events without a text field carry nothing to display
        if let Some(progress) = visitor.finish() {
            self.feed.deliver(progress);
        }
    }
}

#[derive(Default)]
struct ProgressVisitor {
    stage: Option<String>,
    text: Option<String>,
}

impl ProgressVisitor {
    fn finish(self) -> Option<ProgressEvent> {
        let text = self.text?;
        Some(ProgressEvent {
            stage: self.stage.unwrap_or_default(),
            text,
        })
    }
}

impl Visit for ProgressVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "stage" => self.stage = Some(value.to_owned()),
            "text" => self.text = Some(value.to_owned()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "stage" => self.stage = Some(format!("{value:?}")),
            "text" => self.text = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    fn collect(f: impl FnOnce()) -> Vec<ProgressEvent> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let feed = ProgressFeed::default();
        let sink = seen.clone();
        feed.connect(move |ev| sink.lock().unwrap().push(ev));

        let subscriber = tracing_subscriber::registry().with(ProgressLayer::new(feed));
        tracing::subscriber::with_default(subscriber, f);

        let events = seen.lock().unwrap().clone();
        events
    }

    #[test]
    fn report_progress_is_forwarded() {
        let events = collect(|| report_progress("models", "Loading models"));
        assert_eq!(
            events,
            vec![ProgressEvent {
                stage: "models".into(),
                text: "Loading models".into(),
            }]
        );
    }

    #[test]
    fn other_targets_are_ignored() {
        let events = collect(|| {
            tracing::info!(target: "main", stage = "x", text = "y", "unrelated");
        });
        assert!(events.is_empty());
    }

    #[test]
    fn events_without_text_are_ignored() {
        let events = collect(|| {
            tracing::info!(target: PROGRESS_TARGET, stage = "only-stage", "no text");
            tracing::info!(target: PROGRESS_TARGET, "a - b - c");
        });
        assert!(events.is_empty());
    }

    #[test]
    fn display_fields_are_accepted() {
        let name = String::from("Preparing workspace");
        let events = collect(|| {
            tracing::info!(target: PROGRESS_TARGET, text = %name, "progress");
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "Preparing workspace");
        assert_eq!(events[0].stage, "");
    }

    #[test]
    fn disconnected_feed_reports_no_listener() {
        let feed = ProgressFeed::default();
        assert!(!feed.deliver(ProgressEvent {
            stage: String::new(),
            text: "x".into(),
        }));

        feed.connect(|_| {});
        assert!(feed.is_connected());
        feed.disconnect();
        assert!(!feed.is_connected());
    }
}
