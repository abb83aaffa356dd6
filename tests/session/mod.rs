mod streaming;

use std::rc::Rc;

use hexview::{DocumentSession, MemoryViews, PluginCatalog, ViewSinks, ViewerConfig};

use crate::common::{recording_descriptor, CallLog, CollectingReporter, RecordingProgress};

/// A session wired to recording collaborators, with a `recorder` plugin
/// available next to the built-in ones.
pub struct Harness {
    pub session: DocumentSession,
    pub views: MemoryViews,
    pub progress: RecordingProgress,
    pub reporter: Rc<CollectingReporter>,
    pub calls: CallLog,
}

pub fn harness(config: ViewerConfig) -> Harness {
    let calls = CallLog::default();
    let mut catalog = PluginCatalog::builtin();
    catalog.register(recording_descriptor("recorder", &calls));

    let (sinks, views) = ViewSinks::in_memory();
    let progress = RecordingProgress::default();
    let reporter = Rc::new(CollectingReporter::default());
    let session = DocumentSession::builder()
        .with_config(config)
        .with_views(sinks)
        .with_progress(progress.clone())
        .with_reporter(reporter.clone())
        .with_resolver(catalog)
        .build()
        .expect("valid configuration");

    Harness {
        session,
        views,
        progress,
        reporter,
        calls,
    }
}

pub fn default_harness() -> Harness {
    harness(ViewerConfig::default())
}
