//! Shared state for the request handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use nodes::{default_tags, PipelineExecutor};
use pipeline::{PublishCapability, Tag};

pub struct AppState {
    pub executor: Arc<PipelineExecutor>,

    /// Used by `POST /publish`, independent of the pipeline's publish toggle.
    pub publisher: Arc<dyn PublishCapability>,

    pub tags: BTreeSet<Tag>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(executor: Arc<PipelineExecutor>, publisher: Arc<dyn PublishCapability>) -> Self {
        Self {
            executor,
            publisher,
            tags: default_tags(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeSet<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
