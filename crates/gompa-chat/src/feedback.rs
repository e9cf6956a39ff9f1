//! Feedback sink. The default sink only logs.

use gompa_core::Result;
use serde::Serialize;
use tracing::info;

use crate::types::FeedbackRequest;

/// A received feedback entry, stamped on arrival.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEntry {
    pub timestamp: String,
    #[serde(flatten)]
    pub request: FeedbackRequest,
}

impl FeedbackEntry {
    pub fn new(request: FeedbackRequest) -> Self {
        Self {
            timestamp: crate::envelope::now_iso8601(),
            request,
        }
    }
}

/// Destination for user feedback.
pub trait FeedbackSink: Send + Sync {
    fn record(&self, entry: &FeedbackEntry) -> Result<()>;
}

/// Writes feedback to the log and nowhere else.
#[derive(Debug, Default)]
pub struct LogFeedbackSink;

impl FeedbackSink for LogFeedbackSink {
    fn record(&self, entry: &FeedbackEntry) -> Result<()> {
        let payload = serde_json::to_string(entry)?;
        info!(feedback = %payload, "Feedback received");
        Ok(())
    }
}
