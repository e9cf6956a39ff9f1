//! Chat service: provider adapters, optional web search augmentation and
//! the router that ties them together.
//!
//! LLM calls go to external OpenAI-compatible APIs (Groq, OpenAI).

pub mod envelope;
pub mod feedback;
pub mod prompt;
pub mod providers;
pub mod router;
pub mod search;
pub mod types;

pub use envelope::{ErrorKind, ResponseEnvelope, FALLBACK_MESSAGE};
pub use feedback::{FeedbackEntry, FeedbackSink, LogFeedbackSink};
pub use providers::{ChatProvider, OpenAiCompatProvider, ProviderKind, ProviderRegistry};
pub use router::{ChatRouter, RouterSettings};
pub use search::{BingSearch, WebSearch};
pub use types::*;
