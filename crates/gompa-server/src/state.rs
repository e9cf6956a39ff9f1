//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use gompa_chat::{
    BingSearch, ChatRouter, FeedbackSink, LogFeedbackSink, OpenAiCompatProvider, ProviderRegistry,
    RouterSettings,
};
use gompa_core::config::DEFAULT_PROVIDER;
use gompa_core::GompaConfig;

/// Shared application state accessible from all route handlers.
///
/// Immutable after construction; nothing here needs a lock.
pub struct AppState {
    pub config: GompaConfig,
    pub chat: ChatRouter,
    pub feedback: Arc<dyn FeedbackSink>,
}

impl AppState {
    /// Wire the real Groq/OpenAI adapters and Bing search from configuration.
    /// Missing credentials are not an error here.
    pub fn new(config: GompaConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let groq = OpenAiCompatProvider::groq(config.groq.clone(), client.clone());
        let openai = OpenAiCompatProvider::openai(config.openai.clone(), client.clone());
        let providers = ProviderRegistry::new(DEFAULT_PROVIDER)
            .register(Arc::new(groq))
            .register(Arc::new(openai));
        let search = Arc::new(BingSearch::new(&config.search, client));

        let chat = ChatRouter::new(providers, search, RouterSettings::from_config(&config));

        Ok(Self::with_parts(config, chat, Arc::new(LogFeedbackSink)))
    }

    pub fn with_parts(
        config: GompaConfig,
        chat: ChatRouter,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Self {
        Self {
            config,
            chat,
            feedback,
        }
    }
}
