//! Chat router: validation, provider selection, optional retrieval and
//! outcome normalization for a single chat message.

use std::sync::Arc;

use gompa_core::{Error, GenerationSettings, GompaConfig, Result};
use tracing::{error, info};

use crate::envelope::{ErrorKind, ResponseEnvelope, FALLBACK_MESSAGE};
use crate::providers::ProviderRegistry;
use crate::search::WebSearch;
use crate::types::GenerationParams;

/// Static routing settings, taken from configuration at construction.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Provider name as configured; resolved case-insensitively.
    pub provider: String,
    pub generation: GenerationSettings,
    pub web_search: bool,
    pub search_count: usize,
    pub expose_details: bool,
}

impl RouterSettings {
    pub fn from_config(config: &GompaConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            generation: config.generation,
            web_search: config.search.enabled,
            search_count: config.search.count,
            expose_details: config.environment.exposes_error_details(),
        }
    }
}

pub struct ChatRouter {
    providers: ProviderRegistry,
    search: Arc<dyn WebSearch>,
    settings: RouterSettings,
}

impl ChatRouter {
    pub fn new(
        providers: ProviderRegistry,
        search: Arc<dyn WebSearch>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            providers,
            search,
            settings,
        }
    }

    /// Handle one chat message and return the envelope to send back.
    pub async fn handle(&self, message: Option<&str>) -> ResponseEnvelope {
        match self.respond(message).await {
            Ok(reply) => ResponseEnvelope::success(reply),
            Err(e) => {
                let kind = ErrorKind::classify(&e);
                if kind == ErrorKind::InvalidInput {
                    info!("Rejected chat request: {}", e);
                } else {
                    error!(kind = ?kind, "Chat request failed: {}", e);
                }
                ResponseEnvelope::failure(&e, self.settings.expose_details)
            }
        }
    }

    async fn respond(&self, message: Option<&str>) -> Result<String> {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .ok_or(Error::InvalidInput)?;

        let provider = self.providers.resolve(&self.settings.provider).ok_or_else(|| {
            Error::Internal(format!("no provider registered for {:?}", self.settings.provider))
        })?;

        info!(provider = %provider.kind(), "Chat request ({} chars)", message.len());

        // Fail on a missing credential before spending a search call.
        provider.check_configured()?;

        let context = if provider.supports_retrieval() && self.settings.web_search {
            let results = self.search.search(message, self.settings.search_count).await?;
            info!("Retrieved {} search results", results.len());
            Some(results).filter(|r| !r.is_empty())
        } else {
            None
        };

        let reply = provider
            .generate(message, context.as_deref(), &self.params(provider.default_model()))
            .await?;

        Ok(reply
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
    }

    fn params(&self, model: &str) -> GenerationParams {
        GenerationParams {
            model: model.to_string(),
            temperature: self.settings.generation.temperature,
            max_tokens: self.settings.generation.max_tokens,
        }
    }
}
