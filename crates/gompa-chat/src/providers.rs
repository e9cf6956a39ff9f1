//! External LLM provider adapters.
//!
//! Groq and OpenAI both expose the OpenAI chat-completions format, so one
//! implementation covers both; they differ in endpoint, credential, default
//! model and whether the router may feed them web search results.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gompa_core::{Error, ProviderSettings, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::build_messages;
use crate::types::{ChatMessage, GenerationParams, SearchResult};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound chat-completion capability.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Model used when the caller has no override.
    fn default_model(&self) -> &str;

    /// Fails with `ProviderUnconfigured` when no credential is present.
    /// Checked per request, never at startup.
    fn check_configured(&self) -> Result<()>;

    /// Whether the router should run web search before calling this provider.
    fn supports_retrieval(&self) -> bool {
        false
    }

    /// Generate a reply. `Ok(None)` means the provider returned no usable text.
    async fn generate(
        &self,
        message: &str,
        context: Option<&[SearchResult]>,
        params: &GenerationParams,
    ) -> Result<Option<String>>;
}

/// OpenAI-compatible provider (OpenAI, Groq).
pub struct OpenAiCompatProvider {
    kind: ProviderKind,
    client: Client,
    settings: ProviderSettings,
    retrieval: bool,
}

impl OpenAiCompatProvider {
    pub fn new(kind: ProviderKind, settings: ProviderSettings, client: Client) -> Self {
        let retrieval = kind == ProviderKind::OpenAI;
        debug!(provider = %kind, base_url = %settings.base_url, "Initialized LLM provider");
        Self {
            kind,
            client,
            settings,
            retrieval,
        }
    }

    pub fn groq(settings: ProviderSettings, client: Client) -> Self {
        Self::new(ProviderKind::Groq, settings, client)
    }

    pub fn openai(settings: ProviderSettings, client: Client) -> Self {
        Self::new(ProviderKind::OpenAI, settings, client)
    }

    fn api_key(&self) -> Result<&str> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ProviderUnconfigured(self.settings.api_key_var.to_string()))
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

// ── OpenAI API request/response types ───────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<MessageResponse>,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

/// Map a transport failure, on send or body read, to a provider error.
/// Timeouts keep the word "timeout" so they classify as 504. The URL is
/// dropped so its port digits never reach the classifier.
fn transport_error(e: reqwest::Error, failed: &str) -> Error {
    let e = e.without_url();
    if e.is_timeout() {
        Error::Provider(format!("Request timeout: {}", e))
    } else {
        Error::Provider(format!("{}: {}", failed, e))
    }
}

/// Text of the first choice, if any and non-empty.
fn first_choice_text(body: &str) -> Result<Option<String>> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|text| !text.trim().is_empty()))
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    fn check_configured(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    fn supports_retrieval(&self) -> bool {
        self.retrieval
    }

    async fn generate(
        &self,
        message: &str,
        context: Option<&[SearchResult]>,
        params: &GenerationParams,
    ) -> Result<Option<String>> {
        let api_key = self.api_key()?;

        let messages = build_messages(message, context);
        let body = CompletionRequest {
            model: &params.model,
            messages: &messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        let url = self.completions_url();

        debug!(provider = %self.kind, model = %params.model, "Requesting completion from {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, "Request failed"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, "Failed to read response"))?;

        if !status.is_success() {
            return Err(Error::Provider(format!("API error {}: {}", status, text)));
        }

        first_choice_text(&text)
    }
}

/// Adapters keyed by provider name, with a default for unknown names.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    default: String,
}

impl ProviderRegistry {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default: default.into().to_ascii_lowercase(),
        }
    }

    pub fn register(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers
            .insert(provider.kind().as_str().to_string(), provider);
        self
    }

    /// Look up a provider by name, case-insensitively. Unknown names resolve
    /// to the default provider.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers
            .get(&name.to_ascii_lowercase())
            .or_else(|| self.providers.get(&self.default))
            .cloned()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .field("default", &self.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::envelope::ErrorKind;

    fn settings(api_key: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            api_key: api_key.map(String::from),
            api_key_var: "GROQ_API_KEY",
            model: "mixtral-8x7b-32768".into(),
            // Unroutable; tests must never reach the network.
            base_url: "http://127.0.0.1:9/v1/".into(),
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            model: "mixtral-8x7b-32768".into(),
            temperature: 0.7,
            max_tokens: 16,
        }
    }

    #[test]
    fn test_first_choice_text() {
        let body = r#"{"choices":[
            {"message":{"role":"assistant","content":"Rumtek Monastery is..."}},
            {"message":{"content":"second"}}
        ]}"#;
        assert_eq!(
            first_choice_text(body).unwrap(),
            Some("Rumtek Monastery is...".to_string())
        );
    }

    #[test]
    fn test_first_choice_text_absent() {
        assert_eq!(first_choice_text(r#"{"choices":[]}"#).unwrap(), None);
        assert_eq!(first_choice_text(r#"{}"#).unwrap(), None);
        assert_eq!(
            first_choice_text(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap(),
            None
        );
        assert_eq!(
            first_choice_text(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_first_choice_text_rejects_garbage() {
        assert!(matches!(first_choice_text("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let provider = OpenAiCompatProvider::groq(settings(None), Client::new());
        assert_eq!(provider.completions_url(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[test]
    fn test_only_openai_supports_retrieval() {
        assert!(!OpenAiCompatProvider::groq(settings(None), Client::new()).supports_retrieval());
        assert!(OpenAiCompatProvider::openai(settings(None), Client::new()).supports_retrieval());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let provider = OpenAiCompatProvider::groq(settings(None), Client::new());
        assert!(matches!(provider.check_configured(), Err(Error::ProviderUnconfigured(_))));

        let err = provider.generate("hello", None, &params()).await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnconfigured(_)));
        assert_eq!(err.to_string(), "GROQ_API_KEY is not configured");
    }

    #[test]
    fn test_registry_resolves_case_insensitively_with_default() {
        let client = Client::new();
        let registry = ProviderRegistry::new("groq")
            .register(Arc::new(OpenAiCompatProvider::groq(settings(None), client.clone())))
            .register(Arc::new(OpenAiCompatProvider::openai(settings(None), client)));

        assert_eq!(registry.resolve("OpenAI").unwrap().kind(), ProviderKind::OpenAI);
        assert_eq!(registry.resolve("groq").unwrap().kind(), ProviderKind::Groq);
        assert_eq!(registry.resolve("anthropic").unwrap().kind(), ProviderKind::Groq);
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        assert!(ProviderRegistry::new("groq").resolve("groq").is_none());
    }

    fn mock_settings(server: &MockServer) -> ProviderSettings {
        ProviderSettings {
            api_key: Some("sk-test".into()),
            api_key_var: "OPENAI_API_KEY",
            model: "gpt-3.5-turbo".into(),
            base_url: server.url("/v1"),
        }
    }

    fn mock_params() -> GenerationParams {
        GenerationParams {
            model: "gpt-3.5-turbo".into(),
            temperature: 0.5,
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn test_generate_posts_completion_request() {
        let server = MockServer::start_async().await;
        let context = vec![SearchResult {
            title: "Rumtek Monastery".into(),
            snippet: "Seat of the Karmapa".into(),
            url: "https://rumtek.org".into(),
        }];
        let expected_messages =
            serde_json::to_value(build_messages("Where is Rumtek?", Some(&context))).unwrap();

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body(json!({
                        "model": "gpt-3.5-turbo",
                        "messages": expected_messages,
                        "temperature": 0.5,
                        "max_tokens": 16,
                    }));
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Near Gangtok."}}]
                }));
            })
            .await;

        let provider = OpenAiCompatProvider::openai(mock_settings(&server), Client::new());
        let reply = provider
            .generate("Where is Rumtek?", Some(&context), &mock_params())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.as_deref(), Some("Near Gangtok."));
    }

    #[tokio::test]
    async fn test_generate_empty_choices_is_no_reply() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let provider = OpenAiCompatProvider::groq(mock_settings(&server), Client::new());
        let reply = provider.generate("hi", None, &mock_params()).await.unwrap();
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn test_generate_error_status_is_classified() {
        for (status, kind) in [(401, ErrorKind::Unauthorized), (429, ErrorKind::RateLimited)] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(POST).path("/v1/chat/completions");
                    then.status(status).body("upstream says no");
                })
                .await;

            let provider = OpenAiCompatProvider::groq(mock_settings(&server), Client::new());
            let err = provider.generate("hi", None, &mock_params()).await.unwrap_err();

            let text = err.to_string();
            assert!(text.starts_with(&format!("API error {}", status)), "{}", text);
            assert!(text.ends_with(": upstream says no"), "{}", text);
            assert_eq!(ErrorKind::classify(&err), kind);
        }
    }

    #[tokio::test]
    async fn test_generate_timeout_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(json!({ "choices": [] }));
            })
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let provider = OpenAiCompatProvider::groq(mock_settings(&server), client);
        let err = provider.generate("hi", None, &mock_params()).await.unwrap_err();

        assert!(err.to_string().starts_with("Request timeout"), "{}", err);
        assert_eq!(ErrorKind::classify(&err), ErrorKind::Timeout);
    }
}
