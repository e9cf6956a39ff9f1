//! Web search client used for retrieval augmentation (Bing Web Search v7).

use async_trait::async_trait;
use gompa_core::{Error, Result, SearchSettings};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::types::SearchResult;

/// A single-query web search capability.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>>;
}

pub struct BingSearch {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    market: String,
}

impl BingSearch {
    pub fn new(settings: &SearchSettings, client: Client) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.clone(),
            market: settings.market.clone(),
        }
    }

    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        count: usize,
    ) -> std::result::Result<BingResponse, FetchError> {
        let count = count.to_string();
        let params = [
            ("q", query),
            ("mkt", self.market.as_str()),
            ("count", count.as_str()),
        ];
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        Ok(response.json::<BingResponse>().await?)
    }
}

/// Upstream failure detail. Logged, never returned to the client.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Default, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default, rename = "displayUrl")]
    display_url: Option<String>,
    #[serde(default)]
    url: String,
}

/// Reduce a search response to at most `count` results. Missing snippets
/// fall back to the display URL, then to the empty string.
fn collect_results(response: BingResponse, count: usize) -> Vec<SearchResult> {
    response
        .web_pages
        .map(|pages| pages.value)
        .unwrap_or_default()
        .into_iter()
        .take(count)
        .map(|page| SearchResult {
            title: page.name,
            snippet: page
                .snippet
                .filter(|s| !s.is_empty())
                .or(page.display_url)
                .unwrap_or_default(),
            url: page.url,
        })
        .collect()
}

#[async_trait]
impl WebSearch for BingSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::SearchUnconfigured("BING_API_KEY".into()))?;

        debug!("Web search for {:?} (count={})", query, count);

        match self.fetch(api_key, query, count).await {
            Ok(response) => Ok(collect_results(response, count)),
            Err(e) => {
                error!("Bing search error: {}", e);
                Err(Error::SearchUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn parse(json: &str) -> BingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_collect_results_maps_fields() {
        let response = parse(
            r#"{"webPages":{"value":[
                {"name":"Rumtek Monastery","snippet":"Seat of the Karmapa",
                 "displayUrl":"rumtek.org","url":"https://rumtek.org"},
                {"name":"Enchey","displayUrl":"enchey.example","url":"https://enchey.example"},
                {"name":"Pemayangtse","url":"https://pemayangtse.example"}
            ]}}"#,
        );

        let results = collect_results(response, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rumtek Monastery");
        assert_eq!(results[0].snippet, "Seat of the Karmapa");
        assert_eq!(results[0].url, "https://rumtek.org");
        assert_eq!(results[1].snippet, "enchey.example");
        assert_eq!(results[2].snippet, "");
    }

    #[test]
    fn test_collect_results_truncates() {
        let response = parse(
            r#"{"webPages":{"value":[
                {"name":"a","url":"https://a"},
                {"name":"b","url":"https://b"},
                {"name":"c","url":"https://c"}
            ]}}"#,
        );
        let results = collect_results(response, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, "b");
    }

    #[test]
    fn test_collect_results_without_web_pages() {
        assert!(collect_results(parse(r#"{"_type":"SearchResponse"}"#), 3).is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let settings = SearchSettings {
            enabled: true,
            api_key: None,
            endpoint: "http://127.0.0.1:9/search".into(),
            market: "en-US".into(),
            count: 3,
        };
        let search = BingSearch::new(&settings, Client::new());
        let err = search.search("Rumtek", 3).await.unwrap_err();
        assert!(matches!(err, Error::SearchUnconfigured(_)));
        assert_eq!(err.to_string(), "BING_API_KEY is not configured");
    }

    fn settings_for(server: &MockServer) -> SearchSettings {
        SearchSettings {
            enabled: true,
            api_key: Some("bing-test".into()),
            endpoint: server.url("/search"),
            market: "en-US".into(),
            count: 3,
        }
    }

    #[tokio::test]
    async fn test_search_sends_query_and_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "Rumtek Monastery")
                    .query_param("mkt", "en-US")
                    .query_param("count", "2")
                    .header("ocp-apim-subscription-key", "bing-test");
                then.status(200).json_body(json!({
                    "webPages": {"value": [
                        {"name": "Rumtek", "snippet": "Seat of the Karmapa",
                         "url": "https://rumtek.org"},
                        {"name": "Enchey", "displayUrl": "enchey.example",
                         "url": "https://enchey.example"},
                        {"name": "Tashiding", "url": "https://tashiding.example"}
                    ]}
                }));
            })
            .await;

        let search = BingSearch::new(&settings_for(&server), Client::new());
        let results = search.search("Rumtek Monastery", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "Seat of the Karmapa");
        assert_eq!(results[1].snippet, "enchey.example");
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(401).body(r#"{"error":{"code":"InvalidAuthorization"}}"#);
            })
            .await;

        let search = BingSearch::new(&settings_for(&server), Client::new());
        let err = search.search("Rumtek", 3).await.unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable));
        assert_eq!(err.to_string(), "Search service unavailable");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let search = BingSearch::new(&settings_for(&server), Client::new());
        let err = search.search("Rumtek", 3).await.unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable));
    }
}
