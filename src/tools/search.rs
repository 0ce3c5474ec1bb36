//! Web search tool backed by the Serper API
//!
//! Gives the advisor access to current AWS CLI documentation and write-ups.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::{Config, CrewError, Result};

/// Anything that can answer a search query with formatted text
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Queries remembered per process; the oldest is dropped first
const CACHE_CAPACITY: usize = 64;

/// Serper (google.serper.dev) search client
pub struct SerperSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    num_results: u32,
    /// Formatted results of recent queries, when caching is on
    cache: Option<Mutex<QueryCache>>,
}

/// Insertion-ordered map holding at most `capacity` queries
#[derive(Debug)]
struct QueryCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl QueryCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, query: &str) -> Option<&String> {
        self.entries.get(query)
    }

    fn insert(&mut self, query: String, results: String) {
        if self.entries.insert(query.clone(), results).is_some() {
            return;
        }
        self.order.push_back(query);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearch {
    /// Create a search client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .search
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CrewError::config("SERPER_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/search", config.search.base_url.trim_end_matches('/')),
            api_key,
            num_results: config.search.num_results,
            cache: config
                .search
                .cache
                .then(|| Mutex::new(QueryCache::new(CACHE_CAPACITY))),
        })
    }

    fn cached(&self, query: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        cache.lock().ok()?.get(query).cloned()
    }

    fn remember(&self, query: &str, results: &str) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.insert(query.to_string(), results.to_string());
            }
        }
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str) -> Result<String> {
        if let Some(hit) = self.cached(query) {
            tracing::debug!(query, "search cache hit");
            return Ok(hit);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| CrewError::search(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CrewError::search(format!("API error ({}): {}", status, body)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CrewError::search(format!("Failed to parse results: {}", e)))?;

        let formatted = format_results(query, &parsed);
        self.remember(query, &formatted);
        Ok(formatted)
    }
}

fn format_results(query: &str, response: &SearchResponse) -> String {
    let mut out = format!("Search results for '{}':\n", query);

    if let Some(ref answer) = response.answer_box {
        if let Some(text) = answer.answer.as_ref().or(answer.snippet.as_ref()) {
            out.push_str(&format!("\nAnswer: {}\n", text));
        }
    }

    if response.organic.is_empty() {
        out.push_str("\nNo results found.\n");
        return out;
    }

    for (i, result) in response.organic.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   {}\n   {}\n",
            i + 1,
            result.title,
            result.link,
            result.snippet
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "answerBox": {"snippet": "Use aws s3api get-bucket-policy"},
                "organic": [
                    {"title": "get-bucket-policy", "link": "https://docs.aws.amazon.com/cli/s3api", "snippet": "Returns the policy of a bucket."},
                    {"title": "S3 enumeration", "link": "https://example.com/s3"}
                ]
            }"#,
        )
        .unwrap();

        let text = format_results("s3 bucket policy", &response);
        assert!(text.starts_with("Search results for 's3 bucket policy'"));
        assert!(text.contains("Answer: Use aws s3api get-bucket-policy"));
        assert!(text.contains("1. get-bucket-policy"));
        assert!(text.contains("2. S3 enumeration"));
    }

    #[test]
    fn test_format_no_results() {
        let text = format_results("nothing", &SearchResponse::default());
        assert!(text.contains("No results found."));
    }

    #[test]
    fn test_cache_roundtrip() {
        let mut config = Config::default();
        config.search.api_key = Some("serper-test".to_string());
        let search = SerperSearch::from_config(&config).unwrap();

        assert!(search.cached("iam enumeration").is_none());
        search.remember("iam enumeration", "cached text");
        assert_eq!(search.cached("iam enumeration").as_deref(), Some("cached text"));
    }

    #[test]
    fn test_cache_drops_oldest_query() {
        let mut cache = QueryCache::new(2);
        cache.insert("s3".to_string(), "one".to_string());
        cache.insert("iam".to_string(), "two".to_string());
        cache.insert("s3".to_string(), "one again".to_string());
        cache.insert("ec2".to_string(), "three".to_string());

        assert!(cache.get("s3").is_none());
        assert_eq!(cache.get("iam").map(String::as_str), Some("two"));
        assert_eq!(cache.get("ec2").map(String::as_str), Some("three"));
        assert_eq!(cache.entries.len(), 2);
        assert_eq!(cache.order.len(), 2);
    }

    #[test]
    fn test_cache_disabled() {
        let mut config = Config::default();
        config.search.api_key = Some("serper-test".to_string());
        config.search.cache = false;
        let search = SerperSearch::from_config(&config).unwrap();

        search.remember("iam enumeration", "cached text");
        assert!(search.cached("iam enumeration").is_none());
    }
}
