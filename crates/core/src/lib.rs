pub mod filters;
pub mod history;
pub mod paging;
pub mod settings;
pub mod store;
pub mod timefmt;

pub mod search {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serialize};
    use thiserror::Error;
    use tracing::warn;

    pub const SUMMARY_UNREACHABLE: &str = "Backend not reachable! Please try again later.";
    pub const SUMMARY_EMPTY: &str = "No answer generated.";

    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
    pub struct SearchResult {
        #[serde(default, deserialize_with = "string_or_null")]
        pub title: String,
        #[serde(default, deserialize_with = "string_or_null")]
        pub body_text: String,
        #[serde(default, deserialize_with = "string_or_null")]
        pub link: String,
        #[serde(default, deserialize_with = "lenient_score")]
        pub score: f64,
        #[serde(default, deserialize_with = "string_or_null")]
        pub media_type: String,
    }

    impl SearchResult {
        pub fn is_video(&self) -> bool {
            self.media_type == "video"
        }
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
    pub struct SearchFilters {
        pub sources: Vec<String>,
        pub media_types: Vec<String>,
    }

    impl SearchFilters {
        pub fn is_active(&self) -> bool {
            !self.sources.is_empty() || !self.media_types.is_empty()
        }

        pub fn active_count(&self) -> usize {
            self.sources.len() + self.media_types.len()
        }
    }

    #[derive(Clone, Debug, Serialize, PartialEq, Eq)]
    pub struct SearchRequest {
        pub query: String,
        pub sources: Vec<String>,
        #[serde(rename = "mediaTypes")]
        pub media_types: Vec<String>,
    }

    impl SearchRequest {
        pub fn new(query: impl Into<String>, filters: &SearchFilters) -> Self {
            Self {
                query: query.into(),
                sources: filters.sources.clone(),
                media_types: filters.media_types.clone(),
            }
        }
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct SummarizeRequest {
        pub query: String,
        pub results: Vec<SearchResult>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchResponse {
        #[serde(default)]
        pub results: Vec<SearchResult>,
        #[serde(default)]
        pub total: Option<usize>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SummarizeResponse {
        #[serde(default)]
        pub summary: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct LatexResponse {
        #[serde(default)]
        pub latex: Option<String>,
        #[serde(default)]
        pub error: Option<String>,
    }

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("network: {0}")] Network(String),
        #[error("timeout: {0}")] Timeout(String),
        #[error("status {code}: {body}")] Status { code: u16, body: String },
        #[error("decode: {0}")] Decode(String),
        #[error("empty query")] EmptyQuery,
        #[error("other: {0}")] Other(String),
    }

    impl SearchError {
        /// Transient failures worth another attempt.
        pub fn is_retryable(&self) -> bool {
            match self {
                SearchError::Network(_) | SearchError::Timeout(_) => true,
                SearchError::Status { code, .. } => *code >= 500,
                _ => false,
            }
        }
    }

    #[allow(async_fn_in_trait)]
    pub trait SearchClient: Send + Sync {
        async fn search(&self, req: &SearchRequest) -> Result<Vec<SearchResult>, SearchError>;
        async fn summarize(&self, req: &SummarizeRequest) -> Result<String, SearchError>;
        async fn speech_to_latex(&self, text: &str) -> Result<String, SearchError>;
    }

    /// Runs a search and degrades every failure to an empty result list.
    pub async fn search_or_empty<C: SearchClient>(client: &C, req: &SearchRequest) -> Vec<SearchResult> {
        if req.query.trim().is_empty() {
            return Vec::new();
        }
        match client.search(req).await {
            Ok(results) => results,
            Err(e) => {
                warn!(target: "core::search", "search failed, showing no results: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn summarize_or_fallback<C: SearchClient>(
        client: &C,
        query: &str,
        results: Vec<SearchResult>,
    ) -> String {
        let req = SummarizeRequest {
            query: query.to_string(),
            results,
        };
        match client.summarize(&req).await {
            Ok(s) if s.trim().is_empty() => SUMMARY_EMPTY.to_string(),
            Ok(s) => s,
            Err(e) => {
                warn!(target: "core::search", "summarize failed: {}", e);
                SUMMARY_UNREACHABLE.to_string()
            }
        }
    }

    static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:youtube\.com/.*v=|youtu\.be/)([^&\n?#]+)").expect("static regex")
    });
    static HTML_BREAK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</h[1-6]>").expect("static regex"));
    static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

    pub fn youtube_id(link: &str) -> Option<String> {
        YOUTUBE_ID
            .captures(link)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Flattens the backend's HTML summary into plain text for the terminal.
    pub fn strip_html(s: &str) -> String {
        let with_breaks = HTML_BREAK.replace_all(s, "\n");
        let text = HTML_TAG.replace_all(&with_breaks, "");
        text.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
            .trim()
            .to_string()
    }

    fn string_or_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
    }

    // The backend has sent scores both as numbers and as numeric strings.
    fn lenient_score<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = serde_json::Value::deserialize(d)?;
        Ok(match v {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }

}
