use crate::mathmex::config::MathMexConfig;
use mathmex_core::search::{
    LatexResponse, SearchClient, SearchError, SearchRequest, SearchResponse, SearchResult,
    SummarizeRequest, SummarizeResponse,
};
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct MathMexClient {
    http: Client,
    cfg: MathMexConfig,
}

impl MathMexClient {
    pub fn new(cfg: MathMexConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let mut builder = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        builder = match &cfg.proxy {
            Some(p) => builder.proxy(reqwest::Proxy::all(p)?),
            // The config already folded in HTTP(S)_PROXY; don't let reqwest re-read it.
            None => builder.no_proxy(),
        };
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &MathMexConfig {
        &self.cfg
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SearchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.cfg.endpoint(path);
        let mut attempt = 0u32;
        loop {
            let started = Instant::now();
            match self.post_once(&url, body).await {
                Ok(v) => {
                    debug!(target:"providers::mathmex","POST {} ok in {:?}", url, started.elapsed());
                    return Ok(v);
                }
                Err(e) if e.is_retryable() && attempt < self.cfg.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(300 * attempt as u64);
                    warn!(target:"providers::mathmex","POST {} failed ({}), retry {} in {:?}", url, e, attempt, backoff);
                    sleep(backoff).await;
                }
                Err(e) => {
                    error!(target:"providers::mathmex","POST {} failed: {}", url, e);
                    return Err(e);
                }
            }
        }
    }

    async fn post_once<B, T>(&self, url: &str, body: &B) -> Result<T, SearchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(map_status_err(status, resp.text().await.ok()));
        }
        resp.json::<T>()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[allow(async_fn_in_trait)]
impl SearchClient for MathMexClient {
    async fn search(&self, req: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        if req.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        info!(target:"providers::mathmex","search query_len={} sources={} media_types={}",
            req.query.len(), req.sources.len(), req.media_types.len());
        let resp: SearchResponse = self.post_json("search", req).await?;
        Ok(resp.results)
    }

    async fn summarize(&self, req: &SummarizeRequest) -> Result<String, SearchError> {
        if req.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        info!(target:"providers::mathmex","summarize query_len={} context={}", req.query.len(), req.results.len());
        let resp: SummarizeResponse = self.post_json("summarize", req).await?;
        Ok(resp.summary.unwrap_or_default())
    }

    async fn speech_to_latex(&self, text: &str) -> Result<String, SearchError> {
        if text.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let body = serde_json::json!({ "text": text });
        let resp: LatexResponse = self.post_json("speech-to-latex", &body).await?;
        match resp.latex {
            Some(l) if !l.is_empty() => Ok(l),
            _ => Err(SearchError::Other(
                resp.error.unwrap_or_else(|| "no latex returned".into()),
            )),
        }
    }
}

fn map_reqwest_err(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(e.to_string())
    } else if e.is_request() || e.is_connect() {
        SearchError::Network(e.to_string())
    } else {
        SearchError::Other(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>) -> SearchError {
    let mut body = body.unwrap_or_default();
    // The backend reports request errors as {"error": "..."}.
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(msg) = v["error"].as_str() {
            body = msg.to_string();
        }
    }
    SearchError::Status {
        code: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathmex_core::search::{search_or_empty, SearchFilters};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    /// Serves the canned `(status, body)` responses in order, one per
    /// connection, and records the request bodies it received.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        std::thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut sock, _)) = listener.accept() else { return };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                let header_end = loop {
                    let n = sock.read(&mut chunk).unwrap_or(0);
                    if n == 0 {
                        break None;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(p) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break Some(p + 4);
                    }
                };
                let Some(header_end) = header_end else { continue };
                let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < header_end + len {
                    let n = sock.read(&mut chunk).unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                seen2
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf[header_end..]).to_string());
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = sock.write_all(reply.as_bytes());
            }
        });
        (format!("http://{}/api", addr), seen)
    }

    fn client(base: String, max_retries: u32) -> MathMexClient {
        MathMexClient::new(MathMexConfig {
            base_url: base,
            timeout: Duration::from_secs(5),
            max_retries,
            proxy: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn search_posts_filters_and_decodes_results() {
        let (base, seen) = serve(vec![(
            200,
            r#"{"results":[{"title":"Pythagorean Theorem","body_text":"a^2+b^2=c^2","link":"https://w/p","score":0.9,"media_type":"article"}],"total":1}"#,
        )]);
        let c = client(base, 0);
        let filters = SearchFilters {
            sources: vec!["wikipedia".into()],
            media_types: vec![],
        };
        let results = c.search(&SearchRequest::new("a^2+b^2=c^2", &filters)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Pythagorean Theorem");
        let body: serde_json::Value =
            serde_json::from_str(&seen.lock().unwrap()[0]).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"query":"a^2+b^2=c^2","sources":["wikipedia"],"mediaTypes":[]})
        );
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let (base, seen) = serve(vec![
            (503, "{}"),
            (200, r#"{"summary":"<p>Euler</p>"}"#),
        ]);
        let c = client(base, 2);
        let req = SummarizeRequest {
            query: "e^{i\\pi}+1=0".into(),
            results: vec![],
        };
        assert_eq!(c.summarize(&req).await.unwrap(), "<p>Euler</p>");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (base, seen) = serve(vec![(400, r#"{"error":"No query provided"}"#), (200, "{}")]);
        let c = client(base, 3);
        let err = c.speech_to_latex("x squared").await.unwrap_err();
        match err {
            SearchError::Status { code, body } => {
                assert_eq!(code, 400);
                assert_eq!(body, "No query provided");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn speech_to_latex_returns_latex() {
        let (base, _seen) = serve(vec![(200, r#"{"latex":"x^2"}"#)]);
        let c = client(base, 0);
        assert_eq!(c.speech_to_latex("x squared").await.unwrap(), "x^2");
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_empty() {
        // Bind then drop to get a port nothing listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let c = client(format!("http://127.0.0.1:{}/api", port), 0);
        let req = SearchRequest::new("x^2", &SearchFilters::default());
        assert!(search_or_empty(&c, &req).await.is_empty());
    }

    #[test]
    fn status_errors_keep_backend_message() {
        let e = map_status_err(StatusCode::BAD_REQUEST, Some(r#"{"error":"bad"}"#.into()));
        assert!(matches!(e, SearchError::Status { code: 400, ref body } if body == "bad"));
        let e = map_status_err(StatusCode::BAD_GATEWAY, None);
        assert!(e.is_retryable());
    }
}
