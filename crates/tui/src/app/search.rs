use std::future::Future;
use std::sync::mpsc::Sender;

use mathmex_core::search::{search_or_empty, SearchClient, SearchRequest, SearchResult};
use providers::mathmex::{MathMexClient, MathMexConfig};
use tracing::{debug, error, info};

use super::{App, NetEvent};

impl App {
    /// Records `query` in the journal, then asks the backend for results.
    pub fn start_search(&mut self, query: String) {
        self.journal.record(&query);
        self.history_selected = 0;
        self.history_scroll = 0;

        self.search_seq += 1;
        let seq = self.search_seq;
        self.loading = true;
        self.results.clear();
        self.results_cache.clear();
        self.marked.clear();
        self.pager.reset();
        self.result_selected = 0;
        self.results_scroll = 0;
        self.last_query = Some(query.clone());

        let req = SearchRequest::new(query, &self.filters);
        info!(target: "tui", "search seq={} query_len={} filters={}", seq, req.query.len(), self.filters.active_count());
        spawn_backend(
            self.backend.clone(),
            self.net_tx.clone(),
            NetEvent::Results {
                seq,
                results: Vec::new(),
            },
            move |client, tx| async move {
                let results = search_or_empty(&client, &req).await;
                let _ = tx.send(NetEvent::Results { seq, results });
            },
        );
        self.dirty = true;
    }

    pub fn on_results(&mut self, seq: u64, results: Vec<SearchResult>) {
        if seq != self.search_seq {
            debug!(target: "tui", "dropping stale results seq={} current={}", seq, self.search_seq);
            return;
        }
        info!(target: "tui", "results seq={} count={}", seq, results.len());
        self.results = results;
        self.results_cache.clear();
        self.loading = false;
        self.searched = true;
    }

    pub fn page_results(&self) -> &[SearchResult] {
        let r = self.pager.range(self.results.len());
        &self.results[r]
    }

    pub fn next_page(&mut self) {
        if self.pager.next(self.results.len()) {
            self.on_page_changed();
        }
    }

    pub fn prev_page(&mut self) {
        if self.pager.prev() {
            self.on_page_changed();
        }
    }

    fn on_page_changed(&mut self) {
        self.result_selected = 0;
        self.results_scroll = 0;
        self.results_cache.clear();
    }

    pub fn select_result_up(&mut self) {
        self.result_selected = self.result_selected.saturating_sub(1);
        self.ensure_result_visible();
    }

    pub fn select_result_down(&mut self) {
        let n = self.page_results().len();
        if self.result_selected + 1 < n {
            self.result_selected += 1;
        }
        self.ensure_result_visible();
    }

    pub fn selected_result_index(&self) -> Option<usize> {
        let r = self.pager.range(self.results.len());
        let idx = r.start + self.result_selected;
        (idx < r.end).then_some(idx)
    }

    /// Marks or unmarks the selected result as context for the answer.
    pub fn toggle_mark_selected(&mut self) {
        let Some(idx) = self.selected_result_index() else {
            return;
        };
        if !self.marked.remove(&idx) {
            self.marked.insert(idx);
        }
    }

    pub(crate) fn request_latex(&mut self, text: String) {
        self.notice = Some(crate::strings::NOTICE_CONVERTING.to_string());
        spawn_backend(
            self.backend.clone(),
            self.net_tx.clone(),
            NetEvent::Latex(Err(String::from("backend not configured"))),
            move |client, tx| async move {
                let r = client
                    .speech_to_latex(&text)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(NetEvent::Latex(r));
            },
        );
    }
}

/// Runs `job` against a fresh client on a background thread with its own
/// runtime. When no backend is configured, or the client can't be built,
/// `fallback` is delivered instead.
pub(crate) fn spawn_backend<F, Fut>(
    backend: Option<MathMexConfig>,
    tx: Sender<NetEvent>,
    fallback: NetEvent,
    job: F,
) where
    F: FnOnce(MathMexClient, Sender<NetEvent>) -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let Some(cfg) = backend else {
        let _ = tx.send(fallback);
        return;
    };
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!(target: "tui", "failed to start runtime: {}", e);
                let _ = tx.send(fallback);
                return;
            }
        };
        let client = match MathMexClient::new(cfg) {
            Ok(c) => c,
            Err(e) => {
                error!(target: "tui", "failed to build client: {:#}", e);
                let _ = tx.send(fallback);
                return;
            }
        };
        rt.block_on(job(client, tx));
    });
}
