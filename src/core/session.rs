//! Async driver for [`SearchController`].
//!
//! One tokio task owns the controller, its result cache and the debouncer, so
//! every cache mutation is serialized through this loop. Catalog fetches run
//! as child tasks; their results come back tagged with the key they were
//! issued for and the controller drops the ones that went stale meanwhile.

use crate::core::cache::ResultCache;
use crate::core::controller::{
    FetchTicket, SearchController, SearchRequest, SearchView, SortChange, Step,
};
use crate::core::debounce::Debouncer;
use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, Property};
use crate::domain::ports::{CatalogProvider, ConfigProvider};
use crate::utils::error::{Result, SearchError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce_delay: Duration,
    pub page_size: usize,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub default_sort: SortOrder,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            cache_capacity: crate::core::cache::DEFAULT_CAPACITY,
            cache_ttl: crate::core::cache::DEFAULT_TTL,
            default_sort: SortOrder::Relevance,
        }
    }
}

impl SearchSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            debounce_delay: config.debounce_delay(),
            page_size: config.page_size(),
            cache_capacity: config.cache_capacity(),
            cache_ttl: config.cache_ttl(),
            default_sort: config.default_sort(),
        }
    }
}

/// 從展示層送進來的事件
#[derive(Debug, Clone)]
pub enum SearchCommand {
    UpdateCriteria(Criteria),
    ChangePage(usize),
    ChangeSort(SortOrder),
    InvalidateCatalog,
    Shutdown,
}

type FetchOutcome = (FetchTicket, Result<Vec<Property>>);

pub struct SearchSession {
    controller: SearchController,
    provider: Arc<dyn CatalogProvider>,
    debouncer: Debouncer<SearchRequest>,
    settled: mpsc::UnboundedReceiver<SearchRequest>,
    commands: mpsc::UnboundedReceiver<SearchCommand>,
    fetches: JoinSet<FetchOutcome>,
    views: watch::Sender<SearchView>,
}

impl SearchSession {
    /// Start the session loop. Must be called from inside a tokio runtime.
    pub fn spawn(provider: Arc<dyn CatalogProvider>, settings: SearchSettings) -> SearchHandle {
        let cache = ResultCache::new(settings.cache_capacity, settings.cache_ttl);
        let controller = SearchController::new(cache, settings.page_size, settings.default_sort);
        let (debouncer, settled) = Debouncer::new(settings.debounce_delay);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (views, view_rx) = watch::channel(controller.view().clone());

        let session = Self {
            controller,
            provider,
            debouncer,
            settled,
            commands,
            fetches: JoinSet::new(),
            views,
        };

        let task = tokio::spawn(session.run());
        SearchHandle {
            commands: command_tx,
            views: view_rx,
            task,
        }
    }

    async fn run(mut self) {
        tracing::debug!("Search session started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SearchCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(request) = self.settled.recv() => self.handle_settled(request),
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    match joined {
                        Ok((ticket, outcome)) => {
                            if let Some(view) = self.controller.complete(ticket, outcome) {
                                self.views.send_replace(view);
                            }
                        }
                        Err(e) => tracing::warn!("⚠️ Catalog fetch task failed: {}", e),
                    }
                }
            }
        }

        // teardown: no timer may fire and no fetch may publish after this point
        self.debouncer.cancel();
        self.fetches.abort_all();
        tracing::debug!("Search session stopped");
    }

    fn handle_command(&mut self, command: SearchCommand) {
        match command {
            SearchCommand::UpdateCriteria(criteria) => {
                let request = self.controller.update_criteria(criteria);
                self.debounce(request);
            }
            SearchCommand::ChangePage(page) => {
                let request = self.controller.change_page(page);
                self.debounce(request);
            }
            SearchCommand::ChangeSort(sort) => match self.controller.change_sort(sort) {
                SortChange::Published(view) => {
                    self.views.send_replace(view);
                }
                SortChange::Debounce(request) => self.debounce(request),
            },
            SearchCommand::InvalidateCatalog => {
                let request = self.controller.invalidate_catalog();
                self.debounce(request);
            }
            SearchCommand::Shutdown => {}
        }
    }

    fn debounce(&mut self, request: SearchRequest) {
        self.debouncer.push(request);
        self.views.send_replace(self.controller.view().clone());
    }

    fn handle_settled(&mut self, request: SearchRequest) {
        match self.controller.settle(request) {
            Step::Published(view) => {
                self.views.send_replace(view);
            }
            Step::Fetch(ticket) => {
                let provider = Arc::clone(&self.provider);
                self.fetches.spawn(async move {
                    let outcome = provider.fetch_properties(&ticket.request.criteria).await;
                    (ticket, outcome)
                });
            }
            Step::Ignored => {}
        }
    }
}

/// Presentation-side handle to a running [`SearchSession`].
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<SearchCommand>,
    views: watch::Receiver<SearchView>,
    task: JoinHandle<()>,
}

impl SearchHandle {
    fn send(&self, command: SearchCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SearchError::SessionClosed)
    }

    pub fn set_criteria(&self, criteria: Criteria) -> Result<()> {
        self.send(SearchCommand::UpdateCriteria(criteria))
    }

    pub fn set_page(&self, page: usize) -> Result<()> {
        self.send(SearchCommand::ChangePage(page))
    }

    pub fn set_sort(&self, sort: SortOrder) -> Result<()> {
        self.send(SearchCommand::ChangeSort(sort))
    }

    pub fn invalidate_catalog(&self) -> Result<()> {
        self.send(SearchCommand::InvalidateCatalog)
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.views.clone()
    }

    pub fn current(&self) -> SearchView {
        self.views.borrow().clone()
    }

    /// 等待 revision 大於 `after` 的發佈結果
    pub async fn published_after(&mut self, after: u64) -> Result<SearchView> {
        let view = self
            .views
            .wait_for(|view| view.revision > after && !view.is_loading)
            .await
            .map_err(|_| SearchError::SessionClosed)?;
        Ok(view.clone())
    }

    /// Convenience for one-shot callers: update criteria and wait for the
    /// resulting publish.
    pub async fn search(&mut self, criteria: Criteria) -> Result<SearchView> {
        let before = self.views.borrow().revision;
        self.set_criteria(criteria)?;
        self.published_after(before).await
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(SearchCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::warn!("⚠️ Search session ended abnormally: {}", e);
        }
    }
}
