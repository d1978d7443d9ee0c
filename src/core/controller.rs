use crate::core::cache::{CacheEntry, CacheKey, CacheStats, ResultCache};
use crate::core::filter::PropertyFilter;
use crate::core::pagination::{clamp_page, paginate, total_pages};
use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, Page, Property};
use crate::utils::error::Result;
use serde::Serialize;

/// 搜尋狀態機
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchState {
    Idle,
    Debouncing,
    CheckingCache,
    Fetching,
    Computing,
    Errored,
    Published,
}

/// Everything that determines one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub criteria: Criteria,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortOrder,
}

impl SearchRequest {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.page, self.page_size, self.sort, &self.criteria)
    }
}

/// A cache miss that needs the catalog. Hand the result back with
/// [`SearchController::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: CacheKey,
    pub request: SearchRequest,
}

/// What the presentation layer sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub page: Page,
    pub state: SearchState,
    pub is_loading: bool,
    pub error: Option<String>,
    pub from_cache: bool,
    pub sort: SortOrder,
    pub criteria: Criteria,
    /// Incremented on every publish.
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Published(SearchView),
    Fetch(FetchTicket),
    /// The settled request was superseded before it arrived.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortChange {
    /// Re-derived from the retained catalog snapshot, no fetch needed.
    Published(SearchView),
    Debounce(SearchRequest),
}

struct FetchedSet {
    criteria: Criteria,
    properties: Vec<Property>,
}

/// Sans-IO search state machine.
///
/// The controller never performs I/O itself: [`settle`](Self::settle) either
/// publishes from cache or hands out a [`FetchTicket`], and the caller feeds the
/// catalog response back through [`complete`](Self::complete). A ticket whose
/// key is no longer the active one is discarded as stale.
pub struct SearchController {
    cache: ResultCache,
    request: SearchRequest,
    state: SearchState,
    active: Option<CacheKey>,
    fetched: Option<FetchedSet>,
    view: SearchView,
}

impl SearchController {
    pub fn new(cache: ResultCache, page_size: usize, sort: SortOrder) -> Self {
        let page_size = page_size.max(1);
        let request = SearchRequest {
            criteria: Criteria::default(),
            page: 1,
            page_size,
            sort,
        };
        let view = SearchView {
            page: Page::empty(1, page_size),
            state: SearchState::Idle,
            is_loading: false,
            error: None,
            from_cache: false,
            sort,
            criteria: Criteria::default(),
            revision: 0,
        };

        Self {
            cache,
            request,
            state: SearchState::Idle,
            active: None,
            fetched: None,
            view,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn view(&self) -> &SearchView {
        &self.view
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// 新條件一律回到第 1 頁
    pub fn update_criteria(&mut self, criteria: Criteria) -> SearchRequest {
        self.request.criteria = criteria.normalized();
        self.request.page = 1;
        self.enter_debouncing();
        self.request.clone()
    }

    pub fn change_page(&mut self, page: usize) -> SearchRequest {
        self.request.page = clamp_page(page, self.view.page.total_pages);
        self.enter_debouncing();
        self.request.clone()
    }

    pub fn change_page_size(&mut self, page_size: usize) -> SearchRequest {
        self.request.page_size = page_size.max(1);
        self.request.page = 1;
        self.enter_debouncing();
        self.request.clone()
    }

    /// Sorting is a pure re-derivation: if the current criteria's catalog
    /// snapshot is still held, the new order is computed without a fetch.
    pub fn change_sort(&mut self, sort: SortOrder) -> SortChange {
        self.request.sort = sort;
        self.request.page = 1;

        let reusable = self.state == SearchState::Published
            && self.view.error.is_none()
            && self
                .fetched
                .as_ref()
                .is_some_and(|set| set.criteria == self.request.criteria);

        if !reusable {
            self.enter_debouncing();
            return SortChange::Debounce(self.request.clone());
        }

        self.active = None;
        let request = self.request.clone();
        let key = request.cache_key();
        if let Some(view) = self.publish_from_cache(&request, &key) {
            return SortChange::Published(view);
        }

        self.transition(SearchState::Computing);
        let page = match &self.fetched {
            Some(set) => compute_page(&request, &set.properties),
            None => Page::empty(request.page, request.page_size),
        };
        self.store(key, &page);
        SortChange::Published(self.publish(page, false, None))
    }

    /// Debounce settled: consult the cache, or ask for a fetch.
    pub fn settle(&mut self, request: SearchRequest) -> Step {
        if request != self.request {
            tracing::debug!("Settled request was superseded, ignoring");
            return Step::Ignored;
        }

        self.transition(SearchState::CheckingCache);
        let key = request.cache_key();
        if let Some(view) = self.publish_from_cache(&request, &key) {
            return Step::Published(view);
        }

        self.transition(SearchState::Fetching);
        self.active = Some(key.clone());
        Step::Fetch(FetchTicket { key, request })
    }

    /// Feed a catalog response back. Returns `None` for stale results.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<Property>>,
    ) -> Option<SearchView> {
        if self.active.as_ref() != Some(&ticket.key) {
            tracing::debug!(key = %ticket.key, "Discarding stale catalog result");
            return None;
        }
        self.active = None;

        match outcome {
            Ok(properties) => {
                self.transition(SearchState::Computing);
                let page = compute_page(&ticket.request, &properties);
                let mut request = ticket.request;
                let key = if page.page_number == request.page {
                    ticket.key
                } else {
                    // criteria changed under a pending page change
                    tracing::debug!(
                        requested = request.page,
                        clamped = page.page_number,
                        "Requested page is past the last page, clamping"
                    );
                    request.page = page.page_number;
                    self.request.page = page.page_number;
                    request.cache_key()
                };
                self.store(key, &page);
                self.fetched = Some(FetchedSet {
                    criteria: request.criteria,
                    properties,
                });
                Some(self.publish(page, false, None))
            }
            Err(e) => {
                tracing::warn!("⚠️ Catalog fetch failed: {}", e);
                self.transition(SearchState::Errored);
                let page = Page::empty(ticket.request.page, ticket.request.page_size);
                Some(self.publish(page, false, Some(e.user_friendly_message())))
            }
        }
    }

    /// 資料來源變動：清空快取與保留的快照，並重新搜尋目前條件
    pub fn invalidate_catalog(&mut self) -> SearchRequest {
        self.cache.clear();
        self.fetched = None;
        tracing::debug!("Catalog invalidated, result cache cleared");
        self.enter_debouncing();
        self.request.clone()
    }

    fn enter_debouncing(&mut self) {
        // an in-flight fetch for the old request is now stale
        self.active = None;
        self.transition(SearchState::Debouncing);
        self.view.state = SearchState::Debouncing;
        self.view.is_loading = true;
    }

    fn transition(&mut self, next: SearchState) {
        tracing::debug!(from = ?self.state, to = ?next, "Search state transition");
        self.state = next;
    }

    fn publish_from_cache(&mut self, request: &SearchRequest, key: &CacheKey) -> Option<SearchView> {
        let entry = self.cache.get(key)?;
        let pages = total_pages(entry.total_items, request.page_size);
        if request.page != clamp_page(request.page, pages) {
            tracing::debug!(key = %key, "Cached result has fewer pages than requested");
            return None;
        }
        let page = Page {
            items: entry.items.clone(),
            page_number: request.page,
            page_size: request.page_size,
            total_items: entry.total_items,
            total_pages: pages,
        };
        tracing::debug!(key = %key, "Result cache hit");
        Some(self.publish(page, true, None))
    }

    fn store(&mut self, key: CacheKey, page: &Page) {
        self.cache
            .set(key, CacheEntry::new(page.items.clone(), page.total_items));
    }

    fn publish(&mut self, page: Page, from_cache: bool, error: Option<String>) -> SearchView {
        self.transition(SearchState::Published);
        tracing::info!(
            page = page.page_number,
            total_items = page.total_items,
            total_pages = page.total_pages,
            from_cache,
            "Published search results"
        );
        self.view = SearchView {
            page,
            state: SearchState::Published,
            is_loading: false,
            error,
            from_cache,
            sort: self.request.sort,
            criteria: self.request.criteria.clone(),
            revision: self.view.revision + 1,
        };
        self.view.clone()
    }
}

/// filter → sort → paginate, with the page clamped to `[1, max(1, totalPages)]`
pub fn compute_page(request: &SearchRequest, properties: &[Property]) -> Page {
    let filter = PropertyFilter::from_criteria(&request.criteria);
    let mut matched = filter.apply(properties);
    request.sort.sort(&mut matched);
    let last = total_pages(matched.len(), request.page_size);
    paginate(&matched, clamp_page(request.page, last), request.page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::SearchError;

    fn catalog() -> Vec<Property> {
        vec![
            Property::new("1")
                .with_price(200_000.0)
                .with_bedrooms(2)
                .with_amenities(["pool"]),
            Property::new("2").with_price(450_000.0).with_bedrooms(3),
            Property::new("3").with_price(350_000.0).with_bedrooms(4),
        ]
    }

    fn controller() -> SearchController {
        SearchController::new(ResultCache::default(), 10, SortOrder::Relevance)
    }

    fn expect_fetch(step: Step) -> FetchTicket {
        match step {
            Step::Fetch(ticket) => ticket,
            other => panic!("expected a fetch, got {:?}", other),
        }
    }

    fn ids(view: &SearchView) -> Vec<&str> {
        view.page.items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_miss_fetch_compute_publish() {
        let mut controller = controller();
        let request = controller.update_criteria(Criteria::new().with_min_price(300_000.0));
        assert_eq!(controller.state(), SearchState::Debouncing);
        assert!(controller.view().is_loading);

        let ticket = expect_fetch(controller.settle(request));
        assert_eq!(controller.state(), SearchState::Fetching);

        let view = controller.complete(ticket, Ok(catalog())).unwrap();
        assert_eq!(controller.state(), SearchState::Published);
        assert_eq!(ids(&view), vec!["2", "3"]);
        assert_eq!(view.page.total_items, 2);
        assert!(!view.from_cache);
        assert_eq!(controller.cached_entries(), 1);
    }

    #[test]
    fn test_second_identical_search_hits_cache() {
        let mut controller = controller();
        let request = controller.update_criteria(Criteria::new().with_min_bedrooms(3));
        let ticket = expect_fetch(controller.settle(request));
        controller.complete(ticket, Ok(catalog()));

        let request = controller.update_criteria(Criteria::new().with_min_bedrooms(3));
        match controller.settle(request) {
            Step::Published(view) => {
                assert!(view.from_cache);
                assert_eq!(ids(&view), vec!["2", "3"]);
            }
            other => panic!("expected cache hit, got {:?}", other),
        }
        assert_eq!(controller.cache_stats().hits, 1);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut controller = controller();
        let first = controller.update_criteria(Criteria::new().with_min_bedrooms(3));
        let stale = expect_fetch(controller.settle(first));

        let second = controller.update_criteria(Criteria::new().with_min_bedrooms(4));
        assert!(controller.complete(stale, Ok(catalog())).is_none());
        assert_eq!(controller.cached_entries(), 0);

        let ticket = expect_fetch(controller.settle(second));
        let view = controller.complete(ticket, Ok(catalog())).unwrap();
        assert_eq!(ids(&view), vec!["3"]);
    }

    #[test]
    fn test_superseded_settle_is_ignored() {
        let mut controller = controller();
        let old = controller.update_criteria(Criteria::new().with_query("old"));
        controller.update_criteria(Criteria::new().with_query("new"));
        assert_eq!(controller.settle(old), Step::Ignored);
    }

    #[test]
    fn test_fetch_failure_publishes_empty_error_view() {
        let mut controller = controller();
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));

        let view = controller
            .complete(ticket, Err(SearchError::fetch_failure("timeout")))
            .unwrap();
        assert_eq!(view.state, SearchState::Published);
        assert!(view.page.items.is_empty());
        assert!(view.error.as_deref().unwrap().contains("timeout"));
        assert_eq!(controller.cached_entries(), 0);
    }

    #[test]
    fn test_sort_change_rederives_without_fetch() {
        let mut controller = controller();
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));
        controller.complete(ticket, Ok(catalog()));

        match controller.change_sort(SortOrder::PriceDescending) {
            SortChange::Published(view) => {
                assert_eq!(ids(&view), vec!["2", "3", "1"]);
                assert_eq!(view.page.page_number, 1);
                assert_eq!(view.sort, SortOrder::PriceDescending);
            }
            other => panic!("expected immediate publish, got {:?}", other),
        }
    }

    #[test]
    fn test_sort_change_before_publish_debounces() {
        let mut controller = controller();
        controller.update_criteria(Criteria::default());
        assert!(matches!(
            controller.change_sort(SortOrder::Size),
            SortChange::Debounce(_)
        ));
    }

    #[test]
    fn test_page_change_is_clamped_to_known_pages() {
        let mut controller = SearchController::new(ResultCache::default(), 2, SortOrder::Relevance);
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));
        let view = controller.complete(ticket, Ok(catalog())).unwrap();
        assert_eq!(view.page.total_pages, 2);

        assert_eq!(controller.change_page(7).page, 2);
        assert_eq!(controller.change_page(0).page, 1);
    }

    #[test]
    fn test_page_is_clamped_to_results_of_new_criteria() {
        let mut controller = SearchController::new(ResultCache::default(), 1, SortOrder::Relevance);
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));
        let view = controller.complete(ticket, Ok(catalog())).unwrap();
        assert_eq!(view.page.total_pages, 3);

        // page change lands in the same debounce window as the new criteria
        controller.update_criteria(Criteria::new().with_min_bedrooms(4));
        let request = controller.change_page(3);
        assert_eq!(request.page, 3);

        let ticket = expect_fetch(controller.settle(request));
        let view = controller.complete(ticket, Ok(catalog())).unwrap();
        assert_eq!(view.page.page_number, 1);
        assert_eq!(view.page.total_pages, 1);
        assert_eq!(ids(&view), vec!["3"]);
        assert_eq!(controller.request().page, 1);

        let request = controller.change_page(1);
        match controller.settle(request) {
            Step::Published(view) => {
                assert!(view.from_cache);
                assert_eq!(ids(&view), vec!["3"]);
            }
            other => panic!("expected cache hit, got {:?}", other),
        }
    }

    #[test]
    fn test_page_past_the_end_is_never_published() {
        let catalog: Vec<Property> = (1..=5).map(|i| Property::new(i.to_string())).collect();
        let request = SearchRequest {
            criteria: Criteria::default(),
            page: 9,
            page_size: 2,
            sort: SortOrder::Relevance,
        };
        let page = compute_page(&request, &catalog);
        assert_eq!(page.page_number, 3);
        assert_eq!(page.items.len(), 1);

        let empty = compute_page(&request, &[]);
        assert_eq!(empty.page_number, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_sort_change_after_fetch_error_does_not_hide_error() {
        let mut controller = SearchController::new(ResultCache::default(), 2, SortOrder::Relevance);
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));
        controller.complete(ticket, Ok(catalog()));

        let request = controller.change_page(2);
        let ticket = expect_fetch(controller.settle(request));
        let failed = controller
            .complete(ticket, Err(SearchError::fetch_failure("timeout")))
            .unwrap();
        assert!(failed.error.is_some());

        assert!(matches!(
            controller.change_sort(SortOrder::PriceDescending),
            SortChange::Debounce(_)
        ));
        assert_eq!(controller.state(), SearchState::Debouncing);
    }

    #[test]
    fn test_invalidate_clears_cache() {
        let mut controller = controller();
        let request = controller.update_criteria(Criteria::default());
        let ticket = expect_fetch(controller.settle(request));
        controller.complete(ticket, Ok(catalog()));
        assert_eq!(controller.cached_entries(), 1);

        let request = controller.invalidate_catalog();
        assert_eq!(controller.cached_entries(), 0);
        assert!(matches!(controller.settle(request), Step::Fetch(_)));
    }
}
