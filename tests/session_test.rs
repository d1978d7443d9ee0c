use async_trait::async_trait;
use listing_search::core::controller::SearchState;
use listing_search::domain::ports::CatalogProvider;
use listing_search::{
    Criteria, InMemoryCatalog, Property, Result, SearchSession, SearchSettings, SortOrder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// 計數並可延遲回應的 catalog
struct CountingCatalog {
    inner: InMemoryCatalog,
    calls: AtomicUsize,
    slow_bedrooms: Option<u32>,
}

impl CountingCatalog {
    fn new(properties: Vec<Property>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCatalog::new(properties),
            calls: AtomicUsize::new(0),
            slow_bedrooms: None,
        })
    }

    fn slow_for(properties: Vec<Property>, bedrooms: u32) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCatalog::new(properties),
            calls: AtomicUsize::new(0),
            slow_bedrooms: Some(bedrooms),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for CountingCatalog {
    async fn fetch_properties(&self, criteria: &Criteria) -> Result<Vec<Property>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = if criteria.min_bedrooms.is_some() && criteria.min_bedrooms == self.slow_bedrooms
        {
            Duration::from_secs(1)
        } else {
            Duration::from_millis(10)
        };
        tokio::time::sleep(delay).await;
        self.inner.fetch_properties(criteria).await
    }
}

fn catalog() -> Vec<Property> {
    vec![
        Property::new("1").with_price(200_000.0).with_bedrooms(2),
        Property::new("2").with_price(450_000.0).with_bedrooms(3),
        Property::new("3").with_price(350_000.0).with_bedrooms(4),
    ]
}

fn settings(debounce_ms: u64) -> SearchSettings {
    SearchSettings {
        debounce_delay: Duration::from_millis(debounce_ms),
        ..SearchSettings::default()
    }
}

fn ids(view: &listing_search::SearchView) -> Vec<String> {
    view.page.items.iter().map(|p| p.id.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_triggers_single_fetch() {
    let provider = CountingCatalog::new(catalog());
    let mut handle = SearchSession::spawn(provider.clone(), settings(500));

    for price in 1..=5u64 {
        handle
            .set_criteria(Criteria::new().with_min_price(price as f64 * 100_000.0))
            .unwrap();
        if price < 5 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
    let last_change = Instant::now();

    let view = handle.published_after(0).await.unwrap();
    let waited = last_change.elapsed();

    assert_eq!(provider.calls(), 1);
    assert_eq!(view.criteria.min_price.map(|p| p.get()), Some(500_000.0));
    assert!(waited >= Duration::from_millis(500));
    assert!(waited < Duration::from_millis(600));
    assert_eq!(view.revision, 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_fetch_is_never_published() {
    let provider = CountingCatalog::slow_for(catalog(), 2);
    let mut handle = SearchSession::spawn(provider.clone(), settings(100));

    handle
        .set_criteria(Criteria::new().with_min_bedrooms(2))
        .unwrap();
    // let the slow request settle and start fetching
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(provider.calls(), 1);

    handle
        .set_criteria(Criteria::new().with_min_bedrooms(4))
        .unwrap();
    let view = handle.published_after(0).await.unwrap();
    assert_eq!(ids(&view), vec!["3"]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let current = handle.current();
    assert_eq!(current.revision, view.revision);
    assert_eq!(current.criteria.min_bedrooms, Some(4));
    assert_eq!(provider.calls(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeat_search_is_served_from_cache() {
    let provider = CountingCatalog::new(catalog());
    let mut handle = SearchSession::spawn(provider.clone(), settings(100));

    let first = handle
        .search(Criteria::new().with_min_bedrooms(3))
        .await
        .unwrap();
    assert!(!first.from_cache);

    handle
        .search(Criteria::new().with_min_price(400_000.0))
        .await
        .unwrap();

    let again = handle
        .search(Criteria::new().with_min_bedrooms(3))
        .await
        .unwrap();
    assert!(again.from_cache);
    assert_eq!(ids(&again), ids(&first));
    assert_eq!(provider.calls(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sort_change_reorders_without_refetch() {
    let provider = CountingCatalog::new(catalog());
    let mut handle = SearchSession::spawn(provider.clone(), settings(100));

    let view = handle.search(Criteria::default()).await.unwrap();
    assert_eq!(ids(&view), vec!["1", "2", "3"]);

    handle.set_sort(SortOrder::PriceDescending).unwrap();
    let sorted = handle.published_after(view.revision).await.unwrap();

    assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    assert_eq!(sorted.page.page_number, 1);
    assert_eq!(sorted.state, SearchState::Published);
    assert_eq!(provider.calls(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_page_change_goes_through_debounce_and_clamps() {
    let provider = CountingCatalog::new(catalog());
    let mut handle = SearchSession::spawn(
        provider.clone(),
        SearchSettings {
            page_size: 2,
            ..settings(100)
        },
    );

    let first = handle.search(Criteria::default()).await.unwrap();
    assert_eq!(first.page.total_pages, 2);

    handle.set_page(9).unwrap();
    let last = handle.published_after(first.revision).await.unwrap();
    assert_eq!(last.page.page_number, 2);
    assert_eq!(ids(&last), vec!["3"]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_debounce() {
    let provider = CountingCatalog::new(catalog());
    let handle = SearchSession::spawn(provider.clone(), settings(500));

    handle.set_criteria(Criteria::new().with_query("x")).unwrap();
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(provider.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_observe_session_close() {
    let provider = CountingCatalog::new(catalog());
    let handle = SearchSession::spawn(provider, settings(100));
    let views = handle.subscribe();

    handle.shutdown().await;
    assert!(views.has_changed().is_err());
}
