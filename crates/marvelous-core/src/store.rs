//! Shared browsing state over the catalog: the series list, the current
//! detail, the random avatar, and the user's library.
//!
//! Operations take `&self` and may overlap. Every operation kind (list,
//! detail, avatar) carries a request token; a response is applied only if
//! its token is still the latest issued for that kind, so the most recent
//! request wins regardless of the order responses arrive in. `fetch_page`
//! and `search` share the list token.
//!
//! The state mutex is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marvelous_api::{CatalogService, Character, Series, MAX_PAGE_LIMIT};
use rand::Rng;

use crate::library::{Library, Toggle};
use crate::persistence::KeyValueStore;

/// Random character offsets are drawn from `0..RANDOM_OFFSET_CEILING`.
pub const RANDOM_OFFSET_CEILING: u32 = 1500;

/// Attempts before the avatar pick gives up.
pub const AVATAR_MAX_ATTEMPTS: u32 = 5;

/// Progress of one operation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// How a list operation (`fetch_page` / `search`) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Results were applied to the list.
    Loaded { added: usize },
    /// A page fetch was already running; it will load one more page when done.
    Coalesced,
    /// A search query is active, so there is nothing further to page through.
    SearchActive,
    /// A newer list request was issued before this one resolved.
    Superseded,
    /// The request failed; see [`SeriesStore::last_error`].
    Failed,
}

/// Result of the random avatar pick.
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarPick {
    Found(Character),
    NotFound,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    List,
    Detail,
    Avatar,
}

#[derive(Debug, Default)]
struct StoreState {
    series: Vec<Series>,
    detail: Option<Series>,
    avatar: Option<Character>,
    library: Library,

    offset: u32,
    limit: u32,
    search_query: String,
    last_error: Option<String>,

    list_state: LoadState,
    detail_state: LoadState,
    avatar_state: LoadState,

    list_token: u64,
    detail_token: u64,
    avatar_token: u64,

    /// Token of the running page fetch, if any.
    page_in_flight: Option<u64>,
    /// A page fetch arrived while one was running.
    more_requested: bool,
}

impl StoreState {
    fn token(&self, kind: Kind) -> u64 {
        match kind {
            Kind::List => self.list_token,
            Kind::Detail => self.detail_token,
            Kind::Avatar => self.avatar_token,
        }
    }

    fn load_state_mut(&mut self, kind: Kind) -> &mut LoadState {
        match kind {
            Kind::List => &mut self.list_state,
            Kind::Detail => &mut self.detail_state,
            Kind::Avatar => &mut self.avatar_state,
        }
    }

    /// Issue a new token for `kind`, invalidating any request still running.
    fn begin(&mut self, kind: Kind) -> u64 {
        let token = match kind {
            Kind::List => &mut self.list_token,
            Kind::Detail => &mut self.detail_token,
            Kind::Avatar => &mut self.avatar_token,
        };
        *token += 1;
        let token = *token;
        *self.load_state_mut(kind) = LoadState::Loading;
        token
    }

    fn is_current(&self, kind: Kind, token: u64) -> bool {
        self.token(kind) == token
    }

    fn fail(&mut self, kind: Kind, message: String) {
        tracing::warn!("{message}");
        self.last_error = Some(message.clone());
        *self.load_state_mut(kind) = LoadState::Failed(message);
    }
}

/// The application store. Generic over the catalog so tests can supply a fake.
pub struct SeriesStore<C> {
    catalog: C,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<StoreState>,
}

impl<C: CatalogService> SeriesStore<C> {
    /// Create an empty store. Call [`restore`](Self::restore) once to load the library.
    ///
    /// `limit` is clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(catalog: C, storage: Arc<dyn KeyValueStore>, limit: u32) -> Self {
        Self {
            catalog,
            storage,
            state: Mutex::new(StoreState {
                limit: limit.clamp(1, MAX_PAGE_LIMIT),
                ..StoreState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── List ────────────────────────────────────────────────────

    /// Load the next page of series and append it to the list.
    pub async fn fetch_page(&self) -> PageOutcome {
        let (mut token, mut offset, limit) = {
            let mut state = self.lock();
            if !state.search_query.is_empty() {
                return PageOutcome::SearchActive;
            }
            if state.page_in_flight.is_some() {
                state.more_requested = true;
                tracing::debug!("Page fetch already running, coalescing");
                return PageOutcome::Coalesced;
            }
            let token = state.begin(Kind::List);
            state.page_in_flight = Some(token);
            (token, state.offset, state.limit)
        };

        let mut added = 0;
        loop {
            tracing::debug!(offset, limit, "Fetching series page");
            let result = self.catalog.series_page(offset, limit).await;

            let mut state = self.lock();
            if !state.is_current(Kind::List, token) {
                tracing::debug!(offset, "Discarding superseded series page");
                return PageOutcome::Superseded;
            }
            match result {
                Ok(page) => {
                    added += page.results.len();
                    state.series.extend(page.results);
                    state.offset = state.offset.saturating_add(limit);

                    if std::mem::take(&mut state.more_requested) {
                        token = state.begin(Kind::List);
                        state.page_in_flight = Some(token);
                        offset = state.offset;
                        continue;
                    }
                    state.page_in_flight = None;
                    state.list_state = LoadState::Loaded;
                    return PageOutcome::Loaded { added };
                }
                Err(e) => {
                    state.page_in_flight = None;
                    state.more_requested = false;
                    state.fail(Kind::List, format!("Error fetching series: {e}"));
                    return PageOutcome::Failed;
                }
            }
        }
    }

    /// Search series by title prefix. The empty query goes back to paging.
    ///
    /// Either way the list and offset are reset first, and any running page
    /// fetch is superseded. A non-empty query loads a single page which
    /// replaces the list.
    pub async fn search(&self, query: &str) -> PageOutcome {
        let ticket = {
            let mut state = self.lock();
            state.search_query = query.to_string();
            state.offset = 0;
            state.series.clear();
            state.page_in_flight = None;
            state.more_requested = false;
            if query.is_empty() {
                None
            } else {
                Some((state.begin(Kind::List), state.limit))
            }
        };
        let Some((token, limit)) = ticket else {
            return self.fetch_page().await;
        };

        tracing::debug!(query, "Searching series");
        let result = self.catalog.search_series(query, limit).await;

        let mut state = self.lock();
        if !state.is_current(Kind::List, token) {
            tracing::debug!(query, "Discarding superseded search results");
            return PageOutcome::Superseded;
        }
        match result {
            Ok(page) => {
                let added = page.results.len();
                state.series = page.results;
                state.list_state = LoadState::Loaded;
                PageOutcome::Loaded { added }
            }
            Err(e) => {
                state.fail(Kind::List, format!("Error searching series: {e}"));
                PageOutcome::Failed
            }
        }
    }

    // ── Detail ──────────────────────────────────────────────────

    /// Fetch one series and make it the current detail.
    ///
    /// If a newer detail request was issued meanwhile, the series is still
    /// returned but the current detail is left to the newer request.
    pub async fn fetch_detail(&self, id: u64) -> Option<Series> {
        let token = self.lock().begin(Kind::Detail);
        let result = self.catalog.series_detail(id).await;

        let mut state = self.lock();
        let current = state.is_current(Kind::Detail, token);
        match result {
            Ok(page) => match page.first() {
                Some(series) => {
                    if current {
                        state.detail = Some(series.clone());
                        state.detail_state = LoadState::Loaded;
                    }
                    Some(series)
                }
                None => {
                    if current {
                        state.fail(
                            Kind::Detail,
                            format!("Error fetching series detail: series {id} not found"),
                        );
                    }
                    None
                }
            },
            Err(e) => {
                if current {
                    state.fail(Kind::Detail, format!("Error fetching series detail: {e}"));
                }
                None
            }
        }
    }

    // ── Avatar ──────────────────────────────────────────────────

    /// Pick a random character that has real artwork.
    ///
    /// Each attempt samples a fresh offset. Running out of attempts yields
    /// `NotFound` without touching the shared error field. A request failure
    /// ends the attempts early; it also yields `NotFound`, but its message is
    /// recorded in [`last_error`](Self::last_error).
    pub async fn fetch_random_character(&self) -> AvatarPick {
        let token = self.lock().begin(Kind::Avatar);

        let mut picked = None;
        let mut failure = None;
        for attempt in 1..=AVATAR_MAX_ATTEMPTS {
            let offset = rand::thread_rng().gen_range(0..RANDOM_OFFSET_CEILING);
            match self.catalog.character_at(offset).await {
                Ok(page) => {
                    if let Some(character) = page.first().filter(Character::has_image) {
                        picked = Some(character);
                        break;
                    }
                    tracing::debug!(attempt, offset, "Random character has no usable image");
                }
                Err(e) => {
                    failure = Some(format!("Error fetching random character: {e}"));
                    break;
                }
            }
        }
        if picked.is_none() && failure.is_none() {
            tracing::warn!("Could not find character with valid image");
        }

        let mut state = self.lock();
        if state.is_current(Kind::Avatar, token) {
            state.avatar = picked.clone();
            match failure {
                Some(message) => state.fail(Kind::Avatar, message),
                None => state.avatar_state = LoadState::Loaded,
            }
        } else if let Some(message) = failure {
            tracing::debug!("Discarding superseded avatar failure: {message}");
        }
        match picked {
            Some(character) => AvatarPick::Found(character),
            None => AvatarPick::NotFound,
        }
    }

    // ── Library ─────────────────────────────────────────────────

    /// Save or unsave a series. Successful toggles are persisted.
    pub fn toggle_saved(&self, series: Series) -> Toggle {
        let mut state = self.lock();
        let outcome = state.library.toggle_saved(series);
        if outcome.succeeded() {
            state.library.persist(self.storage.as_ref());
        }
        outcome
    }

    /// Record a series in the viewing history. Returns whether it was new.
    pub fn add_to_viewed(&self, series: Series) -> bool {
        let mut state = self.lock();
        let inserted = state.library.add_to_viewed(series);
        if inserted {
            state.library.persist(self.storage.as_ref());
        }
        inserted
    }

    /// Forget the viewing history, in memory and in storage.
    pub fn clear_history(&self) {
        self.lock().library.clear_viewed(self.storage.as_ref());
    }

    /// Write the saved and viewed sets to storage.
    pub fn persist(&self) {
        self.lock().library.persist(self.storage.as_ref());
    }

    /// Reload the saved and viewed sets from storage. Never fails.
    pub fn restore(&self) {
        self.lock().library.restore(self.storage.as_ref());
    }

    // ── Resets ──────────────────────────────────────────────────

    /// Clear browsing state. The library and storage are left alone.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.list_token += 1;
        state.series.clear();
        state.offset = 0;
        state.search_query.clear();
        state.last_error = None;
        state.list_state = LoadState::Idle;
        state.page_in_flight = None;
        state.more_requested = false;
    }

    pub fn clear_detail(&self) {
        let mut state = self.lock();
        state.detail_token += 1;
        state.detail = None;
        state.detail_state = LoadState::Idle;
        state.last_error = None;
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }

    // ── Getters ─────────────────────────────────────────────────

    pub fn series(&self) -> Vec<Series> {
        self.lock().series.clone()
    }

    /// The loaded list narrowed to titles containing the current query (case-insensitive).
    pub fn filtered_series(&self) -> Vec<Series> {
        let state = self.lock();
        if state.search_query.is_empty() {
            return state.series.clone();
        }
        let needle = state.search_query.to_lowercase();
        state
            .series
            .iter()
            .filter(|s| s.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn detail(&self) -> Option<Series> {
        self.lock().detail.clone()
    }

    pub fn avatar(&self) -> Option<Character> {
        self.lock().avatar.clone()
    }

    pub fn saved(&self) -> Vec<Series> {
        self.lock().library.saved().to_vec()
    }

    pub fn viewed(&self) -> Vec<Series> {
        self.lock().library.viewed().to_vec()
    }

    pub fn is_saved(&self, id: u64) -> bool {
        self.lock().library.is_saved(id)
    }

    pub fn is_viewed(&self, id: u64) -> bool {
        self.lock().library.is_viewed(id)
    }

    pub fn saved_count(&self) -> usize {
        self.lock().library.saved().len()
    }

    pub fn viewed_count(&self) -> usize {
        self.lock().library.viewed().len()
    }

    pub fn offset(&self) -> u32 {
        self.lock().offset
    }

    pub fn limit(&self) -> u32 {
        self.lock().limit
    }

    pub fn search_query(&self) -> String {
        self.lock().search_query.clone()
    }

    /// Most recent failure message from any operation.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn list_state(&self) -> LoadState {
        self.lock().list_state.clone()
    }

    pub fn detail_state(&self) -> LoadState {
        self.lock().detail_state.clone()
    }

    pub fn avatar_state(&self) -> LoadState {
        self.lock().avatar_state.clone()
    }

    pub fn is_loading(&self) -> bool {
        let state = self.lock();
        [&state.list_state, &state.detail_state, &state.avatar_state]
            .iter()
            .any(|s| **s == LoadState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use marvelous_api::{DataContainer, Thumbnail};

    use super::*;
    use crate::library::SAVED_KEY;
    use crate::persistence::MemoryStore;

    #[derive(Debug, thiserror::Error)]
    #[error("Marvel API Error: 500 Internal Server Error")]
    struct FakeError;

    /// In-process catalog with scripted latency and failures.
    #[derive(Default)]
    struct FakeCatalog {
        series: Vec<Series>,
        characters: Mutex<VecDeque<Character>>,
        page_delays: Mutex<VecDeque<Duration>>,
        search_delays: HashMap<String, Duration>,
        fail: AtomicBool,
        character_calls: AtomicUsize,
    }

    fn series(id: u64, title: &str) -> Series {
        Series::new(id, title)
    }

    fn character(id: u64, path: &str) -> Character {
        Character {
            id,
            name: format!("Character {id}"),
            thumbnail: Some(Thumbnail {
                path: path.to_string(),
                extension: "jpg".into(),
            }),
            extra: Default::default(),
        }
    }

    fn container<T>(offset: u32, limit: u32, results: Vec<T>) -> DataContainer<T> {
        DataContainer {
            offset,
            limit,
            total: 0,
            count: results.len() as u32,
            results,
        }
    }

    impl FakeCatalog {
        fn with_series(count: u64) -> Self {
            Self {
                series: (1..=count).map(|id| series(id, &format!("Series {id}"))).collect(),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), FakeError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(FakeError)
            } else {
                Ok(())
            }
        }
    }

    impl CatalogService for FakeCatalog {
        type Error = FakeError;

        async fn series_page(&self, offset: u32, limit: u32) -> Result<DataContainer<Series>, FakeError> {
            let delay = self.page_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.check()?;
            let results = self
                .series
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            Ok(container(offset, limit, results))
        }

        async fn series_detail(&self, id: u64) -> Result<DataContainer<Series>, FakeError> {
            self.check()?;
            let results = self.series.iter().filter(|s| s.id == id).cloned().collect();
            Ok(container(0, 20, results))
        }

        async fn search_series(&self, prefix: &str, limit: u32) -> Result<DataContainer<Series>, FakeError> {
            if let Some(delay) = self.search_delays.get(prefix) {
                tokio::time::sleep(*delay).await;
            }
            self.check()?;
            let results = self
                .series
                .iter()
                .filter(|s| s.title.starts_with(prefix))
                .take(limit as usize)
                .cloned()
                .collect();
            Ok(container(0, limit, results))
        }

        async fn character_at(&self, offset: u32) -> Result<DataContainer<Character>, FakeError> {
            assert!(offset < RANDOM_OFFSET_CEILING);
            self.character_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            let next = self.characters.lock().unwrap().pop_front();
            Ok(container(offset, 1, next.into_iter().collect()))
        }
    }

    fn store_with(catalog: FakeCatalog, limit: u32) -> (SeriesStore<FakeCatalog>, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let store = SeriesStore::new(catalog, storage.clone(), limit);
        (store, storage)
    }

    #[tokio::test]
    async fn test_fetch_page_appends_and_advances() {
        let (store, _) = store_with(FakeCatalog::with_series(45), 20);

        assert_eq!(store.fetch_page().await, PageOutcome::Loaded { added: 20 });
        assert_eq!(store.offset(), 20);
        assert_eq!(store.series().len(), 20);

        assert_eq!(store.fetch_page().await, PageOutcome::Loaded { added: 20 });
        assert_eq!(store.offset(), 40);
        let list = store.series();
        assert_eq!(list.len(), 40);
        assert_eq!(list[0].id, 1);
        assert_eq!(list[39].id, 40);

        assert_eq!(store.fetch_page().await, PageOutcome::Loaded { added: 5 });
        assert_eq!(store.offset(), 60);
        assert_eq!(store.series().len(), 45);
        assert_eq!(store.list_state(), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_page_limit_is_clamped() {
        let (store, _) = store_with(FakeCatalog::with_series(150), u32::MAX);
        assert_eq!(store.limit(), MAX_PAGE_LIMIT);

        assert_eq!(store.fetch_page().await, PageOutcome::Loaded { added: 100 });
        assert_eq!(store.offset(), MAX_PAGE_LIMIT);

        let (store, _) = store_with(FakeCatalog::default(), 0);
        assert_eq!(store.limit(), 1);
    }

    #[tokio::test]
    async fn test_fetch_page_failure_keeps_list() {
        let (store, _) = store_with(FakeCatalog::with_series(30), 10);
        store.fetch_page().await;

        store.catalog.fail.store(true, Ordering::SeqCst);
        assert_eq!(store.fetch_page().await, PageOutcome::Failed);
        assert_eq!(store.series().len(), 10);
        assert_eq!(store.offset(), 10);
        let error = store.last_error().unwrap();
        assert!(error.starts_with("Error fetching series: "));
        assert!(matches!(store.list_state(), LoadState::Failed(_)));
        assert!(!store.is_loading());

        // The in-flight slot is released after a failure.
        store.catalog.fail.store(false, Ordering::SeqCst);
        assert_eq!(store.fetch_page().await, PageOutcome::Loaded { added: 10 });

        store.clear_error();
        assert!(store.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_page_fetches_coalesce() {
        let catalog = FakeCatalog::with_series(50);
        catalog
            .page_delays
            .lock()
            .unwrap()
            .extend([Duration::from_millis(100), Duration::from_millis(100)]);
        let (store, _) = store_with(catalog, 10);

        let (first, second, third) = tokio::join!(store.fetch_page(), store.fetch_page(), store.fetch_page());
        assert_eq!(first, PageOutcome::Loaded { added: 20 });
        assert_eq!(second, PageOutcome::Coalesced);
        assert_eq!(third, PageOutcome::Coalesced);
        assert_eq!(store.offset(), 20);
        assert_eq!(store.series().len(), 20);
    }

    #[tokio::test]
    async fn test_search_replaces_list() {
        let mut catalog = FakeCatalog::with_series(3);
        catalog.series.push(series(100, "Spider-Man (2016)"));
        catalog.series.push(series(101, "Spider-Gwen (2015)"));
        let (store, _) = store_with(catalog, 20);

        store.fetch_page().await;
        assert_eq!(store.series().len(), 5);

        assert_eq!(store.search("Spider").await, PageOutcome::Loaded { added: 2 });
        assert_eq!(store.offset(), 0);
        assert_eq!(store.search_query(), "Spider");
        let ids: Vec<u64> = store.series().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![100, 101]);

        // No further paging while a query is active.
        assert_eq!(store.fetch_page().await, PageOutcome::SearchActive);
        assert_eq!(store.series().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_search_behaves_like_fresh_page() {
        let (store, _) = store_with(FakeCatalog::with_series(30), 10);
        store.fetch_page().await;
        store.fetch_page().await;
        store.search("Series 2").await;

        assert_eq!(store.search("").await, PageOutcome::Loaded { added: 10 });
        assert_eq!(store.offset(), 10);
        let list = store.series();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id, 1);
        assert!(store.search_query().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_message() {
        let (store, _) = store_with(FakeCatalog::with_series(5), 10);
        store.catalog.fail.store(true, Ordering::SeqCst);
        assert_eq!(store.search("Hulk").await, PageOutcome::Failed);
        assert!(store.series().is_empty());
        assert!(store.last_error().unwrap().starts_with("Error searching series: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_search_wins_when_earlier_response_arrives_last() {
        let mut catalog = FakeCatalog::default();
        catalog.series = vec![series(1, "X-Factor"), series(2, "Young Avengers")];
        catalog.search_delays.insert("X".into(), Duration::from_millis(500));
        catalog.search_delays.insert("Y".into(), Duration::from_millis(10));
        let (store, _) = store_with(catalog, 20);

        let (x, y) = tokio::join!(store.search("X"), store.search("Y"));
        assert_eq!(x, PageOutcome::Superseded);
        assert_eq!(y, PageOutcome::Loaded { added: 1 });
        let list = store.series();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Young Avengers");
        assert_eq!(store.search_query(), "Y");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_supersedes_running_page_fetch() {
        let mut catalog = FakeCatalog::with_series(20);
        catalog.series.push(series(500, "Thor (2020)"));
        catalog.page_delays.lock().unwrap().push_back(Duration::from_millis(300));
        let (store, _) = store_with(catalog, 10);

        let (page, search) = tokio::join!(store.fetch_page(), store.search("Thor"));
        assert_eq!(page, PageOutcome::Superseded);
        assert_eq!(search, PageOutcome::Loaded { added: 1 });
        assert_eq!(store.offset(), 0);
        assert_eq!(store.series()[0].id, 500);
    }

    #[tokio::test]
    async fn test_filtered_series() {
        let mut catalog = FakeCatalog::default();
        catalog.series = vec![series(1, "Avengers (1963)"), series(2, "New Avengers"), series(3, "Hulk")];
        let (store, _) = store_with(catalog, 20);

        store.fetch_page().await;
        assert_eq!(store.filtered_series().len(), 3);

        store.search("Avengers").await;
        // Prefix search returns one; the local filter matches anywhere in the title.
        assert_eq!(store.series().len(), 1);
        assert_eq!(store.filtered_series().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_detail() {
        let (store, _) = store_with(FakeCatalog::with_series(5), 20);

        let detail = store.fetch_detail(3).await.unwrap();
        assert_eq!(detail.id, 3);
        assert_eq!(store.detail().unwrap().id, 3);
        assert_eq!(store.detail_state(), LoadState::Loaded);

        assert!(store.fetch_detail(99).await.is_none());
        assert!(store
            .last_error()
            .unwrap()
            .starts_with("Error fetching series detail: "));

        store.catalog.fail.store(true, Ordering::SeqCst);
        assert!(store.fetch_detail(2).await.is_none());

        store.clear_detail();
        assert!(store.detail().is_none());
        assert!(store.last_error().is_none());
        assert_eq!(store.detail_state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn test_random_character_skips_placeholders() {
        let catalog = FakeCatalog::default();
        catalog.characters.lock().unwrap().extend([
            character(1, "http://i.annihil.us/u/prod/marvel/i/mg/b/40/image_not_available"),
            character(2, "http://i.annihil.us/u/prod/marvel/i/mg/c/e0/535fecbbb9784"),
        ]);
        let (store, _) = store_with(catalog, 20);

        match store.fetch_random_character().await {
            AvatarPick::Found(c) => assert_eq!(c.id, 2),
            AvatarPick::NotFound => panic!("expected a character"),
        }
        assert_eq!(store.avatar().unwrap().id, 2);
        assert_eq!(store.catalog.character_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_random_character_gives_up_after_max_attempts() {
        let catalog = FakeCatalog::default();
        catalog.characters.lock().unwrap().extend(
            (1..=10).map(|id| character(id, "http://i.annihil.us/u/prod/marvel/i/mg/b/40/image_not_available")),
        );
        let (store, _) = store_with(catalog, 20);

        assert_eq!(store.fetch_random_character().await, AvatarPick::NotFound);
        assert_eq!(
            store.catalog.character_calls.load(Ordering::SeqCst),
            AVATAR_MAX_ATTEMPTS as usize
        );
        assert!(store.avatar().is_none());
        assert!(store.last_error().is_none());
        assert_eq!(store.avatar_state(), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_random_character_request_failure_records_error() {
        let catalog = FakeCatalog::default();
        catalog.fail.store(true, Ordering::SeqCst);
        let (store, _) = store_with(catalog, 20);

        assert_eq!(store.fetch_random_character().await, AvatarPick::NotFound);
        assert_eq!(store.catalog.character_calls.load(Ordering::SeqCst), 1);
        assert!(store.avatar().is_none());
        assert_eq!(
            store.last_error().as_deref(),
            Some("Error fetching random character: Marvel API Error: 500 Internal Server Error")
        );
        assert!(matches!(store.avatar_state(), LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_toggle_saved_persists_and_caps() {
        let (store, storage) = store_with(FakeCatalog::default(), 20);

        assert_eq!(store.toggle_saved(series(1, "A")), Toggle::Added);
        assert!(storage.get_item(SAVED_KEY).unwrap().unwrap().contains("\"id\":1"));

        for id in 2..=10 {
            assert!(store.toggle_saved(series(id, "B")).succeeded());
        }
        assert_eq!(store.toggle_saved(series(11, "C")), Toggle::Refused);
        assert_eq!(store.saved_count(), 10);
        assert!(!store.is_saved(11));

        assert_eq!(store.toggle_saved(series(1, "A")), Toggle::Removed);
        assert!(!store.is_saved(1));
    }

    #[tokio::test]
    async fn test_add_to_viewed_once() {
        let (store, _) = store_with(FakeCatalog::default(), 20);
        assert!(store.add_to_viewed(series(7, "G")));
        assert!(!store.add_to_viewed(series(7, "G")));
        assert_eq!(store.viewed_count(), 1);
        assert!(store.is_viewed(7));
    }

    #[tokio::test]
    async fn test_clear_history_keeps_saved() {
        let (store, storage) = store_with(FakeCatalog::default(), 20);
        store.add_to_viewed(series(3, "C"));
        store.toggle_saved(series(4, "D"));

        store.clear_history();
        assert_eq!(store.viewed_count(), 0);
        assert!(storage.get_item(crate::library::VIEWED_KEY).unwrap().is_none());
        assert!(store.is_saved(4));
    }

    #[tokio::test]
    async fn test_persist_restore_in_fresh_store() {
        let storage = Arc::new(MemoryStore::new());
        let store = SeriesStore::new(FakeCatalog::default(), storage.clone(), 20);
        store.toggle_saved(series(1, "A"));
        store.toggle_saved(series(2, "B"));
        store.add_to_viewed(series(3, "C"));
        store.persist();

        let fresh = SeriesStore::new(FakeCatalog::default(), storage, 20);
        assert!(fresh.saved().is_empty());
        fresh.restore();
        assert_eq!(fresh.saved(), store.saved());
        assert_eq!(fresh.viewed(), store.viewed());
    }

    #[tokio::test]
    async fn test_reset_keeps_library() {
        let (store, storage) = store_with(FakeCatalog::with_series(10), 5);
        store.fetch_page().await;
        store.toggle_saved(series(1, "A"));
        store.search("Series").await;

        store.reset();
        assert!(store.series().is_empty());
        assert_eq!(store.offset(), 0);
        assert!(store.search_query().is_empty());
        assert_eq!(store.list_state(), LoadState::Idle);
        assert_eq!(store.saved_count(), 1);
        assert!(storage.get_item(SAVED_KEY).unwrap().is_some());
    }
}
