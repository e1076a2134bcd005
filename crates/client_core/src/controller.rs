use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use location_integration::{resolve_or_fallback, LocationResolver};
use shared::domain::{Country, CountryCode, MAX_SELECTED_COUNTRIES};
use storage::CatalogCache;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::source::CountrySource;

pub const LIMIT_REACHED_MESSAGE: &str = "You can only add up to 5 countries.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Loaded(CatalogSource),
    LoadFailed,
}

/// Where the selection is in its per-session lifecycle. `Seeded` is entered at
/// most once, and only from `Empty`; `UserModified` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Empty,
    Seeded,
    UserModified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadySelected,
    LimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing in the filtered catalog is named exactly like the search text.
    NoMatch,
    Added(Country),
    AlreadySelected(Country),
    /// The selection was full; presentation shows [`LIMIT_REACHED_MESSAGE`].
    LimitReached(Country),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    LoadStateChanged(LoadState),
    CatalogLoaded {
        source: CatalogSource,
        count: usize,
    },
    SelectionChanged(Vec<Country>),
    SearchTextChanged(String),
    LocationReported(CountryCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub all_countries: Vec<Country>,
    pub selected_countries: Vec<Country>,
    pub search_text: String,
    pub load_state: LoadState,
    pub phase: SelectionPhase,
}

struct SelectionState {
    all_countries: Vec<Country>,
    selected_countries: Vec<Country>,
    search_text: String,
    load_state: LoadState,
    phase: SelectionPhase,
    last_location_code: Option<CountryCode>,
}

impl SelectionState {
    fn new() -> Self {
        Self {
            all_countries: Vec::new(),
            selected_countries: Vec::new(),
            search_text: String::new(),
            load_state: LoadState::Uninitialized,
            phase: SelectionPhase::Empty,
            last_location_code: None,
        }
    }

    fn filtered(&self) -> Vec<Country> {
        if self.search_text.is_empty() {
            return self.all_countries.clone();
        }
        let needle = self.search_text.to_lowercase();
        self.all_countries
            .iter()
            .filter(|country| country.name_matches(&needle))
            .cloned()
            .collect()
    }

    fn is_selected(&self, country: &Country) -> bool {
        self.selected_countries
            .iter()
            .any(|selected| selected.same_entity(country))
    }

    fn add(&mut self, country: &Country) -> AddOutcome {
        if self.selected_countries.len() >= MAX_SELECTED_COUNTRIES {
            return AddOutcome::LimitReached;
        }
        if self.is_selected(country) {
            return AddOutcome::AlreadySelected;
        }
        self.selected_countries.push(country.clone());
        self.phase = SelectionPhase::UserModified;
        AddOutcome::Added
    }
}

/// Owner of the catalog, the bounded selection and the search text.
///
/// All state lives behind one async mutex; every mutation happens inside a
/// single critical section and publishes its event before releasing it, so
/// subscribers observe changes in the order they were applied. Collaborator
/// I/O (cache, network, location) always runs outside the lock.
pub struct SelectionController {
    source: Arc<dyn CountrySource>,
    cache: Arc<dyn CatalogCache>,
    inner: Mutex<SelectionState>,
    events: broadcast::Sender<SelectionEvent>,
    load_in_flight: AtomicBool,
}

/// Live `load()` attempt. Dropping it unsettled (timeout, aborted task)
/// moves the controller out of `Loading` so a later `load()` can run.
struct LoadAttempt<'a> {
    controller: &'a SelectionController,
    settled: bool,
}

impl LoadAttempt<'_> {
    /// Call with the state lock held, after the terminal state is stored.
    fn settle(mut self) {
        self.settled = true;
        self.controller.load_in_flight.store(false, Ordering::Release);
    }
}

impl Drop for LoadAttempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("catalog load interrupted before it settled");
        let controller = self.controller;
        match controller.inner.try_lock() {
            Ok(mut guard) => {
                controller.load_in_flight.store(false, Ordering::Release);
                if guard.load_state == LoadState::Loading {
                    guard.load_state = LoadState::LoadFailed;
                    controller.emit(SelectionEvent::LoadStateChanged(LoadState::LoadFailed));
                }
            }
            // The next load() sees Loading with nothing in flight and restarts.
            Err(_) => controller.load_in_flight.store(false, Ordering::Release),
        }
    }
}

impl SelectionController {
    pub fn new(source: Arc<dyn CountrySource>, cache: Arc<dyn CatalogCache>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            source,
            cache,
            inner: Mutex::new(SelectionState::new()),
            events,
            load_in_flight: AtomicBool::new(false),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SelectionEvent) {
        let _ = self.events.send(event);
    }

    /// Populates the catalog from the cache, or from the remote source with a
    /// write-through to the cache. Failures are logged and leave the catalog
    /// empty in `LoadState::LoadFailed`.
    ///
    /// A no-op while another load is running or once a load has succeeded.
    /// A load whose future was dropped counts as failed.
    pub async fn load(&self) {
        let attempt = {
            let mut guard = self.inner.lock().await;
            match guard.load_state {
                LoadState::Loaded(_) => {
                    debug!(state = ?guard.load_state, "catalog load skipped");
                    return;
                }
                LoadState::Loading if self.load_in_flight.load(Ordering::Acquire) => {
                    debug!(state = ?guard.load_state, "catalog load skipped");
                    return;
                }
                _ => {}
            }
            guard.load_state = LoadState::Loading;
            self.load_in_flight.store(true, Ordering::Release);
            self.emit(SelectionEvent::LoadStateChanged(LoadState::Loading));
            LoadAttempt {
                controller: self,
                settled: false,
            }
        };

        if let Some(cached) = self.cache.load().await.filter(|c| !c.is_empty()) {
            self.apply_catalog(attempt, cached, CatalogSource::Cache).await;
            return;
        }

        match self.source.fetch_all().await {
            Ok(countries) => {
                self.cache.save(&countries).await;
                self.apply_catalog(attempt, countries, CatalogSource::Network)
                    .await;
            }
            Err(err) => {
                warn!("country catalog unavailable: {err}");
                let mut guard = self.inner.lock().await;
                guard.load_state = LoadState::LoadFailed;
                attempt.settle();
                self.emit(SelectionEvent::LoadStateChanged(LoadState::LoadFailed));
            }
        }
    }

    async fn apply_catalog(
        &self,
        attempt: LoadAttempt<'_>,
        countries: Vec<Country>,
        source: CatalogSource,
    ) {
        let count = countries.len();
        let mut guard = self.inner.lock().await;
        guard.all_countries = countries;
        guard.load_state = LoadState::Loaded(source);
        attempt.settle();
        info!(?source, count, "country catalog loaded");
        self.emit(SelectionEvent::CatalogLoaded { source, count });
        self.emit(SelectionEvent::LoadStateChanged(LoadState::Loaded(source)));
    }

    /// Seeds the selection with one country when nothing has been selected yet.
    ///
    /// The code used is `code`, else the last location report, else `"IN"`.
    /// An explicit code that matches nothing seeds nothing; it does not fall
    /// back. Returns whether a country was seeded.
    pub async fn seed_default_country(&self, code: Option<CountryCode>) -> bool {
        let mut guard = self.inner.lock().await;
        let code = code
            .or_else(|| guard.last_location_code.clone())
            .unwrap_or_else(CountryCode::default_code);
        self.seed_locked(&mut guard, code)
    }

    /// Seeds from the last location report once the catalog is in. Does
    /// nothing until a report has arrived; the report itself seeds then.
    pub async fn seed_from_reported_location(&self) -> bool {
        let mut guard = self.inner.lock().await;
        let Some(code) = guard.last_location_code.clone() else {
            debug!("no location reported yet, seeding left to the location lookup");
            return false;
        };
        self.seed_locked(&mut guard, code)
    }

    fn seed_locked(&self, guard: &mut SelectionState, code: CountryCode) -> bool {
        if guard.phase != SelectionPhase::Empty || !guard.selected_countries.is_empty() {
            debug!(phase = ?guard.phase, "seeding skipped: selection already populated");
            return false;
        }

        let Some(country) = guard
            .all_countries
            .iter()
            .find(|country| country.country_code == code)
            .cloned()
        else {
            debug!(
                code = %code,
                catalog = guard.all_countries.len(),
                "seeding found no matching country"
            );
            return false;
        };

        info!(code = %code, country = %country.name, "seeded default country");
        guard.selected_countries.push(country);
        guard.phase = SelectionPhase::Seeded;
        self.emit(SelectionEvent::SelectionChanged(
            guard.selected_countries.clone(),
        ));
        true
    }

    /// Records a location report and attempts seeding with it.
    pub async fn report_location(&self, code: CountryCode) -> bool {
        {
            let mut guard = self.inner.lock().await;
            guard.last_location_code = Some(code.clone());
            self.emit(SelectionEvent::LocationReported(code.clone()));
        }
        self.seed_default_country(Some(code)).await
    }

    /// Resolves the device location in the background (falling back to `"IN"`)
    /// and reports it. Does not block or wait for `load`.
    pub fn spawn_location_seeding(
        self: &Arc<Self>,
        resolver: Arc<dyn LocationResolver>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let code = resolve_or_fallback(resolver.as_ref()).await;
            controller.report_location(code).await;
        })
    }

    /// Reports every code arriving on `updates` until the sender side closes.
    pub fn watch_location(
        self: &Arc<Self>,
        mut updates: broadcast::Receiver<CountryCode>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(code) => {
                        controller.report_location(code).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "location updates lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Appends `country` unless the selection is full or already holds a
    /// country with the same name. Neither refusal is an error.
    pub async fn add_country(&self, country: &Country) -> AddOutcome {
        let mut guard = self.inner.lock().await;
        let outcome = guard.add(country);
        match outcome {
            AddOutcome::Added => {
                debug!(country = %country.name, "country selected");
                self.emit(SelectionEvent::SelectionChanged(
                    guard.selected_countries.clone(),
                ));
            }
            AddOutcome::AlreadySelected | AddOutcome::LimitReached => {
                debug!(country = %country.name, ?outcome, "country not added");
            }
        }
        outcome
    }

    /// Removes every selected entry named like `country`. Returns whether
    /// anything was removed; when nothing matches, state is untouched.
    pub async fn remove_country(&self, country: &Country) -> bool {
        let mut guard = self.inner.lock().await;
        let before = guard.selected_countries.len();
        guard
            .selected_countries
            .retain(|selected| !selected.same_entity(country));
        if guard.selected_countries.len() == before {
            return false;
        }

        guard.phase = SelectionPhase::UserModified;
        debug!(country = %country.name, "country deselected");
        self.emit(SelectionEvent::SelectionChanged(
            guard.selected_countries.clone(),
        ));
        true
    }

    /// The catalog filtered by a case-insensitive substring match of the
    /// search text against country names, in catalog order. An empty search
    /// text yields the whole catalog.
    pub async fn filtered_countries(&self) -> Vec<Country> {
        self.inner.lock().await.filtered()
    }

    pub async fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut guard = self.inner.lock().await;
        if guard.search_text == text {
            return;
        }
        guard.search_text = text.clone();
        self.emit(SelectionEvent::SearchTextChanged(text));
    }

    /// Handles a submitted search: an exact (case-insensitive) name match
    /// clears the search text and is added if there is room.
    pub async fn submit_search(&self) -> SubmitOutcome {
        let mut guard = self.inner.lock().await;
        let wanted = guard.search_text.to_lowercase();
        let Some(country) = guard
            .filtered()
            .into_iter()
            .find(|country| country.name.to_lowercase() == wanted)
        else {
            return SubmitOutcome::NoMatch;
        };

        guard.search_text.clear();
        self.emit(SelectionEvent::SearchTextChanged(String::new()));

        match guard.add(&country) {
            AddOutcome::Added => {
                self.emit(SelectionEvent::SelectionChanged(
                    guard.selected_countries.clone(),
                ));
                SubmitOutcome::Added(country)
            }
            AddOutcome::AlreadySelected => SubmitOutcome::AlreadySelected(country),
            AddOutcome::LimitReached => SubmitOutcome::LimitReached(country),
        }
    }

    pub async fn is_selected(&self, country: &Country) -> bool {
        self.inner.lock().await.is_selected(country)
    }

    pub async fn all_countries(&self) -> Vec<Country> {
        self.inner.lock().await.all_countries.clone()
    }

    pub async fn selected_countries(&self) -> Vec<Country> {
        self.inner.lock().await.selected_countries.clone()
    }

    pub async fn search_text(&self) -> String {
        self.inner.lock().await.search_text.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.lock().await.load_state
    }

    pub async fn selection_phase(&self) -> SelectionPhase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> SelectionSnapshot {
        let guard = self.inner.lock().await;
        SelectionSnapshot {
            all_countries: guard.all_countries.clone(),
            selected_countries: guard.selected_countries.clone(),
            search_text: guard.search_text.clone(),
            load_state: guard.load_state,
            phase: guard.phase,
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
