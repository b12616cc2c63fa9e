//! Search-as-you-type over the geocoding endpoint.

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    coordinator::{Channel, Generation, RequestCoordinator},
    error::FetchError,
    model::{Location, Place},
    source::DataSource,
};

/// Queries shorter than this (after trimming) never hit the network.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Hidden,
    /// Waiting on the debounce timer or the geocoder for this query.
    Searching(String),
    Results(Vec<Place>),
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn DataSource>,
    coordinator: RequestCoordinator,
    debounce: Duration,
    state: watch::Sender<SearchState>,
}

#[derive(Debug, Clone)]
pub struct SearchBox {
    inner: Arc<Inner>,
}

impl SearchBox {
    pub fn new(source: Arc<dyn DataSource>, coordinator: RequestCoordinator, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::Hidden);
        Self {
            inner: Arc::new(Inner {
                source,
                coordinator,
                debounce,
                state,
            }),
        }
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Feed the current contents of the search field.
    pub fn input(&self, text: &str) {
        let query = text.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            self.dismiss();
            return;
        }

        let query = query.to_string();
        // A lookup for older text must not land over the newer query.
        self.inner.coordinator.cancel(Channel::SEARCH);
        self.inner
            .state
            .send_replace(SearchState::Searching(query.clone()));

        let this = self.clone();
        self.inner
            .coordinator
            .debounce(Channel::SEARCH, self.inner.debounce, move || {
                this.lookup(query);
            });
    }

    /// Search right away, skipping the debounce.
    pub fn submit(&self, text: &str) -> Option<Generation> {
        let query = text.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            self.dismiss();
            return None;
        }

        self.inner.coordinator.cancel(Channel::SEARCH);
        self.inner
            .state
            .send_replace(SearchState::Searching(query.to_string()));
        Some(self.lookup(query.to_string()))
    }

    /// Hide the results and drop anything pending.
    pub fn dismiss(&self) {
        self.inner.coordinator.cancel(Channel::SEARCH);
        self.inner.state.send_replace(SearchState::Hidden);
    }

    /// Choose one of the visible results; hides the list.
    pub fn pick(&self, index: usize) -> Option<Location> {
        let picked = match &*self.inner.state.borrow() {
            SearchState::Results(places) => places.get(index).map(Location::from),
            _ => None,
        };
        if picked.is_some() {
            self.inner.state.send_replace(SearchState::Hidden);
        }
        picked
    }

    /// Wait until the search in progress resolves to results or nothing.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.subscribe();
        match rx
            .wait_for(|state| !matches!(state, SearchState::Searching(_)))
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn lookup(&self, query: String) -> Generation {
        let source = Arc::clone(&self.inner.source);
        let this = self.clone();

        let work = async move {
            let places = source.geocode(&query).await?;
            if places.is_empty() {
                return Err(FetchError::Empty);
            }
            Ok(places)
        };

        self.inner
            .coordinator
            .issue(Channel::SEARCH, work, move |result| {
                let next = match result {
                    Ok(places) => SearchState::Results(places),
                    Err(FetchError::Empty) => {
                        debug!("search matched nothing");
                        SearchState::Hidden
                    }
                    Err(err) => {
                        warn!(error = %err, "search failed");
                        SearchState::Hidden
                    }
                };
                this.inner.state.send_replace(next);
            })
    }
}
