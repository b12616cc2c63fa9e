//! The "load location" operation: fetch, assemble, swap the screen atomically.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    coordinator::{Channel, Generation, RequestCoordinator},
    error::FetchError,
    model::{Location, ScoreSet},
    notify::Notifier,
    source::DataSource,
    view::{self, DisplayPrefs, ViewModel},
};

pub const LOAD_FAILED: &str = "Failed to load weather data.";
pub const LOCATE_FAILED: &str = "Could not determine location.";

/// Which step of a load failed; each has its own toast.
#[derive(Debug)]
enum LoadFailure {
    Locate(FetchError),
    Weather(FetchError),
}

impl LoadFailure {
    fn message(&self) -> &'static str {
        match self {
            LoadFailure::Locate(_) => LOCATE_FAILED,
            LoadFailure::Weather(_) => LOAD_FAILED,
        }
    }

    fn error(&self) -> &FetchError {
        match self {
            LoadFailure::Locate(err) | LoadFailure::Weather(err) => err,
        }
    }
}

/// What the location view currently shows.
#[derive(Debug, Clone, Default)]
pub enum Screen {
    #[default]
    Welcome,
    Loading,
    Ready(Arc<ViewModel>),
}

impl Screen {
    pub fn is_loading(&self) -> bool {
        matches!(self, Screen::Loading)
    }

    pub fn view(&self) -> Option<&Arc<ViewModel>> {
        match self {
            Screen::Ready(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub prefs: DisplayPrefs,
    /// Ask for the weekly outlook along with today's scores.
    pub weekly: bool,
    /// Upper bound on how long a load waits for scores once weather is in.
    pub scores_timeout: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            prefs: DisplayPrefs::default(),
            weekly: true,
            scores_timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn DataSource>,
    coordinator: RequestCoordinator,
    notifier: Notifier,
    options: LoaderOptions,
    screen: watch::Sender<Screen>,
    /// Last screen that was not `Loading`; failed loads revert to it.
    stable: Mutex<Screen>,
}

/// Drives the location view. Weather is required, scores are best-effort.
#[derive(Debug, Clone)]
pub struct LocationLoader {
    inner: Arc<Inner>,
}

impl LocationLoader {
    pub fn new(
        source: Arc<dyn DataSource>,
        coordinator: RequestCoordinator,
        notifier: Notifier,
        options: LoaderOptions,
    ) -> Self {
        let (screen, _) = watch::channel(Screen::Welcome);
        Self {
            inner: Arc::new(Inner {
                source,
                coordinator,
                notifier,
                options,
                screen,
                stable: Mutex::new(Screen::Welcome),
            }),
        }
    }

    pub fn screen(&self) -> Screen {
        self.inner.screen.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Screen> {
        self.inner.screen.subscribe()
    }

    /// Start loading `location`, superseding any load still in flight.
    pub fn load(&self, location: Location) -> Generation {
        info!(lat = location.latitude, lon = location.longitude, "loading location");
        let source = Arc::clone(&self.inner.source);
        let options = self.inner.options.clone();
        self.run(async move {
            fetch_view(source, options, location)
                .await
                .map_err(LoadFailure::Weather)
        })
    }

    /// Name the place at `(lat, lon)` through reverse geocoding, then load it.
    pub fn locate(&self, lat: f64, lon: f64) -> Generation {
        info!(lat, lon, "locating");
        let source = Arc::clone(&self.inner.source);
        let options = self.inner.options.clone();
        self.run(async move {
            let names = source
                .reverse_geocode(lat, lon)
                .await
                .map_err(LoadFailure::Locate)?;
            let location = Location::at(lat, lon).named(names.city, names.country);
            fetch_view(source, options, location)
                .await
                .map_err(LoadFailure::Weather)
        })
    }

    fn run<W>(&self, work: W) -> Generation
    where
        W: Future<Output = Result<ViewModel, LoadFailure>> + Send + 'static,
    {
        let this = self.clone();
        self.inner.coordinator.issue_with_start(
            Channel::LOCATION,
            |_| {
                self.inner.screen.send_replace(Screen::Loading);
            },
            work,
            move |result| this.settle(result),
        )
    }

    /// Wait until the current load is applied or reverted.
    pub async fn settled(&self) -> Screen {
        let mut rx = self.subscribe();
        match rx.wait_for(|screen| !screen.is_loading()).await {
            Ok(screen) => screen.clone(),
            Err(_) => self.screen(),
        }
    }

    fn settle(&self, result: Result<ViewModel, LoadFailure>) {
        let mut stable = self
            .inner
            .stable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(view) => {
                info!(city = %view.hero.city, scores = view.activities.is_some(), "location ready");
                *stable = Screen::Ready(Arc::new(view));
                self.inner.screen.send_replace(stable.clone());
            }
            Err(failure) => {
                warn!(error = %failure.error(), "location load failed");
                self.inner.notifier.show(failure.message());
                self.inner.screen.send_replace(stable.clone());
            }
        }
    }
}

async fn fetch_view(
    source: Arc<dyn DataSource>,
    options: LoaderOptions,
    location: Location,
) -> Result<ViewModel, FetchError> {
    let (lat, lon) = (location.latitude, location.longitude);
    let scores = fetch_scores(
        source.as_ref(),
        lat,
        lon,
        options.weekly,
        options.scores_timeout,
    );

    let (weather, scores) = tokio::try_join!(source.weather(lat, lon), async {
        Ok::<_, FetchError>(scores.await)
    })?;

    Ok(view::assemble(&weather, scores.as_ref(), &location, &options.prefs))
}

/// Scores are secondary: failures and timeouts become `None`.
pub(crate) async fn fetch_scores(
    source: &dyn DataSource,
    lat: f64,
    lon: f64,
    weekly: bool,
    timeout: Duration,
) -> Option<ScoreSet> {
    match tokio::time::timeout(timeout, source.scores(lat, lon, weekly)).await {
        Ok(Ok(set)) => Some(set),
        Ok(Err(err)) => {
            warn!(error = %err, "scores unavailable, hiding activity sections");
            None
        }
        Err(_) => {
            warn!(?timeout, "scores timed out, hiding activity sections");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{Place, ReverseGeocode, Spot, WeatherSnapshot};

    /// Canned responses keyed by latitude, each with an artificial delay.
    #[derive(Debug, Default)]
    pub struct FakeSource {
        pub weather: HashMap<i64, (u64, Result<WeatherSnapshot, FetchError>)>,
        pub scores: HashMap<i64, (u64, Result<ScoreSet, FetchError>)>,
        pub spots: HashMap<i64, (u64, Result<Vec<Spot>, FetchError>)>,
        pub places: HashMap<String, (u64, Result<Vec<Place>, FetchError>)>,
        /// Reverse geocoding answers; unknown coordinates resolve to "Nowhere".
        pub names: HashMap<i64, (u64, Result<ReverseGeocode, FetchError>)>,
        pub calls: Mutex<Vec<String>>,
    }

    fn key(lat: f64) -> i64 {
        (lat * 1000.0).round() as i64
    }

    async fn respond<T: Clone>(entry: Option<&(u64, Result<T, FetchError>)>) -> Result<T, FetchError> {
        match entry {
            Some((delay, result)) => {
                tokio::time::sleep(Duration::from_millis(*delay)).await;
                result.clone()
            }
            None => Err(FetchError::network("no canned response")),
        }
    }

    impl FakeSource {
        pub fn with_weather(mut self, lat: f64, delay: u64, result: Result<WeatherSnapshot, FetchError>) -> Self {
            self.weather.insert(key(lat), (delay, result));
            self
        }

        pub fn with_scores(mut self, lat: f64, delay: u64, result: Result<ScoreSet, FetchError>) -> Self {
            self.scores.insert(key(lat), (delay, result));
            self
        }

        pub fn with_spots(mut self, lat: f64, delay: u64, result: Result<Vec<Spot>, FetchError>) -> Self {
            self.spots.insert(key(lat), (delay, result));
            self
        }

        pub fn with_places(mut self, query: &str, delay: u64, result: Result<Vec<Place>, FetchError>) -> Self {
            self.places.insert(query.to_string(), (delay, result));
            self
        }

        pub fn with_names(mut self, lat: f64, delay: u64, result: Result<ReverseGeocode, FetchError>) -> Self {
            self.names.insert(key(lat), (delay, result));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn geocode(&self, query: &str) -> Result<Vec<Place>, FetchError> {
            self.record(format!("geocode:{query}"));
            respond(self.places.get(query)).await
        }

        async fn reverse_geocode(&self, lat: f64, _lon: f64) -> Result<ReverseGeocode, FetchError> {
            self.record(format!("reverse:{lat}"));
            match self.names.get(&key(lat)) {
                Some(entry) => respond(Some(entry)).await,
                None => Ok(ReverseGeocode {
                    city: Some("Nowhere".into()),
                    country: None,
                }),
            }
        }

        async fn weather(&self, lat: f64, _lon: f64) -> Result<WeatherSnapshot, FetchError> {
            self.record(format!("weather:{lat}"));
            respond(self.weather.get(&key(lat))).await
        }

        async fn scores(&self, lat: f64, _lon: f64, weekly: bool) -> Result<ScoreSet, FetchError> {
            self.record(if weekly {
                format!("scores:{lat}:weekly")
            } else {
                format!("scores:{lat}")
            });
            respond(self.scores.get(&key(lat))).await
        }

        async fn spots(&self, lat: f64, _lon: f64, _radius_m: u32) -> Result<Vec<Spot>, FetchError> {
            self.record(format!("spots:{lat}"));
            respond(self.spots.get(&key(lat))).await
        }

        async fn save_location(&self, name: &str, _lat: f64, _lon: f64) -> Result<(), FetchError> {
            self.record(format!("save:{name}"));
            Ok(())
        }

        async fn remove_location(&self, name: &str) -> Result<(), FetchError> {
            self.record(format!("remove:{name}"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;
    use crate::model::ReverseGeocode;
    use crate::model::fixtures::{score, score_set, weather};
    use tokio::time::sleep;

    fn loader(source: FakeSource) -> (LocationLoader, Notifier) {
        let notifier = Notifier::new(Duration::from_millis(4500));
        let loader = LocationLoader::new(
            Arc::new(source),
            RequestCoordinator::new(),
            notifier.clone(),
            LoaderOptions {
                scores_timeout: Duration::from_millis(500),
                ..LoaderOptions::default()
            },
        );
        (loader, notifier)
    }

    fn city(screen: &Screen) -> Option<String> {
        screen.view().map(|v| v.hero.city.clone())
    }

    fn named(lat: f64, name: &str) -> Location {
        Location::at(lat, 0.0).named(Some(name.into()), None)
    }

    #[tokio::test(start_paused = true)]
    async fn load_combines_weather_and_scores() {
        let source = FakeSource::default()
            .with_weather(1.0, 20, Ok(weather()))
            .with_scores(1.0, 40, Ok(score_set(vec![score("hiking", 90.0)])));
        let (loader, notifier) = loader(source);

        loader.load(named(1.0, "Oslo"));
        assert!(loader.screen().is_loading());

        let screen = loader.settled().await;
        let view = screen.view().expect("ready");
        assert_eq!(view.hero.city, "Oslo");
        assert!(view.activities.is_some());
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn score_failure_hides_panel_but_keeps_weather() {
        let source = FakeSource::default()
            .with_weather(1.0, 20, Ok(weather()))
            .with_scores(1.0, 5, Err(FetchError::network("502")));
        let (loader, notifier) = loader(source);

        loader.load(named(1.0, "Oslo"));
        let screen = loader.settled().await;

        let view = screen.view().expect("ready");
        assert!(view.activities.is_none());
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_scores_are_bounded_by_timeout() {
        let source = FakeSource::default()
            .with_weather(1.0, 20, Ok(weather()))
            .with_scores(1.0, 60_000, Ok(score_set(vec![score("hiking", 90.0)])));
        let (loader, _) = loader(source);

        let started = tokio::time::Instant::now();
        loader.load(named(1.0, "Oslo"));
        let screen = loader.settled().await;

        assert!(screen.view().expect("ready").activities.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn weather_failure_reverts_to_previous_view_and_toasts() {
        let source = FakeSource::default()
            .with_weather(1.0, 10, Ok(weather()))
            .with_weather(2.0, 10, Err(FetchError::data("upstream error")));
        let (loader, notifier) = loader(source);

        loader.load(named(1.0, "Oslo"));
        loader.settled().await;

        loader.load(named(2.0, "Bergen"));
        assert!(loader.screen().is_loading());
        let screen = loader.settled().await;

        assert_eq!(city(&screen).as_deref(), Some("Oslo"));
        assert_eq!(notifier.current().map(|t| t.message).as_deref(), Some(LOAD_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_returns_to_welcome() {
        let source = FakeSource::default().with_weather(1.0, 10, Err(FetchError::network("down")));
        let (loader, _) = loader(source);

        loader.load(named(1.0, "Oslo"));
        let screen = loader.settled().await;
        assert!(matches!(screen, Screen::Welcome));
    }

    #[tokio::test(start_paused = true)]
    async fn weather_failure_does_not_wait_for_scores() {
        let source = FakeSource::default()
            .with_weather(1.0, 10, Err(FetchError::network("down")))
            .with_scores(1.0, 400, Ok(ScoreSet::default()));
        let (loader, _) = loader(source);

        let started = tokio::time::Instant::now();
        loader.load(named(1.0, "Oslo"));
        loader.settled().await;
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_location_changes_render_only_the_last() {
        let source = FakeSource::default()
            .with_weather(1.0, 300, Ok(weather()))
            .with_weather(2.0, 200, Ok(weather()))
            .with_weather(3.0, 10, Ok(weather()));
        let (loader, _) = loader(source);

        loader.load(named(1.0, "A"));
        loader.load(named(2.0, "B"));
        let last = loader.load(named(3.0, "C"));

        let screen = loader.settled().await;
        assert_eq!(city(&screen).as_deref(), Some("C"));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(city(&loader.screen()).as_deref(), Some("C"));
        assert_eq!(last.value(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn locate_names_the_place_from_reverse_geocoding() {
        let source = FakeSource::default()
            .with_names(
                1.0,
                10,
                Ok(ReverseGeocode {
                    city: Some("Tromsø".into()),
                    country: Some("Norway".into()),
                }),
            )
            .with_weather(1.0, 10, Ok(weather()));
        let (loader, notifier) = loader(source);

        loader.locate(1.0, 0.0);
        assert!(loader.screen().is_loading());
        let screen = loader.settled().await;

        let view = screen.view().expect("ready");
        assert_eq!(view.hero.city, "Tromsø");
        assert_eq!(view.hero.country, "Norway");
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn locate_failure_toasts_and_returns_to_welcome() {
        let source = FakeSource::default()
            .with_names(1.0, 10, Err(FetchError::network("geocoder down")))
            .with_weather(1.0, 10, Ok(weather()));
        let (loader, notifier) = loader(source);

        loader.locate(1.0, 0.0);
        let screen = loader.settled().await;

        assert!(matches!(screen, Screen::Welcome));
        assert_eq!(notifier.current().map(|t| t.message).as_deref(), Some(LOCATE_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn weekly_option_reaches_the_scores_request() {
        for (weekly, expected) in [(true, "scores:1:weekly"), (false, "scores:1")] {
            let source = Arc::new(FakeSource::default().with_weather(1.0, 10, Ok(weather())));
            let loader = LocationLoader::new(
                Arc::clone(&source) as Arc<dyn DataSource>,
                RequestCoordinator::new(),
                Notifier::new(Duration::from_millis(4500)),
                LoaderOptions {
                    weekly,
                    ..LoaderOptions::default()
                },
            );

            loader.load(named(1.0, "Oslo"));
            loader.settled().await;

            let calls = source.calls();
            let scores: Vec<_> = calls.iter().filter(|c| c.starts_with("scores:")).collect();
            assert_eq!(scores, vec![expected], "weekly = {weekly}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn new_load_shows_loading_until_it_settles() {
        let source = FakeSource::default()
            .with_weather(1.0, 0, Ok(weather()))
            .with_weather(2.0, 200, Ok(weather()));
        let (loader, _) = loader(source);

        loader.load(named(1.0, "Oslo"));
        loader.settled().await;

        let mut rx = loader.subscribe();
        rx.mark_unchanged();
        loader.load(named(2.0, "Bergen"));

        // Every screen published after the second load starts is either
        // Loading or the second load's result.
        while rx.changed().await.is_ok() {
            let screen = rx.borrow_and_update().clone();
            match &screen {
                Screen::Loading => continue,
                Screen::Ready(view) => {
                    assert_eq!(view.hero.city, "Bergen");
                    break;
                }
                Screen::Welcome => panic!("unexpected welcome screen"),
            }
        }
    }
}
