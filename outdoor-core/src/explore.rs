//! Spots near a map center, scored against the activity scores for that
//! center.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    assembler::fetch_scores,
    coordinator::{Channel, Generation, RequestCoordinator},
    error::FetchError,
    matcher::{self, ScoreTier},
    model::{ActivityScore, Location, ScoreSet, Spot, TimeWindow},
    notify::Notifier,
    source::DataSource,
};

pub const SPOTS_FAILED: &str = "Failed to load spots.";

/// Panama City, used when no position is known.
pub const DEFAULT_CENTER: (f64, f64) = (8.98, -79.52);

#[derive(Debug, Clone, Default)]
pub enum ExploreScreen {
    #[default]
    Idle,
    Loading,
    Ready(Arc<SpotsView>),
}

impl ExploreScreen {
    pub fn is_loading(&self) -> bool {
        matches!(self, ExploreScreen::Loading)
    }

    pub fn view(&self) -> Option<&Arc<SpotsView>> {
        match self {
            ExploreScreen::Ready(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotMarker {
    pub spot: Spot,
    /// Best matching activity score, 0 when nothing matches.
    pub score: f64,
    pub tier: ScoreTier,
}

/// Markers for one map center plus the scores they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotsView {
    pub center: (f64, f64),
    pub markers: Vec<SpotMarker>,
    pub scores: Option<ScoreSet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub name: String,
    pub score: i64,
    /// Bar fill, clamped to 0..=100.
    pub fill_pct: f64,
    pub tier: ScoreTier,
    pub window: Option<TimeWindow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetScores {
    Unavailable,
    NoMatches,
    Matches(Vec<SheetRow>),
}

impl SheetScores {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SheetScores::Unavailable => Some("Scores unavailable"),
            SheetScores::NoMatches => Some("No matching activities"),
            SheetScores::Matches(_) => None,
        }
    }
}

/// Detail panel for a single spot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotSheet {
    pub name: String,
    pub category: String,
    pub icon: String,
    pub scores: SheetScores,
    pub directions_url: String,
    /// Where "show weather here" should load.
    pub location: Location,
}

impl SpotsView {
    pub fn sheet(&self, index: usize) -> Option<SpotSheet> {
        let marker = self.markers.get(index)?;
        Some(spot_sheet(&marker.spot, self.scores.as_ref()))
    }
}

pub fn build_spots_view(center: (f64, f64), spots: Vec<Spot>, scores: Option<ScoreSet>) -> SpotsView {
    let markers = spots
        .into_iter()
        .map(|spot| {
            let score = scores
                .as_ref()
                .and_then(|set| matcher::best(set, &spot.activities))
                .map_or(0.0, |best| best.score);
            SpotMarker {
                tier: ScoreTier::of(score),
                score,
                spot,
            }
        })
        .collect();

    SpotsView {
        center,
        markers,
        scores,
    }
}

pub fn spot_sheet(spot: &Spot, scores: Option<&ScoreSet>) -> SpotSheet {
    let scores = match scores {
        None => SheetScores::Unavailable,
        Some(set) => {
            let ranked = matcher::ranked_matches(set, &spot.activities);
            if ranked.is_empty() {
                SheetScores::NoMatches
            } else {
                SheetScores::Matches(ranked.into_iter().map(sheet_row).collect())
            }
        }
    };

    SpotSheet {
        name: spot.name.clone(),
        category: capitalize(&spot.category),
        icon: spot.icon.clone(),
        scores,
        directions_url: directions_url(spot),
        location: Location::at(spot.lat, spot.lon).named(Some(spot.name.clone()), None),
    }
}

fn sheet_row(score: &ActivityScore) -> SheetRow {
    SheetRow {
        name: score.name.clone(),
        score: score.score.round() as i64,
        fill_pct: score.score.clamp(0.0, 100.0),
        tier: ScoreTier::of(score.score),
        window: score.best_window.clone(),
    }
}

pub fn directions_url(spot: &Spot) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        spot.lat, spot.lon
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ExploreOptions {
    pub radius_m: u32,
    pub pan_debounce: Duration,
    pub scores_timeout: Duration,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            radius_m: 8000,
            pan_debounce: Duration::from_millis(800),
            scores_timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn DataSource>,
    coordinator: RequestCoordinator,
    notifier: Notifier,
    options: ExploreOptions,
    screen: watch::Sender<ExploreScreen>,
    stable: Mutex<ExploreScreen>,
}

/// The map view: spots are required, scores are best-effort.
#[derive(Debug, Clone)]
pub struct ExploreMap {
    inner: Arc<Inner>,
}

impl ExploreMap {
    pub fn new(
        source: Arc<dyn DataSource>,
        coordinator: RequestCoordinator,
        notifier: Notifier,
        options: ExploreOptions,
    ) -> Self {
        let (screen, _) = watch::channel(ExploreScreen::Idle);
        Self {
            inner: Arc::new(Inner {
                source,
                coordinator,
                notifier,
                options,
                screen,
                stable: Mutex::new(ExploreScreen::Idle),
            }),
        }
    }

    pub fn screen(&self) -> ExploreScreen {
        self.inner.screen.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExploreScreen> {
        self.inner.screen.subscribe()
    }

    /// Load spots around `(lat, lon)` now, superseding any earlier load.
    pub fn load_spots(&self, lat: f64, lon: f64) -> Generation {
        info!(lat, lon, radius_m = self.inner.options.radius_m, "loading spots");
        let source = Arc::clone(&self.inner.source);
        let options = self.inner.options.clone();
        let work = async move {
            let scores = fetch_scores(source.as_ref(), lat, lon, false, options.scores_timeout);
            let (spots, scores) = tokio::try_join!(source.spots(lat, lon, options.radius_m), async {
                Ok::<_, FetchError>(scores.await)
            })?;
            Ok(build_spots_view((lat, lon), spots, scores))
        };

        let this = self.clone();
        self.inner.coordinator.issue_with_start(
            Channel::MAP,
            |_| {
                self.inner.screen.send_replace(ExploreScreen::Loading);
            },
            work,
            move |result| this.settle(result),
        )
    }

    /// The map stopped moving at `(lat, lon)`; load once it stays put.
    pub fn pan_to(&self, lat: f64, lon: f64) {
        let this = self.clone();
        self.inner
            .coordinator
            .debounce(Channel::MAP, self.inner.options.pan_debounce, move || {
                this.load_spots(lat, lon);
            });
    }

    pub async fn settled(&self) -> ExploreScreen {
        let mut rx = self.subscribe();
        match rx.wait_for(|screen| !screen.is_loading()).await {
            Ok(screen) => screen.clone(),
            Err(_) => self.screen(),
        }
    }

    fn settle(&self, result: Result<SpotsView, FetchError>) {
        let mut stable = self
            .inner
            .stable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(view) => {
                info!(spots = view.markers.len(), scores = view.scores.is_some(), "spots ready");
                *stable = ExploreScreen::Ready(Arc::new(view));
                self.inner.screen.send_replace(stable.clone());
            }
            Err(err) => {
                warn!(error = %err, "spots load failed");
                self.inner.notifier.show(SPOTS_FAILED);
                self.inner.screen.send_replace(stable.clone());
            }
        }
    }
}
