use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tracing::debug;

use outdoor_core::{
    Config, DataSource, ExploreMap, ExploreOptions, ExploreScreen, HttpSource, LoaderOptions,
    Location, LocationLoader, Notifier, RequestCoordinator, Screen, SearchBox, SearchState,
    UnitSystem,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "outdoor", version, about = "Weather and activity conditions for outdoor plans")]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the server address, units and preferred activity.
    Configure,

    /// List places matching a name.
    Search {
        query: String,
    },

    /// Show conditions for a place found by name.
    Show {
        query: String,
    },

    /// Show conditions at coordinates.
    Here {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// List outdoor spots around a point, scored for current conditions.
    Explore {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Simulate panning the map; only the last position is loaded.
        #[arg(long = "pan", value_name = "LAT,LON", value_parser = parse_coords, allow_hyphen_values = true)]
        pans: Vec<(f64, f64)>,

        /// Open the detail sheet for the spot with this number.
        #[arg(long)]
        spot: Option<usize>,
    },

    /// Add a saved location to your profile.
    Save {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Remove a saved location from your profile.
    Unsave {
        name: String,
    },
}

fn parse_coords(raw: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{raw}'"))?;
    let lat = lat.trim().parse().map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lon = lon.trim().parse().map_err(|e| format!("bad longitude '{lon}': {e}"))?;
    Ok((lat, lon))
}

/// Slack after the pan debounce before checking for the triggered load.
const PAN_GRACE: Duration = Duration::from_millis(50);

/// Shared wiring for one command run.
struct App {
    config: Config,
    source: Arc<dyn DataSource>,
    notifier: Notifier,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let source = HttpSource::from_config(&config.api)?;
        let notifier = Notifier::new(config.timing.toast());
        Ok(Self {
            config,
            source: Arc::new(source),
            notifier,
        })
    }

    fn search_box(&self) -> SearchBox {
        SearchBox::new(
            Arc::clone(&self.source),
            RequestCoordinator::new(),
            self.config.timing.search_debounce(),
        )
    }

    fn loader(&self) -> LocationLoader {
        LocationLoader::new(
            Arc::clone(&self.source),
            RequestCoordinator::new(),
            self.notifier.clone(),
            LoaderOptions {
                prefs: self.config.display_prefs(),
                weekly: self.config.display.weekly,
                scores_timeout: self.config.timing.scores_timeout(),
            },
        )
    }

    fn explore_map(&self) -> ExploreMap {
        ExploreMap::new(
            Arc::clone(&self.source),
            RequestCoordinator::new(),
            self.notifier.clone(),
            ExploreOptions {
                radius_m: self.config.timing.spot_radius_m,
                pan_debounce: self.config.timing.map_debounce(),
                scores_timeout: self.config.timing.scores_timeout(),
            },
        )
    }

    /// Message of the visible toast, or a generic fallback.
    fn failure(&self, fallback: &str) -> anyhow::Error {
        let message = self
            .notifier
            .current()
            .map(|toast| toast.message)
            .unwrap_or_else(|| fallback.to_string());
        anyhow!(message)
    }

    async fn search(&self, query: &str) -> Result<SearchState> {
        let search = self.search_box();
        if search.submit(query).is_none() {
            bail!(
                "Search term '{query}' is too short.\n\
                 Hint: type at least {} characters.",
                outdoor_core::search::MIN_QUERY_LEN
            );
        }
        Ok(search.settled().await)
    }

    async fn show(&self, location: Location) -> Result<()> {
        let loader = self.loader();
        loader.load(location);
        self.present(&loader).await
    }

    async fn locate(&self, lat: f64, lon: f64) -> Result<()> {
        let loader = self.loader();
        loader.locate(lat, lon);
        self.present(&loader).await
    }

    async fn present(&self, loader: &LocationLoader) -> Result<()> {
        match loader.settled().await {
            Screen::Ready(view) => {
                println!("{}", render::location(&view, view.clock(Utc::now())));
                Ok(())
            }
            _ => Err(self.failure("Failed to load weather data.")),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Command::Configure = self.command {
            return configure();
        }

        let config = Config::load()?;
        debug!(base_url = %config.api.base_url, "loaded configuration");
        let app = App::new(config)?;

        match self.command {
            Command::Configure => configure()?,

            Command::Search { query } => match app.search(&query).await? {
                SearchState::Results(places) => println!("{}", render::places(&places)),
                _ => println!("No results found."),
            },

            Command::Show { query } => {
                let places = match app.search(&query).await? {
                    SearchState::Results(places) => places,
                    _ => bail!("No results found for '{query}'."),
                };

                let place = if places.len() == 1 {
                    &places[0]
                } else {
                    let labels: Vec<String> = places.iter().map(render::place_label).collect();
                    let picked = Select::new("Which place?", labels)
                        .raw_prompt()
                        .context("No place selected")?;
                    &places[picked.index]
                };

                app.show(Location::from(place)).await?;
            }

            Command::Here { lat, lon } => app.locate(lat, lon).await?,

            Command::Explore {
                lat,
                lon,
                pans,
                spot,
            } => {
                let map = app.explore_map();
                map.load_spots(lat, lon);
                let mut screen = map.settled().await;

                if !pans.is_empty() {
                    for (lat, lon) in pans {
                        map.pan_to(lat, lon);
                    }
                    // Let the debounced load start before waiting on it.
                    tokio::time::sleep(app.config.timing.map_debounce() + PAN_GRACE).await;
                    screen = map.settled().await;
                }

                let ExploreScreen::Ready(view) = screen else {
                    return Err(app.failure("Failed to load spots."));
                };
                println!("{}", render::spots(&view));

                if let Some(number) = spot {
                    let sheet = number
                        .checked_sub(1)
                        .and_then(|index| view.sheet(index))
                        .ok_or_else(|| anyhow!("There is no spot number {number}."))?;
                    println!();
                    println!("{}", render::sheet(&sheet));
                }
            }

            Command::Save { name, lat, lon } => {
                app.source
                    .save_location(&name, lat, lon)
                    .await
                    .map_err(|err| anyhow!("{}\n({err})", err.user_message()))?;
                println!("Saved '{name}'.");
            }

            Command::Unsave { name } => {
                app.source
                    .remove_location(&name)
                    .await
                    .map_err(|err| anyhow!("{}\n({err})", err.user_message()))?;
                println!("Removed '{name}'.");
            }
        }

        Ok(())
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let base_url = Text::new("Server address:")
        .with_default(&config.api.base_url)
        .prompt()
        .context("Configuration cancelled")?;
    config.set_base_url(&base_url)?;

    let units: Vec<&str> = UnitSystem::all().iter().map(UnitSystem::as_str).collect();
    let start = UnitSystem::all()
        .iter()
        .position(|u| *u == config.display.units)
        .unwrap_or_default();
    let picked = Select::new("Units:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Configuration cancelled")?;
    config.display.units = UnitSystem::try_from(picked)?;

    let primary = Text::new("Preferred activity slug (blank for none):")
        .with_default(config.display.primary_activity.as_deref().unwrap_or_default())
        .prompt()
        .context("Configuration cancelled")?;
    config.set_primary_activity(Some(&primary));

    let token = Text::new("CSRF token for saving locations (blank to skip):")
        .with_default(config.api.csrf_token.as_deref().unwrap_or_default())
        .prompt()
        .context("Configuration cancelled")?;
    config.set_csrf_token(Some(&token));

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_parse_with_negative_longitude() {
        assert_eq!(parse_coords("8.98,-79.52"), Ok((8.98, -79.52)));
        assert_eq!(parse_coords(" 1.5 , 2 "), Ok((1.5, 2.0)));
        assert!(parse_coords("8.98").is_err());
        assert!(parse_coords("north,east").is_err());
    }

    #[test]
    fn explore_accepts_repeated_pans() {
        let cli = Cli::try_parse_from([
            "outdoor", "explore", "--lat", "8.98", "--lon", "-79.52", "--pan", "9.0,-79.5", "--pan", "9.1,-79.4",
            "--spot", "2",
        ])
        .expect("valid args");

        let Command::Explore { pans, spot, lon, .. } = cli.command else {
            panic!("expected explore");
        };
        assert_eq!(pans, vec![(9.0, -79.5), (9.1, -79.4)]);
        assert_eq!(spot, Some(2));
        assert_eq!(lon, -79.52);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["outdoor", "search", "Oslo", "--verbose"]).expect("valid args");
        assert!(cli.verbose);
    }
}
