//! Core library for the `outdoor` CLI.
//!
//! This crate defines:
//! - The data source abstraction over the hosting web app's JSON endpoints
//! - Pure display transforms (conditions, units, forecast bars, tips)
//! - Latest-request-wins coordination for search, location and map loads
//! - Configuration handling
//!
//! It is used by `outdoor-cli`, but the controllers only depend on
//! [`DataSource`] so other front ends can drive them too.

pub mod assembler;
pub mod clock;
pub mod condition;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod explore;
pub mod matcher;
pub mod model;
pub mod notify;
pub mod search;
pub mod series;
pub mod source;
pub mod tip;
pub mod units;
pub mod view;

pub use assembler::{LoaderOptions, LocationLoader, Screen};
pub use config::Config;
pub use coordinator::{Channel, Generation, RequestCoordinator};
pub use error::FetchError;
pub use explore::{ExploreMap, ExploreOptions, ExploreScreen};
pub use model::{Location, Place, ScoreSet, Spot, WeatherSnapshot};
pub use notify::Notifier;
pub use search::{SearchBox, SearchState};
pub use source::{DataSource, HttpSource};
pub use units::UnitSystem;
pub use view::{DisplayPrefs, ViewModel};
