use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Weather payload for one location, as served by the weather endpoint.
///
/// Field names follow the Open-Meteo response the backend forwards.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSnapshot {
    pub current: Current,
    #[serde(default)]
    pub hourly: Option<Hourly>,
    pub daily: Daily,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Current {
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    pub apparent_temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: f64,
    /// km/h
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: f64,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction_deg: f64,
    /// hPa
    #[serde(rename = "surface_pressure")]
    pub pressure: f64,
    #[serde(rename = "weather_code")]
    pub condition_code: i32,
    #[serde(deserialize_with = "flag")]
    pub is_day: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hourly {
    #[serde(rename = "time")]
    pub times: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperatures: Vec<f64>,
    #[serde(rename = "weather_code")]
    pub condition_codes: Vec<i32>,
    #[serde(default, deserialize_with = "flags")]
    pub is_day: Vec<bool>,
    #[serde(rename = "precipitation_probability", default)]
    pub precipitation_probabilities: Vec<Option<f64>>,
}

impl Hourly {
    /// Precipitation probability at step `index`, 0 when missing.
    pub fn precipitation_at(&self, index: usize) -> f64 {
        self.precipitation_probabilities
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(0.0)
    }

    pub fn is_day_at(&self, index: usize) -> bool {
        self.is_day.get(index).copied().unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Daily {
    #[serde(rename = "time")]
    pub dates: Vec<String>,
    #[serde(rename = "temperature_2m_min")]
    pub temp_min: Vec<f64>,
    #[serde(rename = "temperature_2m_max")]
    pub temp_max: Vec<f64>,
    #[serde(rename = "weather_code")]
    pub condition_codes: Vec<i32>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index_max: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m_max", default)]
    pub wind_speed_max: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
}

/// Suitability of one activity at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub label: String,
    /// 0..=100
    pub score: f64,
    #[serde(default)]
    pub best_window: Option<TimeWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

/// Ranked activity scores for one location. The backend sorts `scores`
/// best-first; nothing here re-sorts the full list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    #[serde(default)]
    pub scores: Vec<ActivityScore>,
    #[serde(default)]
    pub weekly: Option<Vec<WeeklyScore>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScore {
    pub date: String,
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

/// A point of interest on the explore map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub icon: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub activities: BTreeSet<String>,
}

/// One geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Place {
    /// Secondary line shown under the name, e.g. "Bavaria, Germany".
    pub fn detail(&self) -> String {
        match self.admin1.as_deref() {
            Some(admin1) if !admin1.is_empty() => format!("{admin1}, {}", self.country),
            _ => self.country.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Target of a "load location" operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl Location {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city: None,
            country: None,
            timezone: None,
        }
    }

    pub fn named(mut self, city: Option<String>, country: Option<String>) -> Self {
        self.city = city;
        self.country = country;
        self
    }
}

impl From<&Place> for Location {
    fn from(place: &Place) -> Self {
        Self {
            latitude: place.latitude,
            longitude: place.longitude,
            city: Some(place.name.clone()),
            country: Some(place.country.clone()),
            timezone: place.timezone.clone(),
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(u8::deserialize(deserializer)? == 1)
}

fn flags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<bool>, D::Error> {
    let raw = Vec::<u8>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v == 1).collect())
}
