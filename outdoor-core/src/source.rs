use std::{fmt::Debug, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    config::ApiConfig,
    error::FetchError,
    model::{Place, ReverseGeocode, ScoreSet, Spot, WeatherSnapshot},
};

/// The external endpoints the client reads from and writes to.
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    async fn geocode(&self, query: &str) -> Result<Vec<Place>, FetchError>;

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<ReverseGeocode, FetchError>;

    async fn weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, FetchError>;

    async fn scores(&self, lat: f64, lon: f64, weekly: bool) -> Result<ScoreSet, FetchError>;

    async fn spots(&self, lat: f64, lon: f64, radius_m: u32) -> Result<Vec<Spot>, FetchError>;

    async fn save_location(&self, name: &str, lat: f64, lon: f64) -> Result<(), FetchError>;

    async fn remove_location(&self, name: &str) -> Result<(), FetchError>;
}

pub const CSRF_HEADER: &str = "X-CSRFToken";

/// JSON-over-HTTP implementation against the hosting web app.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    csrf_token: Option<String>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct SpotsResponse {
    #[serde(default)]
    spots: Vec<Spot>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct SaveLocationBody<'a> {
    name: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct RemoveLocationBody<'a> {
    name: &'a str,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, csrf_token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token,
            http,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.csrf_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, FetchError> {
        let res = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::network(format!("Failed to send {what} request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::network(format!("Failed to read {what} response body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::network(format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        debug!(what, bytes = body.len(), "fetched");
        decode(&body, what)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B, what: &str) -> Result<(), FetchError> {
        let mut req = self.http.post(self.url(path)).json(body);
        match self.csrf_token.as_deref() {
            Some(token) => req = req.header(CSRF_HEADER, token),
            None => warn!(what, "no CSRF token configured; the server will likely reject this"),
        }

        let res = req
            .send()
            .await
            .map_err(|e| FetchError::network(format!("Failed to send {what} request: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::network(format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn geocode(&self, query: &str) -> Result<Vec<Place>, FetchError> {
        let parsed: GeocodeResponse = self
            .get_json("/weather/api/geocode/", &[("q", query.to_string())], "geocode")
            .await?;
        Ok(parsed.results)
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<ReverseGeocode, FetchError> {
        self.get_json(
            "/weather/api/reverse-geocode/",
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
            "reverse geocode",
        )
        .await
    }

    async fn weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, FetchError> {
        self.get_json(
            "/weather/api/weather/",
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
            "weather",
        )
        .await
    }

    async fn scores(&self, lat: f64, lon: f64, weekly: bool) -> Result<ScoreSet, FetchError> {
        self.get_json("/weather/api/scores/", &scores_query(lat, lon, weekly), "scores")
            .await
    }

    async fn spots(&self, lat: f64, lon: f64, radius_m: u32) -> Result<Vec<Spot>, FetchError> {
        let parsed: SpotsResponse = self
            .get_json(
                "/explore/api/spots/",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("radius", radius_m.to_string()),
                ],
                "spots",
            )
            .await?;
        Ok(parsed.spots)
    }

    async fn save_location(&self, name: &str, lat: f64, lon: f64) -> Result<(), FetchError> {
        let body = SaveLocationBody {
            name,
            latitude: lat,
            longitude: lon,
        };
        self.post_json("/profile/api/save-location/", &body, "save location").await
    }

    async fn remove_location(&self, name: &str) -> Result<(), FetchError> {
        self.post_json("/profile/api/remove-location/", &RemoveLocationBody { name }, "remove location")
            .await
    }
}

/// Parse a successful body, treating a set `error` field as a data error.
fn scores_query(lat: f64, lon: f64, weekly: bool) -> Vec<(&'static str, String)> {
    let mut query = vec![("lat", lat.to_string()), ("lon", lon.to_string())];
    if weekly {
        query.push(("weekly", "1".to_string()));
    }
    query
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, FetchError> {
    if let Ok(ErrorEnvelope { error: Some(error) }) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !error.is_null() {
            return Err(FetchError::data(format!("{what} response reported an error: {error}")));
        }
    }

    serde_json::from_str(body).map_err(|e| FetchError::data(format!("Failed to parse {what} JSON: {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
