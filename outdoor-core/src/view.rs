//! Presentation model for one location, rebuilt from scratch on every load.

use chrono::{DateTime, Utc};

use crate::{
    clock::{LocalClock, clock_label, day_name, hour_label},
    condition::{self, Icon, Mood},
    matcher::{self, ScoreTier},
    model::{ActivityScore, Location, ScoreSet, WeatherSnapshot},
    series::{self, BarGeometry},
    tip::{self, Tip, TipContext, TipPolicy},
    units::{self, UnitSystem},
};

pub const HOURLY_LIMIT: usize = 24;

/// Render-time preferences, sourced once per load.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPrefs {
    pub units: UnitSystem,
    pub primary_activity: Option<String>,
    pub top_activities: usize,
    pub tips: TipPolicy,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            primary_activity: None,
            top_activities: 3,
            tips: TipPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub units: UnitSystem,
    pub timezone: String,
    pub hero: Hero,
    pub details: Details,
    pub hourly: Vec<HourlyEntry>,
    pub forecast: Vec<ForecastRow>,
    /// `None` when scores were unavailable for this load.
    pub activities: Option<ActivityPanel>,
    pub tip: Tip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hero {
    pub city: String,
    pub country: String,
    pub icon: Icon,
    pub condition: &'static str,
    pub temperature: i64,
    pub temperature_unit: &'static str,
    pub mood: Mood,
    pub is_night: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Details {
    pub feels_like: i64,
    pub humidity_pct: i64,
    pub wind_speed: i64,
    pub speed_unit: &'static str,
    pub wind_direction: &'static str,
    pub pressure_hpa: i64,
    pub uv: Option<UvReading>,
    pub max_wind: Option<i64>,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvReading {
    pub value: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEntry {
    /// "Now" for the first step, then "HH:00".
    pub label: String,
    pub icon: Icon,
    pub temperature: i64,
    /// Only set when above zero.
    pub precipitation_pct: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub day: String,
    pub is_today: bool,
    pub icon: Icon,
    pub description: &'static str,
    pub precipitation_pct: Option<i64>,
    pub low: i64,
    pub high: i64,
    pub bar: BarGeometry,
}

/// Score-derived sections. Built whole or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPanel {
    pub primary: Option<ActivityScore>,
    pub top: Vec<ActivityScore>,
    pub weekly: Vec<WeeklyDot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyDot {
    pub day: String,
    pub score: i64,
    pub label: String,
    pub tier: ScoreTier,
}

impl ViewModel {
    /// Current wall-clock reading at the location.
    pub fn clock(&self, now: DateTime<Utc>) -> Option<LocalClock> {
        LocalClock::at(&self.timezone, now)
    }
}

/// Build the full view from one weather payload and, optionally, its scores.
pub fn assemble(
    weather: &WeatherSnapshot,
    scores: Option<&ScoreSet>,
    location: &Location,
    prefs: &DisplayPrefs,
) -> ViewModel {
    let units = prefs.units;
    let timezone = location
        .timezone
        .clone()
        .or_else(|| weather.timezone.clone())
        .unwrap_or_else(|| "UTC".to_string());

    let tip = tip::recommend(&TipContext {
        weather,
        scores,
        primary_slug: prefs.primary_activity.as_deref(),
        policy: &prefs.tips,
    });

    ViewModel {
        units,
        timezone,
        hero: hero(weather, location, units),
        details: details(weather, units),
        hourly: hourly(weather, units),
        forecast: forecast(weather, units),
        activities: scores.map(|set| activity_panel(set, prefs)),
        tip,
    }
}

fn hero(weather: &WeatherSnapshot, location: &Location, units: UnitSystem) -> Hero {
    let current = &weather.current;
    let condition = condition::describe(current.condition_code, current.is_day);

    Hero {
        city: location.city.clone().unwrap_or_else(|| "Unknown".to_string()),
        country: location.country.clone().unwrap_or_default(),
        icon: condition.icon,
        condition: condition.description,
        temperature: units::to_display_temperature(current.temperature, units),
        temperature_unit: units.temperature_label(),
        mood: condition::mood(current.condition_code, current.is_day),
        is_night: !current.is_day,
    }
}

fn details(weather: &WeatherSnapshot, units: UnitSystem) -> Details {
    let current = &weather.current;
    let daily = &weather.daily;
    let uv = daily.uv_index_max.first().copied().flatten();

    Details {
        feels_like: units::to_display_temperature(current.apparent_temperature, units),
        humidity_pct: current.humidity.round() as i64,
        wind_speed: units::to_display_speed(current.wind_speed, units),
        speed_unit: units.speed_label(),
        wind_direction: units::wind_label(current.wind_direction_deg),
        pressure_hpa: current.pressure.round() as i64,
        uv: uv.map(|uv| UvReading {
            value: units::format_uv(uv),
            label: units::uv_label(uv),
        }),
        max_wind: daily
            .wind_speed_max
            .first()
            .copied()
            .flatten()
            .map(|kmh| units::to_display_speed(kmh, units)),
        sunrise: clock_label(daily.sunrise.first().map(String::as_str)),
        sunset: clock_label(daily.sunset.first().map(String::as_str)),
    }
}

fn hourly(weather: &WeatherSnapshot, units: UnitSystem) -> Vec<HourlyEntry> {
    let Some(hourly) = weather.hourly.as_ref() else {
        return Vec::new();
    };

    hourly
        .times
        .iter()
        .zip(&hourly.temperatures)
        .zip(&hourly.condition_codes)
        .take(HOURLY_LIMIT)
        .enumerate()
        .map(|(i, ((time, temperature), code))| {
            let precipitation = hourly.precipitation_at(i).round() as i64;
            HourlyEntry {
                label: if i == 0 { "Now".to_string() } else { hour_label(time) },
                icon: condition::describe(*code, hourly.is_day_at(i)).icon,
                temperature: units::to_display_temperature(*temperature, units),
                precipitation_pct: (precipitation > 0).then_some(precipitation),
            }
        })
        .collect()
}

fn forecast(weather: &WeatherSnapshot, units: UnitSystem) -> Vec<ForecastRow> {
    let daily = &weather.daily;
    let len = daily
        .dates
        .len()
        .min(daily.temp_min.len())
        .min(daily.temp_max.len())
        .min(daily.condition_codes.len());

    let lows = &daily.temp_min[..len];
    let highs = &daily.temp_max[..len];
    let Some(range) = series::global_range(lows, highs) else {
        return Vec::new();
    };

    (0..len)
        .map(|i| {
            let condition = condition::describe(daily.condition_codes[i], true);
            let precipitation = daily
                .precipitation_probability_max
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(0.0)
                .round() as i64;

            ForecastRow {
                day: if i == 0 {
                    "Today".to_string()
                } else {
                    day_name(&daily.dates[i])
                        .map(str::to_string)
                        .unwrap_or_else(|| daily.dates[i].clone())
                },
                is_today: i == 0,
                icon: condition.icon,
                description: condition.description,
                precipitation_pct: (precipitation > 0).then_some(precipitation),
                low: units::to_display_temperature(lows[i], units),
                high: units::to_display_temperature(highs[i], units),
                bar: series::bar_geometry(lows[i], highs[i], range),
            }
        })
        .collect()
}

fn activity_panel(set: &ScoreSet, prefs: &DisplayPrefs) -> ActivityPanel {
    let primary = prefs
        .primary_activity
        .as_deref()
        .and_then(|slug| matcher::find(set, slug))
        .cloned();

    let weekly = set
        .weekly
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|day| WeeklyDot {
            day: day_name(&day.date)
                .map(str::to_string)
                .unwrap_or_else(|| day.date.clone()),
            score: day.score.round() as i64,
            label: day.label.clone(),
            tier: ScoreTier::of(day.score),
        })
        .collect();

    ActivityPanel {
        primary,
        top: matcher::top_n(set, prefs.top_activities).to_vec(),
        weekly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            WeeklyScore,
            fixtures::{score, score_set, weather, windowed},
        },
        tip::TipKind,
    };

    fn berlin() -> Location {
        Location::at(52.52, 13.40).named(Some("Berlin".into()), Some("Germany".into()))
    }

    #[test]
    fn hero_and_details_use_metric() {
        let view = assemble(&weather(), None, &berlin(), &DisplayPrefs::default());

        assert_eq!(view.hero.city, "Berlin");
        assert_eq!(view.hero.temperature, 21);
        assert_eq!(view.hero.temperature_unit, "\u{B0}C");
        assert_eq!(view.hero.condition, "Partly cloudy");
        assert!(!view.hero.is_night);

        assert_eq!(view.details.feels_like, 21);
        assert_eq!(view.details.humidity_pct, 55);
        assert_eq!(view.details.wind_speed, 12);
        assert_eq!(view.details.speed_unit, "km/h");
        assert_eq!(view.details.wind_direction, "SSW");
        assert_eq!(view.details.pressure_hpa, 1013);
        assert_eq!(
            view.details.uv,
            Some(UvReading { value: "5.3".into(), label: "High" })
        );
        assert_eq!(view.details.max_wind, Some(18));
        assert_eq!(view.details.sunrise, "05:01");
        assert_eq!(view.details.sunset, "21:18");
        assert_eq!(view.timezone, "Europe/Berlin");
    }

    #[test]
    fn imperial_applies_to_every_value() {
        let prefs = DisplayPrefs {
            units: UnitSystem::Imperial,
            ..DisplayPrefs::default()
        };
        let view = assemble(&weather(), None, &berlin(), &prefs);

        assert_eq!(view.units, UnitSystem::Imperial);
        assert_eq!(view.hero.temperature, 71);
        assert_eq!(view.hero.temperature_unit, "\u{B0}F");
        assert_eq!(view.details.speed_unit, "mph");
        assert_eq!(view.details.wind_speed, 8);
        assert_eq!(view.hourly[0].temperature, 71);
        assert_eq!(view.forecast[2].high, 79);
        assert_eq!(view.forecast[1].low, 50);
    }

    #[test]
    fn hourly_labels_and_precipitation() {
        let view = assemble(&weather(), None, &berlin(), &DisplayPrefs::default());

        assert_eq!(view.hourly.len(), 6);
        assert_eq!(view.hourly[0].label, "Now");
        assert_eq!(view.hourly[1].label, "15:00");
        assert_eq!(view.hourly[0].precipitation_pct, None);
        assert_eq!(view.hourly[4].precipitation_pct, Some(40));
        assert_eq!(view.hourly[5].precipitation_pct, None);
        assert_eq!(view.hourly[5].icon, Icon::Cloud);
    }

    #[test]
    fn hourly_is_capped_at_a_day() {
        let mut w = weather();
        let hourly = w.hourly.as_mut().expect("hourly");
        hourly.times = (0..48).map(|h| format!("2024-06-0{}T{:02}:00", 1 + h / 24, h % 24)).collect();
        hourly.temperatures = vec![20.0; 48];
        hourly.condition_codes = vec![0; 48];

        let view = assemble(&w, None, &berlin(), &DisplayPrefs::default());
        assert_eq!(view.hourly.len(), HOURLY_LIMIT);
    }

    #[test]
    fn forecast_bars_use_global_range() {
        let view = assemble(&weather(), None, &berlin(), &DisplayPrefs::default());

        assert_eq!(view.forecast.len(), 3);
        assert_eq!(view.forecast[0].day, "Today");
        assert!(view.forecast[0].is_today);
        assert_eq!(view.forecast[1].day, "Sun");
        assert_eq!(view.forecast[1].description, "Slight rain");
        assert_eq!(view.forecast[2].precipitation_pct, None);
        assert_eq!(view.forecast[1].precipitation_pct, Some(80));

        // Global range is 10..26.
        let first = view.forecast[0].bar;
        assert!((first.offset_pct - 12.5).abs() < 1e-9);
        assert!((first.width_pct - 62.5).abs() < 1e-9);
        let third = view.forecast[2].bar;
        assert!((third.offset_pct + third.width_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn no_scores_hides_activity_panel() {
        let view = assemble(&weather(), None, &berlin(), &DisplayPrefs::default());
        assert!(view.activities.is_none());
        assert_eq!(view.tip.kind, TipKind::Moderate);
    }

    #[test]
    fn scores_fill_panel_and_tip() {
        let mut set = score_set(vec![
            windowed("running", 85.0, "09:00", "11:00"),
            score("hiking", 70.0),
            score("cycling", 60.0),
            score("surfing", 10.0),
        ]);
        set.weekly = Some(vec![
            WeeklyScore { date: "2024-06-01".into(), score: 72.0, label: "Good".into() },
            WeeklyScore { date: "2024-06-02".into(), score: 41.0, label: "Poor".into() },
        ]);
        let prefs = DisplayPrefs {
            primary_activity: Some("running".into()),
            top_activities: 2,
            ..DisplayPrefs::default()
        };

        let view = assemble(&weather(), Some(&set), &berlin(), &prefs);
        let panel = view.activities.expect("panel present");

        assert_eq!(panel.primary.map(|p| p.slug), Some("running".to_string()));
        assert_eq!(panel.top.len(), 2);
        assert_eq!(panel.top[1].slug, "hiking");
        assert_eq!(panel.weekly.len(), 2);
        assert_eq!(panel.weekly[0].day, "Sat");
        assert_eq!(panel.weekly[0].tier, ScoreTier::Great);
        assert_eq!(panel.weekly[1].tier, ScoreTier::Low);

        assert_eq!(view.tip.kind, TipKind::GreatConditions);
        assert!(view.tip.text.contains("09:00"));
    }

    #[test]
    fn timezone_prefers_location_then_payload() {
        let mut location = berlin();
        location.timezone = Some("America/Panama".into());
        let view = assemble(&weather(), None, &location, &DisplayPrefs::default());
        assert_eq!(view.timezone, "America/Panama");

        let mut w = weather();
        w.timezone = None;
        let view = assemble(&w, None, &berlin(), &DisplayPrefs::default());
        assert_eq!(view.timezone, "UTC");
    }

    #[test]
    fn missing_daily_rows_render_no_forecast() {
        let mut w = weather();
        w.daily.temp_min.clear();
        w.daily.temp_max.clear();

        let view = assemble(&w, None, &berlin(), &DisplayPrefs::default());
        assert!(view.forecast.is_empty());
    }
}
