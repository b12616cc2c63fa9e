use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

const KMH_PER_MPH: f64 = 1.609_344;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "\u{B0}C",
            UnitSystem::Imperial => "\u{B0}F",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Celsius to a whole display degree in `system`.
pub fn to_display_temperature(celsius: f64, system: UnitSystem) -> i64 {
    let value = match system {
        UnitSystem::Metric => celsius,
        UnitSystem::Imperial => celsius * 9.0 / 5.0 + 32.0,
    };
    value.round() as i64
}

/// Display degrees in `system` back to Celsius.
pub fn from_display_temperature(value: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => (value - 32.0) * 5.0 / 9.0,
    }
}

/// km/h to a whole display speed in `system`.
pub fn to_display_speed(kmh: f64, system: UnitSystem) -> i64 {
    let value = match system {
        UnitSystem::Metric => kmh,
        UnitSystem::Imperial => kmh / KMH_PER_MPH,
    };
    value.round() as i64
}

pub fn from_display_speed(value: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * KMH_PER_MPH,
    }
}

/// UV index keeps one decimal.
pub fn format_uv(uv: f64) -> String {
    format!("{uv:.1}")
}

pub fn uv_label(uv: f64) -> &'static str {
    if uv <= 2.0 {
        "Low"
    } else if uv <= 5.0 {
        "Moderate"
    } else if uv <= 7.0 {
        "High"
    } else if uv <= 10.0 {
        "Very high"
    } else {
        "Extreme"
    }
}

/// 16-point compass label for a wind direction in degrees.
pub fn wind_label(degrees: f64) -> &'static str {
    const DIRS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let step = (degrees / 22.5).round() as i64;
    DIRS[step.rem_euclid(16) as usize]
}
