//! WMO weather-code catalog: description, icon and mood palette.

use std::fmt;

/// Icon selector for a weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Sun,
    NewMoon,
    SunSmallCloud,
    CrescentMoon,
    PartlyCloudy,
    Cloud,
    Fog,
    SunRainCloud,
    RainCloud,
    SnowCloud,
    Snowflake,
    Thunderstorm,
    /// Fallback for codes outside the catalog.
    Globe,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Sun => "\u{2600}\u{FE0F}",
            Icon::NewMoon => "\u{1F311}",
            Icon::SunSmallCloud => "\u{1F324}\u{FE0F}",
            Icon::CrescentMoon => "\u{1F319}",
            Icon::PartlyCloudy => "\u{26C5}",
            Icon::Cloud => "\u{2601}\u{FE0F}",
            Icon::Fog => "\u{1F32B}\u{FE0F}",
            Icon::SunRainCloud => "\u{1F326}\u{FE0F}",
            Icon::RainCloud => "\u{1F327}\u{FE0F}",
            Icon::SnowCloud => "\u{1F328}\u{FE0F}",
            Icon::Snowflake => "\u{2744}\u{FE0F}",
            Icon::Thunderstorm => "\u{26C8}\u{FE0F}",
            Icon::Globe => "\u{1F310}",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Resolved condition for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub description: &'static str,
    pub icon: Icon,
}

pub const UNKNOWN: Condition = Condition {
    description: "Unknown",
    icon: Icon::Globe,
};

struct Entry {
    code: i32,
    description: &'static str,
    day: Icon,
    night: Icon,
}

const fn both(code: i32, description: &'static str, icon: Icon) -> Entry {
    Entry {
        code,
        description,
        day: icon,
        night: icon,
    }
}

const CATALOG: &[Entry] = &[
    Entry {
        code: 0,
        description: "Clear sky",
        day: Icon::Sun,
        night: Icon::NewMoon,
    },
    Entry {
        code: 1,
        description: "Mainly clear",
        day: Icon::SunSmallCloud,
        night: Icon::CrescentMoon,
    },
    both(2, "Partly cloudy", Icon::PartlyCloudy),
    both(3, "Overcast", Icon::Cloud),
    both(45, "Fog", Icon::Fog),
    both(48, "Rime fog", Icon::Fog),
    both(51, "Light drizzle", Icon::SunRainCloud),
    both(53, "Moderate drizzle", Icon::SunRainCloud),
    both(55, "Dense drizzle", Icon::RainCloud),
    both(56, "Freezing drizzle", Icon::RainCloud),
    both(57, "Heavy freezing drizzle", Icon::RainCloud),
    both(61, "Slight rain", Icon::SunRainCloud),
    both(63, "Moderate rain", Icon::RainCloud),
    both(65, "Heavy rain", Icon::RainCloud),
    both(66, "Freezing rain", Icon::RainCloud),
    both(67, "Heavy freezing rain", Icon::RainCloud),
    both(71, "Light snow", Icon::SnowCloud),
    both(73, "Moderate snow", Icon::SnowCloud),
    both(75, "Heavy snow", Icon::Snowflake),
    both(77, "Snow grains", Icon::Snowflake),
    both(80, "Light showers", Icon::SunRainCloud),
    both(81, "Moderate showers", Icon::RainCloud),
    both(82, "Heavy showers", Icon::RainCloud),
    both(85, "Light snow showers", Icon::SnowCloud),
    both(86, "Heavy snow showers", Icon::Snowflake),
    both(95, "Thunderstorm", Icon::Thunderstorm),
    both(96, "Thunderstorm, hail", Icon::Thunderstorm),
    both(99, "Severe thunderstorm", Icon::Thunderstorm),
];

/// Look up a weather code. Codes outside the catalog resolve to [`UNKNOWN`].
pub fn describe(code: i32, is_day: bool) -> Condition {
    CATALOG
        .iter()
        .find(|entry| entry.code == code)
        .map(|entry| Condition {
            description: entry.description,
            icon: if is_day { entry.day } else { entry.night },
        })
        .unwrap_or(UNKNOWN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

/// Colour pair used to tint the hero card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    pub primary: Rgb,
    pub alt: Rgb,
}

const fn mood_of(primary: Rgb, alt: Rgb) -> Mood {
    Mood { primary, alt }
}

pub const DEFAULT_MOOD: Mood = mood_of(Rgb(212, 149, 107), Rgb(190, 130, 90));

/// Palette for a weather code. Freezing drizzle shares the drizzle palette
/// and freezing rain the rain palette.
pub fn mood(code: i32, is_day: bool) -> Mood {
    match code {
        0 | 1 if is_day => mood_of(Rgb(210, 170, 100), Rgb(195, 135, 75)),
        0 | 1 => mood_of(Rgb(150, 160, 195), Rgb(120, 130, 175)),
        2 => mood_of(Rgb(180, 170, 145), Rgb(155, 150, 125)),
        3 => mood_of(Rgb(145, 145, 155), Rgb(125, 128, 140)),
        45 | 48 => mood_of(Rgb(160, 155, 170), Rgb(140, 135, 155)),
        51..=57 => mood_of(Rgb(130, 160, 185), Rgb(110, 140, 170)),
        61..=67 => mood_of(Rgb(115, 150, 190), Rgb(95, 125, 170)),
        71..=77 => mood_of(Rgb(170, 185, 205), Rgb(145, 165, 190)),
        80..=82 => mood_of(Rgb(120, 155, 185), Rgb(100, 135, 168)),
        85 | 86 => mood_of(Rgb(165, 180, 200), Rgb(140, 160, 185)),
        95..=99 => mood_of(Rgb(155, 130, 175), Rgb(130, 105, 155)),
        _ => DEFAULT_MOOD,
    }
}
