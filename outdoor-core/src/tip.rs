//! "Smart tip": one recommendation derived from conditions and activity scores.
//!
//! Rules are evaluated in order and the first one that applies produces the
//! tip. Each rule is a predicate plus a text builder so it can be tested on
//! its own.

use serde::{Deserialize, Serialize};

use crate::{
    clock::hour_label,
    matcher,
    model::{ActivityScore, ScoreSet, WeatherSnapshot},
};

/// Tunable constants of the rain-warning rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipPolicy {
    /// Warn when precipitation probability exceeds this percentage.
    pub rain_threshold_pct: f64,
    /// First hourly step inspected (0 is the current hour).
    pub rain_first_step: usize,
    /// Last hourly step inspected, inclusive.
    pub rain_last_step: usize,
}

impl Default for TipPolicy {
    fn default() -> Self {
        Self {
            rain_threshold_pct: 60.0,
            rain_first_step: 1,
            rain_last_step: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipKind {
    RainWarning,
    GreatConditions,
    DecentConditions,
    TryInstead,
    ToughConditions,
    PerfectDay,
    HeatAdvisory,
    WindAdvisory,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub kind: TipKind,
    pub text: String,
}

/// Everything the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct TipContext<'a> {
    pub weather: &'a WeatherSnapshot,
    pub scores: Option<&'a ScoreSet>,
    pub primary_slug: Option<&'a str>,
    pub policy: &'a TipPolicy,
}

impl<'a> TipContext<'a> {
    fn primary(&self) -> Option<&'a ActivityScore> {
        matcher::find(self.scores?, self.primary_slug?)
    }

    fn top(&self) -> Option<&'a ActivityScore> {
        self.scores?.scores.first()
    }

    /// Earliest step in the look-ahead window above the rain threshold.
    fn rain_step(&self) -> Option<(usize, f64)> {
        let hourly = self.weather.hourly.as_ref()?;
        (self.policy.rain_first_step..=self.policy.rain_last_step)
            .filter(|&step| step < hourly.precipitation_probabilities.len())
            .map(|step| (step, hourly.precipitation_at(step)))
            .find(|&(_, pct)| pct > self.policy.rain_threshold_pct)
    }
}

struct Rule {
    kind: TipKind,
    applies: fn(&TipContext<'_>) -> bool,
    build: fn(&TipContext<'_>) -> String,
}

fn windowed_primary<'a>(ctx: &TipContext<'a>) -> Option<(&'a ActivityScore, &'a str, &'a str)> {
    let primary = ctx.primary()?;
    let window = primary.best_window.as_ref()?;
    Some((primary, window.start.as_str(), window.end.as_str()))
}

fn rounded(score: f64) -> i64 {
    score.round() as i64
}

const RULES: &[Rule] = &[
    Rule {
        kind: TipKind::RainWarning,
        applies: |ctx| ctx.rain_step().is_some(),
        build: |ctx| {
            let (step, pct) = ctx.rain_step().unwrap_or_default();
            let hour = ctx
                .weather
                .hourly
                .as_ref()
                .and_then(|h| h.times.get(step))
                .map(|t| hour_label(t))
                .unwrap_or_else(|| format!("+{step}h"));
            format!(
                "Rain likely around {hour} ({}% chance). Head out early or plan something indoors.",
                rounded(pct)
            )
        },
    },
    Rule {
        kind: TipKind::GreatConditions,
        applies: |ctx| windowed_primary(ctx).is_some_and(|(p, _, _)| p.score >= 80.0),
        build: |ctx| match windowed_primary(ctx) {
            Some((p, start, end)) => {
                format!("Great conditions for {} between {start} and {end}.", p.name)
            }
            None => String::new(),
        },
    },
    Rule {
        kind: TipKind::DecentConditions,
        applies: |ctx| {
            windowed_primary(ctx).is_some_and(|(p, _, _)| (60.0..80.0).contains(&p.score))
        },
        build: |ctx| match windowed_primary(ctx) {
            Some((p, start, end)) => format!(
                "Decent conditions for {}. Your best window is {start} to {end}.",
                p.name
            ),
            None => String::new(),
        },
    },
    Rule {
        kind: TipKind::TryInstead,
        applies: |ctx| {
            ctx.primary().is_some_and(|p| p.score < 40.0)
                && ctx.top().is_some_and(|t| t.score >= 60.0)
        },
        build: |ctx| {
            let primary = ctx.primary().map(|p| p.name.as_str()).unwrap_or_default();
            match ctx.top() {
                Some(top) => format!(
                    "Not a great day for {primary}. Try {} instead ({}/100).",
                    top.name,
                    rounded(top.score)
                ),
                None => String::new(),
            }
        },
    },
    Rule {
        kind: TipKind::ToughConditions,
        applies: |ctx| ctx.primary().is_some_and(|p| p.score < 40.0),
        build: |_| "Tough conditions for outdoor activities today. Maybe a rest day.".to_string(),
    },
    Rule {
        kind: TipKind::PerfectDay,
        applies: |ctx| ctx.primary_slug.is_none() && ctx.top().is_some_and(|t| t.score >= 80.0),
        build: |ctx| match ctx.top() {
            Some(top) => format!("Perfect day for {}! Scoring {}/100.", top.name, rounded(top.score)),
            None => String::new(),
        },
    },
    Rule {
        kind: TipKind::HeatAdvisory,
        applies: |ctx| ctx.weather.current.temperature > 35.0,
        build: |_| "Heat advisory: stay hydrated and avoid the midday sun.".to_string(),
    },
    Rule {
        kind: TipKind::WindAdvisory,
        applies: |ctx| ctx.weather.current.wind_speed > 40.0,
        build: |_| "Strong winds today. Take care on exposed routes.".to_string(),
    },
    Rule {
        kind: TipKind::Moderate,
        applies: |_| true,
        build: |_| "Moderate conditions today. Check the activity scores for the best fit.".to_string(),
    },
];

/// Exactly one tip: the first rule that applies.
pub fn recommend(ctx: &TipContext<'_>) -> Tip {
    RULES
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .map(|rule| Tip {
            kind: rule.kind,
            text: (rule.build)(ctx),
        })
        .unwrap_or_else(|| Tip {
            kind: TipKind::Moderate,
            text: String::new(),
        })
}
