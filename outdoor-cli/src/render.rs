//! Plain-text rendering of the core view models.

use outdoor_core::{
    clock::LocalClock,
    explore::{SheetScores, SpotSheet, SpotsView},
    model::{ActivityScore, Place},
    series::BarGeometry,
    view::{ActivityPanel, ViewModel},
};

/// Character width of a forecast bar track.
pub const BAR_WIDTH: usize = 30;

/// Draw `bar` on a track of `width` cells: spaces outside the day's range,
/// `=` inside it.
pub fn ascii_bar(bar: &BarGeometry, width: usize) -> String {
    let cells = |pct: f64| ((pct / 100.0) * width as f64).round() as usize;
    let start = cells(bar.offset_pct).min(width.saturating_sub(1));
    let end = cells(bar.offset_pct + bar.width_pct).clamp(start, width);
    let filled = if end == start && bar.width_pct > 0.0 && start < width {
        1
    } else {
        end - start
    };

    format!(
        "[{}{}{}]",
        " ".repeat(start),
        "=".repeat(filled),
        " ".repeat(width - start - filled)
    )
}

pub fn places(places: &[Place]) -> String {
    places
        .iter()
        .enumerate()
        .map(|(i, place)| format!("{:>2}. {} ({})", i + 1, place.name, place.detail()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn place_label(place: &Place) -> String {
    format!("{}, {}", place.name, place.detail())
}

pub fn location(view: &ViewModel, clock: Option<LocalClock>) -> String {
    let mut lines = Vec::new();
    let hero = &view.hero;

    let place = if hero.country.is_empty() {
        hero.city.clone()
    } else {
        format!("{}, {}", hero.city, hero.country)
    };
    lines.push(place);
    if let Some(clock) = clock {
        lines.push(format!("{} · {}", clock.time, clock.date));
    }
    lines.push(format!(
        "{} {}{} {}{}",
        hero.icon,
        hero.temperature,
        hero.temperature_unit,
        hero.condition,
        if hero.is_night { " (night)" } else { "" }
    ));

    let d = &view.details;
    lines.push(String::new());
    lines.push(format!("Feels like  {}{}", d.feels_like, hero.temperature_unit));
    lines.push(format!("Humidity    {}%", d.humidity_pct));
    lines.push(format!("Wind        {} {} {}", d.wind_speed, d.speed_unit, d.wind_direction));
    lines.push(format!("Pressure    {} hPa", d.pressure_hpa));
    if let Some(uv) = &d.uv {
        lines.push(format!("UV index    {} ({})", uv.value, uv.label));
    }
    if let Some(max_wind) = d.max_wind {
        lines.push(format!("Max wind    {} {}", max_wind, d.speed_unit));
    }
    lines.push(format!("Sun         {} - {}", d.sunrise, d.sunset));

    if !view.hourly.is_empty() {
        lines.push(String::new());
        lines.push("Hourly".to_string());
        for entry in &view.hourly {
            let rain = entry
                .precipitation_pct
                .map(|p| format!("  {p}%"))
                .unwrap_or_default();
            lines.push(format!(
                "  {:<5} {} {:>4}{}",
                entry.label, entry.icon, entry.temperature, rain
            ));
        }
    }

    if !view.forecast.is_empty() {
        lines.push(String::new());
        lines.push("Forecast".to_string());
        for row in &view.forecast {
            let rain = row
                .precipitation_pct
                .map(|p| format!("{p}%"))
                .unwrap_or_default();
            lines.push(format!(
                "  {:<5} {} {:<20} {:>4} {:>4} {} {:>4}",
                row.day,
                row.icon,
                row.description,
                rain,
                row.low,
                ascii_bar(&row.bar, BAR_WIDTH),
                row.high
            ));
        }
    }

    if let Some(panel) = &view.activities {
        lines.push(String::new());
        lines.extend(activities(panel));
    }

    lines.push(String::new());
    lines.push(format!("Tip: {}", view.tip.text));
    lines.join("\n")
}

fn score_line(score: &ActivityScore) -> String {
    let window = score
        .best_window
        .as_ref()
        .map(|w| format!("  best {}-{}", w.start, w.end))
        .unwrap_or_default();
    let label = if score.label.is_empty() {
        String::new()
    } else {
        format!(" {}", score.label)
    };
    format!("{:<14} {:>3}/100{}{}", score.name, score.score.round() as i64, label, window)
}

fn activities(panel: &ActivityPanel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(primary) = &panel.primary {
        lines.push(format!("Your activity: {}", score_line(primary)));
    }
    if !panel.top.is_empty() {
        lines.push("Top activities".to_string());
        lines.extend(panel.top.iter().map(|s| format!("  {}", score_line(s))));
    }
    if !panel.weekly.is_empty() {
        let dots: Vec<_> = panel
            .weekly
            .iter()
            .map(|dot| format!("{} {} ({})", dot.day, dot.score, dot.tier.as_str()))
            .collect();
        lines.push(format!("This week: {}", dots.join(" · ")));
    }
    lines
}

pub fn spots(view: &SpotsView) -> String {
    let (lat, lon) = view.center;
    let mut lines = vec![format!("{} spots near {lat:.4}, {lon:.4}", view.markers.len())];
    if view.scores.is_none() {
        lines.push("(scores unavailable)".to_string());
    }
    for (i, marker) in view.markers.iter().enumerate() {
        lines.push(format!(
            "{:>2}. {:<28} {:>3} {:<5} {}",
            i + 1,
            marker.spot.name,
            marker.score.round() as i64,
            marker.tier.as_str(),
            marker.spot.category
        ));
    }
    lines.join("\n")
}

pub fn sheet(sheet: &SpotSheet) -> String {
    let mut lines = vec![format!("{} ({})", sheet.name, sheet.category)];
    match &sheet.scores {
        SheetScores::Matches(rows) => {
            for row in rows {
                let fill = (row.fill_pct / 10.0).round() as usize;
                let window = row
                    .window
                    .as_ref()
                    .map(|w| format!("  {}-{}", w.start, w.end))
                    .unwrap_or_default();
                lines.push(format!(
                    "  {:<5} {:<14} {:>3} [{:<10}]{}",
                    row.tier.as_str(),
                    row.name,
                    row.score,
                    "#".repeat(fill.min(10)),
                    window
                ));
            }
        }
        other => lines.push(format!("  {}", other.message().unwrap_or_default())),
    }
    lines.push(format!("Directions: {}", sheet.directions_url));
    lines.join("\n")
}
