/// Lowest low and highest high across a multi-day series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Width of the range; a flat range counts as 1 so geometry never divides by zero.
    pub fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 { 1.0 } else { span }
    }
}

/// Placement of one bar inside the global range, in percent of the track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarGeometry {
    pub offset_pct: f64,
    pub width_pct: f64,
}

/// Min of `mins` and max of `maxs`. `None` when both are empty.
pub fn global_range(mins: &[f64], maxs: &[f64]) -> Option<Range> {
    if mins.is_empty() && maxs.is_empty() {
        return None;
    }

    let min = mins.iter().copied().fold(f64::INFINITY, f64::min);
    let max = maxs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Range { min, max })
}

pub fn bar_geometry(low: f64, high: f64, range: Range) -> BarGeometry {
    let span = range.span();
    BarGeometry {
        offset_pct: (low - range.min) / span * 100.0,
        width_pct: (high - low) / span * 100.0,
    }
}
