//! Joins activity scores against the activities an entity cares about.

use std::{cmp::Ordering, collections::BTreeSet};

use crate::model::{ActivityScore, ScoreSet};

/// Entries whose slug is in `candidates`, in the set's original order.
pub fn match_scores<'a>(set: &'a ScoreSet, candidates: &BTreeSet<String>) -> Vec<&'a ActivityScore> {
    set.scores
        .iter()
        .filter(|score| candidates.contains(&score.slug))
        .collect()
}

/// Highest-scoring match; on a tie the earlier entry wins.
pub fn best<'a>(set: &'a ScoreSet, candidates: &BTreeSet<String>) -> Option<&'a ActivityScore> {
    match_scores(set, candidates)
        .into_iter()
        .fold(None, |best: Option<&ActivityScore>, score| match best {
            Some(current) if current.score >= score.score => Some(current),
            _ => Some(score),
        })
}

/// Entry for a single activity, if the set scored it.
pub fn find<'a>(set: &'a ScoreSet, slug: &str) -> Option<&'a ActivityScore> {
    set.scores.iter().find(|score| score.slug == slug)
}

/// First `n` entries; the backend already ranks the set.
pub fn top_n(set: &ScoreSet, n: usize) -> &[ActivityScore] {
    &set.scores[..n.min(set.scores.len())]
}

/// Matches sorted best-first for spot display. Stable, so equal scores keep input order.
pub fn ranked_matches<'a>(set: &'a ScoreSet, candidates: &BTreeSet<String>) -> Vec<&'a ActivityScore> {
    let mut matches = match_scores(set, candidates);
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches
}

/// Colour band used for map markers, sheet dots and weekly dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Great,
    Ok,
    Low,
}

impl ScoreTier {
    pub fn of(score: f64) -> Self {
        if score >= 70.0 {
            ScoreTier::Great
        } else if score >= 50.0 {
            ScoreTier::Ok
        } else {
            ScoreTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Great => "great",
            ScoreTier::Ok => "ok",
            ScoreTier::Low => "low",
        }
    }
}
