//! Loyalty progression: where a stamp count sits on a business's prize ladder.

use std::collections::BTreeMap;

use crate::models::Prize;

/// Step used when a business has no prizes configured.
pub const DEFAULT_STAMP_STEP: i64 = 15;

/// Previous and next prize thresholds for a stamp count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
    pub stamps_last_prize: i64,
    pub stamps_next_prize: i64,
    pub next_prize_name: Option<String>,
}

/// Ascending, deduplicated prize thresholds with the prize name for each.
#[derive(Debug, Clone, Default)]
pub struct PrizeLadder {
    rungs: BTreeMap<i64, String>,
}

impl PrizeLadder {
    /// Builds a ladder from `(points_required, name)` pairs.
    ///
    /// Non-positive thresholds are ignored. When two prizes share a
    /// threshold the first one seen keeps the name.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let mut rungs = BTreeMap::new();
        for (points, name) in entries {
            if points > 0 {
                rungs.entry(points).or_insert_with(|| name.into());
            }
        }
        Self { rungs }
    }

    pub fn from_catalog(prizes: &[Prize]) -> Self {
        Self::new(
            prizes
                .iter()
                .map(|p| (i64::from(p.points_required), p.name.as_str())),
        )
    }

    pub fn thresholds(&self) -> Vec<i64> {
        self.rungs.keys().copied().collect()
    }

    fn name_for(&self, threshold: i64) -> Option<String> {
        self.rungs.get(&threshold).cloned()
    }

    /// Computes progression for `stamps` (negative counts are treated as 0).
    ///
    /// Reaching a threshold exactly counts it as the last prize, never the next.
    pub fn progress(&self, stamps: i64) -> Progression {
        let stamps = stamps.max(0);

        let (first, max) = match (
            self.rungs.keys().next().copied(),
            self.rungs.keys().next_back().copied(),
        ) {
            (Some(first), Some(max)) => (first, max),
            _ => {
                let (last, next) = repeating_step(stamps, DEFAULT_STAMP_STEP);
                return Progression {
                    stamps_last_prize: last,
                    stamps_next_prize: next,
                    next_prize_name: None,
                };
            }
        };

        if self.rungs.len() == 1 {
            let (last, next) = repeating_step(stamps, first);
            return Progression {
                stamps_last_prize: last,
                stamps_next_prize: next,
                next_prize_name: self.name_for(first),
            };
        }

        let (last, next) = if stamps <= max {
            let last = self
                .rungs
                .range(..=stamps)
                .next_back()
                .map(|(t, _)| *t)
                .unwrap_or(0);
            let next = self
                .rungs
                .range(stamps + 1..)
                .next()
                .map(|(t, _)| *t)
                .unwrap_or(last + first);
            (last, next)
        } else {
            // Past the top prize the cheapest prize repeats
            repeating_step(stamps, first)
        };

        Progression {
            stamps_last_prize: last,
            stamps_next_prize: next,
            next_prize_name: self.name_for(next).or_else(|| self.name_for(first)),
        }
    }
}

fn repeating_step(stamps: i64, step: i64) -> (i64, i64) {
    let last = (stamps / step) * step;
    (last, last + step)
}
