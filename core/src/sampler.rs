//! Region quota sampling and plain weighted draws.
//!
//! RULE: Region picks decrement a quota. The quotas are integers fixed
//! up front, so a period's signups split across regions exactly rather
//! than approximately.

use crate::{config::RegionWeight, rng::StageRng};

#[derive(Debug, Clone)]
pub struct QuotaSampler {
    buckets: Vec<(String, u32)>,
    fallback_picks: u32,
}

impl QuotaSampler {
    /// Split `total` across `weights` in declared order. Every bucket but
    /// the last gets `round(share * total)`, clamped to what is left; the
    /// last bucket takes the exact remainder.
    pub fn from_weights(weights: &[RegionWeight], total: u32) -> Self {
        let sum: f64 = weights.iter().map(|w| w.weight).sum();
        let mut remaining = total;
        let mut buckets = Vec::with_capacity(weights.len());
        for (i, w) in weights.iter().enumerate() {
            let quota = if i + 1 == weights.len() {
                remaining
            } else if sum > 0.0 {
                ((w.weight / sum * total as f64).round() as u32).min(remaining)
            } else {
                0
            };
            remaining -= quota;
            buckets.push((w.region.clone(), quota));
        }
        Self { buckets, fallback_picks: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.buckets.iter().map(|(_, q)| q).sum()
    }

    pub fn quota(&self, label: &str) -> Option<u32> {
        self.buckets.iter().find(|(l, _)| l == label).map(|(_, q)| *q)
    }

    /// How many picks fell through to the fallback bucket.
    pub fn fallback_picks(&self) -> u32 {
        self.fallback_picks
    }

    /// Roll in `[0, remaining)`, walk buckets in declared order and take
    /// one unit from the bucket the roll lands in.
    pub fn pick(&mut self, rng: &mut StageRng) -> Option<&str> {
        let total = self.remaining();
        if total == 0 {
            // Quotas are exhausted but a pick was still requested.
            self.fallback_picks += 1;
            let label = self.buckets.last().map(|(l, _)| l.as_str());
            log::warn!("quota sampler exhausted, falling back to {label:?}");
            return label;
        }
        let mut roll = rng.next_u64_below(total as u64) as u32;
        let mut chosen = self.buckets.len() - 1;
        for (i, (_, quota)) in self.buckets.iter().enumerate() {
            if roll < *quota {
                chosen = i;
                break;
            }
            roll -= *quota;
        }
        let bucket = &mut self.buckets[chosen];
        bucket.1 -= 1;
        Some(bucket.0.as_str())
    }
}

/// Cumulative-weight draw without decrement. Falls back to the last item
/// when rounding leaves the roll past the final edge.
pub fn weighted_pick<'a, T>(items: &'a [T], weight: impl Fn(&T) -> f64, rng: &mut StageRng) -> &'a T {
    assert!(!items.is_empty(), "weighted_pick on empty slice");
    let total: f64 = items.iter().map(&weight).sum();
    let roll = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for item in items {
        cumulative += weight(item);
        if roll < cumulative {
            return item;
        }
    }
    &items[items.len() - 1]
}
