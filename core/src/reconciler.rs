//! Two-phase target reconciliation.
//!
//! Phase 1 lives in the stages: they generate a population whose total
//! is only roughly right. Phase 2 lives here: one pass that nudges the
//! total into `[target * floor, target * ceiling]`.
//!
//! The routine is generic over the item type. Callers pass a getter and a
//! setter for the magnitude, and the setter is free to recompute derived
//! fields (word counts from bytes, for instance).

use crate::rng::StageRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileBand {
    /// Lower acceptance bound, as a multiple of the target.
    pub floor: f64,
    /// Upper acceptance bound; above this the population is scaled down.
    pub ceiling: f64,
    /// A boosted total lands uniformly in `[boost_low, boost_high] * target`.
    pub boost_low: f64,
    pub boost_high: f64,
    /// A scaled-down total aims for `scale_to * target`.
    pub scale_to: f64,
}

impl Default for ReconcileBand {
    fn default() -> Self {
        Self {
            floor: 1.0,
            ceiling: 1.2,
            boost_low: 1.10,
            boost_high: 1.15,
            scale_to: 1.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Nothing to do: already inside the band, or no target at all.
    InBand { sum: f64 },
    Boosted { before: f64, after: f64 },
    Scaled { before: f64, after: f64, factor: f64 },
    /// Nothing to adjust, so the target could not be reached.
    Shortfall { sum: f64 },
    /// Magnitude floors kept the total above the ceiling.
    Overshoot { before: f64, after: f64 },
}

impl ReconcileOutcome {
    pub fn final_sum(&self) -> f64 {
        match *self {
            Self::InBand { sum } | Self::Shortfall { sum } => sum,
            Self::Boosted { after, .. } | Self::Scaled { after, .. } | Self::Overshoot { after, .. } => after,
        }
    }

    /// Shortfall and overshoot are data-consistency warnings, not errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Shortfall { .. } | Self::Overshoot { .. })
    }
}

/// Extra rescale passes when magnitude floors push a scaled total back
/// over the ceiling.
const MAX_RESCALE_PASSES: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    pub band: ReconcileBand,
    pub min_magnitude: f64,
}

impl Reconciler {
    pub fn new(band: ReconcileBand, min_magnitude: f64) -> Self {
        Self { band, min_magnitude }
    }

    pub fn reconcile<T>(
        &self,
        items: &mut [T],
        target: f64,
        rng: &mut StageRng,
        get: impl Fn(&T) -> f64,
        mut set: impl FnMut(&mut T, f64),
    ) -> ReconcileOutcome {
        let sum: f64 = items.iter().map(&get).sum();
        if target <= 0.0 {
            return ReconcileOutcome::InBand { sum };
        }
        if items.is_empty() {
            return ReconcileOutcome::Shortfall { sum };
        }

        let low = target * self.band.floor;
        let high = target * self.band.ceiling;

        if sum < low {
            let goal = target * rng.uniform(self.band.boost_low, self.band.boost_high);
            self.boost(items, goal - sum, rng, &get, &mut set);
            let after: f64 = items.iter().map(&get).sum();
            return ReconcileOutcome::Boosted { before: sum, after };
        }

        if sum > high {
            let goal = target * self.band.scale_to;
            let factor = goal / sum;
            for item in items.iter_mut() {
                let v = (get(&*item) * factor).max(self.min_magnitude);
                set(item, v);
            }
            let mut after: f64 = items.iter().map(&get).sum();
            for _ in 0..MAX_RESCALE_PASSES {
                if after <= high {
                    break;
                }
                after = self.rescale_unfloored(items, goal, &get, &mut set);
            }
            if after > high {
                return ReconcileOutcome::Overshoot { before: sum, after };
            }
            return ReconcileOutcome::Scaled { before: sum, after, factor };
        }

        ReconcileOutcome::InBand { sum }
    }

    /// Hand out `extra` in random shares around the even split. The last
    /// item touched absorbs whatever is left; once nothing is left the
    /// walk stops early.
    fn boost<T>(
        &self,
        items: &mut [T],
        extra: f64,
        rng: &mut StageRng,
        get: &impl Fn(&T) -> f64,
        set: &mut impl FnMut(&mut T, f64),
    ) {
        let n = items.len();
        let even = extra / n as f64;
        let mut remaining = extra;
        for (i, item) in items.iter_mut().enumerate() {
            if remaining <= 0.0 {
                break;
            }
            let share = if i + 1 == n {
                remaining
            } else {
                (even * rng.uniform(0.5, 1.5)).min(remaining)
            };
            let v = get(&*item) + share;
            set(item, v);
            remaining -= share;
        }
    }

    /// Shrink only the items still above the floor so the total aims at
    /// `goal` again. Returns the new total.
    fn rescale_unfloored<T>(
        &self,
        items: &mut [T],
        goal: f64,
        get: &impl Fn(&T) -> f64,
        set: &mut impl FnMut(&mut T, f64),
    ) -> f64 {
        let floor = self.min_magnitude;
        let (pinned, free): (f64, f64) = items.iter().map(get).fold((0.0, 0.0), |(p, f), v| {
            if v <= floor {
                (p + v, f)
            } else {
                (p, f + v)
            }
        });
        let want = goal - pinned;
        if want > 0.0 && free > 0.0 {
            let factor = want / free;
            for item in items.iter_mut() {
                let v = get(&*item);
                if v > floor {
                    set(item, (v * factor).max(floor));
                }
            }
        }
        items.iter().map(get).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(values: &mut [f64], target: f64, seed: u64) -> ReconcileOutcome {
        let mut rng = StageRng::from_seed(seed);
        Reconciler::new(ReconcileBand::default(), 1.0).reconcile(
            values,
            target,
            &mut rng,
            |v| *v,
            |v, x| *v = x,
        )
    }

    #[test]
    fn boosts_short_population_into_band() {
        let mut values = vec![10.0; 50];
        let out = run(&mut values, 1_000.0, 1);
        let sum: f64 = values.iter().sum();
        assert!(matches!(out, ReconcileOutcome::Boosted { .. }));
        assert!((1_100.0 - 1e-6..=1_150.0 + 1e-6).contains(&sum), "sum={sum}");
    }

    #[test]
    fn scales_bloated_population_to_buffer() {
        let mut values = vec![100.0; 50];
        let out = run(&mut values, 1_000.0, 2);
        let sum: f64 = values.iter().sum();
        assert!(matches!(out, ReconcileOutcome::Scaled { .. }));
        assert!((sum - 1_150.0).abs() < 1e-6, "sum={sum}");
    }

    #[test]
    fn leaves_in_band_population_alone() {
        let mut values = vec![22.0; 50];
        let before = values.clone();
        let out = run(&mut values, 1_000.0, 3);
        assert_eq!(out, ReconcileOutcome::InBand { sum: 1_100.0 });
        assert_eq!(values, before);
    }

    #[test]
    fn empty_population_is_a_shortfall() {
        let mut values: Vec<f64> = vec![];
        assert!(run(&mut values, 1_000.0, 4).is_warning());
    }

    #[test]
    fn floors_that_cannot_fit_report_overshoot() {
        // 100 items with a floor of 50 can never total less than 5000.
        let mut values = vec![500.0; 100];
        let mut rng = StageRng::from_seed(5);
        let out = Reconciler::new(ReconcileBand::default(), 50.0).reconcile(
            &mut values,
            1_000.0,
            &mut rng,
            |v| *v,
            |v, x| *v = x,
        );
        assert!(matches!(out, ReconcileOutcome::Overshoot { .. }));
        assert!(values.iter().all(|v| *v >= 50.0));
    }
}
