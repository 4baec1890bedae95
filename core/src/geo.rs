//! Geo deduplication cache.
//!
//! Every user gets a point jittered around their city anchor, rounded to
//! three decimals. No rounded pair may be handed out more than
//! `max_per_point` times over a whole run, so the cache lives in the run
//! context and is never reset between periods.

use crate::{
    config::GeoConfig,
    error::{GenError, GenResult},
    rng::StageRng,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Rounded coordinates in thousandths of a degree.
type GeoKey = (i32, i32);

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[derive(Debug, Default)]
pub struct GeoCache {
    config: GeoConfig,
    usage: HashMap<GeoKey, u32>,
}

impl GeoCache {
    pub fn new(config: GeoConfig) -> Self {
        Self {
            config,
            usage: HashMap::new(),
        }
    }

    /// Jitter, round, and claim a point with spare capacity.
    pub fn assign(&mut self, base_lat: f64, base_lon: f64, rng: &mut StageRng) -> GenResult<GeoPoint> {
        let j = self.config.jitter_degrees;
        for _ in 0..self.config.max_attempts {
            let lat = round3(base_lat + rng.uniform(-j, j)).clamp(-90.0, 90.0);
            let lon = round3(base_lon + rng.uniform(-j, j)).clamp(-180.0, 180.0);
            let key = ((lat * 1000.0).round() as i32, (lon * 1000.0).round() as i32);
            let used = self.usage.entry(key).or_insert(0);
            if *used < self.config.max_per_point {
                *used += 1;
                return Ok(GeoPoint { lat, lon });
            }
        }
        Err(GenError::GeoExhausted {
            lat: base_lat,
            lon: base_lon,
            attempts: self.config.max_attempts,
        })
    }

    pub fn usage(&self, point: GeoPoint) -> u32 {
        let key = ((point.lat * 1000.0).round() as i32, (point.lon * 1000.0).round() as i32);
        self.usage.get(&key).copied().unwrap_or(0)
    }

    pub fn max_usage(&self) -> u32 {
        self.usage.values().copied().max().unwrap_or(0)
    }

    pub fn distinct_points(&self) -> usize {
        self.usage.len()
    }
}
