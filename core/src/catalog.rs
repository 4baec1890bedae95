//! Fixed attribute catalog: cities per region, device bundles, tiers.
//!
//! City weights inside a region double as the country distribution
//! (e.g. the EU region spreads across its member countries).

use crate::{rng::StageRng, sampler::weighted_pick};

#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct Region {
    pub code: &'static str,
    pub cities: Vec<City>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBundle {
    pub device: &'static str,
    pub os: &'static str,
    pub browser: &'static str,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    regions: Vec<Region>,
    devices: Vec<(DeviceBundle, f64)>,
    tiers: Vec<(&'static str, f64)>,
}

const fn city(name: &'static str, country: &'static str, lat: f64, lon: f64, weight: f64) -> City {
    City { name, country, lat, lon, weight }
}

const fn bundle(device: &'static str, os: &'static str, browser: &'static str) -> DeviceBundle {
    DeviceBundle { device, os, browser }
}

impl Catalog {
    pub fn builtin() -> Self {
        let regions = vec![
            Region {
                code: "IN",
                cities: vec![
                    city("Bengaluru", "IN", 12.972, 77.594, 0.26),
                    city("Mumbai", "IN", 19.076, 72.878, 0.20),
                    city("Delhi", "IN", 28.704, 77.102, 0.18),
                    city("Hyderabad", "IN", 17.385, 78.487, 0.14),
                    city("Pune", "IN", 18.520, 73.857, 0.12),
                    city("Chennai", "IN", 13.083, 80.271, 0.10),
                ],
            },
            Region {
                code: "US",
                cities: vec![
                    city("San Francisco", "US", 37.775, -122.419, 0.24),
                    city("New York", "US", 40.713, -74.006, 0.24),
                    city("Austin", "US", 30.267, -97.743, 0.16),
                    city("Seattle", "US", 47.606, -122.332, 0.14),
                    city("Chicago", "US", 41.878, -87.630, 0.12),
                    city("Boston", "US", 42.360, -71.059, 0.10),
                ],
            },
            Region {
                code: "EU",
                cities: vec![
                    city("Berlin", "DE", 52.520, 13.405, 0.22),
                    city("London", "GB", 51.507, -0.128, 0.22),
                    city("Paris", "FR", 48.857, 2.352, 0.18),
                    city("Amsterdam", "NL", 52.368, 4.904, 0.14),
                    city("Madrid", "ES", 40.417, -3.704, 0.12),
                    city("Stockholm", "SE", 59.329, 18.069, 0.12),
                ],
            },
            Region {
                code: "APAC",
                cities: vec![
                    city("Singapore", "SG", 1.352, 103.820, 0.35),
                    city("Sydney", "AU", -33.869, 151.209, 0.35),
                    city("Tokyo", "JP", 35.676, 139.650, 0.30),
                ],
            },
        ];
        let devices = vec![
            (bundle("desktop", "Windows", "Chrome"), 0.30),
            (bundle("desktop", "macOS", "Chrome"), 0.16),
            (bundle("desktop", "macOS", "Safari"), 0.10),
            (bundle("desktop", "Windows", "Edge"), 0.08),
            (bundle("desktop", "Linux", "Firefox"), 0.04),
            (bundle("mobile", "Android", "Chrome"), 0.20),
            (bundle("mobile", "iOS", "Safari"), 0.12),
        ];
        let tiers = vec![("free", 0.78), ("pro", 0.17), ("team", 0.05)];
        Self { regions, devices, tiers }
    }

    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.code == code)
    }

    pub fn pick_city<'a>(&self, region: &'a Region, rng: &mut StageRng) -> &'a City {
        weighted_pick(&region.cities, |c| c.weight, rng)
    }

    pub fn pick_device(&self, rng: &mut StageRng) -> DeviceBundle {
        weighted_pick(&self.devices, |(_, w)| *w, rng).0
    }

    pub fn pick_tier(&self, rng: &mut StageRng) -> &'static str {
        weighted_pick(&self.tiers, |(_, w)| *w, rng).0
    }
}
