use crate::{
    catalog::Catalog,
    error::{GenError, GenResult},
    period::Period,
};
use serde::{Deserialize, Serialize};

// ── Plan table ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionWeight {
    pub region: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelWeight {
    pub channel: String,
    pub weight: f64,
}

/// Inclusive `[low, high]` bounds for one day's active-user draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActiveRange(pub u32, pub u32);

impl DailyActiveRange {
    /// The default band sits at or below the nominal target:
    /// `[floor(0.6 * target), target]`.
    pub fn from_target(target: u32) -> Self {
        Self((target as f64 * 0.6).floor() as u32, target)
    }

    pub fn low(&self) -> u32 {
        self.0
    }

    pub fn high(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTarget {
    pub period: Period,
    pub signup_count: u32,
    #[serde(default)]
    pub daily_active_target: Option<u32>,
    #[serde(default)]
    pub daily_active_range: Option<DailyActiveRange>,
    #[serde(default)]
    pub monthly_active_target: u32,
    #[serde(default)]
    pub volume_target_bytes: Option<f64>,
    pub region_weights: Vec<RegionWeight>,
    #[serde(default)]
    pub channel_weights: Vec<ChannelWeight>,
    #[serde(default)]
    pub tickets_raised: u32,
    #[serde(default)]
    pub tickets_resolved: u32,
}

impl PeriodTarget {
    /// Explicit range wins; otherwise derived from the daily target.
    pub fn daily_active(&self) -> Option<DailyActiveRange> {
        self.daily_active_range
            .or_else(|| self.daily_active_target.map(DailyActiveRange::from_target))
    }
}

// ── Generator tuning ───────────────────────────────────────────────

/// Empirically tuned constants. None of these are semantic invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub bytes_per_word: f64,
    pub events_per_user_per_day: f64,
    pub heavy_job_probability: f64,
    pub heavy_job_multiplier: (f64, f64),
    pub min_job_bytes: f64,
    pub failure_probability: f64,
    pub download_probability: f64,
    pub failure_delay_secs: i64,
    pub download_delay_secs: i64,
    pub login_probability: f64,
    pub login_lead_secs: i64,
    pub geo: GeoConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bytes_per_word: 6.2,
            events_per_user_per_day: 0.35,
            heavy_job_probability: 0.10,
            heavy_job_multiplier: (2.0, 8.0),
            min_job_bytes: 64.0,
            failure_probability: 0.03,
            download_probability: 0.55,
            failure_delay_secs: 3_600,
            download_delay_secs: 86_400,
            login_probability: 0.4,
            login_lead_secs: 1_800,
            geo: GeoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub jitter_degrees: f64,
    pub max_per_point: u32,
    pub max_attempts: u32,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            jitter_degrees: 0.02,
            max_per_point: 3,
            max_attempts: 10_000,
        }
    }
}

// ── Whole plan ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct PlanFile {
    periods: Vec<PeriodTarget>,
    #[serde(default)]
    generator: GeneratorConfig,
}

#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub periods: Vec<PeriodTarget>,
    pub generator: GeneratorConfig,
}

impl PlanConfig {
    /// Load and validate a plan file.
    /// In tests, use PlanConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: PlanFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        let plan = Self {
            periods: file.periods,
            generator: file.generator,
        };
        plan.validate(&Catalog::builtin())?;
        Ok(plan)
    }

    pub fn validate(&self, catalog: &Catalog) -> GenResult<()> {
        if self.periods.is_empty() {
            return Err(GenError::Config("plan has no periods".into()));
        }
        for pair in self.periods.windows(2) {
            if pair[1].period <= pair[0].period {
                return Err(GenError::Config(format!(
                    "periods out of order: {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }
        for target in &self.periods {
            let p = target.period;
            if target.signup_count > 0 && target.region_weights.is_empty() {
                return Err(GenError::Config(format!("{p}: signups need region weights")));
            }
            for rw in &target.region_weights {
                if catalog.region(&rw.region).is_none() {
                    return Err(GenError::Config(format!(
                        "{p}: unknown region '{}'",
                        rw.region
                    )));
                }
            }
            check_weights(p, "region", target.region_weights.iter().map(|w| w.weight))?;
            check_weights(p, "channel", target.channel_weights.iter().map(|w| w.weight))?;
            if let Some(range) = target.daily_active() {
                if range.low() > range.high() {
                    return Err(GenError::Config(format!(
                        "{p}: daily active range [{}, {}] is inverted",
                        range.low(),
                        range.high()
                    )));
                }
            }
            if let Some(bytes) = target.volume_target_bytes {
                if !(bytes.is_finite() && bytes >= 0.0) {
                    return Err(GenError::Config(format!("{p}: bad volume target {bytes}")));
                }
            }
        }
        let geo = &self.generator.geo;
        if geo.max_per_point == 0 || geo.max_attempts == 0 {
            return Err(GenError::Config("geo caps must be positive".into()));
        }
        if self.generator.bytes_per_word <= 0.0 {
            return Err(GenError::Config("bytes_per_word must be positive".into()));
        }
        Ok(())
    }

    /// Three small months with every stage enabled.
    pub fn default_test() -> Self {
        let regions = vec![
            RegionWeight { region: "IN".into(), weight: 0.6 },
            RegionWeight { region: "US".into(), weight: 0.3 },
            RegionWeight { region: "EU".into(), weight: 0.1 },
        ];
        let channels = vec![
            ChannelWeight { channel: "organic".into(), weight: 0.5 },
            ChannelWeight { channel: "referral".into(), weight: 0.3 },
            ChannelWeight { channel: "paid_social".into(), weight: 0.2 },
        ];
        let month = |m: u32, signups: u32, dau: u32, mau: u32, bytes: f64, raised: u32, resolved: u32| {
            PeriodTarget {
                period: Period::new(2024, m).expect("static test period"),
                signup_count: signups,
                daily_active_target: Some(dau),
                daily_active_range: None,
                monthly_active_target: mau,
                volume_target_bytes: Some(bytes),
                region_weights: regions.clone(),
                channel_weights: channels.clone(),
                tickets_raised: raised,
                tickets_resolved: resolved,
            }
        };
        Self {
            periods: vec![
                month(1, 45, 12, 40, 2_000_000.0, 6, 3),
                month(2, 60, 30, 90, 5_000_000.0, 8, 6),
                month(3, 80, 50, 150, 9_000_000.0, 10, 12),
            ],
            generator: GeneratorConfig::default(),
        }
    }
}

fn check_weights(p: Period, what: &str, weights: impl Iterator<Item = f64>) -> GenResult<()> {
    let mut total = 0.0;
    let mut any = false;
    for w in weights {
        any = true;
        if !(w.is_finite() && w >= 0.0) {
            return Err(GenError::Config(format!("{p}: negative {what} weight {w}")));
        }
        total += w;
    }
    if any && total <= 0.0 {
        return Err(GenError::Config(format!("{p}: {what} weights sum to zero")));
    }
    Ok(())
}

// ── Ingestion endpoint ─────────────────────────────────────────────

pub const DEFAULT_INGEST_URL: &str = "https://api.mixpanel.com/import";
pub const DEFAULT_BATCH_SIZE: usize = 2_000;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub url: String,
    pub api_secret: String,
    pub batch_size: usize,
}

impl IngestConfig {
    /// Read from `PULSEGEN_INGEST_URL`, `PULSEGEN_API_SECRET` and
    /// `PULSEGEN_BATCH_SIZE`. The secret is required.
    pub fn from_env() -> GenResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GenResult<Self> {
        let api_secret = lookup("PULSEGEN_API_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| GenError::Config("PULSEGEN_API_SECRET is not set".into()))?;
        let url = lookup("PULSEGEN_INGEST_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INGEST_URL.to_string());
        let batch_size = match lookup("PULSEGEN_BATCH_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| GenError::Config(format!("bad PULSEGEN_BATCH_SIZE '{raw}'")))?,
            None => DEFAULT_BATCH_SIZE,
        };
        Ok(Self { url, api_secret, batch_size })
    }
}
