//! Shared primitive types used across the generator.

use chrono::{DateTime, Utc};

/// A stable, unique identifier for a synthetic user.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Every timestamp in the generator is a UTC instant.
pub type Instant = DateTime<Utc>;

/// Zero-based position of a period within the plan table.
pub type PeriodIndex = u64;
