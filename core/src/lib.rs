//! pulsegen-core: quota-constrained synthetic telemetry generation.
//!
//! A plan table of monthly targets goes in; a chronologically ordered
//! list of user events whose monthly aggregates land on those targets
//! comes out. See engine.rs for the per-period execution order.

pub mod activity_stage;
pub mod artifact;
pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod geo;
pub mod period;
pub mod reconciler;
pub mod report;
pub mod rng;
pub mod sampler;
pub mod signup_stage;
pub mod sink;
pub mod stage;
pub mod stats;
pub mod store;
pub mod ticket_stage;
pub mod tickets;
pub mod types;
pub mod volume_stage;
