//! Run-wide generation state.
//!
//! RULE: everything that outlives a single period lives here and is
//! passed `&mut` into each stage. There is no process-wide state, so two
//! engines in one process never see each other.

use crate::{
    catalog::Catalog,
    config::GeneratorConfig,
    entity::EntityPool,
    geo::GeoCache,
    period::Period,
    stats::PeriodAccumulator,
    tickets::TicketLedger,
};

pub struct RunContext {
    pub catalog: Catalog,
    pub generator: GeneratorConfig,
    pub pool: EntityPool,
    pub geo: GeoCache,
    pub tickets: TicketLedger,
    /// Totals for the period currently being generated.
    pub period: PeriodAccumulator,
}

impl RunContext {
    pub fn new(catalog: Catalog, generator: GeneratorConfig, first: Period) -> Self {
        Self {
            geo: GeoCache::new(generator.geo.clone()),
            catalog,
            generator,
            pool: EntityPool::new(),
            tickets: TicketLedger::new(),
            period: PeriodAccumulator::new(first),
        }
    }
}
