//! Synthetic users and the append-only pool that owns them.

use crate::{
    geo::GeoPoint,
    types::{EntityId, Instant},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub user_id: EntityId,
    pub created_at: Instant,
    pub region: String,
    pub country: String,
    pub city: String,
    pub channel: String,
    pub device: String,
    pub os: String,
    pub browser: String,
    pub tier: String,
    pub paying: bool,
    pub geo: GeoPoint,
}

/// RULE: entities are only ever appended. Nothing is removed or edited,
/// so an index handed out once stays valid for the whole run.
#[derive(Debug, Default)]
pub struct EntityPool {
    entities: Vec<Entity>,
    by_id: HashMap<EntityId, usize>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) -> usize {
        let idx = self.entities.len();
        self.by_id.insert(entity.user_id.clone(), idx);
        self.entities.push(entity);
        idx
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Entity {
        &self.entities[idx]
    }

    pub fn by_id(&self, user_id: &str) -> Option<&Entity> {
        self.by_id.get(user_id).map(|&i| &self.entities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Indices of every entity created strictly before `cutoff`.
    /// Windows are half-open, so "eligible by the end of day D" means
    /// created before the first instant of D + 1.
    pub fn eligible_before(&self, cutoff: Instant) -> Vec<usize> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.created_at < cutoff)
            .map(|(i, _)| i)
            .collect()
    }
}
