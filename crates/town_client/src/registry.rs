//! Live controllers for every poster session area the client knows about.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use shared::{
    domain::{InteractableId, PosterSessionAreaModel},
    protocol::ServerEvent,
};
use tracing::debug;

use crate::poster_session_area_controller::PosterSessionAreaController;

#[derive(Default)]
pub struct PosterSessionAreaRegistry {
    areas: RwLock<HashMap<InteractableId, Arc<PosterSessionAreaController>>>,
}

impl PosterSessionAreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model`, or refreshes the existing controller with the same id.
    pub fn insert(&self, model: PosterSessionAreaModel) -> Arc<PosterSessionAreaController> {
        let mut areas = self.areas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = areas.get(&model.id) {
            let existing = Arc::clone(existing);
            drop(areas);
            existing.update_from(&model);
            return existing;
        }

        let controller = Arc::new(PosterSessionAreaController::new(model));
        areas.insert(controller.id().clone(), Arc::clone(&controller));
        controller
    }

    pub fn get(&self, id: &InteractableId) -> Option<Arc<PosterSessionAreaController>> {
        self.areas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn ids(&self) -> Vec<InteractableId> {
        let mut ids: Vec<_> = self
            .areas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn apply_server_event(&self, event: &ServerEvent) {
        match event {
            ServerEvent::InteractableUpdated { area } => {
                debug!(area_id = %area.id, stars = area.stars, "applying poster area update");
                self.insert(area.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
