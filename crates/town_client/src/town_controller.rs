//! Seam to the session-wide town controller, plus an in-process implementation.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{InteractableId, PosterSessionAreaModel},
    error::ApiException,
    protocol::ServerEvent,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    poster_session_area_controller::PosterSessionAreaController,
    registry::PosterSessionAreaRegistry,
};

#[derive(Debug, Error)]
pub enum TownControllerError {
    #[error("{0}")]
    Rejected(#[from] ApiException),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl TownControllerError {
    /// Whether the error carries a message meant for the user.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }
}

#[async_trait]
pub trait TownController: Send + Sync {
    fn pause(&self);
    fn un_pause(&self);
    async fn create_poster_session_area(
        &self,
        request: PosterSessionAreaModel,
    ) -> Result<(), TownControllerError>;
    fn poster_session_area_controller(
        &self,
        id: &InteractableId,
    ) -> Option<Arc<PosterSessionAreaController>>;
}

/// Keeps the town simulation paused for as long as the guard is alive.
#[must_use = "dropping the guard resumes the simulation immediately"]
pub struct SimulationPause {
    town: Arc<dyn TownController>,
}

impl SimulationPause {
    pub fn acquire(town: Arc<dyn TownController>) -> Self {
        town.pause();
        Self { town }
    }

    pub fn release(self) {}
}

impl Drop for SimulationPause {
    fn drop(&mut self) {
        self.town.un_pause();
    }
}

/// Town controller that accepts poster requests in process and applies them
/// to its own registry, as the server would echo them back.
///
/// Pauses nest: the town stays paused until every `pause` has been matched by
/// an `un_pause`.
pub struct LocalTownController {
    pauses: AtomicUsize,
    areas: PosterSessionAreaRegistry,
    events: broadcast::Sender<ServerEvent>,
}

impl Default for LocalTownController {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            pauses: AtomicUsize::new(0),
            areas: PosterSessionAreaRegistry::new(),
            events,
        }
    }
}

impl LocalTownController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn areas(&self) -> &PosterSessionAreaRegistry {
        &self.areas
    }

    pub fn is_paused(&self) -> bool {
        self.pauses.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl TownController for LocalTownController {
    fn pause(&self) {
        if self.pauses.fetch_add(1, Ordering::SeqCst) == 0 {
            info!("town simulation paused");
        }
    }

    fn un_pause(&self) {
        let previous = self
            .pauses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            info!("town simulation resumed");
        }
    }

    async fn create_poster_session_area(
        &self,
        request: PosterSessionAreaModel,
    ) -> Result<(), TownControllerError> {
        if self.areas.get(&request.id).is_none() {
            return Err(ApiException::not_found(format!(
                "unknown poster session area {}",
                request.id
            ))
            .into());
        }
        if request.title.is_empty() {
            return Err(ApiException::validation("poster title must not be empty").into());
        }
        if request.image_contents.is_empty() {
            return Err(ApiException::validation("poster image must not be empty").into());
        }

        let event = ServerEvent::InteractableUpdated { area: request };
        self.areas.apply_server_event(&event);
        if self.events.send(event).is_err() {
            debug!("no subscribers for poster area update");
        }
        Ok(())
    }

    fn poster_session_area_controller(
        &self,
        id: &InteractableId,
    ) -> Option<Arc<PosterSessionAreaController>> {
        self.areas.get(id)
    }
}

#[cfg(test)]
#[path = "tests/town_controller_tests.rs"]
mod tests;
