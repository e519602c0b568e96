//! Interaction logic of the "create a poster" dialog.
//!
//! The modal owns a [`SimulationPause`] while it is open, collects a title and
//! an image, and submits them through the [`TownController`]. Every async
//! completion is checked against the epoch it started in, so results that
//! arrive after the modal was closed (or reopened) are dropped. File reads are
//! also numbered, and only the most recent selection may store its result.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::{InteractableId, PosterSessionAreaModel};
use tracing::{debug, error, info, warn};

use crate::{
    poster_file::read_file_as_base64,
    toast::{Toast, Toaster},
    town_controller::{SimulationPause, TownController, TownControllerError},
};

const CREATED_TITLE: &str = "Poster created!";
const REJECTED_TITLE: &str = "Unable to set given title and image";
const UNEXPECTED_TITLE: &str = "Unexpected Error";
const UNREADABLE_IMAGE_TITLE: &str = "Unable to read poster image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectPosterModalOptions {
    /// Close the dialog after the poster was created.
    pub close_on_success: bool,
}

impl Default for SelectPosterModalOptions {
    fn default() -> Self {
        Self {
            close_on_success: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Open,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSelection {
    Loaded,
    Cleared,
    Failed,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input incomplete or modal not ready; nothing was sent.
    Skipped,
    Created,
    Failed,
    /// The modal was closed before the request completed.
    Discarded,
}

struct ModalState {
    phase: ModalPhase,
    epoch: u64,
    selection: u64,
    pause: Option<SimulationPause>,
    title: String,
    image_contents: Option<String>,
}

pub struct SelectPosterModal {
    town: Arc<dyn TownController>,
    toaster: Arc<dyn Toaster>,
    area_id: InteractableId,
    options: SelectPosterModalOptions,
    on_close: Option<Box<dyn Fn() + Send + Sync>>,
    state: Mutex<ModalState>,
}

impl SelectPosterModal {
    pub fn new(
        town: Arc<dyn TownController>,
        toaster: Arc<dyn Toaster>,
        area_id: InteractableId,
        default_title: impl Into<String>,
        options: SelectPosterModalOptions,
    ) -> Self {
        Self {
            town,
            toaster,
            area_id,
            options,
            on_close: None,
            state: Mutex::new(ModalState {
                phase: ModalPhase::Closed,
                epoch: 0,
                selection: 0,
                pause: None,
                title: default_title.into(),
                image_contents: None,
            }),
        }
    }

    /// Callback run every time the modal transitions to closed.
    pub fn with_on_close(mut self, on_close: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(on_close));
        self
    }

    pub fn open(&self) {
        let mut state = self.state();
        if state.phase != ModalPhase::Closed {
            return;
        }
        state.epoch += 1;
        state.pause = Some(SimulationPause::acquire(Arc::clone(&self.town)));
        state.phase = ModalPhase::Open;
        debug!(area_id = %self.area_id, epoch = state.epoch, "poster modal opened");
    }

    pub fn close(&self) {
        let pause = {
            let mut state = self.state();
            if state.phase == ModalPhase::Closed {
                return;
            }
            state.phase = ModalPhase::Closed;
            state.epoch += 1;
            state.pause.take()
        };
        drop(pause);
        debug!(area_id = %self.area_id, "poster modal closed");

        if let Some(on_close) = &self.on_close {
            on_close();
        }
    }

    pub fn phase(&self) -> ModalPhase {
        self.state().phase
    }

    pub fn is_open(&self) -> bool {
        self.phase() != ModalPhase::Closed
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().title = title.into();
    }

    pub fn image_contents(&self) -> Option<String> {
        self.state().image_contents.clone()
    }

    pub fn header(&self) -> String {
        let area = self
            .town
            .poster_session_area_controller(&self.area_id)
            .map(|controller| controller.id().to_string())
            .unwrap_or_default();
        format!("Create a poster in {area}")
    }

    /// Loads the chosen file as the poster image. `None` clears the image.
    pub async fn select_file(&self, file: Option<&Path>) -> FileSelection {
        let (epoch, selection) = {
            let mut state = self.state();
            if state.phase == ModalPhase::Closed {
                return FileSelection::Discarded;
            }
            state.selection += 1;
            (state.epoch, state.selection)
        };

        let result = read_file_as_base64(file).await;

        let failure = {
            let mut state = self.state();
            if state.epoch != epoch || state.selection != selection {
                debug!(area_id = %self.area_id, "discarding stale poster image read");
                return FileSelection::Discarded;
            }
            match result {
                Ok(contents) => {
                    state.image_contents = contents.filter(|contents| !contents.is_empty());
                    return if state.image_contents.is_some() {
                        FileSelection::Loaded
                    } else {
                        FileSelection::Cleared
                    };
                }
                Err(err) => err,
            }
        };

        let description = format!("{failure:#}");
        warn!(area_id = %self.area_id, error = %description, "poster image read failed");
        self.toaster
            .toast(Toast::error(UNREADABLE_IMAGE_TITLE).with_description(description));
        FileSelection::Failed
    }

    /// Submits the collected title and image as a new poster.
    pub async fn create_poster(&self) -> SubmitOutcome {
        let Some((epoch, request)) = self.begin_submission() else {
            return SubmitOutcome::Skipped;
        };

        info!(area_id = %request.id, title = %request.title, "creating poster");
        let result = self.town.create_poster_session_area(request).await;
        self.finish_submission(epoch, result)
    }

    fn begin_submission(&self) -> Option<(u64, PosterSessionAreaModel)> {
        let controller = self.town.poster_session_area_controller(&self.area_id);

        let mut state = self.state();
        if !matches!(
            state.phase,
            ModalPhase::Open | ModalPhase::Succeeded | ModalPhase::Failed
        ) {
            debug!(phase = ?state.phase, "poster submission ignored");
            return None;
        }
        let (Some(image_contents), Some(controller)) = (state.image_contents.clone(), controller)
        else {
            debug!(area_id = %self.area_id, "poster submission skipped: missing image or area");
            return None;
        };
        if state.title.is_empty() {
            debug!(area_id = %self.area_id, "poster submission skipped: empty title");
            return None;
        }

        state.phase = ModalPhase::Submitting;
        let request = PosterSessionAreaModel {
            id: controller.id().clone(),
            title: state.title.clone(),
            image_contents,
            stars: 0,
        };
        Some((state.epoch, request))
    }

    fn finish_submission(
        &self,
        epoch: u64,
        result: Result<(), TownControllerError>,
    ) -> SubmitOutcome {
        let pause = {
            let mut state = self.state();
            if state.epoch != epoch || state.phase != ModalPhase::Submitting {
                debug!(area_id = %self.area_id, "discarding stale poster submission result");
                return SubmitOutcome::Discarded;
            }
            state.phase = if result.is_ok() {
                ModalPhase::Succeeded
            } else {
                ModalPhase::Failed
            };
            state.pause.take()
        };
        drop(pause);

        match result {
            Ok(()) => {
                info!(area_id = %self.area_id, "poster created");
                self.toaster.toast(Toast::success(CREATED_TITLE));
                if self.options.close_on_success {
                    self.close();
                }
                SubmitOutcome::Created
            }
            Err(err) if err.is_recognized() => {
                warn!(area_id = %self.area_id, error = %err, "poster creation rejected");
                self.toaster
                    .toast(Toast::error(REJECTED_TITLE).with_description(err.to_string()));
                SubmitOutcome::Failed
            }
            Err(err) => {
                error!(area_id = %self.area_id, error = ?err, "unexpected poster creation failure");
                self.toaster.toast(Toast::error(UNEXPECTED_TITLE));
                SubmitOutcome::Failed
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ModalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/select_poster_modal_tests.rs"]
mod tests;
