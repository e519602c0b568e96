//! Client-side state for poster session areas: observable area controllers,
//! the town controller seam, and the "create a poster" modal flow.

mod poster_file;
mod poster_session_area_controller;
mod registry;
mod select_poster_modal;
mod toast;
mod town_controller;

pub use poster_file::read_file_as_base64;
pub use poster_session_area_controller::{
    ListenerId, PosterSessionAreaController, PosterSessionAreaEvent, PosterSessionAreaEventKind,
};
pub use registry::PosterSessionAreaRegistry;
pub use select_poster_modal::{
    FileSelection, ModalPhase, SelectPosterModal, SelectPosterModalOptions, SubmitOutcome,
};
pub use toast::{Toast, ToastStatus, Toaster, TracingToaster};
pub use town_controller::{
    LocalTownController, SimulationPause, TownController, TownControllerError,
};
