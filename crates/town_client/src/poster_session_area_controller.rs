//! Observable wrapper around a single poster session area.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use shared::domain::{InteractableId, PosterSessionAreaModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterSessionAreaEvent {
    TitleChange(String),
    ImageContentsChange(String),
    StarChange(u32),
}

impl PosterSessionAreaEvent {
    pub fn kind(&self) -> PosterSessionAreaEventKind {
        match self {
            Self::TitleChange(_) => PosterSessionAreaEventKind::TitleChange,
            Self::ImageContentsChange(_) => PosterSessionAreaEventKind::ImageContentsChange,
            Self::StarChange(_) => PosterSessionAreaEventKind::StarChange,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosterSessionAreaEventKind {
    TitleChange,
    ImageContentsChange,
    StarChange,
}

impl PosterSessionAreaEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TitleChange => "posterTitleChange",
            Self::ImageContentsChange => "posterImageContentsChange",
            Self::StarChange => "posterStarChange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&PosterSessionAreaEvent) + Send + Sync>;

struct RegisteredListener {
    id: ListenerId,
    kind: PosterSessionAreaEventKind,
    listener: Listener,
}

struct PosterState {
    title: String,
    image_contents: String,
    stars: u32,
}

/// Holds the client's copy of one poster session area and notifies listeners
/// whenever a property actually changes.
///
/// Listeners run synchronously, in registration order, after the internal
/// locks have been released.
pub struct PosterSessionAreaController {
    id: InteractableId,
    state: Mutex<PosterState>,
    listeners: Mutex<Vec<RegisteredListener>>,
    next_listener_id: AtomicU64,
}

impl PosterSessionAreaController {
    pub fn new(model: PosterSessionAreaModel) -> Self {
        Self {
            id: model.id,
            state: Mutex::new(PosterState {
                title: model.title,
                image_contents: model.image_contents,
                stars: model.stars,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn id(&self) -> &InteractableId {
        &self.id
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        {
            let mut state = self.state();
            if state.title == title {
                return;
            }
            state.title.clone_from(&title);
        }
        self.emit(PosterSessionAreaEvent::TitleChange(title));
    }

    pub fn image_contents(&self) -> String {
        self.state().image_contents.clone()
    }

    pub fn set_image_contents(&self, image_contents: impl Into<String>) {
        let image_contents = image_contents.into();
        {
            let mut state = self.state();
            if state.image_contents == image_contents {
                return;
            }
            state.image_contents.clone_from(&image_contents);
        }
        self.emit(PosterSessionAreaEvent::ImageContentsChange(image_contents));
    }

    pub fn stars(&self) -> u32 {
        self.state().stars
    }

    pub fn set_stars(&self, stars: u32) {
        {
            let mut state = self.state();
            if state.stars == stars {
                return;
            }
            state.stars = stars;
        }
        self.emit(PosterSessionAreaEvent::StarChange(stars));
    }

    pub fn poster_session_area_model(&self) -> PosterSessionAreaModel {
        let state = self.state();
        PosterSessionAreaModel {
            id: self.id.clone(),
            title: state.title.clone(),
            image_contents: state.image_contents.clone(),
            stars: state.stars,
        }
    }

    /// Applies the mutable fields of `model`. The incoming `id` is ignored.
    pub fn update_from(&self, model: &PosterSessionAreaModel) {
        self.set_title(model.title.as_str());
        self.set_image_contents(model.image_contents.as_str());
        self.set_stars(model.stars);
    }

    pub fn add_listener<F>(&self, kind: PosterSessionAreaEventKind, listener: F) -> ListenerId
    where
        F: Fn(&PosterSessionAreaEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push(RegisteredListener {
            id,
            kind,
            listener: Arc::new(listener),
        });
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|registered| registered.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, kind: PosterSessionAreaEventKind) -> usize {
        self.listeners()
            .iter()
            .filter(|registered| registered.kind == kind)
            .count()
    }

    fn emit(&self, event: PosterSessionAreaEvent) {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .listeners()
            .iter()
            .filter(|registered| registered.kind == kind)
            .map(|registered| Arc::clone(&registered.listener))
            .collect();

        tracing::trace!(
            area_id = %self.id,
            event = kind.as_str(),
            listeners = targets.len(),
            "poster session area changed"
        );

        for listener in targets {
            listener(&event);
        }
    }

    fn state(&self) -> MutexGuard<'_, PosterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<RegisteredListener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PosterSessionAreaController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterSessionAreaController")
            .field("model", &self.poster_session_area_model())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/poster_session_area_controller_tests.rs"]
mod tests;
