use super::*;
use crate::{
    poster_session_area_controller::PosterSessionAreaController,
    registry::PosterSessionAreaRegistry, toast::ToastStatus,
};
use async_trait::async_trait;
use shared::error::ApiException;
use std::{
    env, fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::{oneshot, Notify};

static TEMP_DIRS: AtomicUsize = AtomicUsize::new(0);

const AREA_ID: &str = "poster-area-1";

#[derive(Debug, Clone)]
enum Failure {
    Rejected(String),
    Unexpected(String),
}

struct TestTownController {
    pauses: AtomicUsize,
    un_pauses: AtomicUsize,
    areas: PosterSessionAreaRegistry,
    fail_with: Mutex<Option<Failure>>,
    requests: Mutex<Vec<PosterSessionAreaModel>>,
    create_started: Notify,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl TestTownController {
    fn new() -> Arc<Self> {
        let areas = PosterSessionAreaRegistry::new();
        areas.insert(PosterSessionAreaModel {
            id: InteractableId::new(AREA_ID),
            title: String::new(),
            image_contents: String::new(),
            stars: 0,
        });
        Arc::new(Self {
            pauses: AtomicUsize::new(0),
            un_pauses: AtomicUsize::new(0),
            areas,
            fail_with: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            create_started: Notify::new(),
            gate: Mutex::new(None),
        })
    }

    fn fail_next(&self, failure: Failure) {
        *self.fail_with.lock().expect("fail_with") = Some(failure);
    }

    fn hold_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().expect("gate") = Some(rx);
        tx
    }

    fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    fn un_pauses(&self) -> usize {
        self.un_pauses.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<PosterSessionAreaModel> {
        self.requests.lock().expect("requests").clone()
    }
}

#[async_trait]
impl TownController for TestTownController {
    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn un_pause(&self) {
        self.un_pauses.fetch_add(1, Ordering::SeqCst);
    }

    async fn create_poster_session_area(
        &self,
        request: PosterSessionAreaModel,
    ) -> Result<(), TownControllerError> {
        self.requests.lock().expect("requests").push(request);
        self.create_started.notify_one();

        let gate = self.gate.lock().expect("gate").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match self.fail_with.lock().expect("fail_with").take() {
            Some(Failure::Rejected(message)) => {
                Err(ApiException::validation(message).into())
            }
            Some(Failure::Unexpected(message)) => Err(TownControllerError::Unexpected(message)),
            None => Ok(()),
        }
    }

    fn poster_session_area_controller(
        &self,
        id: &InteractableId,
    ) -> Option<Arc<PosterSessionAreaController>> {
        self.areas.get(id)
    }
}

#[derive(Default)]
struct RecordingToaster {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToaster {
    fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().expect("toasts").clone()
    }
}

impl Toaster for RecordingToaster {
    fn toast(&self, toast: Toast) {
        self.toasts.lock().expect("toasts").push(toast);
    }
}

struct Harness {
    town: Arc<TestTownController>,
    toaster: Arc<RecordingToaster>,
    closes: Arc<AtomicUsize>,
    modal: SelectPosterModal,
}

fn harness_for(area_id: &str, options: SelectPosterModalOptions) -> Harness {
    let town = TestTownController::new();
    let toaster = Arc::new(RecordingToaster::default());
    let closes = Arc::new(AtomicUsize::new(0));
    let close_counter = Arc::clone(&closes);
    let modal = SelectPosterModal::new(
        town.clone(),
        toaster.clone(),
        InteractableId::new(area_id),
        "",
        options,
    )
    .with_on_close(move || {
        close_counter.fetch_add(1, Ordering::SeqCst);
    });
    Harness {
        town,
        toaster,
        closes,
        modal,
    }
}

fn harness() -> Harness {
    harness_for(AREA_ID, SelectPosterModalOptions::default())
}

fn temp_poster_dir() -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!(
        "town_client_modal_{suffix}_{}",
        TEMP_DIRS.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn poster_png_with(contents: &[u8]) -> PathBuf {
    let path = temp_poster_dir().join("poster.png");
    fs::write(&path, contents).expect("write poster");
    path
}

fn poster_png() -> PathBuf {
    poster_png_with(b"\x89PNG\r\n")
}

async fn fill_form(h: &Harness, title: &str) {
    h.modal.set_title(title);
    let png = poster_png();
    assert_eq!(h.modal.select_file(Some(&png)).await, FileSelection::Loaded);
    fs::remove_dir_all(png.parent().expect("parent")).expect("cleanup");
}

#[test]
fn opening_pauses_and_closing_resumes_once() {
    let h = harness();

    h.modal.open();
    assert!(h.modal.is_open());
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 0));

    h.modal.close();
    h.modal.close();
    assert_eq!(h.modal.phase(), ModalPhase::Closed);
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 1));
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn repeated_open_close_cycles_stay_symmetric() {
    let h = harness();

    for _ in 0..3 {
        h.modal.open();
        h.modal.open();
        h.modal.close();
    }

    assert_eq!((h.town.pauses(), h.town.un_pauses()), (3, 3));
}

#[test]
fn dropping_an_open_modal_resumes_the_simulation() {
    let h = harness();
    h.modal.open();

    let Harness { town, modal, .. } = h;
    drop(modal);

    assert_eq!((town.pauses(), town.un_pauses()), (1, 1));
}

#[test]
fn header_names_the_resolved_area() {
    let h = harness();
    assert_eq!(h.modal.header(), format!("Create a poster in {AREA_ID}"));

    let unresolved = harness_for("missing", SelectPosterModalOptions::default());
    assert_eq!(unresolved.modal.header(), "Create a poster in ");
}

#[tokio::test]
async fn empty_title_never_invokes_creation() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "").await;

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Skipped);
    assert!(h.town.requests().is_empty());
    assert!(h.toaster.toasts().is_empty());
    assert_eq!(h.modal.phase(), ModalPhase::Open);
}

#[tokio::test]
async fn missing_image_never_invokes_creation() {
    let h = harness();
    h.modal.open();
    h.modal.set_title("Ownership for everyone");

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Skipped);
    assert!(h.town.requests().is_empty());
}

#[tokio::test]
async fn unresolved_area_never_invokes_creation() {
    let h = harness_for("missing", SelectPosterModalOptions::default());
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Skipped);
    assert!(h.town.requests().is_empty());
    assert!(h.toaster.toasts().is_empty());
}

#[tokio::test]
async fn closed_modal_does_not_submit() {
    let h = harness();
    h.modal.set_title("Ownership for everyone");

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Skipped);
    assert!(h.town.requests().is_empty());
}

#[tokio::test]
async fn successful_creation_toasts_resumes_and_closes() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Created);

    assert_eq!(
        h.town.requests(),
        vec![PosterSessionAreaModel {
            id: InteractableId::new(AREA_ID),
            title: "Ownership for everyone".to_string(),
            image_contents: "data:image/png;base64,iVBORw0K".to_string(),
            stars: 0,
        }]
    );
    assert_eq!(h.toaster.toasts(), vec![Toast::success("Poster created!")]);
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 1));
    assert_eq!(h.modal.phase(), ModalPhase::Closed);
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn success_can_leave_the_modal_open_without_double_resume() {
    let h = harness_for(
        AREA_ID,
        SelectPosterModalOptions {
            close_on_success: false,
        },
    );
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Created);
    assert_eq!(h.modal.phase(), ModalPhase::Succeeded);
    assert_eq!(h.town.un_pauses(), 1);
    assert_eq!(h.closes.load(Ordering::SeqCst), 0);

    h.modal.close();
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 1));
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_creation_shows_error_message_and_resumes() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    h.town.fail_next(Failure::Rejected("X".to_string()));

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Failed);

    let toasts = h.toaster.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Unable to set given title and image");
    assert_eq!(toasts[0].status, ToastStatus::Error);
    assert_eq!(toasts[0].description.as_deref(), Some("Validation: X"));
    assert_eq!(h.town.un_pauses(), 1);
    assert_eq!(h.modal.phase(), ModalPhase::Failed);
    assert!(h.modal.is_open());
}

#[tokio::test]
async fn unexpected_failure_shows_generic_error() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    h.town.fail_next(Failure::Unexpected("socket went away".to_string()));

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Failed);

    assert_eq!(h.toaster.toasts(), vec![Toast::error("Unexpected Error")]);
    assert_eq!(h.town.un_pauses(), 1);
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    h.town.fail_next(Failure::Rejected("try again".to_string()));

    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Failed);
    assert_eq!(h.modal.create_poster().await, SubmitOutcome::Created);

    assert_eq!(h.town.requests().len(), 2);
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 1));
    assert_eq!(h.modal.phase(), ModalPhase::Closed);
}

#[tokio::test]
async fn closing_during_submission_discards_the_result() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    let release = h.town.hold_next_create();

    let (outcome, ()) = tokio::join!(h.modal.create_poster(), async {
        h.town.create_started.notified().await;
        assert_eq!(h.modal.phase(), ModalPhase::Submitting);
        h.modal.close();
        release.send(()).expect("release create");
    });

    assert_eq!(outcome, SubmitOutcome::Discarded);
    assert!(h.toaster.toasts().is_empty());
    assert_eq!((h.town.pauses(), h.town.un_pauses()), (1, 1));
    assert_eq!(h.modal.phase(), ModalPhase::Closed);
}

#[tokio::test]
async fn selecting_no_file_clears_the_image() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    assert!(h.modal.image_contents().is_some());

    assert_eq!(h.modal.select_file(None).await, FileSelection::Cleared);
    assert_eq!(h.modal.image_contents(), None);
}

#[tokio::test]
async fn unreadable_file_is_reported_and_keeps_previous_image() {
    let h = harness();
    h.modal.open();
    fill_form(&h, "Ownership for everyone").await;
    let previous = h.modal.image_contents();
    let missing = env::temp_dir().join("town_client_modal_missing_poster.png");

    assert_eq!(
        h.modal.select_file(Some(&missing)).await,
        FileSelection::Failed
    );

    assert_eq!(h.modal.image_contents(), previous);
    let toasts = h.toaster.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Unable to read poster image");
    assert_eq!(toasts[0].status, ToastStatus::Error);
}

#[tokio::test]
async fn file_selection_on_a_closed_modal_is_discarded() {
    let h = harness();
    let png = poster_png();

    assert_eq!(
        h.modal.select_file(Some(&png)).await,
        FileSelection::Discarded
    );
    assert_eq!(h.modal.image_contents(), None);
    fs::remove_dir_all(png.parent().expect("parent")).expect("cleanup");
}

#[cfg(unix)]
#[tokio::test]
async fn superseded_file_read_does_not_overwrite_newer_selection() {
    let h = harness();
    h.modal.open();
    let slow_dir = temp_poster_dir();
    let slow = slow_dir.join("slow.png");
    let status = std::process::Command::new("mkfifo")
        .arg(&slow)
        .status()
        .expect("run mkfifo");
    assert!(status.success(), "mkfifo failed");
    let fast = poster_png_with(b"SECOND");

    let (first, ()) = tokio::join!(h.modal.select_file(Some(&slow)), async {
        assert_eq!(h.modal.select_file(Some(&fast)).await, FileSelection::Loaded);
        let writer = slow.clone();
        tokio::task::spawn_blocking(move || fs::write(writer, b"FIRST"))
            .await
            .expect("writer task")
            .expect("feed slow read");
    });

    assert_eq!(first, FileSelection::Discarded);
    assert_eq!(
        h.modal.image_contents().as_deref(),
        Some("data:image/png;base64,U0VDT05E")
    );
    fs::remove_dir_all(slow_dir).expect("cleanup");
    fs::remove_dir_all(fast.parent().expect("parent")).expect("cleanup");
}
