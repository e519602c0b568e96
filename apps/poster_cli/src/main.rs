use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::Parser;
use shared::domain::{InteractableId, PosterSessionAreaModel};
use town_client::{
    LocalTownController, PosterSessionAreaEvent, PosterSessionAreaEventKind, SelectPosterModal,
    SelectPosterModalOptions, SubmitOutcome, TracingToaster,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

/// Creates a poster in a local town by driving the poster selection flow.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "poster.toml")]
    config: PathBuf,
    /// Overrides `area_id` from the settings.
    #[arg(long)]
    area_id: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    image: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let area_id = InteractableId::new(args.area_id.unwrap_or(settings.area_id));
    let town = LocalTownController::new();
    let area = town.areas().insert(PosterSessionAreaModel {
        id: area_id.clone(),
        title: String::new(),
        image_contents: String::new(),
        stars: 0,
    });
    for kind in [
        PosterSessionAreaEventKind::TitleChange,
        PosterSessionAreaEventKind::ImageContentsChange,
        PosterSessionAreaEventKind::StarChange,
    ] {
        area.add_listener(kind, |event| match event {
            PosterSessionAreaEvent::TitleChange(title) => info!(%title, "poster title changed"),
            PosterSessionAreaEvent::ImageContentsChange(contents) => {
                info!(bytes = contents.len(), "poster image changed")
            }
            PosterSessionAreaEvent::StarChange(stars) => info!(stars, "poster stars changed"),
        });
    }

    let modal = SelectPosterModal::new(
        town.clone(),
        Arc::new(TracingToaster),
        area_id,
        settings.default_title,
        SelectPosterModalOptions {
            close_on_success: settings.close_on_success,
        },
    );

    modal.open();
    info!(header = %modal.header(), "poster modal ready");
    if let Some(title) = args.title {
        modal.set_title(title);
    }
    modal.select_file(Some(&args.image)).await;

    let outcome = modal.create_poster().await;
    modal.close();

    if outcome != SubmitOutcome::Created {
        bail!("poster was not created ({outcome:?})");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&area.poster_session_area_model())?
    );
    Ok(())
}
