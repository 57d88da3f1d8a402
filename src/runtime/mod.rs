use std::env;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::catalog::{self, TrackCatalog};
use crate::config::{CatalogSettings, Settings};
use crate::media::{MediaError, RodioResource};
use crate::mpris::ControlCmd;
use crate::session::PlaybackSession;
use crate::transport::{self, TransportSurface};

mod event_loop;
mod logging;
mod settings;

pub(crate) type Transport = TransportSurface<RodioResource, Arc<dyn TrackCatalog>>;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_problem) = settings::load_settings();
    logging::init(&settings.log);
    if let Some(problem) = settings_problem {
        eprintln!("encore: {problem}");
        warn!("{problem}");
    }

    let catalog_path = catalog_path(env::args_os().nth(1).map(PathBuf::from), &settings.catalog);
    let catalog = catalog::open(&catalog_path, &settings.catalog)?;

    let mut app = App::new(catalog.list_all_tracks());
    app.follow_playback = settings.ui.follow_playback;
    app.source_label = Some(catalog_path.display().to_string());

    let transport = match open_transport(&settings, catalog.clone()) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(error = %e, "continuing without playback");
            app.player_available = false;
            app.set_status(e.to_string());
            None
        }
    };

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new(transport.as_ref());
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        transport.as_ref(),
        &mpris,
        &control_rx,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    state.detach(transport.as_ref());
    if let Some(t) = transport {
        t.shutdown();
    }
    info!("exiting");
    run_result
}

/// Command-line path, else the configured catalog, else the working directory.
fn catalog_path(arg: Option<PathBuf>, settings: &CatalogSettings) -> PathBuf {
    arg.or_else(|| settings.path.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn open_transport(
    settings: &Settings,
    catalog: Arc<dyn TrackCatalog>,
) -> Result<Transport, MediaError> {
    let (events_tx, events_rx) = mpsc::channel();
    let resource = RodioResource::open(events_tx, &settings.audio)?;
    let session = PlaybackSession::new(
        resource,
        events_rx,
        catalog,
        settings.audio.initial_volume,
    );
    Ok(TransportSurface::new(transport::share(session)))
}
