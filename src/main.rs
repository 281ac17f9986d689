//! TRNRS - Countdown timer service for the TRNRS workout page
//!
//! This is the main entry point for the trnrs server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use trnrs::{
    api::create_router,
    config::Config,
    services::{spotify, sound_player_for, FfmpegCapture, MediaCapture, SpotifyController},
    state::{app_state::Capabilities, AppState},
    tasks::{countdown_ticker_task, now_playing_task},
    timer::WatchScheduler,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("trnrs={},tower_http=info", config.log_level()))
        .init();

    info!("Starting trnrs server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}s, step={}s",
          config.host, config.port, config.duration, config.step);

    let sound = sound_player_for(config.sound_command.as_deref()).map_err(anyhow::Error::msg)?;

    let login_url = match config.spotify_client_id.as_deref() {
        Some(client_id) => Some(spotify::login_url(client_id, &config.redirect_uri).map_err(anyhow::Error::msg)?),
        None => {
            info!("No Spotify client id configured, music widget stays disconnected");
            None
        }
    };

    std::fs::create_dir_all(&config.capture_dir)?;
    let capture = Arc::new(FfmpegCapture::new(config.capture_settings()));
    let (scheduler, tick_streams) = WatchScheduler::new();

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.duration,
        config.adjust_step(),
        Capabilities {
            sound,
            scheduler: Box::new(scheduler),
            playback: Arc::new(SpotifyController::new(login_url)),
            capture: capture.clone(),
        },
    ));

    // Start the background tasks
    tokio::spawn(countdown_ticker_task(Arc::clone(&state), tick_streams));
    tokio::spawn(now_playing_task(Arc::clone(&state), config.poll_period()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer            - Clock face");
    info!("  GET  /timer/events     - Clock face updates (SSE)");
    info!("  POST /timer/toggle     - Start or pause");
    info!("  POST /timer/reset      - Reset the countdown");
    info!("  POST /timer/plus|minus - Adjust duration by {}s", config.step);
    info!("  POST /timer/adjust     - Adjust duration by any delta");
    info!("  POST /media/mute       - Toggle mute");
    info!("  POST /media/photo      - Take a photo");
    info!("  POST /media/video      - Start or stop video recording");
    info!("  POST /media/voice-memo - Start or stop a voice memo");
    info!("  GET  /playback         - Now playing");
    info!("  POST /playback/toggle|next|previous|token - Music controls");
    info!("  GET  /login            - Connect a Spotify account");
    info!("  GET  /status           - Full status");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    capture.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
