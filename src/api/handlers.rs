//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json, Redirect,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use crate::{
    services::{spotify::token_from_fragment, SkipDirection},
    state::{
        app_state::{CaptureOutcome, PlaybackOutcome},
        AppState, TimerView, Toggle,
    },
};
use super::responses::{
    AdjustRequest, HealthResponse, MediaResponse, PlaybackResponse, StatusResponse, TimerResponse,
    TokenRequest,
};

fn internal_error(context: &str, e: String) -> StatusCode {
    error!("{}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Handle GET /timer - Return the clock face
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerView>, StatusCode> {
    state
        .get_timer_view()
        .map(Json)
        .map_err(|e| internal_error("Failed to get timer state", e))
}

/// Handle POST /timer/toggle - Start or pause
pub async fn timer_toggle_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    let (toggle, timer) = state
        .toggle_timer()
        .map_err(|e| internal_error("Failed to toggle timer", e))?;

    Ok(Json(match toggle {
        Toggle::Started => TimerResponse::ok("Timer started".to_string(), timer),
        Toggle::Paused => TimerResponse::ok("Timer paused".to_string(), timer),
        Toggle::Ignored => TimerResponse::rejected("No time left on the clock".to_string(), timer),
    }))
}

/// Handle POST /timer/reset - Stop and rewind
pub async fn timer_reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    let timer = state
        .reset_timer()
        .map_err(|e| internal_error("Failed to reset timer", e))?;
    Ok(Json(TimerResponse::ok("Timer reset".to_string(), timer)))
}

fn adjusted_response(adjusted: bool, timer: TimerView) -> Json<TimerResponse> {
    if adjusted {
        Json(TimerResponse::ok(format!("Duration set to {}", timer.display), timer))
    } else {
        Json(TimerResponse::rejected("Pause the timer to change its duration".to_string(), timer))
    }
}

/// Handle POST /timer/adjust - Change the duration by an arbitrary delta
pub async fn timer_adjust_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<TimerResponse>, StatusCode> {
    let (adjusted, timer) = state
        .adjust_timer(request.delta)
        .map_err(|e| internal_error("Failed to adjust timer", e))?;
    Ok(adjusted_response(adjusted, timer))
}

/// Handle POST /timer/plus - Add one step
pub async fn timer_plus_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    let (adjusted, timer) = state
        .step_timer(true)
        .map_err(|e| internal_error("Failed to adjust timer", e))?;
    Ok(adjusted_response(adjusted, timer))
}

/// Handle POST /timer/minus - Remove one step
pub async fn timer_minus_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    let (adjusted, timer) = state
        .step_timer(false)
        .map_err(|e| internal_error("Failed to adjust timer", e))?;
    Ok(adjusted_response(adjusted, timer))
}

/// Handle GET /timer/events - Stream the clock face on every change
pub async fn timer_events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe_timer();

    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }

        let view = rx.borrow_and_update().clone();
        let event = Event::default()
            .event("timer")
            .json_data(&view)
            .unwrap_or_else(|e| {
                warn!("Failed to encode timer event: {}", e);
                Event::default().comment("encoding failed")
            });
        Some((Ok(event), (rx, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle POST /media/mute - Toggle mute
pub async fn mute_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    let timer = state
        .toggle_mute()
        .await
        .map_err(|e| internal_error("Failed to toggle mute", e))?;
    let message = if timer.muted { "Muted" } else { "Unmuted" };
    Ok(Json(TimerResponse::ok(message.to_string(), timer)))
}

fn capture_response(state: &AppState, outcome: CaptureOutcome, started: &str) -> Result<Json<MediaResponse>, StatusCode> {
    let media = state
        .get_media_state()
        .map_err(|e| internal_error("Failed to get media state", e))?;

    Ok(Json(match outcome {
        CaptureOutcome::Started => {
            info!("{}", started);
            MediaResponse::recording(started.to_string(), media)
        }
        CaptureOutcome::Saved(file) => MediaResponse::saved(file, media),
        CaptureOutcome::Failed(alert) => MediaResponse::alert(alert, media),
    }))
}

/// Handle POST /media/photo - Take a photo
pub async fn photo_handler(State(state): State<Arc<AppState>>) -> Result<Json<MediaResponse>, StatusCode> {
    let outcome = state
        .take_photo()
        .await
        .map_err(|e| internal_error("Failed to take photo", e))?;
    capture_response(&state, outcome, "Photo taken")
}

/// Handle POST /media/video - Start or stop video recording
pub async fn video_handler(State(state): State<Arc<AppState>>) -> Result<Json<MediaResponse>, StatusCode> {
    let outcome = state
        .toggle_video()
        .await
        .map_err(|e| internal_error("Failed to toggle video recording", e))?;
    capture_response(&state, outcome, "Video recording started")
}

/// Handle POST /media/voice-memo - Start or stop a voice memo
pub async fn voice_memo_handler(State(state): State<Arc<AppState>>) -> Result<Json<MediaResponse>, StatusCode> {
    let outcome = state
        .toggle_voice_memo()
        .await
        .map_err(|e| internal_error("Failed to toggle voice memo", e))?;
    capture_response(&state, outcome, "Voice memo recording started")
}

fn playback_response(outcome: PlaybackOutcome) -> Json<PlaybackResponse> {
    Json(match outcome {
        PlaybackOutcome::Updated(now_playing) => PlaybackResponse::ok("Playback updated".to_string(), now_playing),
        PlaybackOutcome::LoginRequired(login_url) => PlaybackResponse::login_required(login_url),
        PlaybackOutcome::Failed(e) => PlaybackResponse::error(e),
    })
}

/// Handle GET /playback - Return the last known track
pub async fn playback_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackResponse>, StatusCode> {
    if !state.playback.is_connected() {
        return Ok(Json(PlaybackResponse::login_required(state.playback.login_url())));
    }

    let media = state
        .get_media_state()
        .map_err(|e| internal_error("Failed to get media state", e))?;
    Ok(Json(PlaybackResponse::ok("Now playing".to_string(), media.now_playing)))
}

/// Handle POST /playback/toggle - Play or pause
pub async fn playback_toggle_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackResponse>, StatusCode> {
    state
        .toggle_playback()
        .await
        .map(playback_response)
        .map_err(|e| internal_error("Failed to toggle playback", e))
}

/// Handle POST /playback/next - Skip forward
pub async fn playback_next_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackResponse>, StatusCode> {
    state
        .skip_track(SkipDirection::Next)
        .await
        .map(playback_response)
        .map_err(|e| internal_error("Failed to skip track", e))
}

/// Handle POST /playback/previous - Skip back
pub async fn playback_previous_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackResponse>, StatusCode> {
    state
        .skip_track(SkipDirection::Previous)
        .await
        .map(playback_response)
        .map_err(|e| internal_error("Failed to skip track", e))
}

/// Handle POST /playback/token - Connect a music account
pub async fn playback_token_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<PlaybackResponse>, StatusCode> {
    let token = request.access_token.or_else(|| {
        request
            .fragment
            .as_deref()
            .map(token_from_fragment)
            .and_then(|mut values| values.remove("access_token"))
    });

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        warn!("Token request without an access token");
        return Err(StatusCode::BAD_REQUEST);
    };

    state.connect_playback(token);
    let now_playing = match state.refresh_now_playing().await {
        Ok(now_playing) => now_playing,
        Err(e) => {
            warn!("Error fetching current track: {}", e);
            None
        }
    };
    Ok(Json(PlaybackResponse::ok("Music account connected".to_string(), now_playing)))
}

/// Handle GET /login - Redirect to the music account authorization page
pub async fn login_handler(State(state): State<Arc<AppState>>) -> Result<Redirect, StatusCode> {
    match state.playback.login_url() {
        Some(url) => Ok(Redirect::temporary(&url)),
        None => {
            warn!("Login requested but no client id is configured");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Handle GET /status - Return current status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = state
        .get_timer_view()
        .map_err(|e| internal_error("Failed to get timer state", e))?;
    let media = state
        .get_media_state()
        .map_err(|e| internal_error("Failed to get media state", e))?;

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        media,
        playback_connected: state.playback.is_connected(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
