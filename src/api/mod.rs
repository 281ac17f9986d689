//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer", get(timer_handler))
        .route("/timer/events", get(timer_events_handler))
        .route("/timer/toggle", post(timer_toggle_handler))
        .route("/timer/reset", post(timer_reset_handler))
        .route("/timer/adjust", post(timer_adjust_handler))
        .route("/timer/plus", post(timer_plus_handler))
        .route("/timer/minus", post(timer_minus_handler))
        .route("/media/mute", post(mute_handler))
        .route("/media/photo", post(photo_handler))
        .route("/media/video", post(video_handler))
        .route("/media/voice-memo", post(voice_memo_handler))
        .route("/playback", get(playback_handler))
        .route("/playback/toggle", post(playback_toggle_handler))
        .route("/playback/next", post(playback_next_handler))
        .route("/playback/previous", post(playback_previous_handler))
        .route("/playback/token", post(playback_token_handler))
        .route("/login", get(login_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use std::time::Duration;

    use futures::StreamExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        services::{SkipDirection, MICROPHONE_ALERT},
        test_utils::{harness, FakeCapture, FakePlayback},
    };

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_timer_endpoints() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let (status, body) = call(&router, Method::GET, "/timer", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display"], "00:30");
        assert_eq!(body["progress"], 0.0);

        let (_, body) = call(&router, Method::POST, "/timer/minus", None).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timer"]["initial_seconds"], 25);

        let (_, body) = call(&router, Method::POST, "/timer/adjust", Some(json!({"delta": -100}))).await;
        assert_eq!(body["timer"]["remaining_seconds"], 0);

        let (_, body) = call(&router, Method::POST, "/timer/toggle", None).await;
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["timer"]["can_start"], false);

        call(&router, Method::POST, "/timer/plus", None).await;
        let (_, body) = call(&router, Method::POST, "/timer/toggle", None).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timer"]["is_running"], true);

        let (_, body) = call(&router, Method::POST, "/timer/plus", None).await;
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["timer"]["initial_seconds"], 5);

        let (_, body) = call(&router, Method::POST, "/timer/reset", None).await;
        assert_eq!(body["timer"]["is_running"], false);
        assert_eq!(h.scheduler.active(), None);
    }

    async fn next_frame(body: &mut axum::body::BodyDataStream) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        String::from_utf8(frame.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_timer_events_stream_views() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let request = Request::builder().uri("/timer/events").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        let mut body = response.into_body().into_data_stream();

        // the current clock face is sent straight away
        let first = next_frame(&mut body).await;
        assert!(first.starts_with("event: timer\n"));
        assert!(first.contains("\"remaining_seconds\":30"));
        assert!(first.contains("\"is_running\":false"));

        h.state.toggle_timer().unwrap();
        let second = next_frame(&mut body).await;
        assert!(second.starts_with("event: timer\n"));
        assert!(second.contains("\"is_running\":true"));
    }

    #[tokio::test]
    async fn test_capture_alert_is_reported() {
        let h = harness(FakeCapture::failing(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let (status, body) = call(&router, Method::POST, "/media/voice-memo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alert");
        assert_eq!(body["message"], MICROPHONE_ALERT);
        assert_eq!(body["media"]["recording_audio"], false);
    }

    #[tokio::test]
    async fn test_photo_is_saved() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let (_, body) = call(&router, Method::POST, "/media/photo", None).await;
        assert_eq!(body["status"], "saved");
        assert_eq!(body["file"], "photo.jpg");
    }

    #[tokio::test]
    async fn test_playback_login_flow() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let (_, body) = call(&router, Method::POST, "/playback/toggle", None).await;
        assert_eq!(body["status"], "login_required");
        assert_eq!(body["login_url"], "https://accounts.example/authorize");

        let (status, _) = call(&router, Method::POST, "/playback/token", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &router,
            Method::POST,
            "/playback/token",
            Some(json!({"fragment": "#access_token=abc&token_type=Bearer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["now_playing"]["track"], "Track");
        assert_eq!(h.playback.token.lock().unwrap().as_deref(), Some("abc"));

        let (_, body) = call(&router, Method::POST, "/playback/toggle", None).await;
        assert_eq!(body["now_playing"]["is_playing"], true);
    }

    #[tokio::test]
    async fn test_now_playing_endpoint() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let (status, body) = call(&router, Method::GET, "/playback", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "login_required");
        assert_eq!(body["login_url"], "https://accounts.example/authorize");

        h.state.connect_playback("abc".to_string());
        let (_, body) = call(&router, Method::GET, "/playback", None).await;
        assert_eq!(body["status"], "ok");
        assert!(body["now_playing"].is_null());

        h.state.refresh_now_playing().await.unwrap();
        let (_, body) = call(&router, Method::GET, "/playback", None).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["now_playing"]["track"], "Track");
        assert_eq!(body["now_playing"]["artist"], "Artist");
    }

    #[tokio::test]
    async fn test_skip_back() {
        let h = harness(FakeCapture::default(), FakePlayback::connected());
        let router = create_router(h.state.clone());

        let (status, body) = call(&router, Method::POST, "/playback/previous", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["now_playing"]["track"], "Track");
        assert_eq!(*h.playback.skips.lock().unwrap(), vec![SkipDirection::Previous]);
        assert_eq!(h.state.get_last_action().0.as_deref(), Some("playback-previous"));
    }

    #[tokio::test]
    async fn test_failed_playback_command_returns_error_status() {
        let h = harness(FakeCapture::default(), FakePlayback::connected_failing());
        let router = create_router(h.state.clone());

        let (status, body) = call(&router, Method::POST, "/playback/toggle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("502"));

        let (_, body) = call(&router, Method::POST, "/playback/next", None).await;
        assert_eq!(body["status"], "error");
        assert!(h.playback.skips.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_redirects() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        let request = Request::builder().uri("/login").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://accounts.example/authorize"
        );
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        let router = create_router(h.state.clone());

        call(&router, Method::POST, "/media/mute", None).await;
        let (status, body) = call(&router, Method::GET, "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timer"]["muted"], true);
        assert_eq!(body["last_action"], "mute");
        assert_eq!(body["playback_connected"], false);

        let (_, body) = call(&router, Method::GET, "/health", None).await;
        assert_eq!(body["status"], "ok");
    }
}
