use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::config::Config;
use crate::feed::service::FeedService;
use crate::handlers::handlers::{
    create_video, get_feed, get_leaderboard, get_profile_stats, get_status, like_video,
    report_visibility, sign_in, sign_out, sign_up, toggle_playback,
};
use crate::remote::auth::{AuthClient, SessionStore};
use crate::remote::supabase::SupabaseStore;
use crate::service::state::AppState;
use crate::utils::utils::bind_listener;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/feed", get(get_feed))
        .route("/leaderboard", get(get_leaderboard))
        .route("/profile_stats", get(get_profile_stats))
        .route("/status", get(get_status))
        .route("/visibility", post(report_visibility))
        .route("/toggle", post(toggle_playback))
        .route("/like", post(like_video))
        .route("/videos", post(create_video))
        .route("/auth/sign_up", post(sign_up))
        .route("/auth/sign_in", post(sign_in))
        .route("/auth/sign_out", post(sign_out))
        .with_state(state)
}

pub fn build_state(config: &Config) -> AppState {
    let sessions = Arc::new(SessionStore::open(config.session_file.clone()));
    let store = Arc::new(SupabaseStore::new(
        &config.backend_url,
        &config.anon_key,
        Arc::clone(&sessions),
    ));
    let auth = AuthClient::new(&config.backend_url, &config.anon_key, Arc::clone(&sessions));
    AppState::new(FeedService::new(store, sessions), auth)
}

/// Bind and serve; returns the bound address and the shared state so an
/// embedding caller (or a test) can poke at both.
pub async fn start_server(config: Config) -> Result<(SocketAddr, AppState)> {
    let state = build_state(&config);
    let app = router(state.clone());

    let listener = bind_listener(Some(&config.bind_addr))?;
    let addr = listener.local_addr()?;
    info!("Listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum_server::from_tcp(listener).serve(app.into_make_service()).await {
            tracing::error!("Server exited: {e}");
        }
    });

    Ok((addr, state))
}
