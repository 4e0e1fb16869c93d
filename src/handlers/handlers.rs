use std::collections::HashMap;
use std::sync::atomic::Ordering;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::feed::coordinator::PlayerEffect;
use crate::feed::registry::SharedPlayerHandle;
use crate::feed::service::QueryResult;
use crate::models::models::{LeaderboardEntry, NewVideo, ProfileStats, Video};
use crate::service::state::AppState;

/// Returns the cached feed, refetching when needed, and mounts a player
/// for every item so subsequent visibility reports can drive playback.
///
/// Example usage: GET /feed
pub async fn get_feed(State(state): State<AppState>) -> Json<QueryResult<Vec<Video>>> {
    let result = state.feed.videos().await;

    if let Some(videos) = &result.data {
        mount_players(&state, videos);
        let effects = {
            let mut coordinator = state.coordinator.lock();
            coordinator.set_items(videos.iter().map(|v| v.id.clone()).collect())
        };
        state.players.lock().apply(&effects);
    }

    Json(result)
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Json<QueryResult<Vec<LeaderboardEntry>>> {
    Json(state.feed.leaderboard().await)
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: String,
}

pub async fn get_profile_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<QueryResult<ProfileStats>> {
    Json(state.feed.profile_stats(&query.user_id).await)
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    /// Indices of items currently crossing the visibility threshold
    pub visible_indices: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub effects: Vec<PlayerEffect>,
}

/// The viewport reports which items are visible; the lowest reported
/// index becomes current and the resulting pass is applied to every
/// mounted player.
pub async fn report_visibility(
    State(state): State<AppState>,
    Json(payload): Json<VisibilityRequest>,
) -> Json<PlaybackResponse> {
    let (current_index, is_playing, effects) = {
        let mut coordinator = state.coordinator.lock();
        let effects = coordinator.on_visibility_changed(&payload.visible_indices);
        (coordinator.current_index(), coordinator.is_playing(), effects)
    };
    state.players.lock().apply(&effects);

    Json(PlaybackResponse {
        current_index,
        is_playing,
        effects,
    })
}

/// User intent: flip the shared playing flag. Current index unchanged.
pub async fn toggle_playback(State(state): State<AppState>) -> Json<PlaybackResponse> {
    let (current_index, is_playing, effects) = {
        let mut coordinator = state.coordinator.lock();
        let effects = coordinator.toggle_playback();
        (coordinator.current_index(), coordinator.is_playing(), effects)
    };
    state.players.lock().apply(&effects);

    Json(PlaybackResponse {
        current_index,
        is_playing,
        effects,
    })
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub video_id: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub video_id: String,
    pub likes_count: u64,
}

pub async fn like_video(
    State(state): State<AppState>,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, EngineError> {
    let likes_count = state.feed.like_video(&payload.video_id).await?;
    Ok(Json(LikeResponse {
        video_id: payload.video_id,
        likes_count,
    }))
}

pub async fn create_video(
    State(state): State<AppState>,
    Json(payload): Json<NewVideo>,
) -> Result<Json<Video>, EngineError> {
    let video = state.feed.create_video(payload).await?;
    Ok(Json(video))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub current_index: Option<usize>,
    pub current_video_id: Option<String>,
    pub is_playing: bool,
    pub video_count: usize,
    /// Desired play state per mounted item; at most one is ever true
    pub players: HashMap<String, bool>,
}

/// Returns JSON status of the engine.
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let (current_index, current_video_id, is_playing) = {
        let coordinator = state.coordinator.lock();
        (
            coordinator.current_index(),
            coordinator.current_video_id().map(str::to_string),
            coordinator.is_playing(),
        )
    };

    let players: HashMap<String, bool> = state
        .playing_flags
        .lock()
        .iter()
        .map(|(id, flag)| (id.clone(), flag.load(Ordering::SeqCst)))
        .collect();

    Json(StatusResponse {
        current_index,
        current_video_id,
        is_playing,
        video_count: players.len(),
        players,
    })
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>, EngineError> {
    let session = state
        .auth
        .sign_up(
            &payload.email,
            &payload.password,
            &payload.username,
            &payload.full_name,
            payload.bio.as_deref(),
        )
        .await?;
    Ok(Json(SessionResponse {
        user_id: session.user_id,
        email: session.email,
        username: session.username,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, EngineError> {
    let session = state.auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(SessionResponse {
        user_id: session.user_id,
        email: session.email,
        username: session.username,
    }))
}

pub async fn sign_out(State(state): State<AppState>) -> Result<&'static str, EngineError> {
    state.auth.sign_out().await?;
    Ok("OK")
}

/// Mount a player handle for every feed item and unmount the ones whose
/// items left the feed. The registry owns the handles; the coordinator
/// only ever looks them up.
fn mount_players(state: &AppState, videos: &[Video]) {
    let mut players = state.players.lock();
    let mut flags = state.playing_flags.lock();

    let live: std::collections::HashSet<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    let gone: Vec<String> = flags
        .keys()
        .filter(|id| !live.contains(id.as_str()))
        .cloned()
        .collect();
    for id in gone {
        players.unregister(&id);
        flags.remove(&id);
    }

    for video in videos {
        if !players.contains(&video.id) {
            let handle = SharedPlayerHandle::new();
            flags.insert(video.id.clone(), handle.playing_flag());
            players.register(video.id.clone(), Box::new(handle));
        }
    }
}
