use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::EngineError;
use crate::models::models::{LeaderboardEntry, NewVideo, UserProfile, Video};
use crate::remote::auth::SessionStore;
use crate::remote::store::RemoteStore;

/// PostgREST client for the hosted backend.
///
/// Every request carries the anon API key; when a session exists its
/// bearer token is sent instead of the anon one so row-level policies
/// see the signed-in user.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    sessions: Arc<SessionStore>,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, sessions: Arc<SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            sessions,
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        let token = self
            .sessions
            .current()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(EngineError::Fetch(format!("backend returned {status}: {body}")))
        }
    }
}

/// One flattened row of the leaderboard view.
#[derive(Debug, Deserialize)]
struct LeaderboardRow {
    id: String,
    user_id: String,
    video_id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    rank: u64,
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    full_name: String,
    avatar_url: Option<String>,
    #[serde(default)]
    user_created_at: String,
    #[serde(default)]
    user_updated_at: String,
    #[serde(default)]
    video_title: String,
    video_description: Option<String>,
    #[serde(default)]
    video_url: String,
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    likes_count: u64,
    #[serde(default)]
    views_count: u64,
    #[serde(default)]
    video_created_at: String,
    #[serde(default)]
    video_updated_at: String,
}

impl LeaderboardRow {
    /// The view returns one wide row per entry; nest the author and video
    /// back into their own records.
    fn into_entry(self) -> LeaderboardEntry {
        LeaderboardEntry {
            user: UserProfile {
                id: self.user_id.clone(),
                email: self.email,
                username: self.username,
                full_name: self.full_name,
                avatar_url: self.avatar_url.clone(),
                bio: None,
                created_at: self.user_created_at,
                updated_at: self.user_updated_at,
            },
            video: Video {
                id: self.video_id.clone(),
                user_id: self.user_id.clone(),
                title: self.video_title,
                description: self.video_description,
                video_url: self.video_url,
                thumbnail_url: self.thumbnail_url,
                duration: self.duration,
                likes_count: self.likes_count,
                views_count: self.views_count,
                score: self.score,
                created_at: self.video_created_at,
                updated_at: self.video_updated_at,
                user: None,
            },
            id: self.id,
            user_id: self.user_id,
            video_id: self.video_id,
            score: self.score,
            rank: self.rank,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LikesRow {
    #[serde(default)]
    likes_count: u64,
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn list_videos(&self) -> Result<Vec<Video>, EngineError> {
        let response = self
            .http
            .get(self.rest_url("videos"))
            .headers(self.headers())
            .query(&[
                ("select", "*,user:users(*)"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        let videos = Self::check(response).await?.json::<Vec<Video>>().await?;
        debug!("Fetched {} videos", videos.len());
        Ok(videos)
    }

    async fn video_likes(&self, video_id: &str) -> Result<u64, EngineError> {
        let filter = format!("eq.{video_id}");
        let response = self
            .http
            .get(self.rest_url("videos"))
            .headers(self.headers())
            .query(&[("select", "likes_count"), ("id", filter.as_str())])
            .send()
            .await?;
        let rows = Self::check(response).await?.json::<Vec<LikesRow>>().await?;
        rows.first()
            .map(|r| r.likes_count)
            .ok_or_else(|| EngineError::Fetch(format!("video {video_id} not found")))
    }

    async fn set_video_likes(&self, video_id: &str, likes: u64) -> Result<(), EngineError> {
        let filter = format!("eq.{video_id}");
        let response = self
            .http
            .patch(self.rest_url("videos"))
            .headers(self.headers())
            .query(&[("id", filter.as_str())])
            .json(&json!({ "likes_count": likes }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn insert_video(&self, user_id: &str, video: &NewVideo) -> Result<Video, EngineError> {
        let response = self
            .http
            .post(self.rest_url("videos"))
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .json(&json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "user_id": user_id,
                "title": video.title,
                "description": video.description,
                "video_url": video.video_url,
                "thumbnail_url": video.thumbnail_url,
                "duration": video.duration,
                "score": video.score,
            }))
            .send()
            .await?;
        let mut rows = Self::check(response).await?.json::<Vec<Video>>().await?;
        rows.pop()
            .ok_or_else(|| EngineError::Fetch("insert returned no row".into()))
    }

    async fn list_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let response = self
            .http
            .get(self.rest_url("leaderboard"))
            .headers(self.headers())
            .query(&[("select", "*"), ("order", "rank.asc")])
            .send()
            .await?;
        let rows = Self::check(response)
            .await?
            .json::<Vec<LeaderboardRow>>()
            .await?;
        Ok(rows.into_iter().map(LeaderboardRow::into_entry).collect())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, EngineError> {
        let response = self
            .http
            .get(self.rest_url("users"))
            .headers(self.headers())
            .query(&[("select", "*"), ("id", format!("eq.{user_id}").as_str())])
            .send()
            .await?;
        let mut rows = Self::check(response)
            .await?
            .json::<Vec<UserProfile>>()
            .await?;
        Ok(rows.pop())
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), EngineError> {
        let response = self
            .http
            .post(self.rest_url("users"))
            .headers(self.headers())
            .json(&json!({
                "id": profile.id,
                "email": profile.email,
                "username": profile.username,
                "full_name": profile.full_name,
                "avatar_url": profile.avatar_url,
                "bio": profile.bio,
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn user_videos(&self, user_id: &str) -> Result<Vec<Video>, EngineError> {
        let response = self
            .http
            .get(self.rest_url("videos"))
            .headers(self.headers())
            .query(&[("select", "*"), ("user_id", format!("eq.{user_id}").as_str())])
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<Vec<Video>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_row_is_renested() {
        let raw = serde_json::json!({
            "id": "l1",
            "user_id": "u1",
            "video_id": "v1",
            "score": 99.5,
            "rank": 1,
            "email": "a@b.c",
            "username": "dancer",
            "full_name": "A Dancer",
            "avatar_url": null,
            "user_created_at": "2025-01-01T00:00:00Z",
            "user_updated_at": "2025-01-01T00:00:00Z",
            "video_title": "Finals",
            "video_description": null,
            "video_url": "https://example.com/v1.mp4",
            "thumbnail_url": null,
            "duration": 30.0,
            "likes_count": 12,
            "views_count": 400,
            "video_created_at": "2025-01-02T00:00:00Z",
            "video_updated_at": "2025-01-02T00:00:00Z"
        });
        let row: LeaderboardRow = serde_json::from_value(raw).unwrap();
        let entry = row.into_entry();

        assert_eq!(entry.rank, 1);
        assert_eq!(entry.user.username, "dancer");
        assert_eq!(entry.video.id, "v1");
        assert_eq!(entry.video.title, "Finals");
        assert_eq!(entry.video.likes_count, 12);
        assert_eq!(entry.video.score, 99.5);
    }

    #[test]
    fn row_tolerates_missing_optional_columns() {
        let raw = serde_json::json!({
            "id": "l1",
            "user_id": "u1",
            "video_id": "v1"
        });
        let row: LeaderboardRow = serde_json::from_value(raw).unwrap();
        let entry = row.into_entry();
        assert_eq!(entry.score, 0.0);
        assert_eq!(entry.rank, 0);
    }
}
