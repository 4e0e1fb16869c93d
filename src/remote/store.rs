use async_trait::async_trait;

use crate::error::EngineError;
use crate::models::models::{LeaderboardEntry, NewVideo, UserProfile, Video};

/// Boundary to the hosted backend. All business logic (score computation,
/// ranking, relational joins) lives behind this seam; the engine only
/// issues queries and writes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Videos ordered by creation time descending, author embedded.
    async fn list_videos(&self) -> Result<Vec<Video>, EngineError>;

    /// Current like count of a single video.
    async fn video_likes(&self, video_id: &str) -> Result<u64, EngineError>;

    /// Overwrite a video's like count.
    async fn set_video_likes(&self, video_id: &str, likes: u64) -> Result<(), EngineError>;

    async fn insert_video(&self, user_id: &str, video: &NewVideo) -> Result<Video, EngineError>;

    /// Leaderboard rows ordered by rank ascending.
    async fn list_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, EngineError>;

    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), EngineError>;

    /// The user's own videos, for the profile stats aggregation.
    async fn user_videos(&self, user_id: &str) -> Result<Vec<Video>, EngineError>;
}
