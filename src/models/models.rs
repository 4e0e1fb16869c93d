use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique ID, shared with the auth user
    pub id: String,

    pub email: String,
    pub username: String,
    pub full_name: String,

    pub avatar_url: Option<String>,
    pub bio: Option<String>,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Unique ID for referencing
    pub id: String,

    /// Owning user's ID
    pub user_id: String,

    pub title: String,
    pub description: Option<String>,

    /// Remote URL of the media
    pub video_url: String,
    pub thumbnail_url: Option<String>,

    /// Video length in seconds
    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub views_count: u64,

    /// Battle score as computed by the backend
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,

    /// Embedded author record, present when the query selects it
    pub user: Option<UserProfile>,
}

/// One row of the ranked leaderboard, with its author and video re-nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub score: f64,
    pub rank: u64,
    pub user: UserProfile,
    pub video: Video,
}

/// Aggregate numbers shown on a profile page.
///
/// `followers` is the sum of likes over the user's videos and `following`
/// is floor(followers * 0.7); both are the backend's admitted stand-ins
/// until a real follower table exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStats {
    pub videos: u64,
    pub followers: u64,
    pub following: u64,
    pub total_score: f64,
}

impl ProfileStats {
    pub fn from_videos(videos: &[Video]) -> Self {
        let total_score: f64 = videos.iter().map(|v| v.score).sum();
        let followers: u64 = videos.iter().map(|v| v.likes_count).sum();
        Self {
            videos: videos.len() as u64,
            followers,
            // rough estimate until a real followers table exists
            following: (followers as f64 * 0.7).floor() as u64,
            total_score,
        }
    }
}

/// Payload for submitting a new video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(score: f64, likes: u64) -> Video {
        Video {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".into(),
            title: "t".into(),
            description: None,
            video_url: "https://example.com/v.mp4".into(),
            thumbnail_url: None,
            duration: 0.0,
            likes_count: likes,
            views_count: 0,
            score,
            created_at: String::new(),
            updated_at: String::new(),
            user: None,
        }
    }

    #[test]
    fn profile_stats_aggregates_scores_and_likes() {
        let stats = ProfileStats::from_videos(&[video(10.0, 3), video(5.5, 7)]);
        assert_eq!(stats.videos, 2);
        assert_eq!(stats.total_score, 15.5);
        assert_eq!(stats.followers, 10);
        assert_eq!(stats.following, 7);
    }

    #[test]
    fn profile_stats_empty() {
        let stats = ProfileStats::from_videos(&[]);
        assert_eq!(stats.videos, 0);
        assert_eq!(stats.following, 0);
        assert_eq!(stats.total_score, 0.0);
    }

    #[test]
    fn video_deserializes_with_embedded_author() {
        let raw = serde_json::json!({
            "id": "v1",
            "user_id": "u1",
            "title": "Amazing Hip Hop",
            "description": null,
            "video_url": "https://example.com/v.mp4",
            "thumbnail_url": null,
            "duration": 12.5,
            "likes_count": 245,
            "views_count": 900,
            "score": 87.0,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "user": {
                "id": "u1",
                "email": "a@b.c",
                "username": "dancer",
                "full_name": "A Dancer",
                "avatar_url": null,
                "bio": null
            }
        });
        let video: Video = serde_json::from_value(raw).unwrap();
        assert_eq!(video.likes_count, 245);
        assert_eq!(video.user.unwrap().username, "dancer");
    }
}
