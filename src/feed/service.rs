use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::query_cache::{QueryCache, QueryKey};
use crate::error::EngineError;
use crate::models::models::{LeaderboardEntry, NewVideo, ProfileStats, UserProfile, Video};
use crate::remote::auth::SessionStore;
use crate::remote::store::RemoteStore;

/// What a query surfaces to the presentation layer: the last known data,
/// whether a fetch is in flight, and the last error if any.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> QueryResult<T> {
    fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

/// Data layer of the feed: issues queries and mutations against the
/// remote store and keeps their results in the query cache. FeedState is
/// written only here, by fetch and mutation completions.
pub struct FeedService {
    cache: Mutex<QueryCache>,
    store: Arc<dyn RemoteStore>,
    sessions: Arc<SessionStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn RemoteStore>, sessions: Arc<SessionStore>) -> Self {
        Self {
            cache: Mutex::new(QueryCache::new()),
            store,
            sessions,
        }
    }

    /// The feed, ordered by creation time descending as the backend
    /// returns it. Concurrent callers collapse onto one remote fetch;
    /// a failed fetch keeps any previously cached list visible next to
    /// the error until the caller explicitly retries.
    pub async fn videos(&self) -> QueryResult<Vec<Video>> {
        self.cached_list(QueryKey::Videos, || self.store.list_videos())
            .await
    }

    pub async fn leaderboard(&self) -> QueryResult<Vec<LeaderboardEntry>> {
        self.cached_list(QueryKey::Leaderboard, || self.store.list_leaderboard())
            .await
    }

    pub async fn profile_stats(&self, user_id: &str) -> QueryResult<ProfileStats> {
        let key = QueryKey::ProfileStats(user_id.to_string());
        {
            let mut cache = self.cache.lock();
            // Serve the cache unless the last attempt errored; an errored
            // entry means this call is the caller's explicit retry.
            if let Some(entry) = cache.entry(&key) {
                if entry.loading || entry.error.is_none() {
                    return QueryResult {
                        data: entry.data.and_then(|v| serde_json::from_value(v).ok()),
                        loading: entry.loading,
                        error: entry.error,
                    };
                }
            }
            if !cache.begin_fetch(&key) {
                return QueryResult::loading();
            }
        }

        let result = self.store.user_videos(user_id).await;
        let mut cache = self.cache.lock();
        match result {
            Ok(videos) => {
                let stats = ProfileStats::from_videos(&videos);
                cache.set_data(&key, &stats);
                QueryResult {
                    data: Some(stats),
                    loading: false,
                    error: None,
                }
            }
            Err(e) => {
                cache.complete(&key, Err(e.to_string()));
                QueryResult {
                    data: None,
                    loading: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Like a video: read the current count, write count + 1, and only
    /// patch the cached feed once the remote write has acknowledged. A
    /// failed write leaves the displayed count untouched. There is no
    /// duplicate-submission guard; every successful submit increments by
    /// exactly one.
    pub async fn like_video(&self, video_id: &str) -> Result<u64, EngineError> {
        let current = self.store.video_likes(video_id).await?;
        self.store.set_video_likes(video_id, current + 1).await?;

        let mut cache = self.cache.lock();
        let mut new_count = current + 1;
        if let Some(mut videos) = cache.data::<Vec<Video>>(&QueryKey::Videos) {
            for video in videos.iter_mut() {
                if video.id == video_id {
                    video.likes_count += 1;
                    new_count = video.likes_count;
                }
            }
            cache.set_data(&QueryKey::Videos, &videos);
        }
        debug!("Liked video {video_id}, count now {new_count}");
        Ok(new_count)
    }

    /// Submit a new video. Validation happens before any remote call;
    /// the author's profile row is created on first upload; on success
    /// the feed query is invalidated so the next read refetches.
    pub async fn create_video(&self, new_video: NewVideo) -> Result<Video, EngineError> {
        if new_video.title.trim().is_empty() || new_video.video_url.trim().is_empty() {
            return Err(EngineError::Validation(
                "title and video URL are required".into(),
            ));
        }

        let session = self
            .sessions
            .current()
            .ok_or_else(|| EngineError::Auth("not signed in".into()))?;

        if self.store.get_profile(&session.user_id).await?.is_none() {
            let id_prefix = session.user_id.get(..8).unwrap_or(&session.user_id);
            let fallback = format!("user_{id_prefix}");
            let profile = UserProfile {
                id: session.user_id.clone(),
                email: session.email.clone(),
                username: if session.username.is_empty() {
                    fallback
                } else {
                    session.username.clone()
                },
                full_name: if session.full_name.is_empty() {
                    "New User".into()
                } else {
                    session.full_name.clone()
                },
                avatar_url: None,
                bio: session.bio.clone(),
                created_at: String::new(),
                updated_at: String::new(),
            };
            self.store.insert_profile(&profile).await?;
            info!("Created profile for {}", session.user_id);
        }

        let video = self.store.insert_video(&session.user_id, &new_video).await?;
        self.cache.lock().invalidate(&QueryKey::Videos);
        Ok(video)
    }

    /// Cached list of feed item ids, for syncing the coordinator after a
    /// refresh.
    pub fn cached_video_ids(&self) -> Vec<String> {
        self.cache
            .lock()
            .data::<Vec<Video>>(&QueryKey::Videos)
            .map(|videos| videos.into_iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    async fn cached_list<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryResult<Vec<T>>
    where
        T: Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<T>, EngineError>>,
    {
        {
            let mut cache = self.cache.lock();
            // Serve the cache unless the last attempt errored; an errored
            // entry means this call is the caller's explicit retry.
            if let Some(entry) = cache.entry(&key) {
                if entry.loading || entry.error.is_none() {
                    return QueryResult {
                        data: entry.data.and_then(|v| serde_json::from_value(v).ok()),
                        loading: entry.loading,
                        error: entry.error,
                    };
                }
            }
            if !cache.begin_fetch(&key) {
                return QueryResult::loading();
            }
        }

        let result = fetch().await;
        let mut cache = self.cache.lock();
        match result {
            Ok(items) => {
                match serde_json::to_value(&items) {
                    Ok(value) => cache.complete(&key, Ok(value)),
                    Err(e) => cache.complete(&key, Err(e.to_string())),
                }
                QueryResult {
                    data: Some(items),
                    loading: false,
                    error: None,
                }
            }
            Err(e) => {
                let stale = cache.data::<Vec<T>>(&key);
                cache.complete(&key, Err(e.to_string()));
                QueryResult {
                    data: stale,
                    loading: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
