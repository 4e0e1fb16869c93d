use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::feed::coordinator::PlaybackCoordinator;
use crate::feed::registry::PlayerRegistry;
use crate::feed::service::FeedService;
use crate::remote::auth::AuthClient;

/// Everything the HTTP surface needs, shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Data layer: queries, mutations, and their cache
    pub feed: Arc<FeedService>,

    /// The playback-visibility coordinator and the mounted players it
    /// drives. Both are synchronous state; one lock covers each.
    pub coordinator: Arc<Mutex<PlaybackCoordinator>>,
    pub players: Arc<Mutex<PlayerRegistry>>,

    /// Observable side of each mounted player's handle, for /status
    pub playing_flags: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,

    pub auth: Arc<AuthClient>,
}

impl AppState {
    pub fn new(feed: FeedService, auth: AuthClient) -> Self {
        Self {
            feed: Arc::new(feed),
            coordinator: Arc::new(Mutex::new(PlaybackCoordinator::new())),
            players: Arc::new(Mutex::new(PlayerRegistry::new())),
            playing_flags: Arc::new(Mutex::new(HashMap::new())),
            auth: Arc::new(auth),
        }
    }
}
