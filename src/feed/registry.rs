use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::feed::coordinator::PlayerEffect;

/// Control surface of one mounted player. Both effects are idempotent.
pub trait PlayerHandle: Send + Sync {
    fn start(&self);
    fn pause(&self);
}

/// Handle backed by a shared flag, so whoever owns the other end of the
/// flag (the HTTP status surface, a test) can observe the desired state.
#[derive(Debug, Default)]
pub struct SharedPlayerHandle {
    playing: Arc<AtomicBool>,
}

impl SharedPlayerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.playing)
    }
}

impl PlayerHandle for SharedPlayerHandle {
    fn start(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }
}

/// Lookup table from video id to its mounted player.
///
/// The presentation side registers a handle when an item mounts and
/// removes it on unmount; the coordinator's effects are applied through
/// lookups only. An effect for an unmounted item is a no-op.
#[derive(Default)]
pub struct PlayerRegistry {
    handles: HashMap<String, Box<dyn PlayerHandle>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, video_id: impl Into<String>, handle: Box<dyn PlayerHandle>) {
        self.handles.insert(video_id.into(), handle);
    }

    pub fn unregister(&mut self, video_id: &str) {
        self.handles.remove(video_id);
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.handles.contains_key(video_id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn apply(&self, effects: &[PlayerEffect]) {
        for effect in effects {
            match self.handles.get(effect.video_id()) {
                Some(handle) => match effect {
                    PlayerEffect::Start(_) => handle.start(),
                    PlayerEffect::Pause(_) => handle.pause(),
                },
                None => debug!("No mounted player for {}", effect.video_id()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_effects_to_registered_handles() {
        let mut registry = PlayerRegistry::new();
        let a = SharedPlayerHandle::new();
        let b = SharedPlayerHandle::new();
        let a_flag = a.playing_flag();
        let b_flag = b.playing_flag();
        registry.register("a", Box::new(a));
        registry.register("b", Box::new(b));

        registry.apply(&[
            PlayerEffect::Start("a".into()),
            PlayerEffect::Pause("b".into()),
        ]);
        assert!(a_flag.load(Ordering::SeqCst));
        assert!(!b_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn missing_handle_is_a_noop() {
        let registry = PlayerRegistry::new();
        registry.apply(&[PlayerEffect::Start("ghost".into())]);
    }

    #[test]
    fn unregister_stops_future_effects() {
        let mut registry = PlayerRegistry::new();
        let handle = SharedPlayerHandle::new();
        let flag = handle.playing_flag();
        registry.register("a", Box::new(handle));
        registry.unregister("a");
        registry.apply(&[PlayerEffect::Start("a".into())]);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(registry.is_empty());
    }
}
