/// One playback side effect to apply to a mounted player.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "video_id", rename_all = "snake_case")]
pub enum PlayerEffect {
    Start(String),
    Pause(String),
}

impl PlayerEffect {
    pub fn video_id(&self) -> &str {
        match self {
            PlayerEffect::Start(id) | PlayerEffect::Pause(id) => id,
        }
    }
}

/// Decides which single item of the feed is "current" and whether it
/// should be playing, from visibility reports alone.
///
/// The coordinator is synchronous and platform-agnostic: callers feed it
/// visibility changes from whatever event source they have (viewport
/// callback, intersection observer, polling) and apply the returned
/// effects to their own players.
#[derive(Debug)]
pub struct PlaybackCoordinator {
    /// Item ids in feed order (creation time descending upstream)
    items: Vec<String>,
    current_index: Option<usize>,
    /// One shared flag for the whole feed, not per item
    is_playing: bool,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            current_index: None,
            is_playing: true,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_video_id(&self) -> Option<&str> {
        self.current_index
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// Replace the item sequence after a data refresh.
    ///
    /// A fresh non-empty sequence starts at the first item, so the feed
    /// plays as soon as it loads, before any visibility report arrives.
    /// Otherwise the current index survives when the new sequence still
    /// covers it, is clamped when the sequence shrank, and is cleared
    /// when the sequence is empty. Returns a fresh synchronization pass
    /// since the caller's player handles may have been recreated.
    pub fn set_items(&mut self, items: Vec<String>) -> Vec<PlayerEffect> {
        self.items = items;
        self.current_index = match (self.current_index, self.items.len()) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), len) if i < len => Some(i),
            (Some(_), len) => Some(len - 1),
        };
        self.sync_effects()
    }

    /// Handle a visibility report from the viewport.
    ///
    /// Among the reported indices the lowest wins; with correct paging at
    /// most one item crosses the 50% threshold at a time, so this is only
    /// a tie-break for transient scroll states. An empty report leaves
    /// the current item unchanged.
    pub fn on_visibility_changed(&mut self, visible_indices: &[usize]) -> Vec<PlayerEffect> {
        let Some(&lowest) = visible_indices
            .iter()
            .filter(|&&i| i < self.items.len())
            .min()
        else {
            return Vec::new();
        };
        self.current_index = Some(lowest);
        self.sync_effects()
    }

    /// User intent: flip the shared playing flag, current index unchanged.
    pub fn toggle_playback(&mut self) -> Vec<PlayerEffect> {
        self.is_playing = !self.is_playing;
        self.sync_effects()
    }

    /// Full synchronization pass over the whole sequence: exactly the
    /// current item starts (when playing), every other item pauses.
    /// Idempotent, so re-running with unchanged state is harmless.
    pub fn sync_effects(&self) -> Vec<PlayerEffect> {
        let Some(current) = self.current_index else {
            return Vec::new();
        };
        self.items
            .iter()
            .enumerate()
            .map(|(index, id)| {
                if index == current && self.is_playing {
                    PlayerEffect::Start(id.clone())
                } else {
                    PlayerEffect::Pause(id.clone())
                }
            })
            .collect()
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(ids: &[&str]) -> PlaybackCoordinator {
        let mut c = PlaybackCoordinator::new();
        c.set_items(ids.iter().map(|s| s.to_string()).collect());
        c
    }

    fn starts(effects: &[PlayerEffect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                PlayerEffect::Start(id) => Some(id.as_str()),
                PlayerEffect::Pause(_) => None,
            })
            .collect()
    }

    #[test]
    fn initial_load_makes_first_item_current() {
        let mut c = PlaybackCoordinator::new();
        let effects = c.set_items(vec!["a".into(), "b".into()]);
        assert_eq!(c.current_index(), Some(0));
        assert_eq!(starts(&effects), vec!["a"]);
        assert!(effects.contains(&PlayerEffect::Pause("b".into())));
    }

    #[test]
    fn single_visible_index_becomes_current() {
        let mut c = coordinator(&["a", "b", "c"]);
        c.on_visibility_changed(&[2]);
        assert_eq!(c.current_index(), Some(2));
    }

    #[test]
    fn lowest_visible_index_wins() {
        let mut c = coordinator(&["a", "b", "c", "d"]);
        c.on_visibility_changed(&[3, 1, 2]);
        assert_eq!(c.current_index(), Some(1));
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut c = coordinator(&["a", "b"]);
        c.on_visibility_changed(&[5, 1]);
        assert_eq!(c.current_index(), Some(1));

        let effects = c.on_visibility_changed(&[9]);
        assert!(effects.is_empty());
        assert_eq!(c.current_index(), Some(1));
    }

    #[test]
    fn empty_report_leaves_current_unchanged() {
        let mut c = coordinator(&["a", "b"]);
        c.on_visibility_changed(&[0]);
        let effects = c.on_visibility_changed(&[]);
        assert!(effects.is_empty());
        assert_eq!(c.current_index(), Some(0));
    }

    #[test]
    fn sync_pass_is_idempotent() {
        let mut c = coordinator(&["a", "b", "c"]);
        let first = c.on_visibility_changed(&[1]);
        let second = c.sync_effects();
        let third = c.sync_effects();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn at_most_one_start_per_pass() {
        let mut c = coordinator(&["a", "b", "c", "d", "e"]);
        for report in [&[0usize][..], &[4, 2][..], &[1][..], &[3, 3][..]] {
            let effects = c.on_visibility_changed(report);
            assert!(starts(&effects).len() <= 1, "effects: {effects:?}");
        }
        c.toggle_playback();
        assert!(starts(&c.sync_effects()).is_empty());
    }

    #[test]
    fn toggle_on_empty_feed_is_a_noop() {
        let mut c = PlaybackCoordinator::new();
        assert!(c.toggle_playback().is_empty());
        assert_eq!(c.current_index(), None);
        assert!(!c.is_playing());
    }

    #[test]
    fn single_item_feed_plays_once_visible() {
        let mut c = coordinator(&["only"]);
        let effects = c.on_visibility_changed(&[0]);
        assert_eq!(effects, vec![PlayerEffect::Start("only".into())]);
    }

    // Feed [A, B, C]: B scrolls into view, then the user taps pause.
    #[test]
    fn scroll_then_toggle_scenario() {
        let mut c = coordinator(&["A", "B", "C"]);
        assert!(c.is_playing());

        let effects = c.on_visibility_changed(&[1]);
        assert_eq!(c.current_index(), Some(1));
        assert_eq!(effects.len(), 3);
        assert_eq!(starts(&effects), vec!["B"]);
        assert!(effects.contains(&PlayerEffect::Pause("A".into())));
        assert!(effects.contains(&PlayerEffect::Pause("C".into())));

        let effects = c.toggle_playback();
        assert_eq!(c.current_index(), Some(1));
        assert!(!c.is_playing());
        assert!(starts(&effects).is_empty());
        assert!(effects.contains(&PlayerEffect::Pause("B".into())));
    }

    #[test]
    fn rapid_reports_last_one_wins() {
        let mut c = coordinator(&["a", "b", "c"]);
        c.on_visibility_changed(&[0]);
        c.on_visibility_changed(&[1]);
        let effects = c.on_visibility_changed(&[2]);
        assert_eq!(c.current_index(), Some(2));
        assert_eq!(starts(&effects), vec!["c"]);
    }

    #[test]
    fn refresh_keeps_current_when_covered() {
        let mut c = coordinator(&["a", "b", "c"]);
        c.on_visibility_changed(&[1]);
        let effects = c.set_items(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(c.current_index(), Some(1));
        assert_eq!(starts(&effects), vec!["b"]);
    }

    #[test]
    fn refresh_clamps_or_clears_current() {
        let mut c = coordinator(&["a", "b", "c"]);
        c.on_visibility_changed(&[2]);

        c.set_items(vec!["a".into(), "b".into()]);
        assert_eq!(c.current_index(), Some(1));

        let effects = c.set_items(Vec::new());
        assert_eq!(c.current_index(), None);
        assert!(effects.is_empty());
    }
}
