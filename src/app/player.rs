use serde::{Deserialize, Serialize};

use super::episode::Episode;
use crate::db::Storage;

pub(crate) const DEFAULT_VOLUME: f64 = 0.75;

const SNAPSHOT_KEY: &str = "player-storage";

fn resume_key(episode_id: &str) -> String {
    format!("player-currentTime-{episode_id}")
}

/// The persistable subset of the player. Restored wholesale at construction,
/// written back after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerState {
    pub(crate) current_episode: Option<Episode>,
    pub(crate) playlist: Vec<Episode>,
    pub(crate) current_index: Option<usize>,
    pub(crate) is_playing: bool,
    pub(crate) volume: f64,
    pub(crate) muted: bool,
    pub(crate) current_time: f64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_episode: None,
            playlist: Vec::new(),
            current_index: None,
            is_playing: false,
            volume: DEFAULT_VOLUME,
            muted: false,
            current_time: 0.0,
        }
    }
}

// Zero volume and mute are coupled on the volume path only.
pub(crate) fn volume_transition(volume: f64) -> (f64, bool) {
    (volume, volume == 0.0)
}

// Muting overwrites the volume with zero. Unmuting brings back the stored
// volume, or the default when the stored volume is zero; there is no
// separate pre-mute volume slot.
pub(crate) fn mute_toggle_transition(muted: bool, volume: f64) -> (bool, f64) {
    if muted {
        let restored = if volume == 0.0 { DEFAULT_VOLUME } else { volume };
        (false, restored)
    } else {
        (true, 0.0)
    }
}

/// Owns the current episode, the ordered playlist, play/volume/mute flags,
/// and the per-episode resume position. Every transition into a new current
/// episode reloads that episode's saved position from storage, so switching
/// away and back never loses progress.
///
/// Storage failures never escape: state mutates in memory regardless, and
/// each absorbed failure is recorded for [`PlayerStore::take_warnings`].
pub(crate) struct PlayerStore<'a, S: Storage> {
    storage: &'a S,
    state: PlayerState,
    warnings: Vec<String>,
}

impl<'a, S: Storage> PlayerStore<'a, S> {
    /// Constructs the store already hydrated from its snapshot slot.
    pub(crate) fn hydrate(storage: &'a S) -> Self {
        let mut warnings = Vec::new();
        let state = match storage.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(err) => {
                    warnings.push(format!("discarding unreadable player snapshot: {err}"));
                    PlayerState::default()
                }
            },
            Ok(None) => PlayerState::default(),
            Err(err) => {
                warnings.push(format!("failed to load player snapshot: {err}"));
                PlayerState::default()
            }
        };
        Self {
            storage,
            state,
            warnings,
        }
    }

    pub(crate) fn state(&self) -> &PlayerState {
        &self.state
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Makes `episode` current and starts playback. A supplied playlist
    /// replaces the stored one; otherwise the playlist is kept and the index
    /// recomputed against it. The episode's saved position becomes the
    /// playback position.
    pub(crate) fn set_episode(&mut self, episode: Episode, playlist: Option<Vec<Episode>>) {
        if let Some(playlist) = playlist {
            self.state.playlist = playlist;
        }
        self.state.current_index = self
            .state
            .playlist
            .iter()
            .position(|candidate| candidate.id == episode.id);
        self.state.current_time = self.saved_time(&episode.id);
        self.state.current_episode = Some(episode);
        self.state.is_playing = true;
        self.persist_snapshot();
    }

    /// Replaces the playlist wholesale and starts from `start_index`. An
    /// out-of-range index selects nothing and leaves the player stopped.
    pub(crate) fn set_playlist(&mut self, episodes: Vec<Episode>, start_index: usize) {
        let start_episode = episodes.get(start_index).cloned();
        self.state.playlist = episodes;
        self.state.current_index = start_episode.is_some().then_some(start_index);
        self.state.current_time = match &start_episode {
            Some(episode) => self.saved_time(&episode.id),
            None => 0.0,
        };
        self.state.is_playing = start_episode.is_some();
        self.state.current_episode = start_episode;
        self.persist_snapshot();
    }

    pub(crate) fn play(&mut self, episode: Episode) {
        self.set_episode(episode, None);
    }

    /// Advances to the next playlist entry; a no-op at the last entry. With
    /// no current index (detached episode, fresh playlist) the first entry
    /// is next.
    pub(crate) fn play_next(&mut self) {
        let next_index = self.state.current_index.map_or(0, |index| index + 1);
        self.select_index(next_index);
    }

    // No-op at the first entry or when nothing from the playlist is current.
    pub(crate) fn play_previous(&mut self) {
        let Some(current) = self.state.current_index else {
            return;
        };
        let Some(prev_index) = current.checked_sub(1) else {
            return;
        };
        self.select_index(prev_index);
    }

    fn select_index(&mut self, index: usize) {
        let Some(episode) = self.state.playlist.get(index).cloned() else {
            return;
        };
        self.state.current_time = self.saved_time(&episode.id);
        self.state.current_episode = Some(episode);
        self.state.current_index = Some(index);
        self.state.is_playing = true;
        self.persist_snapshot();
    }

    pub(crate) fn toggle_play(&mut self) {
        self.state.is_playing = !self.state.is_playing;
        self.persist_snapshot();
    }

    pub(crate) fn stop(&mut self) {
        self.state.is_playing = false;
        self.persist_snapshot();
    }

    /// Stores the volume as given; range clamping is the caller's job.
    pub(crate) fn set_volume(&mut self, volume: f64) {
        let (volume, muted) = volume_transition(volume);
        self.state.volume = volume;
        self.state.muted = muted;
        self.persist_snapshot();
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
        self.persist_snapshot();
    }

    pub(crate) fn toggle_mute(&mut self) {
        let (muted, volume) = mute_toggle_transition(self.state.muted, self.state.volume);
        self.state.muted = muted;
        self.state.volume = volume;
        self.persist_snapshot();
    }

    /// Records the playback position. The in-memory position always updates;
    /// the durable per-episode write is best-effort.
    pub(crate) fn set_current_time(&mut self, seconds: f64) {
        self.state.current_time = seconds;
        if let Some(episode) = &self.state.current_episode {
            let key = resume_key(&episode.id);
            if let Err(err) = self.storage.set(&key, &seconds.to_string()) {
                self.warnings.push(format!(
                    "failed to save playback position for {}: {err}",
                    episode.id
                ));
            }
        }
        self.persist_snapshot();
    }

    fn saved_time(&mut self, episode_id: &str) -> f64 {
        match self.storage.get(&resume_key(episode_id)) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(seconds) if seconds.is_finite() => seconds,
                _ => {
                    self.warnings
                        .push(format!("ignoring unreadable saved position for {episode_id}"));
                    0.0
                }
            },
            Ok(None) => 0.0,
            Err(err) => {
                self.warnings.push(format!(
                    "failed to read saved position for {episode_id}: {err}"
                ));
                0.0
            }
        }
    }

    fn persist_snapshot(&mut self) {
        match serde_json::to_string(&self.state) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(SNAPSHOT_KEY, &raw) {
                    self.warnings
                        .push(format!("failed to save player state: {err}"));
                }
            }
            Err(err) => {
                self.warnings
                    .push(format!("failed to serialize player state: {err}"));
            }
        }
    }
}
