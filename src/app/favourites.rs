use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::Storage;

const SNAPSHOT_KEY: &str = "favourites-storage";

/// A saved favourite. `uid` is the de-duplication key (podcast id plus
/// episode id); `id` is the episode id as the catalog reports it, which is
/// only unique within its show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FavouriteItem {
    pub(crate) uid: String,
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) image: String,
    pub(crate) podcast_id: String,
    pub(crate) file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) season_title: Option<String>,
    pub(crate) saved_at: i64,
}

/// Insertion payload for [`FavouritesStore::toggle_favourite`]. The save
/// timestamp is deliberately absent: the store assigns it.
#[derive(Debug, Clone)]
pub(crate) struct FavouriteDraft {
    pub(crate) uid: String,
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) image: String,
    pub(crate) podcast_id: String,
    pub(crate) file: String,
    pub(crate) season_title: Option<String>,
}

impl FavouriteDraft {
    fn saved(self, saved_at: i64) -> FavouriteItem {
        FavouriteItem {
            uid: self.uid,
            id: self.id,
            title: self.title,
            image: self.image,
            podcast_id: self.podcast_id,
            file: self.file,
            season_title: self.season_title,
            saved_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct FavouritesState {
    favourites: Vec<FavouriteItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortKey {
    SavedAt,
    Title,
}

pub(crate) fn sort_favourites(items: &mut [FavouriteItem], key: SortKey, ascending: bool) {
    match key {
        SortKey::Title => {
            items.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
        SortKey::SavedAt => items.sort_by_key(|item| item.saved_at),
    }
    if !ascending {
        items.reverse();
    }
}

/// The favourites collection: at most one entry per `uid`, insertion order
/// preserved. Storage failures are absorbed and recorded, never raised.
pub(crate) struct FavouritesStore<'a, S: Storage> {
    storage: &'a S,
    state: FavouritesState,
    warnings: Vec<String>,
}

impl<'a, S: Storage> FavouritesStore<'a, S> {
    pub(crate) fn hydrate(storage: &'a S) -> Self {
        let mut warnings = Vec::new();
        let state = match storage.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(err) => {
                    warnings.push(format!("discarding unreadable favourites snapshot: {err}"));
                    FavouritesState::default()
                }
            },
            Ok(None) => FavouritesState::default(),
            Err(err) => {
                warnings.push(format!("failed to load favourites snapshot: {err}"));
                FavouritesState::default()
            }
        };
        Self {
            storage,
            state,
            warnings,
        }
    }

    pub(crate) fn favourites(&self) -> &[FavouriteItem] {
        &self.state.favourites
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Removes the entry matching the draft's `uid` if present, otherwise
    /// inserts it stamped with the current time. Returns true when the item
    /// is now favourited.
    pub(crate) fn toggle_favourite(&mut self, item: FavouriteDraft) -> bool {
        let inserted = if self.is_favourite(&item.uid) {
            let uid = item.uid;
            self.state.favourites.retain(|fav| fav.uid != uid);
            false
        } else {
            let saved_at = Utc::now().timestamp_millis();
            self.state.favourites.push(item.saved(saved_at));
            true
        };
        self.persist_snapshot();
        inserted
    }

    pub(crate) fn is_favourite(&self, uid: &str) -> bool {
        self.state.favourites.iter().any(|fav| fav.uid == uid)
    }

    /// Removes the matching entry; absent uids are a silent no-op.
    pub(crate) fn remove_favourite(&mut self, uid: &str) -> bool {
        let before = self.state.favourites.len();
        self.state.favourites.retain(|fav| fav.uid != uid);
        let removed = self.state.favourites.len() != before;
        if removed {
            self.persist_snapshot();
        }
        removed
    }

    pub(crate) fn clear_favourites(&mut self) {
        self.state.favourites.clear();
        self.persist_snapshot();
    }

    fn persist_snapshot(&mut self) {
        match serde_json::to_string(&self.state) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(SNAPSHOT_KEY, &raw) {
                    self.warnings
                        .push(format!("failed to save favourites: {err}"));
                }
            }
            Err(err) => {
                self.warnings
                    .push(format!("failed to serialize favourites: {err}"));
            }
        }
    }
}
