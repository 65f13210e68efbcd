use chrono::{Local, LocalResult, TimeZone};
use serde::{Deserialize, Serialize};

/// One playable episode. `id` is globally unique across the whole catalog
/// and doubles as the persistence key for the episode's resume position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Episode {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) file: String,
    pub(crate) image: String,
    pub(crate) podcast_id: String,
    pub(crate) podcast_title: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
}

pub(crate) fn compose_episode_id(podcast_id: &str, episode_id: &str) -> String {
    format!("{podcast_id}-{episode_id}")
}

pub(crate) fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub(crate) fn format_saved_at_display(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(stamp) => stamp.format("%Y-%m-%d %H:%M").to_string(),
        _ => millis.to_string(),
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept = s.chars().take(max.saturating_sub(3)).collect::<String>();
    format!("{kept}...")
}
