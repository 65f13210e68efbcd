use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::episode::{Episode, compose_episode_id};
use super::favourites::FavouriteDraft;
use crate::http::{FetchConfig, get_text_with_retries};

const SHOWS_URL: &str = "https://podcast-api.netlify.app/";
const GENRE_URL_BASE: &str = "https://podcast-api.netlify.app/genre/";
const SHOW_URL_BASE: &str = "https://podcast-api.netlify.app/id/";
const PLACEHOLDER_AUDIO_URL: &str = "https://podcast-api.netlify.app/placeholder-audio.mp3";

const UNTITLED_PODCAST: &str = "Untitled Podcast";
const UNTITLED_EPISODE: &str = "Untitled Episode";

// The catalog's fixed genre table; the API only ever reports these ids.
pub(crate) const GENRES: [(u32, &str); 9] = [
    (1, "Personal Growth"),
    (2, "Investigative Journalism"),
    (3, "History"),
    (4, "Comedy"),
    (5, "Entertainment"),
    (6, "Business"),
    (7, "Fiction"),
    (8, "News"),
    (9, "Kids and Family"),
];

pub(crate) fn genre_id_by_name(name: &str) -> Option<u32> {
    let target = name.trim().to_lowercase();
    GENRES
        .iter()
        .find(|(_, genre)| genre.to_lowercase() == target)
        .map(|(id, _)| *id)
}

pub(crate) fn genre_name(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone)]
pub(crate) struct ShowSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) genres: Vec<u32>,
    pub(crate) seasons: u32,
    pub(crate) updated: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ShowDetail {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) image: String,
    pub(crate) updated: String,
    pub(crate) genres: Vec<String>,
    pub(crate) seasons: Vec<Season>,
}

#[derive(Debug, Clone)]
pub(crate) struct Season {
    pub(crate) season: u32,
    pub(crate) title: String,
    pub(crate) image: String,
    pub(crate) episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Clone)]
pub(crate) struct EpisodeRecord {
    pub(crate) id: String,
    pub(crate) episode: u32,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) file: String,
}

pub(crate) fn fetch_shows(config: &FetchConfig) -> Result<Vec<ShowSummary>> {
    let raw = get_text_with_retries(SHOWS_URL, &[], config)
        .map_err(|err| anyhow!("failed to fetch show list: {err}"))?;
    parse_shows(&raw)
}

pub(crate) fn fetch_genre_show_ids(genre_id: u32, config: &FetchConfig) -> Result<Vec<String>> {
    let url = format!("{GENRE_URL_BASE}{genre_id}");
    let raw = get_text_with_retries(&url, &[], config)
        .map_err(|err| anyhow!("failed to fetch genre {genre_id}: {err}"))?;
    parse_genre_show_ids(&raw)
}

pub(crate) fn fetch_show_detail(podcast_id: &str, config: &FetchConfig) -> Result<ShowDetail> {
    let url = format!("{SHOW_URL_BASE}{podcast_id}");
    let raw = get_text_with_retries(&url, &[], config)
        .map_err(|err| anyhow!("failed to fetch show {podcast_id}: {err}"))?;
    parse_show_detail(&raw)
}

pub(crate) fn parse_shows(raw: &str) -> Result<Vec<ShowSummary>> {
    let parsed: Value = serde_json::from_str(raw).context("show list was not valid JSON")?;
    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow!("show list was not a JSON array"))?;
    Ok(items.iter().filter_map(parse_show_summary).collect())
}

fn parse_show_summary(item: &Value) -> Option<ShowSummary> {
    // Records without an id cannot be fetched or favourited; skip them.
    let id = string_field(item, "id")?;
    Some(ShowSummary {
        id,
        title: string_field(item, "title").unwrap_or_else(|| UNTITLED_PODCAST.to_string()),
        description: string_field(item, "description").unwrap_or_default(),
        genres: item
            .get("genres")
            .and_then(Value::as_array)
            .map(|genres| {
                genres
                    .iter()
                    .filter_map(Value::as_u64)
                    .map(|id| id as u32)
                    .collect()
            })
            .unwrap_or_default(),
        seasons: item.get("seasons").and_then(Value::as_u64).unwrap_or(0) as u32,
        updated: string_field(item, "updated").unwrap_or_else(|| "N/A".to_string()),
    })
}

pub(crate) fn parse_genre_show_ids(raw: &str) -> Result<Vec<String>> {
    let parsed: Value = serde_json::from_str(raw).context("genre detail was not valid JSON")?;
    let ids = parsed
        .get("shows")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("genre detail carried no show list"))?;
    Ok(ids.iter().filter_map(value_to_string).collect())
}

pub(crate) fn parse_show_detail(raw: &str) -> Result<ShowDetail> {
    let parsed: Value = serde_json::from_str(raw).context("show detail was not valid JSON")?;
    let id = string_field(&parsed, "id").ok_or_else(|| anyhow!("show detail carried no id"))?;

    let image = string_field(&parsed, "image").unwrap_or_default();
    let seasons = parsed
        .get("seasons")
        .and_then(Value::as_array)
        .map(|seasons| {
            seasons
                .iter()
                .enumerate()
                .map(|(index, season)| parse_season(season, index))
                .collect()
        })
        .unwrap_or_default();

    Ok(ShowDetail {
        id,
        title: string_field(&parsed, "title").unwrap_or_else(|| UNTITLED_PODCAST.to_string()),
        description: string_field(&parsed, "description")
            .unwrap_or_else(|| "No description available.".to_string()),
        image,
        updated: string_field(&parsed, "updated").unwrap_or_else(|| "N/A".to_string()),
        genres: parsed
            .get("genres")
            .and_then(Value::as_array)
            .map(|genres| genres.iter().filter_map(value_to_string).collect())
            .unwrap_or_default(),
        seasons,
    })
}

// Every missing field is defaulted here so no malformed record ever reaches
// the player or favourites stores.
fn parse_season(season: &Value, index: usize) -> Season {
    let number = season
        .get("season")
        .and_then(Value::as_u64)
        .unwrap_or(index as u64 + 1) as u32;
    let episodes = season
        .get("episodes")
        .and_then(Value::as_array)
        .map(|episodes| {
            episodes
                .iter()
                .enumerate()
                .map(|(position, episode)| parse_episode_record(episode, number, position))
                .collect()
        })
        .unwrap_or_default();

    Season {
        season: number,
        title: string_field(season, "title").unwrap_or_else(|| format!("Season {number}")),
        image: string_field(season, "image").unwrap_or_default(),
        episodes,
    }
}

fn parse_episode_record(episode: &Value, season_number: u32, position: usize) -> EpisodeRecord {
    EpisodeRecord {
        id: string_field(episode, "id").unwrap_or_else(|| format!("{season_number}-{position}")),
        episode: episode
            .get("episode")
            .and_then(Value::as_u64)
            .unwrap_or(position as u64 + 1) as u32,
        title: string_field(episode, "title").unwrap_or_else(|| UNTITLED_EPISODE.to_string()),
        description: string_field(episode, "description")
            .unwrap_or_else(|| "No description.".to_string()),
        file: string_field(episode, "file").unwrap_or_else(|| PLACEHOLDER_AUDIO_URL.to_string()),
    }
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    value_to_string(item.get(key)?)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn find_season(show: &ShowDetail, season_number: u32) -> Option<&Season> {
    show.seasons
        .iter()
        .find(|season| season.season == season_number)
}

pub(crate) fn find_episode(
    show: &ShowDetail,
    season_number: u32,
    episode_number: u32,
) -> Option<(&Season, &EpisodeRecord)> {
    let season = find_season(show, season_number)?;
    let record = season
        .episodes
        .iter()
        .find(|record| record.episode == episode_number)?;
    Some((season, record))
}

/// Composes the playable episodes of one season, with the season image
/// falling back to the show image.
pub(crate) fn build_season_playlist(show: &ShowDetail, season_number: u32) -> Option<Vec<Episode>> {
    let season = find_season(show, season_number)?;
    let image = season_image(show, season);
    Some(
        season
            .episodes
            .iter()
            .map(|record| Episode {
                id: compose_episode_id(&show.id, &record.id),
                title: record.title.clone(),
                file: record.file.clone(),
                image: image.clone(),
                podcast_id: show.id.clone(),
                podcast_title: show.title.clone(),
                season: season.season,
                episode: record.episode,
                description: Some(record.description.clone()),
            })
            .collect(),
    )
}

pub(crate) fn favourite_draft(
    show: &ShowDetail,
    season: &Season,
    record: &EpisodeRecord,
) -> FavouriteDraft {
    FavouriteDraft {
        uid: compose_episode_id(&show.id, &record.id),
        id: record.id.clone(),
        title: record.title.clone(),
        image: season_image(show, season),
        podcast_id: show.id.clone(),
        file: record.file.clone(),
        season_title: Some(season.title.clone()),
    }
}

fn season_image(show: &ShowDetail, season: &Season) -> String {
    if season.image.is_empty() {
        show.image.clone()
    } else {
        season.image.clone()
    }
}

pub(crate) fn filter_shows(
    shows: Vec<ShowSummary>,
    allowed_ids: Option<&[String]>,
    search: Option<&str>,
) -> Vec<ShowSummary> {
    let needle = search.map(str::to_lowercase);
    shows
        .into_iter()
        .filter(|show| allowed_ids.is_none_or(|ids| ids.iter().any(|id| id == &show.id)))
        .filter(|show| {
            needle.as_deref().is_none_or(|needle| {
                show.title.to_lowercase().contains(needle)
                    || show.description.to_lowercase().contains(needle)
            })
        })
        .collect()
}
