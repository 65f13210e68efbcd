mod catalog;
mod episode;
mod favourites;
mod player;


use anyhow::{Result, anyhow};

use crate::cli::{Cli, Command, FavCommand, FavSort};
use crate::db::{Database, Storage};
use crate::http::FetchConfig;
use crate::paths::database_file_path;

use self::episode::{compose_episode_id, format_position, format_saved_at_display, truncate};
use self::favourites::{FavouritesStore, SortKey, sort_favourites};
use self::player::{PlayerState, PlayerStore};

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;
    let mut player = PlayerStore::hydrate(&db);
    let mut favourites = FavouritesStore::hydrate(&db);

    match cli.command {
        Some(Command::Shows { genre, search }) => run_shows(genre.as_deref(), search.as_deref())?,
        Some(Command::Show { podcast_id }) => run_show(&podcast_id, &favourites)?,
        Some(Command::Play {
            podcast_id,
            season,
            episode,
        }) => run_play(&mut player, &podcast_id, season, episode)?,
        Some(Command::Queue {
            podcast_id,
            season,
            start,
        }) => run_queue(&mut player, &podcast_id, season, start)?,
        Some(Command::Next) => run_next(&mut player),
        Some(Command::Previous) => run_previous(&mut player),
        Some(Command::Toggle) => run_toggle(&mut player),
        Some(Command::Stop) => run_stop(&mut player),
        Some(Command::Seek { seconds }) => run_seek(&mut player, seconds),
        Some(Command::Volume { level }) => run_volume(&mut player, level)?,
        Some(Command::Mute) => run_set_muted(&mut player, true),
        Some(Command::Unmute) => run_set_muted(&mut player, false),
        Some(Command::ToggleMute) => run_toggle_mute(&mut player),
        Some(Command::Fav(command)) => run_fav(&mut favourites, command)?,
        Some(Command::Status) | None => run_status(&player, &favourites),
    }

    emit_warnings(&player.take_warnings());
    emit_warnings(&favourites.take_warnings());
    Ok(())
}

fn run_shows(genre: Option<&str>, search: Option<&str>) -> Result<()> {
    let config = FetchConfig::default();
    let shows = catalog::fetch_shows(&config)?;

    let allowed_ids = match genre {
        Some(name) => {
            let genre_id = catalog::genre_id_by_name(name).ok_or_else(|| {
                let known = catalog::GENRES
                    .iter()
                    .map(|(_, name)| *name)
                    .collect::<Vec<_>>()
                    .join(", ");
                anyhow!("unknown genre {name:?}; known genres: {known}")
            })?;
            Some(catalog::fetch_genre_show_ids(genre_id, &config)?)
        }
        None => None,
    };

    let shows = catalog::filter_shows(shows, allowed_ids.as_deref(), search);
    if shows.is_empty() {
        println!("No shows matched.");
        return Ok(());
    }

    println!(
        "{:<12} {:<44} {:<8} {:<24} {:<12}",
        "ID", "TITLE", "SEASONS", "GENRES", "UPDATED"
    );
    for show in &shows {
        let genres = show
            .genres
            .iter()
            .filter_map(|id| catalog::genre_name(*id))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<12} {:<44} {:<8} {:<24} {:<12}",
            truncate(&show.id, 12),
            truncate(&show.title, 44),
            show.seasons,
            truncate(&genres, 24),
            date_only(&show.updated)
        );
    }
    println!("{} show(s)", shows.len());
    Ok(())
}

fn run_show<S: Storage>(podcast_id: &str, favourites: &FavouritesStore<'_, S>) -> Result<()> {
    let show = catalog::fetch_show_detail(podcast_id, &FetchConfig::default())?;

    println!("{} ({})", show.title, show.id);
    if !show.genres.is_empty() {
        println!("Genres: {}", show.genres.join(", "));
    }
    println!("Updated: {}", date_only(&show.updated));
    println!("{}", show.description);

    for season in &show.seasons {
        println!();
        println!("{} - {} episode(s)", season.title, season.episodes.len());
        for record in &season.episodes {
            let uid = compose_episode_id(&show.id, &record.id);
            let marker = if favourites.is_favourite(&uid) {
                "*"
            } else {
                " "
            };
            println!(
                "  {marker} {:>3}. {}",
                record.episode,
                truncate(&record.title, 60)
            );
        }
    }
    Ok(())
}

fn run_play<S: Storage>(
    player: &mut PlayerStore<'_, S>,
    podcast_id: &str,
    season: u32,
    episode: u32,
) -> Result<()> {
    let show = catalog::fetch_show_detail(podcast_id, &FetchConfig::default())?;
    let playlist = catalog::build_season_playlist(&show, season)
        .ok_or_else(|| anyhow!("{} has no season {season}", show.title))?;
    let chosen = playlist
        .iter()
        .find(|entry| entry.episode == episode)
        .cloned()
        .ok_or_else(|| anyhow!("{} season {season} has no episode {episode}", show.title))?;

    player.set_episode(chosen, Some(playlist));
    report_now_playing(player.state());
    Ok(())
}

fn run_queue<S: Storage>(
    player: &mut PlayerStore<'_, S>,
    podcast_id: &str,
    season: u32,
    start: u32,
) -> Result<()> {
    if start == 0 {
        return Err(anyhow!("episode positions are 1-based"));
    }
    let show = catalog::fetch_show_detail(podcast_id, &FetchConfig::default())?;
    let playlist = catalog::build_season_playlist(&show, season)
        .ok_or_else(|| anyhow!("{} has no season {season}", show.title))?;
    let count = playlist.len();

    player.set_playlist(playlist, (start - 1) as usize);
    if player.state().current_episode.is_some() {
        println!("Queued {count} episode(s) from {}.", show.title);
        report_now_playing(player.state());
    } else {
        println!(
            "Queued {count} episode(s) from {}; start position {start} is out of range, nothing selected.",
            show.title
        );
    }
    Ok(())
}

fn run_next<S: Storage>(player: &mut PlayerStore<'_, S>) {
    if player.state().playlist.is_empty() {
        println!("The playlist is empty. Use `podtrack queue` first.");
        return;
    }
    let before = player.state().current_index;
    player.play_next();
    if player.state().current_index == before {
        println!("Already at the last episode of the playlist.");
    } else {
        report_now_playing(player.state());
    }
}

fn run_previous<S: Storage>(player: &mut PlayerStore<'_, S>) {
    if player.state().playlist.is_empty() {
        println!("The playlist is empty. Use `podtrack queue` first.");
        return;
    }
    let before = player.state().current_index;
    player.play_previous();
    if player.state().current_index == before {
        println!("Already at the first episode of the playlist.");
    } else {
        report_now_playing(player.state());
    }
}

fn run_toggle<S: Storage>(player: &mut PlayerStore<'_, S>) {
    if player.state().current_episode.is_none() {
        println!("Nothing is queued. Use `podtrack play` first.");
        return;
    }
    player.toggle_play();
    if player.state().is_playing {
        println!("Playing.");
    } else {
        println!("Paused.");
    }
}

fn run_stop<S: Storage>(player: &mut PlayerStore<'_, S>) {
    player.stop();
    println!("Stopped. The position is kept for resume.");
}

fn run_seek<S: Storage>(player: &mut PlayerStore<'_, S>, seconds: f64) {
    let Some(episode_id) = player
        .state()
        .current_episode
        .as_ref()
        .map(|episode| episode.id.clone())
    else {
        println!("Nothing is playing; no position to record.");
        return;
    };
    player.set_current_time(seconds.max(0.0));
    println!(
        "Saved position {} for {episode_id}.",
        format_position(player.state().current_time)
    );
}

fn run_volume<S: Storage>(player: &mut PlayerStore<'_, S>, level: f64) -> Result<()> {
    if !level.is_finite() || !(0.0..=1.0).contains(&level) {
        return Err(anyhow!("volume must be between 0 and 1"));
    }
    player.set_volume(level);
    report_volume(player.state());
    Ok(())
}

fn run_set_muted<S: Storage>(player: &mut PlayerStore<'_, S>, muted: bool) {
    player.set_muted(muted);
    report_volume(player.state());
}

fn run_toggle_mute<S: Storage>(player: &mut PlayerStore<'_, S>) {
    player.toggle_mute();
    report_volume(player.state());
}

fn run_status<S: Storage>(player: &PlayerStore<'_, S>, favourites: &FavouritesStore<'_, S>) {
    let state = player.state();
    match &state.current_episode {
        Some(episode) => {
            let verb = if state.is_playing { "Playing" } else { "Paused" };
            println!(
                "{verb}: {} - S{:02}E{:02} {}",
                episode.podcast_title, episode.season, episode.episode, episode.title
            );
            println!("Position: {}", format_position(state.current_time));
            match state.current_index {
                Some(index) => {
                    println!("Playlist: episode {} of {}", index + 1, state.playlist.len());
                }
                None => println!(
                    "Playlist: current episode is not queued ({} queued)",
                    state.playlist.len()
                ),
            }
        }
        None => println!("Nothing is playing."),
    }
    report_volume(state);
    println!("Favourites: {}", favourites.favourites().len());
}

fn run_fav<S: Storage>(favourites: &mut FavouritesStore<'_, S>, command: FavCommand) -> Result<()> {
    match command {
        FavCommand::Toggle {
            podcast_id,
            season,
            episode,
        } => {
            let show = catalog::fetch_show_detail(&podcast_id, &FetchConfig::default())?;
            let (season_record, record) =
                catalog::find_episode(&show, season, episode).ok_or_else(|| {
                    anyhow!("{} has no season {season} episode {episode}", show.title)
                })?;
            let draft = catalog::favourite_draft(&show, season_record, record);
            let title = record.title.clone();
            if favourites.toggle_favourite(draft) {
                println!("Added favourite: {title}");
            } else {
                println!("Removed favourite: {title}");
            }
        }
        FavCommand::List { sort, desc } => {
            let mut items = favourites.favourites().to_vec();
            if items.is_empty() {
                println!("No favourites yet.");
                return Ok(());
            }
            let key = match sort {
                FavSort::Date => SortKey::SavedAt,
                FavSort::Title => SortKey::Title,
            };
            sort_favourites(&mut items, key, !desc);

            println!("{:<28} {:<40} {:<16} {:<18}", "UID", "TITLE", "SEASON", "SAVED");
            for item in &items {
                println!(
                    "{:<28} {:<40} {:<16} {:<18}",
                    truncate(&item.uid, 28),
                    truncate(&item.title, 40),
                    truncate(item.season_title.as_deref().unwrap_or("-"), 16),
                    format_saved_at_display(item.saved_at)
                );
            }
        }
        FavCommand::Remove { uid } => {
            if favourites.remove_favourite(&uid) {
                println!("Removed favourite {uid}.");
            } else {
                println!("No favourite with uid {uid}.");
            }
        }
        FavCommand::Clear => {
            let count = favourites.favourites().len();
            favourites.clear_favourites();
            println!("Cleared {count} favourite(s).");
        }
    }
    Ok(())
}

fn report_now_playing(state: &PlayerState) {
    let Some(episode) = &state.current_episode else {
        println!("Nothing selected.");
        return;
    };
    println!(
        "Now playing: {} - S{:02}E{:02} {}",
        episode.podcast_title, episode.season, episode.episode, episode.title
    );
    if state.current_time > 0.0 {
        println!("Resuming at {}", format_position(state.current_time));
    }
    println!("Audio: {}", episode.file);
}

fn report_volume(state: &PlayerState) {
    let percent = (state.volume * 100.0).round() as u32;
    if state.muted {
        println!("Volume {percent}% (muted)");
    } else {
        println!("Volume {percent}%");
    }
}

fn date_only(raw: &str) -> &str {
    match raw.find('T') {
        Some(index) => &raw[..index],
        None => raw,
    }
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

fn emit_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }
}
