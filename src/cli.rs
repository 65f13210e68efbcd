use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "podtrack",
    version,
    about = "Browse podcasts, track resumable playback and favourites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Shows {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        podcast_id: String,
    },
    Play {
        podcast_id: String,
        season: u32,
        episode: u32,
    },
    Queue {
        podcast_id: String,
        season: u32,
        #[arg(long, default_value_t = 1)]
        start: u32,
    },
    Next,
    Previous,
    Toggle,
    Stop,
    Seek {
        seconds: f64,
    },
    Volume {
        level: f64,
    },
    Mute,
    Unmute,
    ToggleMute,
    Status,
    #[command(subcommand)]
    Fav(FavCommand),
}

#[derive(Debug, Subcommand)]
pub enum FavCommand {
    Toggle {
        podcast_id: String,
        season: u32,
        episode: u32,
    },
    List {
        #[arg(long, value_enum, default_value = "date")]
        sort: FavSort,
        #[arg(long)]
        desc: bool,
    },
    Remove {
        uid: String,
    },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FavSort {
    Date,
    Title,
}
