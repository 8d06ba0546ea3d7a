use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporbpm::{cli, config, error, library::ItemKind};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[clap(about = "Authorize sporbpm with your Spotify account")]
    Auth,

    #[clap(about = "Forget the stored Spotify login")]
    Logout,

    Library(LibraryOptions),

    #[clap(about = "Show the tempo of the tracks behind album, playlist or track URIs")]
    Tempo(TempoOptions),

    #[clap(about = "Create a playlist from the tracks within a tempo range")]
    Playlist(PlaylistOptions),

    #[clap(about = "Resume playback, or play the given URIs")]
    Play(PlayOptions),

    Completions(CompletionsOption),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LibraryKind {
    Albums,
    Playlists,
    Tracks,
}

impl From<LibraryKind> for ItemKind {
    fn from(kind: LibraryKind) -> Self {
        match kind {
            LibraryKind::Albums => ItemKind::Album,
            LibraryKind::Playlists => ItemKind::Playlist,
            LibraryKind::Tracks => ItemKind::Track,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(about = "List saved albums, playlists or tracks")]
pub struct LibraryOptions {
    #[clap(value_enum)]
    pub kind: LibraryKind,

    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TempoOptions {
    #[clap(required = true)]
    pub uris: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistOptions {
    #[clap(long)]
    pub name: String,

    #[clap(long, default_value_t = 0)]
    pub min_bpm: u32,

    #[clap(long, default_value_t = 300)]
    pub max_bpm: u32,

    /// URI to leave out, may be repeated
    #[clap(long)]
    pub exclude: Vec<String>,

    #[clap(required = true)]
    pub uris: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    pub uris: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Library(opt) => cli::library(opt.kind.into(), opt.search).await,
        Command::Tempo(opt) => cli::tempo(opt.uris).await,
        Command::Playlist(opt) => {
            cli::playlist(opt.name, opt.min_bpm, opt.max_bpm, opt.uris, opt.exclude).await
        }
        Command::Play(opt) => cli::play(opt.uris).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
