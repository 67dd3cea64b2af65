mod catalog;
mod config;
mod notes;
mod palette;
mod storage;

use anyhow::Context;
use catalog::{AlbumDetails, ItunesClient, SearchType, Track};
use clap::{Parser, Subcommand};
use notes::{LinerNotes, NotesClient};
use palette::{AccentColor, ImageSource, PaletteExtractor};
use serde::Serialize;
use storage::Storage;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sleevd", version, about = "Album artwork palettes, tracklists and liner notes")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search, then show palette, tracklist and liner notes for the match.
    Lookup {
        query: String,
        /// Search albums instead of songs.
        #[arg(long)]
        album: bool,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the best catalog match for a query.
    Search {
        query: String,
        #[arg(long)]
        album: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the tracklist of an album by collection id.
    Album { collection_id: u64 },
    /// Extract accent colors from an image URL or file (`-` reads stdin).
    Palette {
        source: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate liner notes for the best match of a query.
    Notes {
        query: String,
        #[arg(long)]
        album: bool,
    },
    /// Manage the Gemini API key stored in the config file.
    Key {
        #[command(subcommand)]
        cmd: KeyCommand,
    },
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    /// Store an API key.
    Set { api_key: String },
    /// Remove the stored API key.
    Clear,
}

#[derive(Debug, Serialize)]
struct Lookup {
    track: Track,
    palette: Vec<AccentColor>,
    /// True when extraction came back empty and the default accents were used.
    default_palette: bool,
    accent_text: &'static str,
    album: Option<AlbumDetails>,
    notes: LinerNotes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Lookup { query, album, json } => {
            let store = open_storage(&cfg);
            let kind = search_type(album);
            let Some(track) = find_track(&cfg, store.as_ref(), &query, kind).await? else {
                println!("No match found in archives.");
                return Ok(());
            };

            let extractor = PaletteExtractor::new(&cfg.palette)?;
            let itunes = ItunesClient::new(&cfg.catalog.base_url)?;
            let notes = NotesClient::new(&cfg.notes)?;

            let (palette, album, notes) = tokio::join!(
                track_palette(&extractor, store.as_ref(), &track.high_res_artwork),
                async {
                    match track.collection_id {
                        Some(id) => itunes.album(id).await,
                        None => None,
                    }
                },
                notes.liner_notes(&track),
            );

            let default_palette = palette.is_empty();
            let palette = if default_palette {
                palette::default_accents()
            } else {
                palette
            };
            let lookup = Lookup {
                accent_text: palette::contrast_color(&palette[0].value),
                track,
                palette,
                default_palette,
                album,
                notes,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else {
                print_lookup(&lookup);
            }
        }
        Command::Search { query, album, json } => {
            let store = open_storage(&cfg);
            match find_track(&cfg, store.as_ref(), &query, search_type(album)).await? {
                Some(track) if json => println!("{}", serde_json::to_string_pretty(&track)?),
                Some(track) => print_track(&track),
                None => println!("No match found in archives."),
            }
        }
        Command::Album { collection_id } => {
            let itunes = ItunesClient::new(&cfg.catalog.base_url)?;
            match itunes.album(collection_id).await {
                Some(album) => print_album(&album),
                None => println!("No album details available."),
            }
        }
        Command::Palette { source, json } => {
            let extractor = PaletteExtractor::new(&cfg.palette)?;
            let source = if source == "-" {
                let mut bytes = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut bytes)
                    .await
                    .context("read image from stdin")?;
                ImageSource::Bytes(bytes)
            } else {
                ImageSource::parse(&source)
            };
            let accents = extractor.extract(&source).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&accents)?);
            } else if accents.is_empty() {
                println!("No usable colors found.");
            } else {
                print_palette(&accents);
            }
        }
        Command::Notes { query, album } => {
            let store = open_storage(&cfg);
            let Some(track) = find_track(&cfg, store.as_ref(), &query, search_type(album)).await?
            else {
                println!("No match found in archives.");
                return Ok(());
            };
            let notes = NotesClient::new(&cfg.notes)?.liner_notes(&track).await;
            print_notes(&notes);
        }
        Command::Key { cmd } => {
            let mut cfg = cfg;
            match cmd {
                KeyCommand::Set { api_key } => {
                    cfg.notes.api_key = Some(api_key);
                    config::save(&cfg, cli.config.as_deref()).context("save config")?;
                    println!("Updated API key in config.");
                }
                KeyCommand::Clear => {
                    cfg.notes.api_key = None;
                    config::save(&cfg, cli.config.as_deref()).context("save config")?;
                    println!("Cleared API key.");
                }
            }
        }
    }

    Ok(())
}

fn search_type(album: bool) -> SearchType {
    if album {
        SearchType::Album
    } else {
        SearchType::Song
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// The cache is optional; a broken database only costs extra requests.
fn open_storage(cfg: &config::Config) -> Option<Storage> {
    let path = cfg.paths.database();
    match Storage::open(&path, cfg.storage.max_age_secs) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("cache disabled: {e:#}");
            None
        }
    }
}

async fn find_track(
    cfg: &config::Config,
    store: Option<&Storage>,
    query: &str,
    kind: SearchType,
) -> anyhow::Result<Option<Track>> {
    let now = now_unix();
    if let Some(s) = store
        && let Ok(Some(track)) = s.get_cached_search(query, kind, now)
    {
        tracing::debug!(query, "search cache hit");
        return Ok(Some(track));
    }

    let itunes = ItunesClient::new(&cfg.catalog.base_url)?;
    let found = itunes.search(query, kind).await?;
    if let (Some(s), Some(track)) = (store, &found)
        && let Err(e) = s.cache_search(query, kind, track, now)
    {
        tracing::warn!("failed to cache search: {e:#}");
    }
    Ok(found)
}

async fn track_palette(
    extractor: &PaletteExtractor,
    store: Option<&Storage>,
    artwork: &str,
) -> Vec<AccentColor> {
    if artwork.is_empty() {
        return Vec::new();
    }
    let now = now_unix();
    if let Some(s) = store
        && let Ok(Some(cached)) = s.get_palette(artwork, now)
    {
        return cached;
    }

    let accents = extractor.extract(&ImageSource::parse(artwork)).await;
    if let Some(s) = store
        && let Err(e) = s.cache_palette(artwork, &accents, now)
    {
        tracing::warn!("failed to cache palette: {e:#}");
    }
    accents
}

fn print_track(t: &Track) {
    println!("{} — {}", t.track_name, t.artist_name);
    if !t.collection_name.is_empty() {
        println!("  album:   {}", t.collection_name);
    }
    if let Some(genre) = &t.primary_genre_name {
        println!("  genre:   {genre}");
    }
    if let Some(date) = &t.release_date {
        println!("  release: {}", date.get(..10).unwrap_or(date));
    }
    if let Some(id) = t.collection_id {
        println!("  collection_id={id}");
    }
    if !t.high_res_artwork.is_empty() {
        println!("  artwork: {}", t.high_res_artwork);
    }
}

fn print_palette(accents: &[AccentColor]) {
    for a in accents {
        println!("{}  {:<16} text {}", a.value, a.name, palette::contrast_color(&a.value));
    }
}

fn print_album(album: &AlbumDetails) {
    println!("{} tracks", album.track_count);
    for t in &album.tracks {
        println!(
            "{}-{:02}. {}",
            t.disc_number.unwrap_or(1),
            t.track_number.unwrap_or(0),
            t.track_name
        );
    }
    if !album.copyright.is_empty() {
        println!("{}", album.copyright);
    }
}

fn print_notes(notes: &LinerNotes) {
    println!("{}", notes.fact);
    println!("mood: {}", notes.mood);
    if !notes.similar_artists.is_empty() {
        println!("similar: {}", notes.similar_artists.join(", "));
    }
}

fn print_lookup(l: &Lookup) {
    print_track(&l.track);
    println!();
    if l.default_palette {
        println!("palette (default):");
    } else {
        println!("palette:");
    }
    print_palette(&l.palette);
    println!();
    if let Some(album) = &l.album {
        print_album(album);
        println!();
    }
    print_notes(&l.notes);
}
