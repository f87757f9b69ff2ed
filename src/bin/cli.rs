// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use librisync_prefs::settings::keys::ALL_KEYS;
use librisync_prefs::settings::models::MARKET_ID_FIELD;
use librisync_prefs::{
    Background, BackendKind, KeyValueStore, LibraryBook, SettingsStore, StoreConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "librisync-prefs")]
#[command(about = "LibriSync preferences - inspect and edit a settings store", long_about = None)]
struct Cli {
    /// Storage backend (defaults to LIBRISYNC_PREFS_BACKEND, then json)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Store location (defaults to LIBRISYNC_PREFS_PATH, then the platform data dir)
    #[arg(short, long)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Json,
    Sqlite,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Json => BackendKind::JsonFile,
            BackendArg::Sqlite => BackendKind::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print every preference (defaults filled in)
    Show {
        /// Dump the raw stored values instead
        #[arg(long)]
        raw: bool,
    },
    /// Save one preference
    Set {
        #[arg(value_enum)]
        field: Field,
        /// New value; for background use NAME:COLOR
        value: String,
    },
    /// Show or overwrite the reading-time counter
    ReadingTime {
        /// New absolute total, in seconds
        #[arg(long)]
        set: Option<u64>,
    },
    /// Manage saved books
    Library {
        #[command(subcommand)]
        command: LibraryCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Field {
    Volume,
    Voice,
    FontSize,
    Speed,
    Background,
    ListeningMode,
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// List saved books
    List,
    /// Add a book unless it is already saved
    Add {
        market_id: String,
        /// Extra field as KEY=VALUE (VALUE parsed as JSON when possible)
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },
    /// Replace a saved book
    Update {
        market_id: String,
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },
    /// Remove a saved book
    Remove { market_id: String },
    /// Check whether a book is saved
    Contains { market_id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = StoreConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(path) = cli.path {
        config.path = Some(path);
    }

    let storage = config.open_storage().with_context(|| {
        format!(
            "opening {} store at {:?}",
            config.backend,
            config.resolved_path()
        )
    })?;
    let store = SettingsStore::new(storage);

    match cli.command {
        Commands::Show { raw } => {
            if raw {
                let mut dump = serde_json::Map::new();
                for key in ALL_KEYS {
                    if let Some(value) = store.storage().get(key)? {
                        dump.insert(key.to_string(), value);
                    }
                }
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&store.get_settings())?);
            }
        }
        Commands::Set { field, value } => set_field(&store, field, &value)?,
        Commands::ReadingTime { set } => {
            if let Some(total) = set {
                store.update_reading_time(total)?;
            }
            println!("{}", store.get_reading_time()?);
        }
        Commands::Library { command } => run_library(&store, command)?,
    }

    Ok(())
}

fn set_field<S: KeyValueStore>(
    store: &SettingsStore<S>,
    field: Field,
    value: &str,
) -> anyhow::Result<()> {
    match field {
        Field::Volume => {
            let volume = value.parse().context("volume must be an integer")?;
            store.save_volume(volume)?
        }
        Field::Voice => store.save_voice(value)?,
        Field::FontSize => {
            let font_size = value.parse().context("font size must be a number")?;
            store.save_font_size(font_size)?
        }
        Field::Speed => {
            let speed = value.parse().context("speed must be a number")?;
            store.save_speed(speed)?
        }
        Field::Background => {
            let (name, color) = value
                .split_once(':')
                .ok_or_else(|| anyhow!("background must be NAME:COLOR, e.g. Sepia:#F4ECD8"))?;
            store.save_background(&Background::new(name, color))?
        }
        Field::ListeningMode => store.save_listening_mode(value)?,
    }
    Ok(())
}

fn run_library<S: KeyValueStore>(
    store: &SettingsStore<S>,
    command: LibraryCommand,
) -> anyhow::Result<()> {
    match command {
        LibraryCommand::List => {
            println!("{}", serde_json::to_string_pretty(&store.get_library_books()?)?);
        }
        LibraryCommand::Add { market_id, fields } => {
            let book = build_book(market_id, &fields)?;
            if !store.add_book_to_library(book)? {
                println!("Already in library");
            }
        }
        LibraryCommand::Update { market_id, fields } => {
            let book = build_book(market_id, &fields)?;
            if !store.update_book_in_library(book)? {
                println!("Not in library");
            }
        }
        LibraryCommand::Remove { market_id } => {
            if !store.remove_book_from_library(&market_id)? {
                println!("Not in library");
            }
        }
        LibraryCommand::Contains { market_id } => {
            println!("{}", store.is_book_in_library(&market_id)?);
        }
    }
    Ok(())
}

fn build_book(market_id: String, fields: &[String]) -> anyhow::Result<LibraryBook> {
    let mut book = LibraryBook::new(market_id);
    for field in fields {
        let Some((key, raw)) = field.split_once('=') else {
            bail!("field '{}' must be KEY=VALUE", field);
        };
        if key == MARKET_ID_FIELD {
            bail!("marketId is given as the positional argument");
        }
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        book = book.with_field(key, value);
    }
    Ok(book)
}
