//! EmojiArt command-line entry point.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use commands::AppError;
use emojiart_core::{EditorConfig, EmojiArtDocument, FileStorage, RasterDecoder, UrlImageSource};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let storage = match cli.data_dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    log::info!("Opening {} in {}", cli.document, storage.base_path().display());

    let storage = Arc::new(storage);
    let config = EditorConfig {
        storage_key: cli.document,
        ..EditorConfig::default()
    };
    let mut document = EmojiArtDocument::new(
        storage,
        Arc::new(UrlImageSource::new()),
        Arc::new(RasterDecoder),
        config,
    );
    document.subscribe(|event| log::debug!("Document event: {:?}", event));

    commands::run(cli.command, &mut document, &cli.view, &mut io::stdout().lock())
}
