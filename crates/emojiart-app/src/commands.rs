//! Command execution against an open document.

use crate::cli::{Command, DropArgs, ViewArgs};
use emojiart_core::drop::handle_drop;
use emojiart_core::{
    CanvasFrame, CoordinateSpace, DropLocation, DropPayload, EmojiArtDocument, EmojiId, FetchState,
    StorageError, Viewport,
};
use kurbo::{Point, Vec2};
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to encode document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output error: {0}")]
    Io(#[from] io::Error),
    #[error("no emoji with id {0}")]
    UnknownEmoji(EmojiId),
    #[error("nothing usable was dropped")]
    NothingDropped,
    #[error("background did not load: {0}")]
    Background(String),
}

/// Run one command, writing its report to `out`.
pub fn run(
    command: Command,
    document: &mut EmojiArtDocument,
    view: &ViewArgs,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let mut viewport = Viewport::with_view(view.zoom, view.pan());

    match command {
        Command::Show => {
            writeln!(out, "{}", document.emoji_art().to_json()?)?;
        }
        Command::List => {
            for emoji in document.emojis() {
                let screen = viewport.position(emoji, view.canvas, document);
                writeln!(
                    out,
                    "{}\t{}\t({}, {})\tsize {}\tscreen ({:.1}, {:.1})",
                    emoji.id(),
                    emoji.text,
                    emoji.x,
                    emoji.y,
                    emoji.size,
                    screen.x,
                    screen.y
                )?;
            }
        }
        Command::Add {
            text,
            x,
            y,
            size,
            screen,
        } => {
            let mut at = Point::new(x, y);
            if screen {
                at = viewport.to_document(at, view.canvas);
            }
            let id = document.add_emoji(&text, at, size);
            writeln!(out, "{}", id)?;
        }
        Command::Drop(args) => drop_payloads(document, &viewport, view, args)?,
        Command::Remove { id } => {
            if !document.remove_emoji(id) {
                return Err(AppError::UnknownEmoji(id));
            }
        }
        Command::Move { ids, dx, dy } => {
            select_all(document, &ids)?;
            document.move_selection(Vec2::new(dx, dy));
        }
        Command::Scale { ids, factor } => {
            select_all(document, &ids)?;
            document.scale_selection(factor);
        }
        Command::Background { url, timeout } => {
            document.set_background_url(url);
            wait_for_background(document, Duration::from_secs(timeout))?;
            match document.background_image() {
                Some(image) => writeln!(out, "{}x{}", image.width(), image.height())?,
                None => writeln!(out, "no background")?,
            }
        }
        Command::Fit { timeout } => {
            wait_for_background(document, Duration::from_secs(timeout))?;
            let image = document.background_image().map(|image| image.size());
            if viewport.zoom_to_fit(image, view.canvas) {
                writeln!(out, "{}", viewport.zoom_scale())?;
            } else {
                writeln!(out, "no background to fit")?;
            }
        }
        Command::Palette => {
            for glyph in document.config().palette_glyphs() {
                writeln!(out, "{}", glyph)?;
            }
        }
    }
    Ok(())
}

fn drop_payloads(
    document: &mut EmojiArtDocument,
    viewport: &Viewport,
    view: &ViewArgs,
    args: DropArgs,
) -> Result<(), AppError> {
    let space = |global| {
        if global {
            CoordinateSpace::Global
        } else {
            CoordinateSpace::Local
        }
    };
    let location = DropLocation::new(args.x, space(args.global_x), args.y, space(args.global_y));
    let frame = CanvasFrame::new(Point::new(args.origin.0, args.origin.1), view.canvas);

    let mut payloads: Vec<DropPayload> = args.url.into_iter().map(DropPayload::Url).collect();
    payloads.extend(args.text.into_iter().map(DropPayload::Text));

    if handle_drop(document, viewport, &payloads, &location, &frame) {
        Ok(())
    } else {
        Err(AppError::NothingDropped)
    }
}

/// Replace the selection with `ids`.
fn select_all(document: &mut EmojiArtDocument, ids: &[EmojiId]) -> Result<(), AppError> {
    if let Some(&missing) = ids.iter().find(|&&id| document.emoji(id).is_none()) {
        return Err(AppError::UnknownEmoji(missing));
    }
    document.clear_selection();
    for &id in ids {
        if !document.is_selected(id) {
            document.select(id);
        }
    }
    Ok(())
}

/// Block until every outstanding fetch is handed back or `timeout` passes.
fn wait_for_background(document: &mut EmojiArtDocument, timeout: Duration) -> Result<(), AppError> {
    while document.pending_fetches() > 0 {
        if !document.wait_for_background(timeout) {
            return Err(AppError::Background(format!(
                "timed out after {}s",
                timeout.as_secs()
            )));
        }
    }
    match document.fetch_state() {
        FetchState::Discarded => Err(AppError::Background(
            document
                .background_url()
                .map(ToString::to_string)
                .unwrap_or_default(),
        )),
        _ => Ok(()),
    }
}
