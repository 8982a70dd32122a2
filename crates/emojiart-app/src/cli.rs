//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use emojiart_core::EmojiId;
use emojiart_core::config::{DEFAULT_EMOJI_SIZE, DEFAULT_STORAGE_KEY};
use kurbo::{Size, Vec2};
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "emojiart", about = "Edit EmojiArt documents from the command line")]
pub struct Cli {
    /// Directory documents are stored in.
    #[arg(long, env = "EMOJIART_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage key of the document.
    #[arg(long, env = "EMOJIART_DOCUMENT", default_value = DEFAULT_STORAGE_KEY)]
    pub document: String,

    #[command(flatten)]
    pub view: ViewArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// The view the canvas is shown through, for commands that take or print
/// screen coordinates.
#[derive(Args, Debug, Clone, Copy)]
pub struct ViewArgs {
    /// Canvas size as WIDTHxHEIGHT.
    #[arg(long, default_value = "800x600", value_parser = parse_size)]
    pub canvas: Size,

    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Pan offset in screen points.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_x: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_y: f64,
}

impl ViewArgs {
    pub fn pan(&self) -> Vec2 {
        Vec2::new(self.pan_x, self.pan_y)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the stored document as JSON.
    Show,
    /// List emoji with their document and screen positions.
    List,
    /// Add an emoji.
    Add {
        text: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(long, default_value_t = DEFAULT_EMOJI_SIZE)]
        size: f64,
        /// Treat X and Y as screen coordinates.
        #[arg(long)]
        screen: bool,
    },
    /// Drop text or a URL onto the canvas.
    Drop(DropArgs),
    /// Remove an emoji.
    Remove { id: EmojiId },
    /// Move emoji by a document-space offset.
    Move {
        #[arg(required = true)]
        ids: Vec<EmojiId>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dx: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dy: f64,
    },
    /// Scale emoji sizes.
    Scale {
        #[arg(required = true)]
        ids: Vec<EmojiId>,
        #[arg(long)]
        factor: f64,
    },
    /// Set or clear the background and wait for it to load.
    Background {
        url: Option<Url>,
        /// Seconds to wait for the image.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Print the zoom that fits the background into the canvas.
    Fit {
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Print the palette glyphs.
    Palette,
}

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Text payloads, each becoming one emoji.
    #[arg(long)]
    pub text: Vec<String>,

    /// URL payload; becomes the background.
    #[arg(long)]
    pub url: Option<Url>,

    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    #[arg(allow_negative_numbers = true)]
    pub y: f64,

    /// X is given in window coordinates.
    #[arg(long)]
    pub global_x: bool,

    /// Y is given in window coordinates.
    #[arg(long)]
    pub global_y: bool,

    /// Canvas top-left corner in window coordinates, as X,Y.
    #[arg(long, default_value = "0,0", value_parser = parse_point)]
    pub origin: (f64, f64),
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{}`", s))?;
    let w: f64 = w.trim().parse().map_err(|_| format!("invalid width `{}`", w))?;
    let h: f64 = h.trim().parse().map_err(|_| format!("invalid height `{}`", h))?;
    if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
        return Err(format!("canvas must have a positive size, got `{}`", s));
    }
    Ok(Size::new(w, h))
}

/// Parse `X,Y`.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{}`", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x `{}`", x))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y `{}`", y))?;
    Ok((x, y))
}
