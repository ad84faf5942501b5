use std::path::PathBuf;

use crate::captcha::{DisturbLevel, DEFAULT_SIZE};
use crate::color::Color;

#[derive(Debug, clap::Args)]
pub struct Config {
    /// Output width in pixels; raised to at least 48.
    #[clap(long, default_value_t = DEFAULT_SIZE.0)]
    pub width: i32,

    /// Output height in pixels; raised to at least 20.
    #[clap(long, default_value_t = DEFAULT_SIZE.1)]
    pub height: i32,

    /// Number of noise circles and lines: `normal`, `medium`, `high`, or a positive count.
    #[clap(long, default_value = "normal")]
    pub disturbance: DisturbLevel,

    /// Named palette from the bundled palette database.
    #[clap(long)]
    pub palette: Option<String>,

    /// Glyph and noise colors (`#rrggbb` or `#rrggbbaa`), comma separated. Overrides the palette.
    #[clap(long, value_delimiter = ',')]
    pub front: Vec<Color>,

    /// Background noise colors, comma separated. Overrides the palette.
    #[clap(long, value_delimiter = ',')]
    pub background: Vec<Color>,

    /// TrueType/OpenType font file; repeat to pick randomly among several.
    #[clap(long = "font")]
    pub fonts: Vec<PathBuf>,

    /// Also use the built-in 5x7 pixel font.
    #[clap(long)]
    pub builtin_font: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            disturbance: DisturbLevel::default(),
            palette: None,
            front: Vec::new(),
            background: Vec::new(),
            fonts: Vec::new(),
            builtin_font: false,
        }
    }
}
