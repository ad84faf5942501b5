//! Captcha configuration and the render pipeline: noise background, decorative shapes, rotated
//! glyphs, then one global wave distortion over the composed scene.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::canvas::PixelCanvas;
use crate::color::{Color, ColorSet, PaletteDb};
use crate::config::Config;
use crate::distort::{distort, Wave};
use crate::error::CaptchaError;
use crate::glyph::{self, GlyphSource, PixelFont};
use crate::rand::Rng;

/// Rendered in place of an empty string.
pub const FALLBACK_TEXT: &str = "unknown";

pub const MIN_WIDTH: i32 = 48;
pub const MIN_HEIGHT: i32 = 20;
pub const DEFAULT_SIZE: (i32, i32) = (82, 32);

/// Number of decorative circles and lines drawn per render.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DisturbLevel(pub i32);

impl DisturbLevel {
    pub const NORMAL: DisturbLevel = DisturbLevel(4);
    pub const MEDIUM: DisturbLevel = DisturbLevel(8);
    pub const HIGH: DisturbLevel = DisturbLevel(16);
}

impl Default for DisturbLevel {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl FromStr for DisturbLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::NORMAL),
            "medium" => Ok(Self::MEDIUM),
            "high" => Ok(Self::HIGH),
            other => other
                .parse::<i32>()
                .map(DisturbLevel)
                .map_err(|_| format!("invalid disturbance {:?}", s)),
        }
    }
}

/// Character ranges for generated text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum TextKind {
    Numeric,
    Lower,
    Upper,
    /// Each character independently picks one of the other ranges.
    All,
}

impl TextKind {
    /// First character and length of the range; `All` picks one of the others.
    fn range(self, rng: &mut Rng) -> (u8, u8) {
        match self {
            TextKind::Numeric => (b'0', 10),
            TextKind::Lower => (b'a', 26),
            TextKind::Upper => (b'A', 26),
            TextKind::All => {
                let kind = *rng.choice(&[TextKind::Numeric, TextKind::Lower, TextKind::Upper]);
                kind.range(rng)
            }
        }
    }
}

pub fn random_text(rng: &mut Rng, len: usize, kind: TextKind) -> String {
    (0..len)
        .map(|_| {
            let (base, count) = kind.range(rng);
            char::from(base + rng.below(i32::from(count)) as u8)
        })
        .collect()
}

/// Counts of decorative shapes issued to the canvas. Shapes that land off-canvas still count.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct NoiseReport {
    pub circles: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPlacement {
    pub ch: char,
    pub font_index: usize,
    pub angle: f64,
    /// Layout position of the glyph's origin, before rotation adjustments.
    pub anchor_x: i32,
    /// Top-left corner and size of the rotated glyph canvas as blitted.
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug)]
pub struct Render {
    /// The finished image.
    pub canvas: PixelCanvas,
    /// Noise shapes and glyphs as composed, before distortion.
    pub layer: PixelCanvas,
    pub noise: NoiseReport,
    pub glyphs: Vec<GlyphPlacement>,
    /// Characters that no configured font could render.
    pub skipped: Vec<char>,
    pub wave: Wave,
}

pub struct Captcha {
    front: ColorSet,
    background: ColorSet,
    disturbance: DisturbLevel,
    fonts: Vec<Box<dyn GlyphSource>>,
    size: (i32, i32),
}

impl fmt::Debug for Captcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captcha")
            .field("front", &self.front)
            .field("background", &self.background)
            .field("disturbance", &self.disturbance)
            .field("fonts", &self.fonts.len())
            .field("size", &self.size)
            .finish()
    }
}

impl Default for Captcha {
    fn default() -> Self {
        Self::new()
    }
}

impl Captcha {
    /// Black on white, [`DisturbLevel::NORMAL`], 82x32, and no fonts.
    pub fn new() -> Self {
        Captcha {
            front: ColorSet::single(Color::BLACK),
            background: ColorSet::single(Color::WHITE),
            disturbance: DisturbLevel::NORMAL,
            fonts: Vec::new(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn from_config(config: &Config, palettes: &PaletteDb) -> Result<Self, CaptchaError> {
        let mut captcha = Captcha::new();
        if let Some(name) = &config.palette {
            let palette = palettes
                .palette(name)
                .ok_or_else(|| CaptchaError::UnknownPalette(name.clone()))?;
            captcha.front = palette.front.clone();
            captcha.background = palette.background.clone();
        }
        captcha.set_front_colors(config.front.clone());
        captcha.set_background_colors(config.background.clone());
        captcha.set_size(config.width, config.height);
        captcha.set_disturbance(config.disturbance);
        for path in &config.fonts {
            captcha.add_font(path)?;
        }
        if config.builtin_font {
            captcha.add_glyph_source(PixelFont);
        }
        Ok(captcha)
    }

    pub fn add_font(&mut self, path: impl AsRef<Path>) -> Result<(), CaptchaError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CaptchaError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_font_bytes(&bytes)?;
        debug!("loaded font {}", path.display());
        Ok(())
    }

    pub fn add_font_bytes(&mut self, bytes: &[u8]) -> Result<(), CaptchaError> {
        let font = glyph::parse_font(bytes)?;
        self.fonts.push(Box::new(font));
        Ok(())
    }

    pub fn add_glyph_source(&mut self, source: impl GlyphSource + 'static) {
        self.fonts.push(Box::new(source));
    }

    /// Non-positive levels are ignored.
    pub fn set_disturbance(&mut self, level: DisturbLevel) {
        if level.0 > 0 {
            self.disturbance = level;
        }
    }

    /// Replaces the glyph and shape colors; an empty list is ignored.
    pub fn set_front_colors(&mut self, colors: Vec<Color>) {
        if let Some(set) = ColorSet::new(colors) {
            self.front = set;
        }
    }

    /// Replaces the background noise colors; an empty list is ignored.
    pub fn set_background_colors(&mut self, colors: Vec<Color>) {
        if let Some(set) = ColorSet::new(colors) {
            self.background = set;
        }
    }

    /// Sets the output size, raising each side to at least [`MIN_WIDTH`] x [`MIN_HEIGHT`].
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.size = (width.max(MIN_WIDTH), height.max(MIN_HEIGHT));
    }

    pub fn size(&self) -> (i32, i32) {
        self.size
    }

    pub fn disturbance(&self) -> DisturbLevel {
        self.disturbance
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Renders `text` with a clock-seeded generator and returns just the image.
    pub fn create_image(&self, text: &str) -> Result<PixelCanvas, CaptchaError> {
        Ok(self.draw(text, &mut Rng::from_time())?.canvas)
    }

    /// Generates `len` random characters of `kind` and renders them.
    pub fn create(
        &self,
        len: usize,
        kind: TextKind,
        rng: &mut Rng,
    ) -> Result<(Render, String), CaptchaError> {
        let text = random_text(rng, len, kind);
        let render = self.draw(&text, rng)?;
        Ok((render, text))
    }

    pub fn draw(&self, text: &str, rng: &mut Rng) -> Result<Render, CaptchaError> {
        if self.fonts.is_empty() {
            return Err(CaptchaError::NoFonts);
        }
        let text = if text.is_empty() { FALLBACK_TEXT } else { text };
        let (width, height) = self.size;

        let mut canvas = PixelCanvas::new(width, height)?;
        let mut layer = PixelCanvas::new(width, height)?;

        canvas.fill_noise(&self.background, rng);
        let noise = self.draw_noise(&mut layer, rng);
        let (glyphs, skipped) = self.draw_text(&mut layer, text, rng)?;

        let wave = Wave::random(rng);
        debug!(
            "distorting {}x{} with amplitude {:.2} period {:.2}",
            width, height, wave.amplitude, wave.period
        );
        distort(&layer, &mut canvas, wave);

        Ok(Render {
            canvas,
            layer,
            noise,
            glyphs,
            skipped,
            wave,
        })
    }

    fn draw_noise(&self, canvas: &mut PixelCanvas, rng: &mut Rng) -> NoiseReport {
        let (width, height) = canvas.size();
        let count = self.disturbance.0.max(0);
        let mut report = NoiseReport::default();

        for i in 0..count {
            let x = rng.below(width);
            let y = rng.below(height);
            let r = rng.below(height / 20) + 1;
            let color = self.front.pick(rng);
            canvas.draw_circle(x, y, r, i % 4 != 0, color);
            report.circles += 1;
        }

        for i in 0..count {
            let x = rng.below(width);
            let y = rng.below(height);
            // Alternate direction so lines fan both ways.
            let sign = if i % 2 == 0 { 1 } else { -1 };
            let dx = rng.below(height) * sign;
            let dy = rng.below(height / 10) * sign;
            let color = self.front.pick(rng);
            canvas.draw_line(x, y, x + dx, y + dy, color);
            report.lines += 1;
        }

        report
    }

    fn draw_text(
        &self,
        canvas: &mut PixelCanvas,
        text: &str,
        rng: &mut Rng,
    ) -> Result<(Vec<GlyphPlacement>, Vec<char>), CaptchaError> {
        let (width, height) = canvas.size();
        let count = text.chars().count() as i32;
        let font_size = (f64::from(height) * 0.65) as i32;
        let gap = width / count - font_size / 6;
        let offset_x = width / (count + 1);
        let offset_y = (f64::from(height) * 0.2) as i32;
        // Glyphs are drawn inset inside their square so that rotation has room on both sides;
        // the inset is taken back out when the square is placed.
        let inset = height / 4;

        let mut glyphs = Vec::with_capacity(count as usize);
        let mut skipped = Vec::new();
        for (i, ch) in text.chars().enumerate() {
            let color = self.front.pick(rng);
            let chosen = rng.index(self.fonts.len());
            let angle = f64::from(rng.below(60) - 30);

            let Some((square, font_index)) =
                self.rasterize(chosen, color, ch, font_size as f32, inset, offset_y, height)?
            else {
                warn!("no configured font has a glyph for {:?}; skipping", ch);
                skipped.push(ch);
                continue;
            };

            let rotated = glyph::rotate(&square, angle);
            let (w, h) = rotated.size();
            let anchor_x = offset_x + i as i32 * gap;
            let left = anchor_x - inset - (w - height) / 2;
            let top = height - h;
            canvas.blit(left, top, &rotated);

            debug!(
                "glyph {:?} font {} angle {} at ({}, {}) size {}x{}",
                ch, font_index, angle, left, top, w, h
            );
            glyphs.push(GlyphPlacement {
                ch,
                font_index,
                angle,
                anchor_x,
                left,
                top,
                width: w,
                height: h,
            });
        }
        Ok((glyphs, skipped))
    }

    /// Rasterizes with the chosen font, falling back to the others in order. `Ok(None)` means no
    /// font has the glyph.
    #[allow(clippy::too_many_arguments)]
    fn rasterize(
        &self,
        chosen: usize,
        color: Color,
        ch: char,
        point_size: f32,
        offset_x: i32,
        offset_y: i32,
        side: i32,
    ) -> Result<Option<(PixelCanvas, usize)>, CaptchaError> {
        let order = std::iter::once(chosen).chain((0..self.fonts.len()).filter(|&i| i != chosen));
        for index in order {
            let font = self.fonts[index].as_ref();
            match glyph::rasterize_char(font, color, ch, point_size, offset_x, offset_y, side) {
                Ok(canvas) => return Ok(Some((canvas, index))),
                Err(CaptchaError::GlyphNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
